// File: bonushub-core/src/repositories/postgres/mod.rs

pub mod bonus_templates;
pub mod user_bonuses;
