// File: bonushub-core/src/tasks/mod.rs

pub mod bonus_expiry;
