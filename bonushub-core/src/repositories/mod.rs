// src/repositories/mod.rs

pub mod memory;
pub mod postgres;

pub use bonushub_common::traits::repository_traits::{
    BonusTemplateRepository, UserBonusRepository, UserStatusProvider,
};

pub use postgres::bonus_templates::PostgresBonusTemplateRepository;
pub use postgres::user_bonuses::PostgresUserBonusRepository;
