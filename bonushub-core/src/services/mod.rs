// File: bonushub-core/src/services/mod.rs

pub mod bonus_service;
pub mod turnover_service;

pub use bonus_service::BonusEngine;
pub use turnover_service::TurnoverService;
