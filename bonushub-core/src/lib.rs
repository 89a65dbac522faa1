// src/lib.rs

pub mod approval;
pub mod calculator;
pub mod config;
pub mod db;
pub mod eventbus;
pub mod handlers;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;
pub mod validators;

pub use bonushub_common::error::Error;
pub use config::EngineConfig;
pub use db::Database;
pub use services::bonus_service::BonusEngine;
