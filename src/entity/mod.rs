//! SeaORM entity definitions

pub mod account;
pub mod activation_code;
pub mod app_config;
pub mod auth_token;
pub mod health;
pub mod ibadah;
pub mod quran;
pub mod role;
pub mod sedekah;

pub use account::PremiumStatus;
pub use activation_code::CodeStatus;
pub use role::Role;
