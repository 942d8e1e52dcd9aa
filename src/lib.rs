//! Ramadhan devotional tracker
//!
//! Daily ibadah, Qur'an pages, sedekah and health records for guests (kept on
//! the device) and signed-in accounts (kept in the database), plus the
//! activation-code service that unlocks premium.

pub mod client;
pub mod entity;
pub mod error;
pub mod identity;
pub mod local;
pub mod plugins;
pub mod prelude;
pub mod recap;
pub mod state;
pub mod sv;
pub mod tracker;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
