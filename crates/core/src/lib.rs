//! # Datatrack Core
//!
//! Runtime configuration and the service facade over the answer codec and tracked-item
//! results.
//!
//! This crate contains no I/O beyond what callers hand it:
//! - [`TrackingConfig`] is resolved once at startup from raw environment values
//! - [`TrackingService`] encodes and decodes answers, reloads collections from client data
//!   and finalizes edited medications
//!
//! **No transport concerns**: reading files and the environment belongs in the CLI.

pub mod config;
pub mod constants;
mod error;
pub mod service;

pub use config::TrackingConfig;
pub use error::{CoreError, CoreResult};
pub use service::TrackingService;
