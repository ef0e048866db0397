//! # Asana Common Library
//!
//! Shared code for the Asana content services:
//! - Error and result types
//! - Event types (ImportEvent) and the broadcast EventBus
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
