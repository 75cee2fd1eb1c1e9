//! Market Common - Shared configuration, validation and logging for the market proxy.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Logging setup and request tracing helpers

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;
pub mod validation;

pub use config::{
    Config, NetworkConfig, ObservabilityConfig, ProvidersConfig, ScreenerProviderConfig,
    ServerConfig, TickerProviderConfig,
};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
