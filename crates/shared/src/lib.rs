//! Shared types, errors, and configuration for Stockflow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types, including accumulated field errors
//! - Configuration management
//! - Tracing subscriber initialisation for binaries

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LoggingConfig};
pub use error::{AppError, AppResult, FieldError, ValidationErrors};
