//! Shared types, errors, and configuration for Settla.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Opaque ID codec for identifiers exposed to clients
//! - Pagination types for list endpoints
//! - Request input error types
//! - Configuration management
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
