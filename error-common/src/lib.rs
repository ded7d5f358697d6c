//! Common error handling utilities for the VetChart backend
//!
//! This crate provides the process-level error type, stable error codes shared
//! by the HTTP layer, and sanitization helpers used before error text is logged
//! or echoed back to a client.
//!
//! # Error Categories
//!
//! - **ValidationError**: bad or missing request input
//! - **NotFound**: unknown animal or record identifiers
//! - **ExternalError**: spreadsheet, speech or generation services failing
//! - **ConfigError**: missing or malformed environment configuration
//! - **NetworkError / ServerError**: listener and serving failures
//!
//! # Example
//!
//! ```rust
//! use error_common::{ChartError, DataSanitizer};
//!
//! fn require_name(name: &str) -> Result<&str, ChartError> {
//!     if name.trim().is_empty() {
//!         return Err(ChartError::ValidationError("name is required".into()));
//!     }
//!     Ok(name)
//! }
//!
//! assert!(require_name("").is_err());
//! let safe = DataSanitizer::new().sanitize_for_logging("GET /v1?key=abc123");
//! assert_eq!(safe, "GET /v1?key=[REDACTED]");
//! ```

pub mod types;
pub mod codes;
pub mod sanitization;

pub use types::*;
pub use codes::*;
pub use sanitization::*;
