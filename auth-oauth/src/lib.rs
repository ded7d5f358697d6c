//! OAuth 2.0 service-account authentication for Google APIs
//!
//! The spreadsheet backend and the speech provider both call Google REST APIs
//! on behalf of a service account. This crate:
//! - loads service-account key material from inline base64 JSON or a file
//! - signs an RS256 JWT assertion and exchanges it for an access token
//!   (the `urn:ietf:params:oauth:grant-type:jwt-bearer` grant)
//! - caches the token until shortly before it expires
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_oauth::{ServiceAccountKey, ServiceAccountTokenSource, TokenSource, SPREADSHEETS_SCOPE};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = ServiceAccountKey::from_env()?;
//! let tokens = ServiceAccountTokenSource::new(key, &[SPREADSHEETS_SCOPE]);
//! let bearer = tokens.access_token().await?;
//! # let _ = bearer;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod error;
pub mod token;

pub use credentials::*;
pub use error::*;
pub use token::*;

/// Read/write access to Google Sheets
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Broad Google Cloud scope, required by Speech-to-Text
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
