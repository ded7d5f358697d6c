//! Note Generation Service
//!
//! Turns free clinical text into a structured SOAP note through a hosted
//! generative model (Gemini), and translates text with the same model.
//!
//! Generation never returns an error to the caller. Empty input, a blocked
//! or empty model answer, malformed JSON and transport failures all produce a
//! note whose fields describe what went wrong.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use note_generation_service::{create_provider, GenerationConfig, SoapGenerator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GenerationConfig::from_env()?;
//! let generator = SoapGenerator::new(create_provider(&config));
//! let note = generator
//!     .generate_soap_from_text("Cow 12 off feed since yesterday, temperature 40.1")
//!     .await;
//! println!("Assessment: {}", note.assessment);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod soap;

pub use config::*;
pub use error::*;
pub use providers::{
    create_provider, Candidate, GenerationProvider, GenerationResponse, OutputFormat,
    BLOCK_REASON_UNSPECIFIED,
};
pub use soap::*;
