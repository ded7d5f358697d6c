//! Voice Recognition Service for clinical dictation
//!
//! Turns recorded visit audio into text for SOAP note generation.
//!
//! # Providers
//!
//! - **Google** Cloud Speech-to-Text (`speech:recognize`), authenticated with
//!   the clinic's service account
//! - **Whisper**, any OpenAI-compatible transcription endpoint
//!
//! The encoding sent to the provider is chosen from the file extension; the
//! language comes from the caller, then `SPEECH_LANGUAGE_CODE`, then `ja-JP`.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use voice_recognition_service::{VoiceConfig, VoiceService};
//!
//! # async fn example(audio: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = VoiceConfig::from_env()?;
//! let voice = VoiceService::new(config, None)?;
//! let result = voice.transcribe_audio(&audio, "visit.webm", Some("en-US")).await?;
//! println!("Transcription: {}", result.text);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod providers;
pub mod service;
pub mod transcription;

pub use audio::*;
pub use config::*;
pub use error::*;
pub use providers::{create_provider, VoiceProviderTrait};
pub use service::*;
pub use transcription::*;
