//! Chart data store for the VetChart backend
//!
//! Animals and their visit records live in an in-memory index that is the
//! authority for reads. Every mutation is mirrored, in order, to a remote
//! tabular store (Google Sheets in production), which is also the source the
//! index is rebuilt from at startup.
//!
//! - [`ChartRepository`] owns the index and the mirror protocol
//! - [`TabularBackend`] abstracts the remote store; [`GoogleSheetsBackend`]
//!   and [`InMemoryTabularBackend`] implement it
//! - [`rows`] maps models to spreadsheet rows
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use database_layer::{Animal, ChartRepository, InMemoryTabularBackend, RepositorySettings};
//!
//! # async fn example() -> database_layer::DatabaseResult<()> {
//! let repository = ChartRepository::new(
//!     Arc::new(InMemoryTabularBackend::new()),
//!     RepositorySettings::default(),
//! );
//! repository.add_animal(Animal::new("392000000001", "Hanako")).await?;
//! assert_eq!(repository.search_animals("hana").len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod a1;
pub mod backend;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod rows;
pub mod sheets;

pub use a1::A1Range;
pub use backend::TabularBackend;
#[cfg(any(test, feature = "mock"))]
pub use backend::MockTabularBackend;
pub use error::*;
pub use memory::InMemoryTabularBackend;
pub use models::*;
pub use repository::*;
pub use sheets::{GoogleSheetsBackend, SheetsConfig, DEFAULT_SHEETS_API_URL};
