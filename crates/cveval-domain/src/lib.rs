//! Domain layer for the CV/project evaluation pipeline.
//!
//! Contains entities, value objects, the stable error taxonomy, and port
//! traits. Nothing here knows about HTTP, a specific LLM vendor, a
//! specific vector store, or a specific message broker — those live behind
//! the ports in [`ports`] and are implemented in `cveval-providers`.

pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, ErrorKind, Result};
