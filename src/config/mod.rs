//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable config backends.
//! Submodules provide the data model, validation logic, and the
//! file-based source implementations. Configuration is loaded once at
//! startup and is immutable for the life of the process (rebuilding
//! the dispatch table means restarting).

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::OutpostError;
use model::Config;

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits (Rust 1.75+) does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<Config, OutpostError>;
}
