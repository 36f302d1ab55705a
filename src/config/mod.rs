//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → settings.rs (defaults + free-form `setting` → EngineSettings)
//!     → shared via Arc to every role runtime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; every role sees the same value
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod settings;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ObservabilityConfig, ServerConfig, ServerType};
pub use settings::EngineSettings;
pub use validation::{validate_config, ValidationError};
