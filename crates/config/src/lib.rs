//! Configuration loading, validation, and env substitution.
//!
//! Config files: `rota.toml`, `rota.yaml`, or `rota.json`
//! Searched in `./` then `~/.config/rota/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{discover_and_load, find_config_file, load_config},
    schema::{DispatcherConfig, JobConfig, RotaConfig, TaskSpec},
    validate::{Diagnostic, Severity, ValidationResult},
};
