//! dricfg Library
//!
//! Core functionality for inspecting and editing per-application graphics
//! driver options: schema parsing, policy overrides, configuration
//! resolution, the edit session state machine and file persistence.

pub mod cli;
pub mod config_file;
pub mod error;
pub mod gpu;
pub mod policy;
pub mod resolver;
pub mod schema;
pub mod session;
pub mod types;
pub mod user_config;

// Re-export main types for convenience
pub use error::{DricfgError, Result};
pub use gpu::{dedup_gpus, GpuInfo};
pub use policy::PolicyStore;
pub use resolver::{
    effective_default, filter_driver_unsupported_options, merge_options_for_display,
    resolve_options_for_save, SaveInclusion,
};
pub use schema::{parse_driver_schema, DriverConfiguration, OptionDescriptor, SchemaStore, Section};
pub use session::{EditSession, OptionEdit, SessionError};
pub use types::{EnumValue, OptionKind};
pub use user_config::{
    Application, ApplicationOption, UserConfigStore, UserDriverConfig, DEFAULT_APP_EXECUTABLE,
    DEFAULT_APP_NAME,
};
