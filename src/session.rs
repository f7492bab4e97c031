//! Edit session state machine
//!
//! This module provides the authoritative source of truth for what is being
//! edited: the active (driver, application) pair and the mutation API the
//! presentation layer drives.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: the `EditSession` exclusively owns the
//!   three stores for the process lifetime
//! - **Stable identifiers**: the active target is a (driver id, executable)
//!   pair resolved through explicit lookups on every access, never a live
//!   reference into a mutable list
//! - **Validated mutations**: invalid selections and edits return errors
//!   immediately and leave state unchanged
//!
//! # State Flow
//!
//! ```text
//! Uninitialized (no drivers loaded)
//!     ↓ construction with at least one schema driver
//! DriverSelected(first driver, default application)
//!     ↓ select_application
//! DriverSelected(driver, application)   (no terminal state)
//! ```

use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::config_file;
use crate::error::DricfgError;
use crate::policy::PolicyStore;
use crate::resolver::{
    effective_default, filter_driver_unsupported_options, merge_options_for_display,
    resolve_options_for_save, SaveInclusion,
};
use crate::schema::SchemaStore;
use crate::user_config::{
    Application, UserConfigStore, DEFAULT_APP_EXECUTABLE,
};

/// An edit applied to one option of the active application.
///
/// Bool and fake-bool options are toggled rather than assigned; enum options
/// are addressed by label; int options take the numeric value directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionEdit {
    /// Flip a bool ("true"/"false") or fake-bool ("1"/"0") option
    Toggle,
    /// Select an enum value by its human-readable label
    Label(String),
    /// Assign an integer value (validated against the descriptor's range)
    Int(i32),
}

/// Errors that can occur during session transitions and edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No driver schema was loaded, so there is nothing to edit
    #[error("Session is not initialized: no driver schemas loaded")]
    NotInitialized,

    /// Selection or edit targeted a driver with no loaded schema
    #[error("Driver '{driver}' not found")]
    DriverNotFound { driver: String },

    /// Selection targeted an executable the driver has no application for
    #[error("Application '{executable}' not found for driver '{driver}'")]
    ApplicationNotFound { driver: String, executable: String },

    /// The default application anchors the driver and can never be removed
    #[error("The default application cannot be removed")]
    DefaultAppNotRemovable,

    /// A required field was empty on add-application
    #[error("Validation error: {field} must not be empty")]
    EmptyField { field: &'static str },

    /// An application with this executable already exists for the driver
    #[error("Application with executable '{executable}' already exists for driver '{driver}'")]
    DuplicateExecutable { driver: String, executable: String },

    /// The active application lacks an option the schema says it must have;
    /// the display merge should have made this impossible
    #[error("Option '{option}' missing from the active application (merge incomplete?)")]
    OptionNotFound { option: String },

    /// The edit does not fit the option's kind (e.g. toggling an int)
    #[error("Edit does not match the kind of option '{option}'")]
    KindMismatch { option: String },

    /// Integer edit outside the descriptor's inclusive range
    #[error("Value {value} for option '{option}' is outside the valid range {min}..={max}")]
    ValueOutOfRange {
        option: String,
        value: i32,
        min: i32,
        max: i32,
    },

    /// Enum edit with a label the descriptor does not declare
    #[error("Option '{option}' has no enum value labelled '{label}'")]
    UnknownEnumLabel { option: String, label: String },
}

impl From<SessionError> for DricfgError {
    fn from(err: SessionError) -> Self {
        match &err {
            SessionError::DriverNotFound { .. }
            | SessionError::ApplicationNotFound { .. } => DricfgError::NotFound(err.to_string()),
            SessionError::OptionNotFound { .. } | SessionError::NotInitialized => {
                DricfgError::Consistency(err.to_string())
            }
            _ => DricfgError::Validation(err.to_string()),
        }
    }
}

/// The active edit target: stable identifiers resolved on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveTarget {
    driver: String,
    executable: String,
}

/// Session tracking the currently active driver and application and
/// exposing the mutation API used by the presentation layer.
///
/// Construction runs the full load pipeline (merge, then filter) and
/// selects the first driver's default application. The session lives for
/// the process lifetime; there is no terminal state.
#[derive(Debug)]
pub struct EditSession {
    schema: SchemaStore,
    policy: PolicyStore,
    user: UserConfigStore,
    active: Option<ActiveTarget>,
    save_inclusion: SaveInclusion,
}

impl EditSession {
    /// Build a session over loaded stores.
    ///
    /// Merges and filters the user configuration so every application is
    /// schema-complete before the first render, then activates the first
    /// schema driver's default application.
    pub fn new(
        schema: SchemaStore,
        policy: PolicyStore,
        mut user: UserConfigStore,
    ) -> Result<Self, DricfgError> {
        merge_options_for_display(&policy, &schema, &mut user)?;
        filter_driver_unsupported_options(&schema, &mut user)?;

        let active = schema.drivers().first().map(|d| ActiveTarget {
            driver: d.driver.clone(),
            executable: DEFAULT_APP_EXECUTABLE.to_string(),
        });
        if let Some(target) = &active {
            info!("session initialized, active driver '{}'", target.driver);
        } else {
            warn!("session initialized without any driver schemas");
        }

        Ok(Self {
            schema,
            policy,
            user,
            active,
            save_inclusion: SaveInclusion::default(),
        })
    }

    /// The active (driver, executable) pair, if any driver is loaded.
    pub fn active_target(&self) -> Option<(&str, &str)> {
        self.active
            .as_ref()
            .map(|t| (t.driver.as_str(), t.executable.as_str()))
    }

    /// Resolves the active application through explicit lookups.
    pub fn active_application(&self) -> Result<&Application, SessionError> {
        let target = self.active.as_ref().ok_or(SessionError::NotInitialized)?;
        self.user
            .driver(&target.driver)
            .ok_or_else(|| SessionError::DriverNotFound {
                driver: target.driver.clone(),
            })?
            .application(&target.executable)
            .ok_or_else(|| SessionError::ApplicationNotFound {
                driver: target.driver.clone(),
                executable: target.executable.clone(),
            })
    }

    /// Read access to the stores, for rendering and persistence.
    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    pub fn user_config(&self) -> &UserConfigStore {
        &self.user
    }

    /// Which option values get persisted for non-default applications.
    pub fn set_save_inclusion(&mut self, inclusion: SaveInclusion) {
        self.save_inclusion = inclusion;
    }

    pub fn save_inclusion(&self) -> SaveInclusion {
        self.save_inclusion
    }

    /// Make (driver, executable) the active pair.
    ///
    /// A selection of the already-active pair is a no-op. Both lookups must
    /// hit; on a miss the error is logged and the state is unchanged.
    pub fn select_application(
        &mut self,
        driver: &str,
        executable: &str,
    ) -> Result<(), SessionError> {
        if let Some(target) = &self.active {
            if target.driver == driver && target.executable == executable {
                return Ok(());
            }
        }

        if self.schema.find_driver(driver).is_none() {
            warn!("selection failed: driver '{}' not found", driver);
            return Err(SessionError::DriverNotFound {
                driver: driver.to_string(),
            });
        }
        let known = self
            .user
            .driver(driver)
            .map(|d| d.application(executable).is_some())
            .unwrap_or(false);
        if !known {
            warn!(
                "selection failed: application '{}' not found for driver '{}'",
                executable, driver
            );
            return Err(SessionError::ApplicationNotFound {
                driver: driver.to_string(),
                executable: executable.to_string(),
            });
        }

        self.active = Some(ActiveTarget {
            driver: driver.to_string(),
            executable: executable.to_string(),
        });
        Ok(())
    }

    /// Add a new application for a driver, with a schema-complete option
    /// set generated from the driver's schema and the policy defaults.
    ///
    /// The new application does not become active; the caller re-selects it
    /// if desired.
    pub fn add_application(
        &mut self,
        driver: &str,
        name: &str,
        executable: &str,
    ) -> Result<(), SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::EmptyField { field: "name" });
        }
        if executable.trim().is_empty() {
            return Err(SessionError::EmptyField { field: "executable" });
        }
        let Some(driver_config) = self.schema.find_driver(driver) else {
            return Err(SessionError::DriverNotFound {
                driver: driver.to_string(),
            });
        };

        let entry = self.user.driver_entry(driver);
        if entry.application(executable).is_some() {
            return Err(SessionError::DuplicateExecutable {
                driver: driver.to_string(),
                executable: executable.to_string(),
            });
        }

        let mut app = Application::new(name, executable);
        for descriptor in driver_config.options() {
            let value = effective_default(&self.policy, driver, descriptor);
            app.set_option(&descriptor.name, &value);
        }
        entry.applications.push(app);
        info!(
            "added application '{}' ({}) for driver '{}'",
            name, executable, driver
        );
        Ok(())
    }

    /// Remove the active application and fall back to the driver's default.
    ///
    /// The default application itself is never removable.
    pub fn remove_application(&mut self) -> Result<(), SessionError> {
        let target = self
            .active
            .clone()
            .ok_or(SessionError::NotInitialized)?;
        if target.executable == DEFAULT_APP_EXECUTABLE {
            return Err(SessionError::DefaultAppNotRemovable);
        }

        let driver = self.user.driver_mut(&target.driver).ok_or_else(|| {
            SessionError::DriverNotFound {
                driver: target.driver.clone(),
            }
        })?;
        if !driver.remove_application(&target.executable) {
            return Err(SessionError::ApplicationNotFound {
                driver: target.driver.clone(),
                executable: target.executable.clone(),
            });
        }

        info!(
            "removed application '{}' from driver '{}'",
            target.executable, target.driver
        );
        self.active = Some(ActiveTarget {
            driver: target.driver,
            executable: DEFAULT_APP_EXECUTABLE.to_string(),
        });
        Ok(())
    }

    /// Apply an edit to one option of the active application.
    ///
    /// The edit is dispatched exhaustively against the descriptor's kind;
    /// range and label validation happen here, not in the presentation
    /// layer. Returns the newly stored value.
    pub fn set_option_value(
        &mut self,
        name: &str,
        edit: OptionEdit,
    ) -> Result<String, SessionError> {
        let target = self.active.clone().ok_or(SessionError::NotInitialized)?;
        let kind = self
            .schema
            .find_driver(&target.driver)
            .ok_or_else(|| SessionError::DriverNotFound {
                driver: target.driver.clone(),
            })?
            .find_option(name)
            .ok_or_else(|| SessionError::OptionNotFound {
                option: name.to_string(),
            })?
            .kind
            .clone();

        let option = self
            .user
            .driver_mut(&target.driver)
            .and_then(|d| d.application_mut(&target.executable))
            .and_then(|a| a.option_mut(name))
            .ok_or_else(|| SessionError::OptionNotFound {
                option: name.to_string(),
            })?;

        use crate::types::OptionKind;
        let new_value = match (&kind, &edit) {
            (OptionKind::Bool | OptionKind::FakeBool, OptionEdit::Toggle) => kind
                .toggled(&option.value)
                .expect("toggle on toggle kind"),
            (OptionKind::Enum { .. }, OptionEdit::Label(label)) => kind
                .raw_for_label(label)
                .map(str::to_string)
                .ok_or_else(|| SessionError::UnknownEnumLabel {
                    option: name.to_string(),
                    label: label.clone(),
                })?,
            (OptionKind::Int { min, max }, OptionEdit::Int(value)) => {
                if value < min || value > max {
                    return Err(SessionError::ValueOutOfRange {
                        option: name.to_string(),
                        value: *value,
                        min: *min,
                        max: *max,
                    });
                }
                value.to_string()
            }
            _ => {
                return Err(SessionError::KindMismatch {
                    option: name.to_string(),
                })
            }
        };

        option.value = new_value.clone();
        Ok(new_value)
    }

    /// Derive the minimal persisted set from the current state.
    pub fn resolve_for_save(&self) -> Result<UserConfigStore, DricfgError> {
        resolve_options_for_save(&self.policy, &self.schema, &self.user, self.save_inclusion)
    }

    /// Resolve and write the user configuration, fully replacing the file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let resolved = self.resolve_for_save()?;
        config_file::save_to_file(&resolved, path)
    }
}
