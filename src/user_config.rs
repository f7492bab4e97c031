//! User-defined configuration store
//!
//! Holds, per driver, the list of application edit targets and their
//! current option values. This is the only store the edit session mutates;
//! nothing here touches disk until an explicit save.

use serde::{Deserialize, Serialize};

/// Name of the reserved default application shown to the user.
pub const DEFAULT_APP_NAME: &str = "Default";

/// Executable sentinel of the default application. Exactly one application
/// per driver carries it, and that application can never be removed.
pub const DEFAULT_APP_EXECUTABLE: &str = "";

/// A single option value on an application, string-encoded per the
/// descriptor's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationOption {
    pub name: String,
    pub value: String,
}

impl ApplicationOption {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// An editable configuration target identified by an executable name.
///
/// The option list has set semantics keyed by option name; duplicates are
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub executable: String,
    #[serde(default)]
    pub options: Vec<ApplicationOption>,
}

impl Application {
    pub fn new(name: &str, executable: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: executable.to_string(),
            options: Vec::new(),
        }
    }

    /// The driver-wide default application for a driver.
    pub fn default_app() -> Self {
        Self::new(DEFAULT_APP_NAME, DEFAULT_APP_EXECUTABLE)
    }

    /// True for the reserved default application.
    pub fn is_default(&self) -> bool {
        self.executable == DEFAULT_APP_EXECUTABLE
    }

    pub fn option(&self, name: &str) -> Option<&ApplicationOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn option_mut(&mut self, name: &str) -> Option<&mut ApplicationOption> {
        self.options.iter_mut().find(|o| o.name == name)
    }

    /// Sets an option value, replacing any existing entry of that name.
    pub fn set_option(&mut self, name: &str, value: &str) {
        match self.option_mut(name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.options.push(ApplicationOption::new(name, value)),
        }
    }
}

/// All applications configured for one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDriverConfig {
    pub driver: String,
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl UserDriverConfig {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            applications: vec![Application::default_app()],
        }
    }

    pub fn application(&self, executable: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.executable == executable)
    }

    pub fn application_mut(&mut self, executable: &str) -> Option<&mut Application> {
        self.applications
            .iter_mut()
            .find(|a| a.executable == executable)
    }

    pub fn default_application(&self) -> Option<&Application> {
        self.application(DEFAULT_APP_EXECUTABLE)
    }

    /// Ensures the default application exists, creating it if a hand-edited
    /// file dropped it.
    pub fn ensure_default_application(&mut self) {
        if self.default_application().is_none() {
            self.applications.insert(0, Application::default_app());
        }
    }

    /// Stable sort by display name, default application first. Keeps the
    /// selection menu deterministic across runs.
    pub fn sort_applications(&mut self) {
        self.applications
            .sort_by(|a, b| b.is_default().cmp(&a.is_default()).then(a.name.cmp(&b.name)));
    }

    /// Removes the application with the given executable. The default
    /// application is never removed.
    pub fn remove_application(&mut self, executable: &str) -> bool {
        if executable == DEFAULT_APP_EXECUTABLE {
            return false;
        }
        let before = self.applications.len();
        self.applications.retain(|a| a.executable != executable);
        self.applications.len() != before
    }
}

/// The whole user-defined configuration: one entry per driver.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserConfigStore {
    #[serde(default)]
    pub drivers: Vec<UserDriverConfig>,
}

impl UserConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver(&self, driver: &str) -> Option<&UserDriverConfig> {
        self.drivers.iter().find(|d| d.driver == driver)
    }

    pub fn driver_mut(&mut self, driver: &str) -> Option<&mut UserDriverConfig> {
        self.drivers.iter_mut().find(|d| d.driver == driver)
    }

    /// Returns the config for a driver, creating an entry with the default
    /// application if none exists yet.
    pub fn driver_entry(&mut self, driver: &str) -> &mut UserDriverConfig {
        if self.driver(driver).is_none() {
            self.drivers.push(UserDriverConfig::new(driver));
        }
        self.driver_mut(driver).expect("entry just ensured")
    }
}
