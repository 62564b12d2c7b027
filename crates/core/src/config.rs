//! Run configuration.
//!
//! A [`Config`] describes one generation run. It can be read from a TOML file
//! and is usually completed from the command line.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hook::{Hook, HookConfig};
use crate::utils::is_go_identifier;

pub const DEFAULT_OUTPUT: &str = "dblog/wrapper.go";
pub const DEFAULT_TYPE_NAME: &str = "Wrapper";

/// Settings of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the interface to wrap.
    pub interface: Option<String>,
    /// Directory of the Go package, or a `.json` package description.
    pub package: PathBuf,
    /// Path of the generated file.
    pub output: PathBuf,
    /// Name of the generated wrapper type.
    pub type_name: String,
    /// Package clause of the generated file. Defaults to the name of the
    /// output directory.
    pub package_name: Option<String>,
    /// Run gofmt on the generated file.
    pub format: bool,
    pub hooks: Vec<HookConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: None,
            package: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            type_name: DEFAULT_TYPE_NAME.to_string(),
            package_name: None,
            format: true,
            hooks: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml(location: &str, contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|err| Error::Configuration(format!("failed to parse '{location}': {err}")))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file.");
        let contents = fs::read_to_string(path).map_err(Error::io("read", path))?;
        Self::from_toml(&path.display().to_string(), &contents)
    }

    /// The interface name, validated.
    pub fn interface_name(&self) -> Result<&str> {
        let name = self
            .interface
            .as_deref()
            .ok_or_else(|| Error::Configuration("no interface name given".to_string()))?;
        if !is_go_identifier(name) {
            return Err(Error::Configuration(format!(
                "'{name}' is not a valid interface name"
            )));
        }
        Ok(name)
    }

    /// The package clause of the generated file, validated.
    pub fn package_name(&self) -> Result<String> {
        let name = match &self.package_name {
            Some(name) => name.clone(),
            None => self
                .output
                .parent()
                .and_then(|dir| dir.file_name())
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "cannot derive a package name from '{}', set one explicitly",
                        self.output.display()
                    ))
                })?,
        };

        if !is_go_identifier(&name) {
            return Err(Error::Configuration(format!(
                "'{name}' is not a valid package name"
            )));
        }
        Ok(name)
    }

    /// Check everything that can be checked before loading the package.
    pub fn validate(&self) -> Result<()> {
        self.interface_name()?;

        if !is_go_identifier(&self.type_name) {
            return Err(Error::Configuration(format!(
                "'{}' is not a valid type name",
                self.type_name
            )));
        }

        let is_go_file = self
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("go"));
        if !is_go_file {
            return Err(Error::Configuration(format!(
                "output '{}' is not a .go file",
                self.output.display()
            )));
        }

        self.package_name()?;

        // each hook kind may run at most once per method
        let mut kinds = HashSet::new();
        for hook in &self.hooks {
            if !kinds.insert(hook.kind()) {
                return Err(Error::Configuration(format!(
                    "hook '{}' is configured more than once",
                    hook.kind()
                )));
            }
        }
        Ok(())
    }

    /// Build the configured hooks, in order.
    pub fn build_hooks(&self) -> Vec<Hook> {
        self.hooks.iter().map(HookConfig::build).collect()
    }
}
