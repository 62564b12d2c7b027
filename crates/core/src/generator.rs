//! The generation pipeline.
//!
//! A [`Generator`] registers the imports of its hooks, introspects the target
//! interface and finally renders the wrapper file. Nothing is written to disk
//! here; the caller decides what to do with the returned text.

use tracing::{debug, info};

use crate::codegen::codegen_file;
use crate::emit::Emit;
use crate::error::{Error, Result};
use crate::hook::Hook;
use crate::imports::ImportTable;
use crate::introspect::{Interface, introspect};
use crate::package::Package;
use crate::utils::is_go_identifier;

/// Generates an instrumented wrapper for one interface.
#[derive(Debug)]
pub struct Generator {
    imports: ImportTable,
    hooks: Vec<Hook>,
    iface: Interface,
    iface_name: String,
}

impl Generator {
    /// Resolve `iface_name` in `package` for wrapping with `hooks`.
    ///
    /// Hook imports are registered before those of the interface, so they
    /// keep their default aliases.
    pub fn new(package: &Package, iface_name: &str, hooks: Vec<Hook>) -> Result<Self> {
        let mut imports = ImportTable::new();
        for hook in &hooks {
            for path in hook.imports() {
                let alias = imports.add(path);
                debug!(hook = hook.name(), path = %path, alias = %alias, "Registered hook import.");
            }
        }

        let iface = introspect(package, iface_name, &mut imports)?;

        Ok(Self {
            imports,
            hooks,
            iface,
            iface_name: iface_name.to_string(),
        })
    }

    pub fn interface(&self) -> &Interface {
        &self.iface
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Render the wrapper type `type_name` in package `package_name`.
    pub fn generate(&self, package_name: &str, type_name: &str) -> Result<String> {
        if !is_go_identifier(package_name) {
            return Err(Error::Configuration(format!(
                "'{package_name}' is not a valid package name"
            )));
        }
        if !is_go_identifier(type_name) {
            return Err(Error::Configuration(format!(
                "'{type_name}' is not a valid type name"
            )));
        }

        let file = codegen_file(
            package_name,
            type_name,
            &self.iface,
            &self.hooks,
            &self.imports,
        )?;
        let code = file.emit();

        info!(
            interface = %self.iface_name,
            wrapper = type_name,
            methods = self.iface.methods.len(),
            imports = file.imports.len(),
            "Generated wrapper."
        );

        Ok(code)
    }
}
