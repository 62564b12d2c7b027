//! Import alias management for generated files.
//!
//! Every package referenced by the generated code is registered here once and
//! receives an alias that is unique within the file. The table is scoped to a
//! single generation run.

use std::collections::BTreeMap;

use tracing::debug;

/// Maps import aliases to import paths, handing out collision-free aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    imports: BTreeMap<String, String>, // alias -> path
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` and return the alias to use when referring to it.
    ///
    /// Adding the same path again returns the same alias. An empty path is a
    /// no-op and yields an empty alias.
    pub fn add(&mut self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }

        let name = default_alias(path);

        // fast path: no collision
        match self.imports.get(&name) {
            Some(existing) if existing != path => {}
            _ => {
                self.imports.insert(name.clone(), path.to_string());
                return name;
            }
        }

        let mut i = 0usize;
        loop {
            let candidate = format!("{name}{i}");
            match self.imports.get(&candidate) {
                Some(existing) if existing != path => i += 1,
                _ => {
                    debug!(path, alias = %candidate, "Import alias collided, using numbered alias.");
                    self.imports.insert(candidate.clone(), path.to_string());
                    return candidate;
                }
            }
        }
    }

    /// Look up the alias a path was registered under.
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|(_, p)| p.as_str() == path)
            .map(|(alias, _)| alias.as_str())
    }

    /// Look up the path registered under an alias.
    pub fn path_of(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }

    /// Iterate `(alias, path)` pairs ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut entries: Vec<_> = self
            .imports
            .iter()
            .map(|(alias, path)| (alias.as_str(), path.as_str()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Derive the default alias for an import path from its last segment.
///
/// Anything after the first `-`, `_` or `.` is dropped, so
/// `github.com/getsentry/sentry-go` becomes `sentry` and `gopkg.in/yaml.v3`
/// becomes `yaml`.
pub fn default_alias(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    let base = base.split(['-', '_', '.']).next().unwrap_or(base);
    if base.is_empty() {
        // e.g. "example.com/_internal"; fall back to the whole segment
        return path
            .rsplit('/')
            .next()
            .unwrap_or(path)
            .replace(['-', '_', '.'], "");
    }
    base.to_string()
}
