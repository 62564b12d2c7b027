//! Instrumentation hooks.
//!
//! A [`Hook`] contributes Go source fragments at up to four extension points
//! of every wrapper method. Each capability is optional; a hook that leaves
//! one out is simply skipped at that point.

pub mod sentry;

use std::fmt;

use serde::Deserialize;

use crate::error::Result;
use crate::imports::ImportTable;
use crate::introspect::Method;

pub use sentry::SentryOptions;

/// Produces the fragment for one method, or `None` if there is nothing to
/// emit. Failing rejects the method and aborts the run.
pub type Fragment = Box<dyn Fn(&Method, &ImportTable) -> Result<Option<String>>>;

/// The points in a wrapper method where hooks may add code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionPoint {
    /// Before the wrapped method is called.
    PreCall,
    /// After the wrapped method returned.
    PostCall,
    /// After the wrapped method returned a nil error, or always if it returns
    /// no error.
    OnSuccess,
    /// After the wrapped method returned a non-nil error.
    OnError,
}

impl ExtensionPoint {
    pub const ALL: [ExtensionPoint; 4] = [
        ExtensionPoint::PreCall,
        ExtensionPoint::PostCall,
        ExtensionPoint::OnSuccess,
        ExtensionPoint::OnError,
    ];
}

impl fmt::Display for ExtensionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionPoint::PreCall => "pre-call",
            ExtensionPoint::PostCall => "post-call",
            ExtensionPoint::OnSuccess => "on-success",
            ExtensionPoint::OnError => "on-error",
        };
        f.write_str(name)
    }
}

/// A named set of optional fragment producers.
pub struct Hook {
    name: String,
    imports: Vec<String>,
    pre_call: Option<Fragment>,
    post_call: Option<Fragment>,
    on_success: Option<Fragment>,
    on_error: Option<Fragment>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            imports: Vec::new(),
            pre_call: None,
            post_call: None,
            on_success: None,
            on_error: None,
        }
    }

    /// Declare an import path the hook's fragments refer to.
    pub fn with_import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(path.into());
        self
    }

    pub fn pre_call<F>(mut self, f: F) -> Self
    where
        F: Fn(&Method, &ImportTable) -> Result<Option<String>> + 'static,
    {
        self.pre_call = Some(Box::new(f));
        self
    }

    pub fn post_call<F>(mut self, f: F) -> Self
    where
        F: Fn(&Method, &ImportTable) -> Result<Option<String>> + 'static,
    {
        self.post_call = Some(Box::new(f));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Method, &ImportTable) -> Result<Option<String>> + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Method, &ImportTable) -> Result<Option<String>> + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    fn slot(&self, point: ExtensionPoint) -> Option<&Fragment> {
        match point {
            ExtensionPoint::PreCall => self.pre_call.as_ref(),
            ExtensionPoint::PostCall => self.post_call.as_ref(),
            ExtensionPoint::OnSuccess => self.on_success.as_ref(),
            ExtensionPoint::OnError => self.on_error.as_ref(),
        }
    }

    /// Whether the hook supplies the capability for `point`.
    pub fn supports(&self, point: ExtensionPoint) -> bool {
        self.slot(point).is_some()
    }

    /// Produce the fragment for `point`. Unsupported points yield `None`
    /// without invoking anything.
    pub fn fragment(
        &self,
        point: ExtensionPoint,
        method: &Method,
        imports: &ImportTable,
    ) -> Result<Option<String>> {
        match self.slot(point) {
            Some(f) => f(method, imports),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let supported: Vec<_> = ExtensionPoint::ALL
            .into_iter()
            .filter(|p| self.supports(*p))
            .map(|p| p.to_string())
            .collect();
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("imports", &self.imports)
            .field("capabilities", &supported)
            .finish()
    }
}

/// Configuration of a hook, as found in config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HookConfig {
    Sentry(SentryOptions),
}

impl HookConfig {
    /// The `kind` this hook is configured under.
    pub fn kind(&self) -> &'static str {
        match self {
            HookConfig::Sentry(_) => "sentry",
        }
    }

    pub fn build(&self) -> Hook {
        match self {
            HookConfig::Sentry(options) => sentry::hook(options),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn method() -> Method {
        Method {
            name: "Ping".into(),
            params: vec![],
            results: vec![],
            variadic: false,
        }
    }

    #[test]
    fn test_missing_capabilities_are_skipped() {
        let hook = Hook::new("partial").post_call(|m, _| Ok(Some(format!("// {}", m.name))));
        let imports = ImportTable::new();

        assert!(!hook.supports(ExtensionPoint::PreCall));
        assert!(hook.supports(ExtensionPoint::PostCall));
        assert_eq!(
            hook.fragment(ExtensionPoint::PreCall, &method(), &imports)
                .unwrap(),
            None
        );
        assert_eq!(
            hook.fragment(ExtensionPoint::PostCall, &method(), &imports)
                .unwrap()
                .as_deref(),
            Some("// Ping")
        );
    }

    #[test]
    fn test_rejection_is_returned() {
        let hook = Hook::new("strict").pre_call(|m, _| {
            Err(Error::Precondition {
                hook: "strict".into(),
                method: m.name.clone(),
                reason: "no".into(),
            })
        });
        let err = hook
            .fragment(ExtensionPoint::PreCall, &method(), &ImportTable::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "strict: method Ping: no");
    }

    #[test]
    fn test_fragments_see_imports() {
        let hook = Hook::new("aliased")
            .with_import("example.com/log")
            .on_success(|_, imports| {
                Ok(imports
                    .alias_of("example.com/log")
                    .map(|alias| format!("{alias}.Done()")))
            });
        let mut imports = ImportTable::new();
        for path in hook.imports() {
            imports.add(path);
        }

        let fragment = hook
            .fragment(ExtensionPoint::OnSuccess, &method(), &imports)
            .unwrap();
        assert_eq!(fragment.as_deref(), Some("log.Done()"));
    }

    #[test]
    fn test_debug_lists_capabilities() {
        let hook = Hook::new("dbg")
            .pre_call(|_, _| Ok(None))
            .on_error(|_, _| Ok(None));
        let debug = format!("{hook:?}");
        assert!(debug.contains("pre-call"), "{debug}");
        assert!(debug.contains("on-error"), "{debug}");
        assert!(!debug.contains("post-call"), "{debug}");
    }

    #[test]
    fn test_hook_config_from_toml() {
        #[derive(Deserialize)]
        struct File {
            hooks: Vec<HookConfig>,
        }

        let file: File = toml::from_str(
            "[[hooks]]\nkind = \"sentry\"\ncategory = \"sql\"\nonly_error = true\n",
        )
        .unwrap();
        let HookConfig::Sentry(options) = &file.hooks[0];
        assert_eq!(options.category, "sql");
        assert!(options.only_error);
        assert_eq!(options.span_op, "db.query");

        let hook = file.hooks[0].build();
        assert_eq!(hook.name(), "sentry");
    }
}
