//! Generator for instrumented wrappers around Go interfaces.
//!
//! The pipeline loads a [`Package`], resolves the target interface into
//! [`Method`]s, and emits a Go file whose wrapper type forwards every call
//! to the wrapped implementation while running the code contributed by the
//! configured [`Hook`]s.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod hook;
pub mod imports;
pub mod introspect;
pub mod package;
pub mod types;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use generator::Generator;
pub use hook::{ExtensionPoint, Hook, HookConfig, SentryOptions};
pub use imports::ImportTable;
pub use introspect::{Interface, Method, Parameter};
pub use package::Package;
pub use types::Type;
