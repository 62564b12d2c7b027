use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Args;
use tracing::{debug, info, warn};

use dblog_core::hook::SentryOptions;
use dblog_core::{Config, Error, Generator, HookConfig, Result, package};

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Name of the interface to wrap
    #[arg(value_name = "INTERFACE")]
    pub interface: Option<String>,

    /// Directory of the Go package containing the interface, or a .json
    /// package description [default: .]
    #[arg(short = 'p', long = "package", value_name = "PATH")]
    pub package: Option<PathBuf>,

    /// Path of the generated file [default: dblog/wrapper.go]
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name of the generated type [default: Wrapper]
    #[arg(short = 't', long = "type", value_name = "NAME")]
    pub type_name: Option<String>,

    /// Package name of the generated file [default: name of the output directory]
    #[arg(long = "package-name", value_name = "NAME")]
    pub package_name: Option<String>,

    /// TOML file with default settings
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Don't run gofmt on the generated file
    #[arg(long = "no-format")]
    pub no_format: bool,

    /// Enable sentry logging
    #[arg(long = "sentry")]
    pub sentry: bool,

    /// The category to use for the breadcrumb [default: db.query]
    #[arg(long = "sentry-category", value_name = "CATEGORY")]
    pub sentry_category: Option<String>,

    /// Don't include the arguments in the breadcrumb
    #[arg(long = "sentry-no-args")]
    pub sentry_no_args: bool,

    /// Don't include the return values in the breadcrumb
    #[arg(long = "sentry-no-results")]
    pub sentry_no_results: bool,

    /// Only include the error and no other return values in the breadcrumb
    #[arg(long = "sentry-only-error")]
    pub sentry_only_error: bool,

    /// Disable performance monitoring
    #[arg(long = "sentry-no-perf")]
    pub sentry_no_perf: bool,

    /// The operation name to use for the span [default: db.query]
    #[arg(long = "sentry-span-op", value_name = "OP")]
    pub sentry_span_op: Option<String>,
}

impl GenerateArgs {
    fn has_sentry_options(&self) -> bool {
        self.sentry_category.is_some()
            || self.sentry_no_args
            || self.sentry_no_results
            || self.sentry_only_error
            || self.sentry_no_perf
            || self.sentry_span_op.is_some()
    }

    fn sentry_options(&self) -> SentryOptions {
        let defaults = SentryOptions::default();
        SentryOptions {
            category: self.sentry_category.clone().unwrap_or(defaults.category),
            no_args: self.sentry_no_args,
            no_results: self.sentry_no_results,
            only_error: self.sentry_only_error,
            no_perf: self.sentry_no_perf,
            span_op: self.sentry_span_op.clone().unwrap_or(defaults.span_op),
        }
    }
}

pub fn run(args: &GenerateArgs) -> i32 {
    match generate(args) {
        Ok(output) => {
            println!("generated {}", output.display());
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Combine the config file, if any, with the command line. Command line
/// values win.
pub fn resolve_config(args: &GenerateArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(interface) = &args.interface {
        config.interface = Some(interface.clone());
    }
    if let Some(package) = &args.package {
        config.package.clone_from(package);
    }
    if let Some(output) = &args.output {
        config.output.clone_from(output);
    }
    if let Some(type_name) = &args.type_name {
        config.type_name.clone_from(type_name);
    }
    if let Some(package_name) = &args.package_name {
        config.package_name = Some(package_name.clone());
    }
    if args.no_format {
        config.format = false;
    }

    if args.sentry {
        config
            .hooks
            .retain(|hook| !matches!(hook, HookConfig::Sentry(_)));
        config.hooks.push(HookConfig::Sentry(args.sentry_options()));
    } else if args.has_sentry_options() {
        warn!("Sentry options are ignored without --sentry.");
    }

    Ok(config)
}

fn generate(args: &GenerateArgs) -> Result<PathBuf> {
    let config = resolve_config(args)?;
    config.validate()?;

    debug!(
        package = %config.package.display(),
        output = %config.output.display(),
        hooks = config.hooks.len(),
        "Resolved configuration."
    );

    let package = package::load(&config.package)?;
    let generator = Generator::new(&package, config.interface_name()?, config.build_hooks())?;
    let code = generator.generate(&config.package_name()?, &config.type_name)?;

    write_output(&config.output, &code)?;

    if config.format {
        format_output(&config.output);
    }

    Ok(config.output)
}

fn write_output(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(Error::io("create directory", parent))?;
    }

    fs::write(path, code).map_err(Error::io("write", path))?;

    info!(
        path = %path.display(),
        bytes = code.len(),
        "Wrote generated file."
    );
    Ok(())
}

/// Run gofmt on `path`. Failing to format is not fatal.
fn format_output(path: &Path) {
    match Command::new("gofmt").arg("-w").arg(path).output() {
        Ok(output) if output.status.success() => {
            debug!(path = %path.display(), "Formatted generated file.");
        }
        Ok(output) => {
            warn!(
                path = %path.display(),
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Failed to format generated file."
            );
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to run gofmt.");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn args(interface: &str) -> GenerateArgs {
        GenerateArgs {
            interface: Some(interface.to_string()),
            ..GenerateArgs::default()
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = resolve_config(&args("Repo")).unwrap();
        assert_eq!(config.interface.as_deref(), Some("Repo"));
        assert_eq!(config.package, PathBuf::from("."));
        assert_eq!(config.output, PathBuf::from("dblog/wrapper.go"));
        assert_eq!(config.type_name, "Wrapper");
        assert!(config.format);
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn test_sentry_flags_build_options() {
        let config = resolve_config(&GenerateArgs {
            sentry: true,
            sentry_only_error: true,
            sentry_span_op: Some("db.sql".into()),
            ..args("Repo")
        })
        .unwrap();

        assert_eq!(
            config.hooks,
            vec![HookConfig::Sentry(SentryOptions {
                only_error: true,
                span_op: "db.sql".into(),
                ..SentryOptions::default()
            })]
        );
    }

    #[test]
    fn test_sentry_options_without_flag_are_ignored() {
        let config = resolve_config(&GenerateArgs {
            sentry_no_perf: true,
            ..args("Repo")
        })
        .unwrap();
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dblog.toml");
        fs::write(
            &path,
            "interface = \"Store\"\ntype_name = \"LoggedStore\"\nformat = false\n\n[[hooks]]\nkind = \"sentry\"\ncategory = \"file\"\n",
        )
        .unwrap();

        let from_file = resolve_config(&GenerateArgs {
            config: Some(path.clone()),
            ..GenerateArgs::default()
        })
        .unwrap();
        assert_eq!(from_file.interface.as_deref(), Some("Store"));
        assert_eq!(from_file.type_name, "LoggedStore");
        assert!(!from_file.format);

        let overridden = resolve_config(&GenerateArgs {
            config: Some(path),
            type_name: Some("Traced".into()),
            sentry: true,
            ..args("Repo")
        })
        .unwrap();
        assert_eq!(overridden.interface.as_deref(), Some("Repo"));
        assert_eq!(overridden.type_name, "Traced");
        assert_eq!(
            overridden.hooks,
            vec![HookConfig::Sentry(SentryOptions::default())]
        );
    }

    #[test]
    fn test_write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dblog").join("wrapper.go");
        write_output(&path, "package dblog\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "package dblog\n");
    }
}
