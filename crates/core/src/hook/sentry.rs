//! Hook reporting calls to Sentry through sentry-go.
//!
//! Every call gets a breadcrumb on the hub of its context. Unless performance
//! monitoring is disabled, every call also runs in its own span whose status
//! reflects the returned error.

use std::collections::HashSet;

use serde::Deserialize;

use super::Hook;
use crate::error::{Error, Result};
use crate::imports::ImportTable;
use crate::introspect::{Method, Parameter};
use crate::utils::{go_quote, to_snake_case};

pub const IMPORT_PATH: &str = "github.com/getsentry/sentry-go";

const NAME: &str = "sentry";
const DEFAULT_CATEGORY: &str = "db.query";
const DEFAULT_SPAN_OP: &str = "db.query";

/// Options of the sentry hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentryOptions {
    /// Category of the breadcrumbs.
    pub category: String,
    /// Leave the arguments out of the breadcrumbs.
    pub no_args: bool,
    /// Leave the results out of the breadcrumbs.
    pub no_results: bool,
    /// Only put the error, and no other results, in the breadcrumbs.
    pub only_error: bool,
    /// Disable performance monitoring.
    pub no_perf: bool,
    /// Operation of the spans.
    pub span_op: String,
}

impl Default for SentryOptions {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            no_args: false,
            no_results: false,
            only_error: false,
            no_perf: false,
            span_op: DEFAULT_SPAN_OP.to_string(),
        }
    }
}

/// Build the sentry hook.
pub fn hook(options: &SentryOptions) -> Hook {
    let mut hook = Hook::new(NAME).with_import(IMPORT_PATH);

    let breadcrumb = options.clone();
    hook = hook.post_call(move |m, imports| breadcrumb_fragment(&breadcrumb, m, imports).map(Some));

    if !options.no_perf {
        let span = options.clone();
        hook = hook
            .pre_call(move |m, imports| span_fragment(&span, m, imports).map(Some))
            .on_success(|m, imports| status_fragment(m, imports, "SpanStatusOK").map(Some))
            .on_error(|m, imports| {
                status_fragment(m, imports, "SpanStatusInternalError").map(Some)
            });
    }

    hook
}

fn context_param(m: &Method) -> Result<&Parameter> {
    m.params
        .first()
        .filter(|p| p.ty.is_context())
        .ok_or_else(|| Error::Precondition {
            hook: NAME.to_string(),
            method: m.name.clone(),
            reason: "methods must accept a context.Context as their first argument".to_string(),
        })
}

fn alias(imports: &ImportTable) -> &str {
    imports.alias_of(IMPORT_PATH).unwrap_or(NAME)
}

fn span_fragment(options: &SentryOptions, m: &Method, imports: &ImportTable) -> Result<String> {
    let ctx = &context_param(m)?.name;
    let sentry = alias(imports);

    Ok(format!(
        "__sentry_span := {sentry}.StartSpan({ctx}, {op})\n\
         __sentry_span.Description = {name}\n\
         {ctx} = __sentry_span.Context()\n\
         \n\
         defer __sentry_span.Finish()",
        op = go_quote(&options.span_op),
        name = go_quote(&m.name),
    ))
}

fn status_fragment(m: &Method, imports: &ImportTable, status: &str) -> Result<String> {
    context_param(m)?;
    let sentry = alias(imports);
    Ok(format!("__sentry_span.Status = {sentry}.{status}"))
}

fn breadcrumb_fragment(
    options: &SentryOptions,
    m: &Method,
    imports: &ImportTable,
) -> Result<String> {
    let ctx = &context_param(m)?.name;
    let sentry = alias(imports);

    let mut data = Vec::new();
    if !options.no_args {
        data.push(format!("\"args\": {},", data_map(&m.params[1..])));
    }
    if !options.no_results {
        let results = if options.only_error {
            match m.error_result() {
                Some(err) => format!("map[string]any{{\"err\": {}}}", err.name),
                None => "map[string]any{}".to_string(),
            }
        } else {
            data_map(&m.results)
        };
        data.push(format!("\"results\": {results},"));
    }

    let mut lines = vec![
        format!("if __sentry_hub := {sentry}.GetHubFromContext({ctx}); __sentry_hub != nil {{"),
        format!("\t__sentry_hub.AddBreadcrumb(&{sentry}.Breadcrumb{{"),
        format!("\t\tCategory: {},", go_quote(&options.category)),
        format!("\t\tMessage: {},", go_quote(&m.name)),
    ];
    if data.is_empty() {
        lines.push("\t\tData: map[string]any{},".to_string());
    } else {
        lines.push("\t\tData: map[string]any{".to_string());
        lines.extend(data.into_iter().map(|entry| format!("\t\t\t{entry}")));
        lines.push("\t\t},".to_string());
    }
    lines.push("\t}, nil)".to_string());
    lines.push("}".to_string());

    Ok(lines.join("\n"))
}

/// `map[string]any{"snake_name": name, ...}`, keys made unique.
fn data_map(params: &[Parameter]) -> String {
    let mut keys = HashSet::new();
    let entries: Vec<_> = params
        .iter()
        .map(|p| {
            let mut key = to_snake_case(&p.name);
            while !keys.insert(key.clone()) {
                key.push('_');
            }
            format!("{}: {}", go_quote(&key), p.name)
        })
        .collect();
    format!("map[string]any{{{}}}", entries.join(", "))
}
