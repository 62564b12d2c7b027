//! Code generation from introspected methods to the Go syntax tree.
//!
//! Builds the wrapper type, its constructor and one forwarding method per
//! interface method, merging hook fragments around each delegated call. The
//! resulting [`GoFile`] is rendered with [`Emit`](crate::emit::Emit).

use std::collections::HashSet;

use tracing::debug;

use crate::ast::{GoDecl, GoField, GoFile, GoFunc, GoImport, GoStmt};
use crate::emit::Emit;
use crate::error::Result;
use crate::hook::{ExtensionPoint, Hook};
use crate::imports::ImportTable;
use crate::introspect::{Interface, Method, Parameter};
use crate::types::Type;

pub const HEADER: &str = "Code generated by dblog. DO NOT EDIT.";

/// Name of the struct field holding the wrapped implementation.
const WRAPPED: &str = "wrapped";

/// Generate the wrapper file for `iface`.
///
/// Hooks are consulted in order for every method. Only imports the file
/// actually refers to are written.
pub fn codegen_file(
    package: &str,
    type_name: &str,
    iface: &Interface,
    hooks: &[Hook],
    imports: &ImportTable,
) -> Result<GoFile> {
    let mut used = UsedImports::default();
    used.add_type(&iface.ty);

    let mut decls = codegen_wrapper_type(type_name, &iface.ty);

    for method in &iface.methods {
        let func = codegen_method(type_name, method, hooks, imports, &mut used)?;
        decls.push(GoDecl::Func(func));
    }

    let imports = imports
        .iter()
        .filter(|(_, path)| used.paths.contains(*path))
        .map(|(alias, path)| GoImport {
            alias: alias.to_string(),
            path: path.to_string(),
        })
        .collect();

    Ok(GoFile {
        header: HEADER.to_string(),
        package: package.to_string(),
        imports,
        decls,
    })
}

/// Import paths referenced by the generated code.
#[derive(Debug, Default)]
struct UsedImports {
    paths: HashSet<String>,
}

impl UsedImports {
    fn add_type(&mut self, ty: &Type) {
        match ty {
            Type::Array { elem, .. } | Type::Pointer(elem) => self.add_type(elem),
            Type::Map { key, value } => {
                self.add_type(key);
                self.add_type(value);
            }
            Type::Func(func) => {
                for ty in func.params.iter().chain(&func.results) {
                    self.add_type(ty);
                }
            }
            Type::Named(named) => {
                if !named.package_path.is_empty() {
                    self.paths.insert(named.package_path.clone());
                }
            }
        }
    }

    fn add_hook(&mut self, hook: &Hook) {
        self.paths.extend(hook.imports().iter().cloned());
    }
}

/// The wrapper struct, the interface assertion and the constructor.
fn codegen_wrapper_type(type_name: &str, iface_ty: &Type) -> Vec<GoDecl> {
    let iface_name = iface_ty.emit();
    let self_ty = Type::builtin(type_name);

    let wrapper = GoDecl::Struct {
        doc: Some(format!(
            "{type_name} wraps a {iface_name} and instruments every call made to it."
        )),
        name: type_name.to_string(),
        fields: vec![GoField {
            name: WRAPPED.to_string(),
            ty: iface_ty.clone(),
        }],
    };

    let assertion = GoDecl::Var {
        name: "_".to_string(),
        ty: Some(iface_ty.clone()),
        value: format!("(*{type_name})(nil)"),
    };

    let constructor = GoDecl::Func(GoFunc {
        doc: Some(format!(
            "New{type_name} creates a new {type_name} that wraps the passed {iface_name}."
        )),
        receiver: None,
        name: format!("New{type_name}"),
        params: vec![GoField {
            name: WRAPPED.to_string(),
            ty: iface_ty.clone(),
        }],
        results: vec![GoField {
            name: String::new(),
            ty: Type::pointer(self_ty),
        }],
        variadic: false,
        body: vec![GoStmt::Return(vec![format!(
            "&{type_name}{{{WRAPPED}: {WRAPPED}}}"
        )])],
    });

    vec![wrapper, assertion, constructor]
}

/// Receiver name for `type_name` that no parameter or result of `method`
/// uses.
fn receiver_name(type_name: &str, method: &Method) -> String {
    let mut name: String = type_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_else(|| "w".to_string());

    let taken = |candidate: &str| {
        method
            .params
            .iter()
            .chain(&method.results)
            .any(|p| p.name == candidate)
    };
    while taken(&name) {
        name.insert(0, '_');
    }
    name
}

fn codegen_method(
    type_name: &str,
    method: &Method,
    hooks: &[Hook],
    imports: &ImportTable,
    used: &mut UsedImports,
) -> Result<GoFunc> {
    for p in method.params.iter().chain(&method.results) {
        used.add_type(&p.ty);
    }

    let receiver = receiver_name(type_name, method);
    let mut fragments = |point| collect_fragments(point, method, hooks, imports, used);

    let mut body = Vec::new();

    let pre = fragments(ExtensionPoint::PreCall)?;
    push_group(&mut body, pre);

    push_group(&mut body, vec![GoStmt::Raw(delegate_call(&receiver, method))]);

    let post = fragments(ExtensionPoint::PostCall)?;
    push_group(&mut body, post);

    match method.error_result() {
        Some(err) => {
            let on_success = fragments(ExtensionPoint::OnSuccess)?;
            let on_error = fragments(ExtensionPoint::OnError)?;
            if let Some(gate) = gate(&err.name, on_success, on_error) {
                push_group(&mut body, vec![gate]);
            }
        }
        // no error to gate on: success always applies, error never does
        None => {
            let on_success = fragments(ExtensionPoint::OnSuccess)?;
            push_group(&mut body, on_success);
        }
    }

    if !method.results.is_empty() {
        body.push(GoStmt::Blank);
        body.push(GoStmt::Return(
            method.results.iter().map(|r| r.name.clone()).collect(),
        ));
    }

    Ok(GoFunc {
        doc: None,
        receiver: Some(GoField {
            name: receiver,
            ty: Type::pointer(Type::builtin(type_name)),
        }),
        name: method.name.clone(),
        params: to_fields(&method.params),
        results: to_fields(&method.results),
        variadic: method.variadic,
        body,
    })
}

fn to_fields(params: &[Parameter]) -> Vec<GoField> {
    params
        .iter()
        .map(|p| GoField {
            name: p.name.clone(),
            ty: p.ty.clone(),
        })
        .collect()
}

/// `r0, err = w.wrapped.Get(ctx, id)`
fn delegate_call(receiver: &str, method: &Method) -> String {
    let last = method.params.len().saturating_sub(1);
    let args: Vec<_> = method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if method.variadic && i == last {
                format!("{}...", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect();

    let call = format!(
        "{receiver}.{WRAPPED}.{}({})",
        method.name,
        args.join(", ")
    );

    if method.results.is_empty() {
        call
    } else {
        let results: Vec<_> = method.results.iter().map(|r| r.name.as_str()).collect();
        format!("{} = {call}", results.join(", "))
    }
}

/// Wrap the outcome specific fragments in the matching branch.
fn gate(err: &str, on_success: Vec<GoStmt>, on_error: Vec<GoStmt>) -> Option<GoStmt> {
    match (on_success.is_empty(), on_error.is_empty()) {
        (true, true) => None,
        (false, true) => Some(GoStmt::If {
            cond: format!("{err} == nil"),
            then_body: on_success,
            else_body: None,
        }),
        (true, false) => Some(GoStmt::If {
            cond: format!("{err} != nil"),
            then_body: on_error,
            else_body: None,
        }),
        (false, false) => Some(GoStmt::If {
            cond: format!("{err} != nil"),
            then_body: on_error,
            else_body: Some(on_success),
        }),
    }
}

/// Ask every hook for its fragment at `point`, in hook order.
fn collect_fragments(
    point: ExtensionPoint,
    method: &Method,
    hooks: &[Hook],
    imports: &ImportTable,
    used: &mut UsedImports,
) -> Result<Vec<GoStmt>> {
    let mut stmts = Vec::new();
    for hook in hooks {
        let Some(code) = hook.fragment(point, method, imports)? else {
            continue;
        };
        debug!(hook = hook.name(), method = %method.name, %point, "Adding hook fragment.");
        used.add_hook(hook);
        if !stmts.is_empty() {
            stmts.push(GoStmt::Blank);
        }
        stmts.push(GoStmt::Raw(code));
    }
    Ok(stmts)
}

/// Append a group of statements, separated from what came before by an
/// empty line.
fn push_group(body: &mut Vec<GoStmt>, group: Vec<GoStmt>) {
    if group.is_empty() {
        return;
    }
    if !body.is_empty() {
        body.push(GoStmt::Blank);
    }
    body.extend(group);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn param(name: &str, ty: Type) -> Parameter {
        Parameter {
            name: name.into(),
            ty,
        }
    }

    fn iface(methods: Vec<Method>) -> Interface {
        Interface {
            ty: Type::named("repository", "example.com/app/repository", "Repo"),
            methods,
        }
    }

    fn imports() -> ImportTable {
        let mut imports = ImportTable::new();
        imports.add("example.com/app/repository");
        imports.add("context");
        imports
    }

    fn counting_hook() -> Hook {
        Hook::new("test")
            .on_success(|_, _| Ok(Some("success()".into())))
            .on_error(|_, _| Ok(Some("failure()".into())))
    }

    fn generate(methods: Vec<Method>, hooks: &[Hook]) -> String {
        codegen_file("dblog", "Wrapper", &iface(methods), hooks, &imports())
            .unwrap()
            .emit()
    }

    #[test]
    fn test_gating_without_error_result() {
        let count = Method {
            name: "Count".into(),
            params: vec![],
            results: vec![param("r0", Type::builtin("int"))],
            variadic: false,
        };
        let code = generate(vec![count], &[counting_hook()]);

        assert_eq!(code.matches("success()").count(), 1, "Generated:\n{code}");
        assert!(!code.contains("failure()"), "Generated:\n{code}");
        assert!(!code.contains("if "), "Generated:\n{code}");
    }

    #[test]
    fn test_gating_with_error_result() {
        let save = Method {
            name: "Save".into(),
            params: vec![],
            results: vec![param("err", Type::builtin("error"))],
            variadic: false,
        };
        let code = generate(vec![save], &[counting_hook()]);

        assert!(
            code.contains("\tif err != nil {\n\t\tfailure()\n\t} else {\n\t\tsuccess()\n\t}\n"),
            "Generated:\n{code}"
        );
    }

    #[test]
    fn test_gating_with_only_one_half() {
        let save = Method {
            name: "Save".into(),
            params: vec![],
            results: vec![param("err", Type::builtin("error"))],
            variadic: false,
        };

        let hook = Hook::new("errors").on_error(|_, _| Ok(Some("failure()".into())));
        let code = generate(vec![save.clone()], &[hook]);
        assert!(
            code.contains("\tif err != nil {\n\t\tfailure()\n\t}\n"),
            "Generated:\n{code}"
        );

        let hook = Hook::new("successes").on_success(|_, _| Ok(Some("success()".into())));
        let code = generate(vec![save], &[hook]);
        assert!(
            code.contains("\tif err == nil {\n\t\tsuccess()\n\t}\n"),
            "Generated:\n{code}"
        );
    }

    #[test]
    fn test_on_error_not_invoked_without_error_result() {
        let ping = Method {
            name: "Ping".into(),
            params: vec![],
            results: vec![],
            variadic: false,
        };
        let hook = Hook::new("strict").on_error(|m, _| {
            Err(crate::error::Error::Precondition {
                hook: "strict".into(),
                method: m.name.clone(),
                reason: "should not be asked".into(),
            })
        });

        let code = generate(vec![ping], &[hook]);
        assert!(code.contains("func (w *Wrapper) Ping() {\n\tw.wrapped.Ping()\n}"), "Generated:\n{code}");
    }

    #[test]
    fn test_fragment_order_follows_hooks() {
        let get = Method {
            name: "Get".into(),
            params: vec![param("ctx", Type::named("context", "context", "Context"))],
            results: vec![param("err", Type::builtin("error"))],
            variadic: false,
        };
        let first = Hook::new("first")
            .pre_call(|_, _| Ok(Some("first_pre()".into())))
            .post_call(|_, _| Ok(Some("first_post()".into())));
        let second = Hook::new("second")
            .pre_call(|_, _| Ok(Some("second_pre()".into())))
            .post_call(|_, _| Ok(Some("second_post()".into())));

        let code = generate(vec![get], &[first, second]);
        let pos = |needle: &str| code.find(needle).unwrap();

        assert!(pos("first_pre()") < pos("second_pre()"));
        assert!(pos("second_pre()") < pos("err = w.wrapped.Get(ctx)"));
        assert!(pos("err = w.wrapped.Get(ctx)") < pos("first_post()"));
        assert!(pos("first_post()") < pos("second_post()"));
        assert!(pos("second_post()") < pos("return err"));
    }

    #[test]
    fn test_receiver_avoids_parameter_names() {
        let m = Method {
            name: "Get".into(),
            params: vec![param("w", Type::builtin("int")), param("_w", Type::builtin("int"))],
            results: vec![],
            variadic: false,
        };
        assert_eq!(receiver_name("Wrapper", &m), "__w");
        assert_eq!(receiver_name("Logged", &m), "l");
    }

    #[test]
    fn test_variadic_call_is_spread() {
        let list = Method {
            name: "List".into(),
            params: vec![
                param("prefix", Type::builtin("string")),
                param("ids", Type::slice(Type::builtin("string"))),
            ],
            results: vec![param("r0", Type::builtin("int"))],
            variadic: true,
        };
        let code = generate(vec![list], &[]);
        assert!(
            code.contains("func (w *Wrapper) List(prefix string, ids ...string) (r0 int) {"),
            "Generated:\n{code}"
        );
        assert!(code.contains("r0 = w.wrapped.List(prefix, ids...)"), "Generated:\n{code}");
    }

    #[test]
    fn test_only_used_imports_are_written() {
        let ping = Method {
            name: "Ping".into(),
            params: vec![],
            results: vec![],
            variadic: false,
        };
        let silent = Hook::new("silent").with_import("example.com/unused");
        let mut table = imports();
        table.add("example.com/unused");

        let file = codegen_file("dblog", "Wrapper", &iface(vec![ping]), &[silent], &table).unwrap();
        let paths: Vec<_> = file.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["example.com/app/repository"]);
    }

    #[test]
    fn test_wrapper_type_and_constructor() {
        let code = generate(vec![], &[]);
        assert!(code.starts_with("// Code generated by dblog. DO NOT EDIT.\n\npackage dblog\n"));
        assert!(
            code.contains("type Wrapper struct {\n\twrapped repository.Repo\n}"),
            "Generated:\n{code}"
        );
        assert!(
            code.contains("var _ repository.Repo = (*Wrapper)(nil)"),
            "Generated:\n{code}"
        );
        assert!(
            code.contains(
                "func NewWrapper(wrapped repository.Repo) *Wrapper {\n\treturn &Wrapper{wrapped: wrapped}\n}"
            ),
            "Generated:\n{code}"
        );
    }
}
