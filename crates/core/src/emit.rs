//! Go code emission via the Emit trait.
//!
//! Each type model and syntax tree node implements `Emit`, producing
//! canonical Go text. Output is indented with tabs the way gofmt does, so it
//! is readable even when the formatter is not run.

use crate::ast::{GoDecl, GoField, GoFile, GoFunc, GoImport, GoStmt};
use crate::types::{FuncType, NamedType, SLICE_LEN, Type};
use crate::utils::{go_quote, indent};

/// Trait for emitting Go code from model and syntax tree nodes.
pub trait Emit {
    /// Convert the node to its Go source representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Types
// =============================================================================

impl Emit for Type {
    fn emit(&self) -> String {
        match self {
            Type::Array { len, elem } if *len == SLICE_LEN => format!("[]{}", elem.emit()),
            Type::Array { len, elem } => format!("[{len}]{}", elem.emit()),
            Type::Map { key, value } => format!("map[{}]{}", key.emit(), value.emit()),
            Type::Pointer(elem) => format!("*{}", elem.emit()),
            Type::Func(func) => func.emit(),
            Type::Named(named) => named.emit(),
        }
    }
}

impl Emit for NamedType {
    fn emit(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }
}

impl Emit for FuncType {
    fn emit(&self) -> String {
        let last = self.params.len().saturating_sub(1);
        let params: Vec<_> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if self.variadic && i == last {
                    variadic_elem(p)
                } else {
                    p.emit()
                }
            })
            .collect();

        let results = match self.results.as_slice() {
            [] => String::new(),
            [single] => format!(" {}", single.emit()),
            many => format!(
                " ({})",
                many.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
            ),
        };

        format!("func({}){results}", params.join(", "))
    }
}

/// Render the type of a variadic parameter as `...T`.
fn variadic_elem(ty: &Type) -> String {
    match ty {
        Type::Array { len, elem } if *len == SLICE_LEN => format!("...{}", elem.emit()),
        other => format!("...{}", other.emit()),
    }
}

// =============================================================================
// Syntax tree
// =============================================================================

impl Emit for GoImport {
    fn emit(&self) -> String {
        format!("{} {}", self.alias, go_quote(&self.path))
    }
}

impl Emit for GoField {
    fn emit(&self) -> String {
        if self.name.is_empty() {
            self.ty.emit()
        } else {
            format!("{} {}", self.name, self.ty.emit())
        }
    }
}

impl Emit for GoStmt {
    fn emit(&self) -> String {
        match self {
            GoStmt::Raw(code) => code.clone(),
            GoStmt::Blank => String::new(),
            GoStmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut out = format!("if {cond} {{\n");
                out.push_str(&emit_block(then_body));
                if let Some(else_body) = else_body {
                    out.push_str("} else {\n");
                    out.push_str(&emit_block(else_body));
                }
                out.push('}');
                out
            }
            GoStmt::Return(values) if values.is_empty() => "return".to_string(),
            GoStmt::Return(values) => format!("return {}", values.join(", ")),
        }
    }
}

/// Emit statements one level deeper, each line terminated.
fn emit_block(stmts: &[GoStmt]) -> String {
    if stmts.is_empty() {
        return String::new();
    }
    let body = stmts.iter().map(Emit::emit).collect::<Vec<_>>().join("\n");
    format!("{}\n", indent(&body, 1))
}

fn emit_doc(doc: Option<&str>) -> String {
    doc.map(|doc| {
        doc.lines()
            .map(|line| format!("// {line}\n"))
            .collect::<String>()
    })
    .unwrap_or_default()
}

impl Emit for GoFunc {
    fn emit(&self) -> String {
        let mut out = emit_doc(self.doc.as_deref());

        out.push_str("func ");
        if let Some(receiver) = &self.receiver {
            out.push_str(&format!("({}) ", receiver.emit()));
        }
        out.push_str(&self.name);

        let last = self.params.len().saturating_sub(1);
        let params: Vec<_> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if self.variadic && i == last {
                    format!("{} {}", p.name, variadic_elem(&p.ty))
                } else {
                    p.emit()
                }
            })
            .collect();
        out.push_str(&format!("({})", params.join(", ")));

        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                out.push_str(&format!(" {}", single.ty.emit()));
            }
            many => {
                let results: Vec<_> = many.iter().map(Emit::emit).collect();
                out.push_str(&format!(" ({})", results.join(", ")));
            }
        }

        out.push_str(" {\n");
        out.push_str(&emit_block(&self.body));
        out.push('}');
        out
    }
}

impl Emit for GoDecl {
    fn emit(&self) -> String {
        match self {
            GoDecl::Struct { doc, name, fields } => {
                let mut out = emit_doc(doc.as_deref());
                out.push_str(&format!("type {name} struct {{\n"));
                for field in fields {
                    out.push_str(&format!("\t{}\n", field.emit()));
                }
                out.push('}');
                out
            }
            GoDecl::Var { name, ty, value } => match ty {
                Some(ty) => format!("var {name} {} = {value}", ty.emit()),
                None => format!("var {name} = {value}"),
            },
            GoDecl::Func(func) => func.emit(),
        }
    }
}

impl Emit for GoFile {
    fn emit(&self) -> String {
        let mut parts = Vec::new();

        let header = emit_doc(Some(&self.header));
        parts.push(header.trim_end().to_string());
        parts.push(format!("package {}", self.package));

        if !self.imports.is_empty() {
            let imports: Vec<_> = self
                .imports
                .iter()
                .map(|import| format!("\t{}\n", import.emit()))
                .collect();
            parts.push(format!("import (\n{})", imports.concat()));
        }

        parts.extend(self.decls.iter().map(Emit::emit));

        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}
