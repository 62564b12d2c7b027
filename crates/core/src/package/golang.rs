//! Tree-sitter based loading of Go packages.
//!
//! Parses every non-test `.go` file of a directory and collects its
//! package-level declarations into a [`Package`]. Only declarations are
//! inspected; function bodies are never looked at. The package import path is
//! derived from the enclosing `go.mod`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::{Language, Node, Parser};

use super::{
    ChanDir, InterfaceMember, InterfaceType, MethodSpec, NativeType, Object, Package, Signature,
    Var,
};
use crate::error::{Error, Result};
use crate::imports::default_alias;

/// Go's predeclared type names.
const PREDECLARED: [&str; 22] = [
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

/// Load the Go package in `dir`.
pub fn load_dir(dir: &Path) -> Result<Package> {
    let location = dir.display().to_string();
    let files = go_files(dir)?;
    if files.is_empty() {
        return Err(Error::Load {
            location,
            reason: "directory contains no Go files".into(),
        });
    }

    let path = import_path(dir)?;

    let language: Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|err| Error::Load {
        location: location.clone(),
        reason: format!("failed to set Go language: {err}"),
    })?;

    let mut name: Option<String> = None;
    let mut objects = Vec::new();

    for file in &files {
        let source = fs::read_to_string(file).map_err(Error::io("read", file))?;
        let parsed = parse_source(&mut parser, file, &source, &path)?;

        match &name {
            None => name = Some(parsed.package),
            Some(existing) if *existing != parsed.package => {
                return Err(Error::Load {
                    location,
                    reason: format!(
                        "found packages {existing} and {} in the same directory",
                        parsed.package
                    ),
                });
            }
            Some(_) => {}
        }

        objects.extend(parsed.objects);
    }

    let name = name.unwrap_or_default();
    debug!(
        package = %name,
        path = %path,
        files = files.len(),
        objects = objects.len(),
        "Loaded Go package."
    );

    Ok(Package {
        name,
        path,
        objects,
    })
}

/// Parse a single Go source file.
///
/// `package_path` is the import path of the package the file belongs to and
/// is used for references to types declared in the same package.
pub fn parse_file(file: &Path, source: &str, package_path: &str) -> Result<Package> {
    let language: Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|err| Error::Load {
        location: file.display().to_string(),
        reason: format!("failed to set Go language: {err}"),
    })?;

    let parsed = parse_source(&mut parser, file, source, package_path)?;
    Ok(Package {
        name: parsed.package,
        path: package_path.to_string(),
        objects: parsed.objects,
    })
}

struct ParsedFile {
    package: String,
    objects: Vec<Object>,
}

fn parse_source(
    parser: &mut Parser,
    file: &Path,
    source: &str,
    package_path: &str,
) -> Result<ParsedFile> {
    let location = file.display().to_string();
    let tree = parser.parse(source, None).ok_or_else(|| Error::Load {
        location: location.clone(),
        reason: "failed to parse file".into(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(0) + 1;
        return Err(Error::Load {
            location,
            reason: format!("syntax error near line {line}"),
        });
    }

    let mut reader = FileReader {
        source,
        package_path,
        imports: HashMap::new(),
        type_params: Vec::new(),
    };

    let mut package = String::new();
    let mut objects = Vec::new();

    let mut cursor = root.walk();
    let decls: Vec<_> = root.named_children(&mut cursor).collect();

    // imports first so qualified types can be resolved regardless of layout
    for decl in &decls {
        match decl.kind() {
            "package_clause" => {
                if let Some(ident) = decl.named_child(0) {
                    package = reader.text(ident).to_string();
                }
            }
            "import_declaration" => reader.read_imports(*decl),
            _ => {}
        }
    }

    for decl in &decls {
        match decl.kind() {
            "type_declaration" => objects.extend(reader.read_type_declaration(*decl)),
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    objects.push(Object::Func {
                        name: reader.text(name).to_string(),
                    });
                }
            }
            "var_declaration" => {
                for name in reader.spec_names(*decl, "var_spec") {
                    objects.push(Object::Var { name });
                }
            }
            "const_declaration" => {
                for name in reader.spec_names(*decl, "const_spec") {
                    objects.push(Object::Const { name });
                }
            }
            _ => {}
        }
    }

    Ok(ParsedFile { package, objects })
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}

struct FileReader<'a> {
    source: &'a str,
    package_path: &'a str,
    /// local package name -> import path
    imports: HashMap<String, String>,
    /// type parameters of the declaration being read
    type_params: Vec<String>,
}

impl<'a> FileReader<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    fn read_imports(&mut self, decl: Node<'_>) {
        let mut specs = Vec::new();
        collect_kind(decl, "import_spec", &mut specs);

        for spec in specs {
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = self.text(path_node).trim_matches(['"', '`']).to_string();
            let name = match spec.child_by_field_name("name") {
                Some(name) => self.text(name).to_string(),
                None => package_name_guess(&path),
            };
            if name == "_" || name == "." {
                debug!(path = %path, "Skipping blank or dot import.");
                continue;
            }
            self.imports.insert(name, path);
        }
    }

    fn read_type_declaration(&mut self, decl: Node<'_>) -> Vec<Object> {
        let mut objects = Vec::new();
        let mut cursor = decl.walk();
        let specs: Vec<_> = decl.named_children(&mut cursor).collect();

        for spec in specs {
            let Some(name) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = self.text(name).to_string();

            match spec.kind() {
                "type_spec" => {
                    let type_params = spec
                        .child_by_field_name("type_parameters")
                        .map(|params| self.type_param_names(params))
                        .unwrap_or_default();

                    self.type_params.clone_from(&type_params);
                    let underlying = self.field_type(spec, "type");
                    self.type_params.clear();

                    objects.push(Object::Type {
                        name,
                        type_params,
                        underlying,
                    });
                }
                "type_alias" => {
                    let target = self.field_type(spec, "type");
                    objects.push(Object::Alias { name, target });
                }
                _ => {}
            }
        }

        objects
    }

    fn type_param_names(&self, params: Node<'_>) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = params.walk();
        let decls: Vec<_> = params.named_children(&mut cursor).collect();
        for decl in decls {
            let mut name_cursor = decl.walk();
            names.extend(
                decl.children_by_field_name("name", &mut name_cursor)
                    .map(|n| self.text(n).to_string()),
            );
        }
        names
    }

    fn spec_names(&self, decl: Node<'_>, spec_kind: &str) -> Vec<String> {
        let mut specs = Vec::new();
        collect_kind(decl, spec_kind, &mut specs);

        let mut names = Vec::new();
        for spec in specs {
            let mut cursor = spec.walk();
            names.extend(
                spec.children_by_field_name("name", &mut cursor)
                    .map(|n| self.text(n).to_string())
                    .filter(|n| n != "_"),
            );
        }
        names
    }

    fn field_type(&self, node: Node<'_>, field: &str) -> NativeType {
        match node.child_by_field_name(field) {
            Some(ty) => self.ty(ty),
            None => NativeType::Other {
                description: format!("missing {field} in `{}`", self.text(node)),
            },
        }
    }

    fn ty(&self, node: Node<'_>) -> NativeType {
        match node.kind() {
            "type_identifier" => {
                let name = self.text(node);
                if self.type_params.iter().any(|p| p == name) {
                    NativeType::TypeParam { name: name.into() }
                } else if PREDECLARED.contains(&name) {
                    NativeType::Basic { name: name.into() }
                } else {
                    NativeType::Named {
                        package: self.package_path.into(),
                        name: name.into(),
                        type_args: Vec::new(),
                    }
                }
            }
            "qualified_type" => {
                let (Some(pkg), Some(name)) = (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) else {
                    return self.other(node);
                };
                match self.imports.get(self.text(pkg)) {
                    Some(path) => NativeType::Named {
                        package: path.clone(),
                        name: self.text(name).into(),
                        type_args: Vec::new(),
                    },
                    None => NativeType::Other {
                        description: format!(
                            "`{}` refers to a package that is not imported",
                            self.text(node)
                        ),
                    },
                }
            }
            "generic_type" => {
                let mut base = self.field_type(node, "type");
                if let NativeType::Named { type_args, .. } = &mut base {
                    if let Some(args) = node.child_by_field_name("type_arguments") {
                        let mut cursor = args.walk();
                        let args: Vec<_> = args.named_children(&mut cursor).collect();
                        type_args.extend(
                            args.into_iter()
                                .filter(|a| a.kind() != "comment")
                                .map(|a| self.type_elem(a)),
                        );
                    }
                }
                base
            }
            "pointer_type" => match last_named_child(node) {
                Some(elem) => NativeType::Pointer {
                    elem: Box::new(self.ty(elem)),
                },
                None => self.other(node),
            },
            "slice_type" => NativeType::Slice {
                elem: Box::new(self.field_type(node, "element")),
            },
            "array_type" => {
                let len = node
                    .child_by_field_name("length")
                    .and_then(|len| parse_int_literal(self.text(len)));
                match len {
                    Some(len) => NativeType::Array {
                        len,
                        elem: Box::new(self.field_type(node, "element")),
                    },
                    None => NativeType::Other {
                        description: format!(
                            "array length in `{}` is not an integer literal",
                            self.text(node)
                        ),
                    },
                }
            }
            "map_type" => NativeType::Map {
                key: Box::new(self.field_type(node, "key")),
                value: Box::new(self.field_type(node, "value")),
            },
            "function_type" => NativeType::Signature(self.signature(
                node.child_by_field_name("parameters"),
                node.child_by_field_name("result"),
            )),
            "channel_type" => {
                let text = self.text(node);
                let dir = if text.starts_with("<-") {
                    ChanDir::Recv
                } else if text.starts_with("chan<-") || text.starts_with("chan <-") {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = node
                    .child_by_field_name("value")
                    .or_else(|| last_named_child(node))
                    .map_or_else(|| self.other(node), |elem| self.ty(elem));
                NativeType::Chan {
                    dir,
                    elem: Box::new(elem),
                }
            }
            "struct_type" => NativeType::Struct { fields: Vec::new() },
            "interface_type" => NativeType::Interface(self.interface(node)),
            "parenthesized_type" => match last_named_child(node) {
                Some(inner) => self.ty(inner),
                None => self.other(node),
            },
            _ => self.other(node),
        }
    }

    /// A type element in a constraint or type argument position.
    fn type_elem(&self, node: Node<'_>) -> NativeType {
        if node.kind() != "type_elem" && node.kind() != "constraint_elem" {
            return self.ty(node);
        }
        let mut cursor = node.walk();
        let terms: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|t| t.kind() != "comment")
            .collect();
        match terms.as_slice() {
            [single] if single.kind() != "negated_type" => self.ty(*single),
            _ => NativeType::Other {
                description: format!("constraint `{}`", self.text(node)),
            },
        }
    }

    fn interface(&self, node: Node<'_>) -> InterfaceType {
        let mut cursor = node.walk();
        let elems: Vec<_> = node.named_children(&mut cursor).collect();

        let mut methods = Vec::new();
        for elem in elems {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    methods.push(InterfaceMember::Method(MethodSpec {
                        name: self.text(name).into(),
                        signature: self.signature(
                            elem.child_by_field_name("parameters"),
                            elem.child_by_field_name("result"),
                        ),
                    }));
                }
                "comment" => {}
                _ => methods.push(InterfaceMember::Embedded {
                    embed: self.type_elem(elem),
                }),
            }
        }

        InterfaceType { methods }
    }

    fn signature(&self, params: Option<Node<'_>>, result: Option<Node<'_>>) -> Signature {
        let mut signature = Signature::default();

        if let Some(params) = params {
            signature.variadic = self.parameter_list(params, &mut signature.params);
        }

        if let Some(result) = result {
            if result.kind() == "parameter_list" {
                self.parameter_list(result, &mut signature.results);
            } else {
                signature.results.push(Var {
                    name: String::new(),
                    ty: self.ty(result),
                });
            }
        }

        signature
    }

    /// Read a parameter list into `out`; returns whether it ends in `...T`.
    fn parameter_list(&self, list: Node<'_>, out: &mut Vec<Var>) -> bool {
        let mut variadic = false;
        let mut cursor = list.walk();
        let decls: Vec<_> = list.named_children(&mut cursor).collect();

        for decl in decls {
            match decl.kind() {
                "parameter_declaration" => {
                    let ty = self.field_type(decl, "type");
                    let mut name_cursor = decl.walk();
                    let names: Vec<_> = decl
                        .children_by_field_name("name", &mut name_cursor)
                        .map(|n| self.text(n).to_string())
                        .collect();
                    if names.is_empty() {
                        out.push(Var {
                            name: String::new(),
                            ty,
                        });
                    } else {
                        out.extend(names.into_iter().map(|name| Var {
                            name,
                            ty: ty.clone(),
                        }));
                    }
                }
                "variadic_parameter_declaration" => {
                    variadic = true;
                    let name = decl
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string())
                        .unwrap_or_default();
                    out.push(Var {
                        name,
                        ty: NativeType::Slice {
                            elem: Box::new(self.field_type(decl, "type")),
                        },
                    });
                }
                _ => {}
            }
        }

        variadic
    }

    fn other(&self, node: Node<'_>) -> NativeType {
        NativeType::Other {
            description: format!("`{}`", self.text(node)),
        }
    }
}

fn collect_kind<'tree>(node: Node<'tree>, kind: &str, out: &mut Vec<Node<'tree>>) {
    if node.kind() == kind {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_kind(child, kind, out);
    }
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children.last().copied()
}

fn parse_int_literal(text: &str) -> Option<u64> {
    let text = text.replace('_', "");
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}

/// Guess the package name an unaliased import is referred to by.
fn package_name_guess(path: &str) -> String {
    let mut segments: Vec<_> = path.split('/').filter(|s| !s.is_empty()).collect();

    // "github.com/go-redis/redis/v8" is package redis
    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            let is_major_version = last.len() > 1
                && last.starts_with('v')
                && last[1..].chars().all(|c| c.is_ascii_digit());
            if is_major_version {
                segments.pop();
            }
        }
    }

    let last = segments.last().copied().unwrap_or(path);
    default_alias(last.strip_prefix("go-").unwrap_or(last))
}

fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(Error::io("read directory", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(Error::io("read directory", dir))?;
        let path = entry.path();
        let is_source = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".go") && !n.ends_with("_test.go"));
        if is_source && path.is_file() {
            files.push(path);
        }
    }

    // directory iteration order is unspecified
    files.sort();
    Ok(files)
}

/// Compute the import path of `dir` from the nearest enclosing `go.mod`.
fn import_path(dir: &Path) -> Result<String> {
    let dir = dir.canonicalize().map_err(Error::io("resolve", dir))?;

    for root in dir.ancestors() {
        let go_mod = root.join("go.mod");
        if !go_mod.is_file() {
            continue;
        }

        let contents = fs::read_to_string(&go_mod).map_err(Error::io("read", &go_mod))?;
        let module = module_path(&contents).ok_or_else(|| Error::Load {
            location: go_mod.display().to_string(),
            reason: "go.mod has no module directive".into(),
        })?;

        let rel: Vec<_> = dir
            .strip_prefix(root)
            .unwrap_or(Path::new(""))
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        return Ok(if rel.is_empty() {
            module
        } else {
            format!("{module}/{}", rel.join("/"))
        });
    }

    Err(Error::Load {
        location: dir.display().to_string(),
        reason: "no go.mod found in this directory or any parent".into(),
    })
}

fn module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.split("//").next()?.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const REPO_GO: &str = r#"package repository

import (
	"context"

	sentryalias "github.com/getsentry/sentry-go"
	"github.com/go-redis/redis/v8"
)

const Version = "1"

var DefaultLimit = 10

type Item struct {
	ID string
}

// Repo stores items.
type Repo interface {
	Get(ctx context.Context, id string) (*Item, error)
	List(context.Context, int, ...string) ([]Item, error)
	Watch(ctx context.Context) map[string][4]byte
	Hub(ctx context.Context) *sentryalias.Hub
	Client() *redis.Client
}

type Stream interface {
	Events(ctx context.Context) <-chan Item
}

type Number interface {
	~int | ~float64
}

func New() Repo { return nil }
"#;

    fn parse(source: &str) -> Package {
        parse_file(Path::new("repo.go"), source, "example.com/app/repository").unwrap()
    }

    fn methods(pkg: &Package, name: &str) -> Vec<MethodSpec> {
        let Some(Object::Type {
            underlying: NativeType::Interface(iface),
            ..
        }) = pkg.lookup(name)
        else {
            panic!("{name} should be an interface: {:?}", pkg.lookup(name));
        };
        iface
            .methods
            .iter()
            .filter_map(|m| match m {
                InterfaceMember::Method(spec) => Some(spec.clone()),
                InterfaceMember::Embedded { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_declarations() {
        let pkg = parse(REPO_GO);
        assert_eq!(pkg.name, "repository");

        let names: Vec<_> = pkg.objects.iter().map(|o| o.name()).collect();
        assert_eq!(
            names,
            vec![
                "Version",
                "DefaultLimit",
                "Item",
                "Repo",
                "Stream",
                "Number",
                "New"
            ]
        );
        assert!(matches!(pkg.lookup("Version"), Some(Object::Const { .. })));
        assert!(matches!(pkg.lookup("DefaultLimit"), Some(Object::Var { .. })));
        assert!(matches!(pkg.lookup("New"), Some(Object::Func { .. })));
    }

    #[test]
    fn test_parse_interface_methods_in_order() {
        let pkg = parse(REPO_GO);
        let methods = methods(&pkg, "Repo");
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Get", "List", "Watch", "Hub", "Client"]);

        let get = &methods[0].signature;
        assert_eq!(get.params[0].name, "ctx");
        assert_eq!(
            get.params[0].ty,
            NativeType::Named {
                package: "context".into(),
                name: "Context".into(),
                type_args: vec![],
            }
        );
        assert_eq!(
            get.results[0].ty,
            NativeType::Pointer {
                elem: Box::new(NativeType::Named {
                    package: "example.com/app/repository".into(),
                    name: "Item".into(),
                    type_args: vec![],
                })
            }
        );
        assert_eq!(
            get.results[1].ty,
            NativeType::Basic {
                name: "error".into()
            }
        );
    }

    #[test]
    fn test_parse_anonymous_and_variadic_params() {
        let pkg = parse(REPO_GO);
        let list = &methods(&pkg, "Repo")[1].signature;

        assert!(list.variadic);
        assert_eq!(list.params.len(), 3);
        assert!(list.params.iter().all(|p| p.name.is_empty()));
        assert_eq!(
            list.params[2].ty,
            NativeType::Slice {
                elem: Box::new(NativeType::Basic {
                    name: "string".into()
                })
            }
        );
    }

    #[test]
    fn test_parse_single_unnamed_result() {
        let pkg = parse(REPO_GO);
        let watch = &methods(&pkg, "Repo")[2].signature;
        assert_eq!(watch.results.len(), 1);
        let NativeType::Map { value, .. } = &watch.results[0].ty else {
            panic!("expected a map, got {:?}", watch.results[0].ty);
        };
        assert!(matches!(**value, NativeType::Array { len: 4, .. }));
    }

    #[test]
    fn test_resolve_import_qualifiers() {
        let pkg = parse(REPO_GO);
        let methods = methods(&pkg, "Repo");

        let NativeType::Pointer { elem } = &methods[3].signature.results[0].ty else {
            panic!("expected pointer");
        };
        assert!(matches!(
            &**elem,
            NativeType::Named { package, name, .. }
                if package == "github.com/getsentry/sentry-go" && name == "Hub"
        ));

        let NativeType::Pointer { elem } = &methods[4].signature.results[0].ty else {
            panic!("expected pointer");
        };
        assert!(matches!(
            &**elem,
            NativeType::Named { package, .. } if package == "github.com/go-redis/redis/v8"
        ));
    }

    #[test]
    fn test_unsupported_syntax_is_kept() {
        let pkg = parse(REPO_GO);
        let events = &methods(&pkg, "Stream")[0].signature;
        assert!(matches!(
            events.results[0].ty,
            NativeType::Chan {
                dir: ChanDir::Recv,
                ..
            }
        ));

        let Some(Object::Type {
            underlying: NativeType::Interface(number),
            ..
        }) = pkg.lookup("Number")
        else {
            panic!("Number should be an interface");
        };
        assert!(matches!(
            &number.methods[0],
            InterfaceMember::Embedded {
                embed: NativeType::Other { .. }
            }
        ));
    }

    #[test]
    fn test_generic_declarations() {
        let pkg = parse(
            "package store\n\ntype Store[T any] interface {\n\tPut(v T) error\n}\n\ntype Page[T any] struct{}\n\ntype Pages interface {\n\tFirst() Page[int]\n}\n",
        );
        let Some(Object::Type { type_params, .. }) = pkg.lookup("Store") else {
            panic!("Store should be a type");
        };
        assert_eq!(type_params, &vec!["T".to_string()]);
        assert!(matches!(
            methods(&pkg, "Store")[0].signature.params[0].ty,
            NativeType::TypeParam { .. }
        ));

        let first = &methods(&pkg, "Pages")[0].signature.results[0].ty;
        assert!(
            matches!(first, NativeType::Named { type_args, .. } if type_args.len() == 1),
            "got {first:?}"
        );
    }

    #[test]
    fn test_syntax_error_is_load_error() {
        let err = parse_file(Path::new("bad.go"), "package x\n\ntype X interface {", "x")
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }), "got {err:?}");
    }

    #[test]
    fn test_package_name_guess() {
        assert_eq!(package_name_guess("context"), "context");
        assert_eq!(package_name_guess("github.com/getsentry/sentry-go"), "sentry");
        assert_eq!(package_name_guess("github.com/go-redis/redis/v8"), "redis");
        assert_eq!(package_name_guess("github.com/go-chi/chi"), "chi");
        assert_eq!(package_name_guess("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(package_name_guess("gopkg.in/yaml.v3"), "yaml");
    }

    #[test]
    fn test_module_path() {
        assert_eq!(
            module_path("module example.com/app\n\ngo 1.22\n"),
            Some("example.com/app".into())
        );
        assert_eq!(
            module_path("// comment\nmodule \"example.com/quoted\" // trailing\n"),
            Some("example.com/quoted".into())
        );
        assert_eq!(module_path("go 1.22\n"), None);
        assert_eq!(module_path("modules x\n"), None);
    }

    #[test]
    fn test_load_dir_uses_module_path() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();

        let dir = root.path().join("internal").join("repository");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("repo.go"), REPO_GO).unwrap();
        fs::write(
            dir.join("repo_test.go"),
            "package repository_test\n\ntype Ignored interface{}\n",
        )
        .unwrap();
        fs::write(dir.join("extra.go"), "package repository\n\ntype Extra int\n").unwrap();

        let pkg = load_dir(&dir).unwrap();
        assert_eq!(pkg.name, "repository");
        assert_eq!(pkg.path, "example.com/app/internal/repository");
        assert!(pkg.lookup("Extra").is_some());
        assert!(pkg.lookup("Repo").is_some());
        assert!(pkg.lookup("Ignored").is_none());

        // extra.go sorts before repo.go
        assert_eq!(pkg.objects[0].name(), "Extra");
    }

    #[test]
    fn test_load_dir_without_go_files() {
        let root = tempfile::tempdir().unwrap();
        let err = load_dir(root.path()).unwrap_err();
        assert!(matches!(err, Error::Load { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_dir_without_go_mod() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("x.go"), "package x\n").unwrap();
        let err = load_dir(root.path()).unwrap_err();
        assert!(
            err.to_string().contains("no go.mod"),
            "unexpected error: {err}"
        );
    }
}
