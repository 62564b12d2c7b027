//! Interface introspection.
//!
//! Locates the target interface in a [`Package`] and converts its method set
//! into [`Method`] descriptors, in declaration order.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::imports::ImportTable;
use crate::package::{
    InterfaceMember, InterfaceType, MethodSpec, NativeType, Object, Package, Signature, Var,
};
use crate::types::{Type, convert};

/// Aliases and embeddings are followed at most this deep.
const MAX_DEPTH: usize = 32;

/// A named parameter or result of a [`Method`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

/// A method of the wrapped interface with every parameter and result named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub params: Vec<Parameter>,
    pub results: Vec<Parameter>,
    /// Whether the last parameter is variadic. Its type is then a slice.
    pub variadic: bool,
}

impl Method {
    /// The final result, if it is an `error`.
    pub fn error_result(&self) -> Option<&Parameter> {
        self.results.last().filter(|r| r.ty.is_error())
    }

    /// The first `context.Context` parameter.
    pub fn context_param(&self) -> Option<&Parameter> {
        self.params.iter().find(|p| p.ty.is_context())
    }
}

/// The interface being wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Reference to the interface type itself, e.g. `repository.Repo`.
    pub ty: Type,
    pub methods: Vec<Method>,
}

/// Find interface `name` in `package` and convert its methods.
///
/// The package of the interface and every package referenced in its method
/// signatures are registered with `imports`.
pub fn introspect(package: &Package, name: &str, imports: &mut ImportTable) -> Result<Interface> {
    let iface = resolve_interface(package, name)?;

    let alias = imports.add(&package.path);
    let ty = Type::named(alias, package.path.as_str(), name);

    let specs = method_set(package, iface)?;
    let mut methods = specs
        .iter()
        .map(|spec| convert_method(spec, imports))
        .collect::<Result<Vec<_>>>()?;
    for method in &mut methods {
        avoid_aliases(method, imports);
    }

    debug!(
        interface = name,
        package = %package.path,
        methods = methods.len(),
        "Introspected interface."
    );

    Ok(Interface { ty, methods })
}

fn resolve_interface<'a>(package: &'a Package, name: &str) -> Result<&'a InterfaceType> {
    let not_found = || Error::NotFound {
        name: name.to_string(),
        package: package.path.clone(),
    };

    let mut object = package.lookup(name).ok_or_else(not_found)?;

    for _ in 0..MAX_DEPTH {
        match object {
            Object::Type {
                type_params,
                underlying,
                ..
            } => {
                if !type_params.is_empty() {
                    return Err(Error::UnsupportedType(format!(
                        "generic interface {name}"
                    )));
                }
                return underlying_interface(package, name, underlying);
            }
            Object::Alias { target, .. } => match local_name(package, target) {
                Some(next) => object = package.lookup(next).ok_or_else(not_found)?,
                None => {
                    return Err(Error::NotNamed {
                        name: name.to_string(),
                        found: format!("an alias of {}", target.describe()),
                    });
                }
            },
            other => {
                return Err(Error::NotNamed {
                    name: name.to_string(),
                    found: other.describe().to_string(),
                });
            }
        }
    }

    Err(Error::NotNamed {
        name: name.to_string(),
        found: "an alias cycle".to_string(),
    })
}

/// Follow local type definitions such as `type Repo Store` to an interface.
fn underlying_interface<'a>(
    package: &'a Package,
    name: &str,
    mut ty: &'a NativeType,
) -> Result<&'a InterfaceType> {
    for _ in 0..MAX_DEPTH {
        if let NativeType::Interface(iface) = ty {
            return Ok(iface);
        }
        let next = local_name(package, ty)
            .and_then(|n| package.lookup(n))
            .and_then(|o| match o {
                Object::Type {
                    type_params,
                    underlying,
                    ..
                } if type_params.is_empty() => Some(underlying),
                Object::Alias { target, .. } => Some(target),
                _ => None,
            });
        match next {
            Some(next) => ty = next,
            None => break,
        }
    }

    Err(Error::NotInterface {
        name: name.to_string(),
        found: ty.describe().to_string(),
    })
}

/// The name of `ty` if it refers to a non-generic type of `package`.
fn local_name<'a>(package: &Package, ty: &'a NativeType) -> Option<&'a str> {
    match ty {
        NativeType::Named {
            package: path,
            name,
            type_args,
        } if *path == package.path && type_args.is_empty() => Some(name.as_str()),
        _ => None,
    }
}

/// Flatten an interface body into its methods, expanding embedded interfaces
/// in place. A method reached twice is kept at its first position.
fn method_set(package: &Package, iface: &InterfaceType) -> Result<Vec<MethodSpec>> {
    let mut methods = Vec::new();
    let mut seen = HashSet::new();
    collect_methods(package, iface, 0, &mut seen, &mut methods)?;
    Ok(methods)
}

fn collect_methods(
    package: &Package,
    iface: &InterfaceType,
    depth: usize,
    seen: &mut HashSet<String>,
    out: &mut Vec<MethodSpec>,
) -> Result<()> {
    for member in &iface.methods {
        match member {
            InterfaceMember::Method(spec) => {
                if seen.insert(spec.name.clone()) {
                    out.push(spec.clone());
                }
            }
            InterfaceMember::Embedded { embed } => {
                collect_embedded(package, embed, depth, seen, out)?;
            }
        }
    }

    Ok(())
}

fn collect_embedded(
    package: &Package,
    embed: &NativeType,
    depth: usize,
    seen: &mut HashSet<String>,
    out: &mut Vec<MethodSpec>,
) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::UnsupportedType(
            "interface embeddings nest too deep".to_string(),
        ));
    }

    match embed {
        NativeType::Interface(inner) => collect_methods(package, inner, depth + 1, seen, out),
        NativeType::Basic { name } | NativeType::Named { name, .. }
            if name == "error" && is_predeclared(embed) =>
        {
            if seen.insert("Error".to_string()) {
                out.push(error_method());
            }
            Ok(())
        }
        NativeType::Basic { name } if name == "any" => Ok(()),
        _ => {
            let Some(local) = local_name(package, embed) else {
                return Err(Error::UnsupportedType(format!(
                    "embedding {} in the wrapped interface",
                    describe_embed(embed)
                )));
            };
            let inner = match package.lookup(local) {
                Some(Object::Type {
                    type_params,
                    underlying,
                    ..
                }) if type_params.is_empty() => underlying,
                Some(Object::Alias { target, .. }) => target,
                _ => {
                    return Err(Error::NotFound {
                        name: local.to_string(),
                        package: package.path.clone(),
                    });
                }
            };
            collect_embedded(package, inner, depth + 1, seen, out)
        }
    }
}

fn is_predeclared(ty: &NativeType) -> bool {
    match ty {
        NativeType::Basic { .. } => true,
        NativeType::Named { package, .. } => package.is_empty(),
        _ => false,
    }
}

fn describe_embed(ty: &NativeType) -> String {
    match ty {
        NativeType::Named { package, name, .. } => format!("{package}.{name}"),
        NativeType::Other { description } => description.clone(),
        other => other.describe().to_string(),
    }
}

fn error_method() -> MethodSpec {
    MethodSpec {
        name: "Error".to_string(),
        signature: Signature {
            params: Vec::new(),
            results: vec![Var {
                name: String::new(),
                ty: NativeType::Basic {
                    name: "string".to_string(),
                },
            }],
            variadic: false,
        },
    }
}

fn convert_method(spec: &MethodSpec, imports: &mut ImportTable) -> Result<Method> {
    let signature = &spec.signature;

    // synthetic names must not shadow declared ones
    let mut taken: HashSet<String> = signature
        .params
        .iter()
        .chain(&signature.results)
        .filter(|v| is_declared(&v.name))
        .map(|v| v.name.clone())
        .collect();

    let mut params = Vec::with_capacity(signature.params.len());
    for (i, param) in signature.params.iter().enumerate() {
        let ty = convert(&param.ty, imports)?;
        let name = name_or_synthetic(&param.name, || format!("p{i}"), &mut taken);
        params.push(Parameter { name, ty });
    }

    let mut results = Vec::with_capacity(signature.results.len());
    let last = signature.results.len().saturating_sub(1);
    for (i, result) in signature.results.iter().enumerate() {
        let ty = convert(&result.ty, imports)?;
        let synthetic = || {
            if i == last && ty.is_error() {
                "err".to_string()
            } else {
                format!("r{i}")
            }
        };
        let name = name_or_synthetic(&result.name, synthetic, &mut taken);
        results.push(Parameter { name, ty });
    }

    Ok(Method {
        name: spec.name.clone(),
        params,
        results,
        variadic: signature.variadic,
    })
}

/// Rename parameters and results that would shadow an import alias inside
/// the wrapper body. Go ignores parameter names when matching interfaces.
fn avoid_aliases(method: &mut Method, imports: &ImportTable) {
    let mut taken: HashSet<String> = method
        .params
        .iter()
        .chain(&method.results)
        .map(|v| v.name.clone())
        .collect();

    for var in method.params.iter_mut().chain(method.results.iter_mut()) {
        if imports.path_of(&var.name).is_none() {
            continue;
        }
        let mut name = var.name.clone();
        while imports.path_of(&name).is_some() || taken.contains(&name) {
            name.push('_');
        }
        debug!(method = %method.name, from = %var.name, to = %name, "Renamed shadowing parameter.");
        taken.insert(name.clone());
        var.name = name;
    }
}

fn is_declared(name: &str) -> bool {
    !name.is_empty() && name != "_"
}

fn name_or_synthetic(
    declared: &str,
    synthetic: impl FnOnce() -> String,
    taken: &mut HashSet<String>,
) -> String {
    if is_declared(declared) {
        return declared.to_string();
    }

    let mut name = synthetic();
    while taken.contains(&name) {
        name.push('_');
    }
    taken.insert(name.clone());
    name
}
