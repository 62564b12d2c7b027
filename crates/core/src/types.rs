//! The type model used in method signatures.
//!
//! [`Type`] is the closed set of shapes a wrapped method signature may use.
//! It is built from the loader's [`NativeType`] by [`convert`], which
//! registers every referenced package with the [`ImportTable`] and rejects
//! everything the model cannot represent. Rendering lives in
//! [`crate::emit`].

use crate::emit::Emit;
use crate::error::{Error, Result};
use crate::imports::ImportTable;
use crate::package::{NativeType, Signature};

/// Array length used for slices.
pub const SLICE_LEN: i64 = -1;

/// A type in a method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `[len]elem`, or `[]elem` if `len` is [`SLICE_LEN`].
    Array { len: i64, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Pointer(Box<Type>),
    Func(FuncType),
    Named(NamedType),
}

/// A function type. If `variadic` is set, the last parameter is a slice whose
/// element is the variadic type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

/// Reference to a named type. Never expands to its definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Import alias in the generated file; empty for predeclared types.
    pub package: String,
    /// Import path; empty for predeclared types.
    pub package_path: String,
    pub name: String,
}

impl Type {
    /// A predeclared type such as `int` or `error`.
    pub fn builtin(name: impl Into<String>) -> Self {
        Type::Named(NamedType {
            package: String::new(),
            package_path: String::new(),
            name: name.into(),
        })
    }

    pub fn named(
        package: impl Into<String>,
        package_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Type::Named(NamedType {
            package: package.into(),
            package_path: package_path.into(),
            name: name.into(),
        })
    }

    pub fn slice(elem: Type) -> Self {
        Type::Array {
            len: SLICE_LEN,
            elem: Box::new(elem),
        }
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Whether this renders as `error`.
    pub fn is_error(&self) -> bool {
        self.emit() == "error"
    }

    /// Whether this is `context.Context`, regardless of the import alias.
    pub fn is_context(&self) -> bool {
        matches!(self, Type::Named(n) if n.package_path == "context" && n.name == "Context")
    }
}

/// Convert a loader type to a [`Type`], registering referenced packages.
pub fn convert(native: &NativeType, imports: &mut ImportTable) -> Result<Type> {
    match native {
        NativeType::Basic { name } => Ok(Type::builtin(name.as_str())),
        NativeType::Named {
            package,
            name,
            type_args,
        } => {
            if !type_args.is_empty() {
                return Err(Error::UnsupportedType(format!(
                    "instantiated generic type {name}"
                )));
            }
            let alias = imports.add(package);
            Ok(Type::named(alias, package.as_str(), name.as_str()))
        }
        NativeType::Pointer { elem } => Ok(Type::pointer(convert(elem, imports)?)),
        NativeType::Slice { elem } => Ok(Type::slice(convert(elem, imports)?)),
        NativeType::Array { len, elem } => {
            let len = i64::try_from(*len).map_err(|_| {
                Error::UnsupportedType(format!("array length {len} is out of range"))
            })?;
            Ok(Type::Array {
                len,
                elem: Box::new(convert(elem, imports)?),
            })
        }
        NativeType::Map { key, value } => Ok(Type::map(
            convert(key, imports)?,
            convert(value, imports)?,
        )),
        NativeType::Signature(signature) => Ok(Type::Func(convert_signature(signature, imports)?)),
        NativeType::Other { description } => {
            Err(Error::UnsupportedType(format!("unsupported syntax {description}")))
        }
        NativeType::Interface(_)
        | NativeType::Struct { .. }
        | NativeType::Chan { .. }
        | NativeType::TypeParam { .. } => Err(Error::UnsupportedType(format!(
            "{} cannot be used in a wrapped method signature",
            native.describe()
        ))),
    }
}

fn convert_signature(signature: &Signature, imports: &mut ImportTable) -> Result<FuncType> {
    let params = signature
        .params
        .iter()
        .map(|p| convert(&p.ty, imports))
        .collect::<Result<Vec<_>>>()?;
    let results = signature
        .results
        .iter()
        .map(|r| convert(&r.ty, imports))
        .collect::<Result<Vec<_>>>()?;

    Ok(FuncType {
        params,
        results,
        variadic: signature.variadic,
    })
}
