//! Package descriptions for serde deserialization.
//!
//! A [`Package`] is the type-checker view of one Go package that the
//! introspector searches for the target interface. It can be read from a JSON
//! description or loaded from Go sources with [`golang::load_dir`].

pub mod golang;

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Root package description.
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    /// Package name, as used in the package clause.
    pub name: String,
    /// Import path of the package.
    pub path: String,
    /// Package-level declarations in source order.
    #[serde(default)]
    pub objects: Vec<Object>,
}

/// A package-level declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Object {
    /// `type Name[P any] T`
    Type {
        name: String,
        #[serde(default)]
        type_params: Vec<String>,
        #[serde(rename = "type")]
        underlying: NativeType,
    },
    /// `type Name = T`
    Alias {
        name: String,
        #[serde(rename = "type")]
        target: NativeType,
    },
    Var {
        name: String,
    },
    Const {
        name: String,
    },
    Func {
        name: String,
    },
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Object::Type { name, .. }
            | Object::Alias { name, .. }
            | Object::Var { name }
            | Object::Const { name }
            | Object::Func { name } => name,
        }
    }

    /// Human readable kind, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Object::Type { .. } => "a type",
            Object::Alias { .. } => "a type alias",
            Object::Var { .. } => "a variable",
            Object::Const { .. } => "a constant",
            Object::Func { .. } => "a function",
        }
    }
}

/// Type as seen by the source type checker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeType {
    /// Predeclared types: `int`, `string`, `error`, `any`, ...
    Basic { name: String },
    /// Reference to a declared type. `package` is the import path, empty for
    /// predeclared named types.
    Named {
        #[serde(default)]
        package: String,
        name: String,
        #[serde(default)]
        type_args: Vec<NativeType>,
    },
    Pointer { elem: Box<NativeType> },
    Slice { elem: Box<NativeType> },
    Array { len: u64, elem: Box<NativeType> },
    Map {
        key: Box<NativeType>,
        value: Box<NativeType>,
    },
    Signature(Signature),
    Interface(InterfaceType),
    Struct {
        #[serde(default)]
        fields: Vec<Var>,
    },
    Chan {
        #[serde(default)]
        dir: ChanDir,
        elem: Box<NativeType>,
    },
    TypeParam { name: String },
    /// Syntax the loader recognised but cannot describe, such as a union
    /// constraint. Kept so unrelated declarations do not fail the load.
    Other { description: String },
}

impl NativeType {
    /// Human readable kind, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            NativeType::Basic { .. } => "a basic type",
            NativeType::Named { .. } => "a named type",
            NativeType::Pointer { .. } => "a pointer",
            NativeType::Slice { .. } => "a slice",
            NativeType::Array { .. } => "an array",
            NativeType::Map { .. } => "a map",
            NativeType::Signature(_) => "a function",
            NativeType::Interface(_) => "an interface",
            NativeType::Struct { .. } => "a struct",
            NativeType::Chan { .. } => "a channel",
            NativeType::TypeParam { .. } => "a type parameter",
            NativeType::Other { .. } => "an unsupported type",
        }
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

/// Function signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<Var>,
    #[serde(default)]
    pub results: Vec<Var>,
    /// Whether the last parameter is `...T`. Its type is then stored as `[]T`.
    #[serde(default)]
    pub variadic: bool,
}

/// A parameter, result or struct field. The name may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Var {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: NativeType,
}

/// Interface body, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InterfaceType {
    #[serde(default)]
    pub methods: Vec<InterfaceMember>,
}

/// An element of an interface body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InterfaceMember {
    /// `Name(params) results`
    Method(MethodSpec),
    /// An embedded interface or a type constraint.
    Embedded { embed: NativeType },
}

/// Method declared in an interface body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(flatten)]
    pub signature: Signature,
}

impl Package {
    /// Parse a JSON package description.
    pub fn from_json(location: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::Load {
            location: location.to_string(),
            reason: format!("invalid package description: {err}"),
        })
    }

    /// Find a package-level object by name.
    pub fn lookup(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name() == name)
    }
}

/// Load the package at `location`.
///
/// A path ending in `.json` is read as a package description, anything else
/// is treated as a directory of Go sources.
pub fn load(location: &Path) -> Result<Package> {
    let is_description = location
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "json");

    if is_description {
        debug!(location = %location.display(), "Reading package description.");
        let json = fs::read_to_string(location).map_err(Error::io("read", location))?;
        return Package::from_json(&location.display().to_string(), &json);
    }

    golang::load_dir(location)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const REPO_JSON: &str = r#"{
  "name": "repository",
  "path": "example.com/app/repository",
  "objects": [
    { "kind": "const", "name": "Version" },
    {
      "kind": "type",
      "name": "Repo",
      "type": {
        "kind": "interface",
        "methods": [
          {
            "name": "Get",
            "params": [
              { "name": "ctx", "type": { "kind": "named", "package": "context", "name": "Context" } },
              { "name": "id", "type": { "kind": "basic", "name": "string" } }
            ],
            "results": [
              { "type": { "kind": "named", "package": "example.com/app/repository", "name": "Item" } },
              { "type": { "kind": "named", "name": "error" } }
            ]
          },
          { "embed": { "kind": "named", "name": "error" } }
        ]
      }
    }
  ]
}"#;

    #[test]
    fn test_parse_package_description() {
        let pkg = Package::from_json("repo.json", REPO_JSON).unwrap();
        assert_eq!(pkg.name, "repository");
        assert_eq!(pkg.objects.len(), 2);
        assert!(matches!(pkg.lookup("Version"), Some(Object::Const { .. })));

        let Some(Object::Type { underlying, .. }) = pkg.lookup("Repo") else {
            panic!("Repo should be a type");
        };
        let NativeType::Interface(iface) = underlying else {
            panic!("Repo should be an interface, got {underlying:?}");
        };
        assert_eq!(iface.methods.len(), 2);

        let InterfaceMember::Method(get) = &iface.methods[0] else {
            panic!("first member should be a method");
        };
        assert_eq!(get.name, "Get");
        assert_eq!(get.signature.params.len(), 2);
        assert_eq!(get.signature.results[0].name, "");
        assert!(!get.signature.variadic);

        assert!(matches!(
            &iface.methods[1],
            InterfaceMember::Embedded { embed: NativeType::Named { name, .. } } if name == "error"
        ));
    }

    #[test]
    fn test_invalid_description_is_load_error() {
        let err = Package::from_json("bad.json", "{ \"name\": 1 }").unwrap_err();
        assert!(matches!(err, Error::Load { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_reads_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo.json");
        fs::write(&path, REPO_JSON).unwrap();

        let pkg = load(&path).unwrap();
        assert_eq!(pkg.path, "example.com/app/repository");
    }
}
