//! Parsed representation of a single `.hal` file.
//!
//! An `Ast` is created by the parser, owned by the coordinator's cache, and
//! handed out as `Rc<Ast>`; callers only query it. Named types are owned by
//! the AST that declares them and referenced elsewhere by FQName, so the
//! type graph carries no ownership cycles.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::fqname::FQName;

/// A `type member;` declaration inside a struct, union, or method list.
#[derive(Debug, Clone)]
pub struct Field {
    pub type_name: String,
    pub name: String,
}

/// One enumerator of an enum declaration.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    /// Explicit initializer text, if one was written.
    pub value: Option<String>,
}

/// Payload of a named type declaration.
#[derive(Debug, Clone)]
pub enum TypeDetail {
    Enum {
        storage: String,
        values: Vec<EnumValue>,
    },
    Struct {
        fields: Vec<Field>,
    },
    Union {
        fields: Vec<Field>,
    },
    TypeDef {
        aliased: String,
    },
}

/// A named type declared at package scope or inside an interface.
#[derive(Debug, Clone)]
pub struct NamedType {
    fq_name: FQName,
    local_name: String,
    detail: TypeDetail,
    exported: bool,
}

impl NamedType {
    pub fn new(fq_name: FQName, local_name: String, detail: TypeDetail, exported: bool) -> Self {
        NamedType {
            fq_name,
            local_name,
            detail,
            exported,
        }
    }

    pub fn fq_name(&self) -> &FQName {
        &self.fq_name
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn detail(&self) -> &TypeDetail {
        &self.detail
    }

    pub fn is_type_def(&self) -> bool {
        matches!(self.detail, TypeDetail::TypeDef { .. })
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }
}

/// A method declared by an interface.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub args: Vec<Field>,
    pub results: Vec<Field>,
    pub oneway: bool,
}

/// An interface declaration: name, superinterface, methods, local types.
#[derive(Debug, Clone)]
pub struct Interface {
    fq_name: FQName,
    super_iface: Option<FQName>,
    methods: Vec<Method>,
    types: Vec<NamedType>,
}

impl Interface {
    pub fn new(
        fq_name: FQName,
        super_iface: Option<FQName>,
        methods: Vec<Method>,
        types: Vec<NamedType>,
    ) -> Self {
        Interface {
            fq_name,
            super_iface,
            methods,
            types,
        }
    }

    pub fn fq_name(&self) -> &FQName {
        &self.fq_name
    }

    pub fn local_name(&self) -> &str {
        self.fq_name.name()
    }

    /// The interface this one extends. `None` only for IBase itself.
    pub fn super_iface(&self) -> Option<&FQName> {
        self.super_iface.as_ref()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn types(&self) -> &[NamedType] {
        &self.types
    }
}

/// The package-level scope of a `types.hal` file (or the empty scope of an
/// interface file).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    sub_types: Vec<NamedType>,
}

impl Scope {
    pub fn new(sub_types: Vec<NamedType>) -> Self {
        Scope { sub_types }
    }

    pub fn sub_types(&self) -> &[NamedType] {
        &self.sub_types
    }
}

/// A parsed `.hal` file.
#[derive(Debug)]
pub struct Ast {
    package: FQName,
    filename: PathBuf,
    imports: Vec<FQName>,
    root_scope: Scope,
    interface: Option<Interface>,
    java_compatible: bool,
}

impl Ast {
    pub fn new(
        package: FQName,
        filename: PathBuf,
        imports: Vec<FQName>,
        root_scope: Scope,
        interface: Option<Interface>,
        java_compatible: bool,
    ) -> Self {
        Ast {
            package,
            filename,
            imports,
            root_scope,
            interface,
            java_compatible,
        }
    }

    /// The declared `pkg@ver` of this file.
    pub fn package(&self) -> &FQName {
        &self.package
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn is_interface(&self) -> bool {
        self.interface.is_some()
    }

    pub fn interface(&self) -> Option<&Interface> {
        self.interface.as_ref()
    }

    pub fn root_scope(&self) -> &Scope {
        &self.root_scope
    }

    /// Imports exactly as written (package-only or fully qualified).
    pub fn imports(&self) -> &[FQName] {
        &self.imports
    }

    /// The set of packages this file references directly: every textual
    /// import plus the superinterface's package when it lives elsewhere.
    pub fn imported_packages(&self, out: &mut BTreeSet<FQName>) {
        for import in &self.imports {
            let package = import.package_and_version();
            if &package != self.package() {
                out.insert(package);
            }
        }
        if let Some(iface) = &self.interface {
            if let Some(parent) = iface.super_iface() {
                let package = parent.package_and_version();
                if &package != self.package() {
                    out.insert(package);
                }
            }
        }
    }

    /// Types annotated for export, in declaration order.
    pub fn exported_types(&self) -> Vec<&NamedType> {
        let mut out: Vec<&NamedType> = self
            .root_scope
            .sub_types()
            .iter()
            .filter(|t| t.is_exported())
            .collect();
        if let Some(iface) = &self.interface {
            out.extend(iface.types().iter().filter(|t| t.is_exported()));
        }
        out
    }

    pub fn is_java_compatible(&self) -> bool {
        self.java_compatible
    }
}
