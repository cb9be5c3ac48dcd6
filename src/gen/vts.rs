//! VTS profile emitters (`-Lvts`).
//!
//! Emits one `.vts` text-proto description per file: interface declarations
//! with their API surface, or the attribute list of a types file.

use anyhow::Result;

use crate::coordinator::Location;
use crate::core::ast::{Ast, TypeDetail};
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

fn scalar_or_reference(out: &mut Formatter, label: &str, type_name: &str) {
    out.push(&format!("{label}: "));
    out.block(|out| {
        if type_name.starts_with("vec<") {
            out.line("type: TYPE_VECTOR");
        } else if matches!(type_name, "string") {
            out.line("type: TYPE_STRING");
        } else {
            out.line("type: TYPE_SCALAR");
            out.line(&format!("scalar_type: \"{type_name}\""));
        }
    });
    out.endl();
}

/// Emit the `.vts` profile for this file.
pub fn generate(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let package = ast.package();

    let (target, file_stem) = match ast.interface() {
        Some(iface) => (
            iface.fq_name().clone(),
            iface.fq_name().interface_base_name().to_string(),
        ),
        None => (package.types_for_package(), "types".to_string()),
    };

    let mut out = ctx.coordinator.formatter(
        output_path,
        &target,
        Location::GenOutput,
        &format!("{file_stem}.vts"),
    )?;

    out.line("component_class: HAL_HIDL");
    out.line(&format!(
        "component_type_version: {}",
        package.version_string()
    ));
    out.line(&format!(
        "component_name: \"{}\"",
        if file_stem == "types" {
            "types".to_string()
        } else {
            target.name().to_string()
        }
    ));
    out.endl();
    out.line(&format!("package: \"{}\"", package.package()));
    out.endl();

    for import in ast.imports() {
        out.line(&format!("import: \"{import}\""));
    }
    if !ast.imports().is_empty() {
        out.endl();
    }

    match ast.interface() {
        Some(iface) => {
            out.push("interface: ");
            out.block(|out| {
                for method in iface.methods() {
                    out.push("api: ");
                    out.block(|out| {
                        out.line(&format!("name: \"{}\"", method.name));
                        if method.oneway {
                            out.line("is_oneway: true");
                        }
                        for arg in &method.args {
                            scalar_or_reference(out, "arg", &arg.type_name);
                        }
                        for result in &method.results {
                            scalar_or_reference(out, "return_type_hidl", &result.type_name);
                        }
                    });
                    out.endl();
                }
            });
            out.endl();
        }
        None => {
            for named_type in ast.root_scope().sub_types() {
                out.push("attribute: ");
                out.block(|out| {
                    out.line(&format!("name: \"{}\"", named_type.fq_name()));
                    match named_type.detail() {
                        TypeDetail::Enum { storage, .. } => {
                            out.line("type: TYPE_ENUM");
                            out.line(&format!("enum_storage_type: \"{storage}\""));
                        }
                        TypeDetail::Struct { .. } => {
                            out.line("type: TYPE_STRUCT");
                        }
                        TypeDetail::Union { .. } => {
                            out.line("type: TYPE_UNION");
                        }
                        TypeDetail::TypeDef { aliased } => {
                            out.line("type: TYPE_TYPEDEF");
                            out.line(&format!("aliased_type: \"{aliased}\""));
                        }
                    }
                });
                out.endl();
            }
        }
    }

    out.finish()
}
