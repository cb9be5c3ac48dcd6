//! Exported-constant emitters (`-Lexport-header` and `-Ljava-constants`).
//!
//! Types annotated `@export` across a whole package are collected into one
//! C header (for legacy C consumers) or one `Constants.java`. When nothing
//! is exported the handler succeeds without writing a file.

use std::rc::Rc;

use anyhow::{Context, Result};

use crate::coordinator::{Enforce, Location};
use crate::core::ast::{Ast, NamedType, TypeDetail};
use crate::core::fqname::FQName;
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

fn emit_exported_cpp(out: &mut Formatter, named_type: &NamedType) {
    if let TypeDetail::Enum { values, .. } = named_type.detail() {
        out.line(&format!("// {}", named_type.fq_name()));
        out.push("enum ");
        out.block(|out| {
            for value in values {
                match &value.value {
                    Some(expr) => out.line(&format!("{} = {},", value.name, expr)),
                    None => out.line(&format!("{},", value.name)),
                };
            }
        });
        out.line(";");
        out.endl();
    }
}

fn emit_exported_java(out: &mut Formatter, named_type: &NamedType) {
    if let TypeDetail::Enum { values, .. } = named_type.detail() {
        out.line(&format!("// {}", named_type.fq_name()));
        let mut previous: Option<String> = None;
        for value in values {
            let initializer = match (&value.value, &previous) {
                (Some(expr), _) => expr.clone(),
                (None, None) => "0".to_string(),
                (None, Some(previous)) => format!("{previous} + 1"),
            };
            out.line(&format!(
                "public static final int {} = {};",
                value.name, initializer
            ));
            previous = Some(value.name.clone());
        }
        out.endl();
    }
}

/// Emit the package's exported constants, if any.
pub fn generate(
    ctx: &GenContext<'_>,
    package: &FQName,
    output_path: &str,
    for_java: bool,
) -> Result<()> {
    let coordinator = ctx.coordinator;

    let mut asts: Vec<Rc<Ast>> = Vec::new();
    for fq_name in coordinator.package_interfaces(package)? {
        let ast = coordinator
            .parse(&fq_name, Enforce::Full)
            .with_context(|| format!("could not parse {fq_name}"))?;
        asts.push(ast);
    }

    if asts.iter().all(|ast| ast.exported_types().is_empty()) {
        return Ok(());
    }

    // The C++ filename is the output path itself.
    let (location, file_name) = if for_java {
        (Location::GenSanitized, "Constants.java")
    } else {
        (Location::Direct, "")
    };
    let mut out = coordinator.formatter(output_path, package, location, file_name)?;

    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.line(&format!("// Source: {package}"));
    out.line(&format!(
        "// Root: {}",
        coordinator.package_root_option(package)?
    ));
    out.endl();

    let guard = format!(
        "HIDL_GENERATED_{}_EXPORTED_CONSTANTS_H_",
        package.token_name().to_uppercase()
    );

    if for_java {
        out.line(&format!("package {};", package.java_package()));
        out.endl();
        out.push("public class Constants ");
        out.block(|out| {
            for ast in &asts {
                for named_type in ast.exported_types() {
                    emit_exported_java(out, named_type);
                }
            }
        });
        out.endl();
    } else {
        out.line(&format!("#ifndef {guard}"));
        out.line(&format!("#define {guard}"));
        out.endl();
        out.line("#ifdef __cplusplus");
        out.line("extern \"C\" {");
        out.line("#endif");
        out.endl();

        for ast in &asts {
            for named_type in ast.exported_types() {
                emit_exported_cpp(&mut out, named_type);
            }
        }

        out.line("#ifdef __cplusplus");
        out.line("}");
        out.line("#endif");
        out.endl();
        out.line(&format!("#endif  // {guard}"));
    }

    out.finish()
}
