//! Java emitters (`-Ljava`).
//!
//! Interface files become `IFoo.java` under the sanitized package tree;
//! the types file becomes one `.java` per non-typedef top-level type. The
//! `types.TopLevel` fqname form constrains output to one named type.

use anyhow::{bail, Result};

use crate::coordinator::Location;
use crate::core::ast::{Ast, Interface, NamedType, TypeDetail};
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

/// Map an IDL type use to its Java spelling.
pub fn java_type(type_name: &str) -> String {
    if let Some(inner) = type_name
        .strip_prefix("vec<")
        .and_then(|s| s.strip_suffix('>'))
    {
        return format!("java.util.ArrayList<{}>", java_boxed_type(inner));
    }

    match type_name {
        "bool" => "boolean".to_string(),
        "int8_t" | "uint8_t" => "byte".to_string(),
        "int16_t" | "uint16_t" => "short".to_string(),
        "int32_t" | "uint32_t" => "int".to_string(),
        "int64_t" | "uint64_t" => "long".to_string(),
        "float" => "float".to_string(),
        "double" => "double".to_string(),
        "string" => "String".to_string(),
        other => other.to_string(),
    }
}

fn java_boxed_type(type_name: &str) -> String {
    match java_type(type_name).as_str() {
        "boolean" => "Boolean".to_string(),
        "byte" => "Byte".to_string(),
        "short" => "Short".to_string(),
        "int" => "Integer".to_string(),
        "long" => "Long".to_string(),
        "float" => "Float".to_string(),
        "double" => "Double".to_string(),
        other => other.to_string(),
    }
}

fn file_header(out: &mut Formatter, ast: &Ast) {
    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    out.line(&format!("package {};", ast.package().java_package()));
    out.endl();
}

fn emit_type_class(out: &mut Formatter, named_type: &NamedType) {
    match named_type.detail() {
        TypeDetail::Enum { values, .. } => {
            out.push(&format!("public final class {} ", named_type.local_name()));
            out.block(|out| {
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
            });
            out.endl();
        }
        TypeDetail::Struct { fields } => {
            out.push(&format!("public final class {} ", named_type.local_name()));
            out.block(|out| {
                for field in fields {
                    out.line(&format!(
                        "public {} {};",
                        java_type(&field.type_name),
                        field.name
                    ));
                }
            });
            out.endl();
        }
        TypeDetail::Union { .. } | TypeDetail::TypeDef { .. } => {}
    }
}

fn generate_interface(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
) -> Result<()> {
    let fq_name = iface.fq_name();

    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenSanitized,
        &format!("{}.java", fq_name.name()),
    )?;

    file_header(&mut out, ast);

    let extends = match iface.super_iface() {
        Some(parent) => format!(
            " extends {}.{}",
            parent.java_package(),
            parent.name()
        ),
        None => String::new(),
    };

    out.push(&format!("public interface {}{extends} ", fq_name.name()));
    out.block(|out| {
        out.line(&format!(
            "public static final String kInterfaceName = \"{fq_name}\";"
        ));
        out.endl();
        for method in iface.methods() {
            let args: Vec<String> = method
                .args
                .iter()
                .map(|arg| format!("{} {}", java_type(&arg.type_name), arg.name))
                .collect();

            let return_type = match method.results.as_slice() {
                [] => "void".to_string(),
                [only] => java_type(&only.type_name),
                _ => {
                    // Multiple results surface through a callback class.
                    let params: Vec<String> = method
                        .results
                        .iter()
                        .map(|result| {
                            format!("{} {}", java_type(&result.type_name), result.name)
                        })
                        .collect();
                    out.line(&format!(
                        "public interface {}Callback {{ void onValues({}); }}",
                        method.name,
                        params.join(", ")
                    ));
                    "void".to_string()
                }
            };

            let mut args = args;
            if method.results.len() > 1 {
                args.push(format!("{}Callback _hidl_cb", method.name));
            }

            out.line(&format!(
                "{} {}({}) throws android.os.RemoteException;",
                return_type,
                method.name,
                args.join(", ")
            ));
        }
    });
    out.endl();
    out.finish()
}

/// Emit Java for this file; `limit_to_type` constrains a types file to one
/// named top-level type.
pub fn generate(
    ctx: &GenContext<'_>,
    ast: &Ast,
    output_path: &str,
    limit_to_type: Option<&str>,
) -> Result<()> {
    if let Some(iface) = ast.interface() {
        return generate_interface(ctx, ast, iface, output_path);
    }

    let mut emitted_any = false;
    for named_type in ast.root_scope().sub_types() {
        if let Some(limit) = limit_to_type {
            if named_type.local_name() != limit {
                continue;
            }
        }
        if named_type.is_type_def() {
            continue;
        }

        let mut out = ctx.coordinator.formatter(
            output_path,
            named_type.fq_name(),
            Location::GenSanitized,
            &format!("{}.java", named_type.local_name()),
        )?;
        file_header(&mut out, ast);
        emit_type_class(&mut out, named_type);
        out.finish()?;
        emitted_any = true;
    }

    if let Some(limit) = limit_to_type {
        if !emitted_any {
            bail!(
                "{} does not declare a type named `{limit}`",
                ast.package().types_for_package()
            );
        }
    }

    Ok(())
}
