//! C++ emitters: interface headers, transport headers, and sources.
//!
//! One interface file yields `IFoo.h`, `IHwFoo.h`, `BnHwFoo.h`, `BpHwFoo.h`,
//! `BsFoo.h` and `FooAll.cpp`; a types file yields `types.h`, `hwtypes.h`
//! and `types.cpp`. These names are load-bearing: the build-file planner
//! lists them as genrule outputs.

use anyhow::Result;

use crate::coordinator::Location;
use crate::core::ast::{Ast, Interface, Method, NamedType, TypeDetail};
use crate::core::fqname::FQName;
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

const SCALAR_TYPES: &[&str] = &[
    "bool", "int8_t", "uint8_t", "int16_t", "uint16_t", "int32_t", "uint32_t", "int64_t",
    "uint64_t", "float", "double",
];

fn is_scalar(type_name: &str) -> bool {
    SCALAR_TYPES.contains(&type_name)
}

/// Map an IDL type use to its C++ spelling.
pub fn cpp_type(type_name: &str) -> String {
    if let Some(inner) = type_name
        .strip_prefix("vec<")
        .and_then(|s| s.strip_suffix('>'))
    {
        return format!("::android::hardware::hidl_vec<{}>", cpp_type(inner));
    }

    match type_name {
        "string" => "::android::hardware::hidl_string".to_string(),
        "handle" => "::android::hardware::hidl_handle".to_string(),
        "memory" => "::android::hardware::hidl_memory".to_string(),
        scalar if is_scalar(scalar) => scalar.to_string(),
        other => other.replace('.', "::"),
    }
}

/// How a parameter is received: scalars by value, everything else by
/// const reference.
fn cpp_arg_type(type_name: &str) -> String {
    let mapped = cpp_type(type_name);
    if is_scalar(type_name) {
        mapped
    } else {
        format!("const {mapped}&")
    }
}

fn guard_name(package: &FQName, file_stem: &str) -> String {
    format!(
        "HIDL_GENERATED_{}_{}_H_",
        package.package_and_version().token_name().to_uppercase(),
        file_stem.to_uppercase()
    )
}

fn open_guard(out: &mut Formatter, package: &FQName, file_stem: &str) -> String {
    let guard = guard_name(package, file_stem);
    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    out.line(&format!("#ifndef {guard}"));
    out.line(&format!("#define {guard}"));
    out.endl();
    guard
}

fn close_guard(out: &mut Formatter, guard: &str) {
    out.endl();
    out.line(&format!("#endif  // {guard}"));
}

fn open_namespaces(out: &mut Formatter, package: &FQName) {
    for component in package.package().split('.') {
        out.line(&format!("namespace {component} {{"));
    }
    out.line(&format!("namespace {} {{", package.sanitized_version()));
    out.endl();
}

fn close_namespaces(out: &mut Formatter, package: &FQName) {
    out.endl();
    out.line(&format!("}}  // namespace {}", package.sanitized_version()));
    for component in package.package().split('.').rev() {
        out.line(&format!("}}  // namespace {component}"));
    }
}

fn emit_named_type(out: &mut Formatter, named_type: &NamedType) {
    match named_type.detail() {
        TypeDetail::Enum { storage, values } => {
            out.push(&format!(
                "enum class {} : {} ",
                named_type.local_name(),
                cpp_type(storage)
            ));
            out.block(|out| {
                for value in values {
                    match &value.value {
                        Some(expr) => out.line(&format!("{} = {},", value.name, expr)),
                        None => out.line(&format!("{},", value.name)),
                    };
                }
            });
            out.line(";");
        }
        TypeDetail::Struct { fields } => {
            out.push(&format!("struct {} ", named_type.local_name()));
            out.block(|out| {
                for field in fields {
                    out.line(&format!("{} {};", cpp_type(&field.type_name), field.name));
                }
            });
            out.line(";");
        }
        TypeDetail::Union { fields } => {
            out.push(&format!("union {} ", named_type.local_name()));
            out.block(|out| {
                for field in fields {
                    out.line(&format!("{} {};", cpp_type(&field.type_name), field.name));
                }
            });
            out.line(";");
        }
        TypeDetail::TypeDef { aliased } => {
            out.line(&format!(
                "typedef {} {};",
                cpp_type(aliased),
                named_type.local_name()
            ));
        }
    }
    out.endl();
}

/// The declared return carrier of a method: `Return<T>` for a single
/// scalar result, `Return<void>` with a callback otherwise.
pub(crate) fn method_return(method: &Method) -> String {
    match method.results.as_slice() {
        [only] if is_scalar(&only.type_name) => {
            format!("::android::hardware::Return<{}>", cpp_type(&only.type_name))
        }
        _ => "::android::hardware::Return<void>".to_string(),
    }
}

pub(crate) fn method_needs_callback(method: &Method) -> bool {
    !method.results.is_empty()
        && !(method.results.len() == 1 && is_scalar(&method.results[0].type_name))
}

pub(crate) fn method_signature(method: &Method) -> String {
    let mut args: Vec<String> = method
        .args
        .iter()
        .map(|arg| format!("{} {}", cpp_arg_type(&arg.type_name), arg.name))
        .collect();
    if method_needs_callback(method) {
        args.push(format!("{}_cb _hidl_cb", method.name));
    }
    format!("{}({})", method.name, args.join(", "))
}

fn emit_callback_alias(out: &mut Formatter, method: &Method) {
    let params: Vec<String> = method
        .results
        .iter()
        .map(|result| format!("{} {}", cpp_arg_type(&result.type_name), result.name))
        .collect();
    out.line(&format!(
        "using {}_cb = std::function<void({})>;",
        method.name,
        params.join(", ")
    ));
}

fn emit_package_include(out: &mut Formatter, fq_name: &FQName, file_stem: &str) {
    out.line(&format!(
        "#include <{}/{}.{}/{}.h>",
        fq_name.package().replace('.', "/"),
        fq_name.major(),
        fq_name.minor(),
        file_stem
    ));
}

/// Emit every header derived from this file.
pub fn generate_headers(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    match ast.interface() {
        Some(iface) => {
            interface_header(ctx, ast, iface, output_path)?;
            hw_header(ctx, ast, iface, output_path)?;
            binder_header(ctx, ast, iface, output_path, true)?;
            binder_header(ctx, ast, iface, output_path, false)?;
            passthrough_header(ctx, ast, iface, output_path)
        }
        None => {
            types_header(ctx, ast, output_path)?;
            hwtypes_header(ctx, ast, output_path)
        }
    }
}

/// Emit the source file derived from this file.
pub fn generate_sources(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    match ast.interface() {
        Some(iface) => interface_source(ctx, ast, iface, output_path),
        None => types_source(ctx, ast, output_path),
    }
}

fn interface_header(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
) -> Result<()> {
    let package = ast.package();
    let name = iface.local_name();
    let mut out = ctx.coordinator.formatter(
        output_path,
        iface.fq_name(),
        Location::GenOutput,
        &format!("{name}.h"),
    )?;

    let guard = open_guard(&mut out, package, name);

    for import in ast.imports() {
        if import.is_fully_qualified() {
            emit_package_include(&mut out, import, import.name());
        } else {
            emit_package_include(&mut out, import, "types");
        }
    }
    if let Some(parent) = iface.super_iface() {
        emit_package_include(&mut out, parent, parent.name());
    }
    out.line("#include <hidl/HidlSupport.h>");
    out.line("#include <hidl/Status.h>");
    out.endl();

    open_namespaces(&mut out, package);

    let parent = match iface.super_iface() {
        Some(parent) => format!(" : virtual public {}", parent.cpp_name()),
        None => String::new(),
    };
    out.push(&format!("struct {name}{parent} "));
    out.block(|out| {
        for named_type in iface.types() {
            emit_named_type(out, named_type);
        }
        for method in iface.methods() {
            if method_needs_callback(method) {
                emit_callback_alias(out, method);
            }
            out.line(&format!(
                "virtual {} {} = 0;",
                method_return(method),
                method_signature(method)
            ));
        }
        out.line("static const char* descriptor;");
    });
    out.line(";");

    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn hw_header(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
) -> Result<()> {
    let package = ast.package();
    let hw_name = iface.fq_name().interface_hw_name();
    let mut out = ctx.coordinator.formatter(
        output_path,
        iface.fq_name(),
        Location::GenOutput,
        &format!("{hw_name}.h"),
    )?;

    let guard = open_guard(&mut out, package, &hw_name);
    emit_package_include(&mut out, iface.fq_name(), iface.local_name());
    out.line("#include <hidl/HidlTransportSupport.h>");
    out.endl();

    open_namespaces(&mut out, package);
    out.line(&format!(
        "::android::status_t readEmbeddedFromParcel(const {}& obj, const ::android::hardware::Parcel& parcel, size_t parentHandle, size_t parentOffset);",
        iface.local_name()
    ));
    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn binder_header(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
    stub: bool,
) -> Result<()> {
    let package = ast.package();
    let fq_name = iface.fq_name();
    let class_name = if stub {
        fq_name.interface_stub_name()
    } else {
        fq_name.interface_proxy_name()
    };
    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenOutput,
        &format!("{class_name}.h"),
    )?;

    let guard = open_guard(&mut out, package, &class_name);
    emit_package_include(&mut out, fq_name, &fq_name.interface_hw_name());
    out.endl();

    open_namespaces(&mut out, package);
    let base = if stub {
        "::android::hardware::BHwBinder"
    } else {
        "::android::hardware::BpInterface"
    };
    out.push(&format!(
        "struct {class_name} : public {}, public {base} ",
        fq_name.cpp_name()
    ));
    out.block(|out| {
        if stub {
            out.line(&format!(
                "explicit {class_name}(const ::android::sp<{}>& impl);",
                fq_name.cpp_name()
            ));
            out.line("::android::status_t onTransact(uint32_t code, const ::android::hardware::Parcel& data, ::android::hardware::Parcel* reply, uint32_t flags) override;");
        } else {
            out.line(&format!(
                "explicit {class_name}(const ::android::sp<::android::hardware::IBinder>& impl);"
            ));
        }
        for method in iface.methods() {
            out.line(&format!(
                "{} {} override;",
                method_return(method),
                method_signature(method)
            ));
        }
    });
    out.line(";");
    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn passthrough_header(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
) -> Result<()> {
    let package = ast.package();
    let fq_name = iface.fq_name();
    let class_name = fq_name.interface_passthrough_name();
    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenOutput,
        &format!("{class_name}.h"),
    )?;

    let guard = open_guard(&mut out, package, &class_name);
    emit_package_include(&mut out, fq_name, iface.local_name());
    out.endl();

    open_namespaces(&mut out, package);
    out.push(&format!("struct {class_name} : {} ", fq_name.cpp_name()));
    out.block(|out| {
        out.line(&format!(
            "explicit {class_name}(const ::android::sp<{}>& impl);",
            fq_name.cpp_name()
        ));
        for method in iface.methods() {
            out.line(&format!(
                "{} {} override;",
                method_return(method),
                method_signature(method)
            ));
        }
        out.line(&format!("const ::android::sp<{}> mImpl;", fq_name.cpp_name()));
    });
    out.line(";");
    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn types_header(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let package = ast.package();
    let mut out = ctx.coordinator.formatter(
        output_path,
        &package.types_for_package(),
        Location::GenOutput,
        "types.h",
    )?;

    let guard = open_guard(&mut out, package, "types");
    for import in ast.imports() {
        let stem = if import.is_fully_qualified() {
            import.name().to_string()
        } else {
            "types".to_string()
        };
        emit_package_include(&mut out, import, &stem);
    }
    out.line("#include <hidl/HidlSupport.h>");
    out.endl();

    open_namespaces(&mut out, package);
    for named_type in ast.root_scope().sub_types() {
        emit_named_type(&mut out, named_type);
    }
    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn hwtypes_header(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let package = ast.package();
    let mut out = ctx.coordinator.formatter(
        output_path,
        &package.types_for_package(),
        Location::GenOutput,
        "hwtypes.h",
    )?;

    let guard = open_guard(&mut out, package, "hwtypes");
    emit_package_include(&mut out, &package.types_for_package(), "types");
    out.line("#include <hidl/HidlTransportSupport.h>");
    out.endl();

    open_namespaces(&mut out, package);
    for named_type in ast.root_scope().sub_types() {
        if matches!(named_type.detail(), TypeDetail::Struct { .. }) {
            out.line(&format!(
                "::android::status_t readEmbeddedFromParcel(const {}& obj, const ::android::hardware::Parcel& parcel, size_t parentHandle, size_t parentOffset);",
                named_type.local_name()
            ));
            out.line(&format!(
                "::android::status_t writeEmbeddedToParcel(const {}& obj, ::android::hardware::Parcel* parcel, size_t parentHandle, size_t parentOffset);",
                named_type.local_name()
            ));
        }
    }
    close_namespaces(&mut out, package);
    close_guard(&mut out, &guard);
    out.finish()
}

fn interface_source(
    ctx: &GenContext<'_>,
    ast: &Ast,
    iface: &Interface,
    output_path: &str,
) -> Result<()> {
    let package = ast.package();
    let fq_name = iface.fq_name();
    let name = iface.local_name();
    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenOutput,
        &format!("{}All.cpp", fq_name.interface_base_name()),
    )?;

    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    emit_package_include(&mut out, fq_name, name);
    emit_package_include(&mut out, fq_name, &fq_name.interface_hw_name());
    emit_package_include(&mut out, fq_name, &fq_name.interface_stub_name());
    emit_package_include(&mut out, fq_name, &fq_name.interface_proxy_name());
    emit_package_include(&mut out, fq_name, &fq_name.interface_passthrough_name());
    out.endl();

    open_namespaces(&mut out, package);

    out.line(&format!(
        "const char* {name}::descriptor = \"{fq_name}\";"
    ));
    out.endl();

    for method in iface.methods() {
        out.push(&format!(
            "{} {}::{} ",
            method_return(method),
            fq_name.interface_proxy_name(),
            method_signature(method)
        ));
        out.block(|out| {
            for arg in &method.args {
                out.line(&format!("(void){};", arg.name));
            }
            if method_needs_callback(method) {
                out.line("(void)_hidl_cb;");
            }
            out.line("return ::android::hardware::Void();");
        });
        out.endl().endl();
    }

    close_namespaces(&mut out, package);
    out.finish()
}

fn types_source(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let package = ast.package();
    let mut out = ctx.coordinator.formatter(
        output_path,
        &package.types_for_package(),
        Location::GenOutput,
        "types.cpp",
    )?;

    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    emit_package_include(&mut out, &package.types_for_package(), "types");
    emit_package_include(&mut out, &package.types_for_package(), "hwtypes");
    out.endl();

    open_namespaces(&mut out, package);
    for named_type in ast.root_scope().sub_types() {
        if matches!(named_type.detail(), TypeDetail::Struct { .. }) {
            out.push(&format!(
                "::android::status_t readEmbeddedFromParcel(const {}& obj, const ::android::hardware::Parcel& parcel, size_t parentHandle, size_t parentOffset) ",
                named_type.local_name()
            ));
            out.block(|out| {
                out.line("(void)obj; (void)parcel; (void)parentHandle; (void)parentOffset;");
                out.line("return ::android::OK;");
            });
            out.endl().endl();
        }
    }
    close_namespaces(&mut out, package);
    out.finish()
}
