//! Versioning-adapter emitters (`-Lc++-adapter*`).
//!
//! An adapter makes a newer interface version impersonate an older one for
//! testing: `IFooAdapter` wraps an `IFoo` and forwards every call. The
//! `c++-adapter-main` handler emits the `main.cpp` that registers every
//! adapter of a package.

use anyhow::Result;

use crate::coordinator::{Enforce, Location};
use crate::core::ast::{Ast, Interface};
use crate::core::fqname::FQName;
use crate::gen::cpp;
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

fn emit_adapter_include(out: &mut Formatter, fq_name: &FQName, stem: &str) {
    out.line(&format!(
        "#include <{}/{}/{}.h>",
        fq_name.package().replace('.', "/"),
        fq_name.version_string(),
        stem
    ));
}

fn open_namespaces(out: &mut Formatter, ast: &Ast) {
    for component in ast.package().package().split('.') {
        out.line(&format!("namespace {component} {{"));
    }
    out.line(&format!("namespace {} {{", ast.package().sanitized_version()));
    out.endl();
}

fn close_namespaces(out: &mut Formatter, ast: &Ast) {
    out.endl();
    out.line(&format!("}}  // namespace {}", ast.package().sanitized_version()));
    for component in ast.package().package().split('.').rev() {
        out.line(&format!("}}  // namespace {component}"));
    }
}

fn adapter_methods(out: &mut Formatter, iface: &Interface, declare: bool, class_name: &str) {
    for method in iface.methods() {
        if declare {
            out.line(&format!(
                "{} {} override;",
                cpp::method_return(method),
                cpp::method_signature(method)
            ));
        } else {
            out.push(&format!(
                "{} {class_name}::{} ",
                cpp::method_return(method),
                cpp::method_signature(method)
            ));
            out.block(|out| {
                let mut args: Vec<String> =
                    method.args.iter().map(|arg| arg.name.clone()).collect();
                if cpp::method_needs_callback(method) {
                    args.push("_hidl_cb".to_string());
                }
                out.line(&format!("return mImpl->{}({});", method.name, args.join(", ")));
            });
            out.endl().endl();
        }
    }
}

pub fn generate_header(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let Some(iface) = ast.interface() else {
        return Ok(());
    };
    let fq_name = iface.fq_name();
    let adapter_name = fq_name.interface_adapter_name();

    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenOutput,
        &format!("{adapter_name}.h"),
    )?;

    let guard = format!(
        "HIDL_GENERATED_{}_{}_H_",
        ast.package().token_name().to_uppercase(),
        adapter_name.to_uppercase()
    );
    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    out.line(&format!("#ifndef {guard}"));
    out.line(&format!("#define {guard}"));
    out.endl();
    emit_adapter_include(&mut out, fq_name, fq_name.name());
    out.line("#include <hidladapter/HidlBinderAdapter.h>");
    out.endl();

    open_namespaces(&mut out, ast);
    out.push(&format!("struct {adapter_name} : public {} ", fq_name.cpp_name()));
    out.block(|out| {
        out.line(&format!(
            "explicit {adapter_name}(const ::android::sp<{}>& impl);",
            fq_name.cpp_name()
        ));
        adapter_methods(out, iface, true, &adapter_name);
        out.line(&format!("const ::android::sp<{}> mImpl;", fq_name.cpp_name()));
    });
    out.line(";");
    close_namespaces(&mut out, ast);
    out.endl();
    out.line(&format!("#endif  // {guard}"));
    out.finish()
}

pub fn generate_source(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let Some(iface) = ast.interface() else {
        return Ok(());
    };
    let fq_name = iface.fq_name();
    let adapter_name = fq_name.interface_adapter_name();

    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::GenOutput,
        &format!("{adapter_name}.cpp"),
    )?;

    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();
    emit_adapter_include(&mut out, fq_name, &adapter_name);
    out.endl();

    open_namespaces(&mut out, ast);
    out.line(&format!(
        "{adapter_name}::{adapter_name}(const ::android::sp<{}>& impl) : mImpl(impl) {{}}",
        fq_name.cpp_name()
    ));
    out.endl();
    adapter_methods(&mut out, iface, false, &adapter_name);
    close_namespaces(&mut out, ast);
    out.finish()
}

/// Emit the adapter binary's `main.cpp` for a package.
pub fn generate_main(ctx: &GenContext<'_>, package: &FQName, output_path: &str) -> Result<()> {
    let coordinator = ctx.coordinator;
    let mut out = coordinator.formatter(output_path, package, Location::Direct, "main.cpp")?;

    let interfaces = coordinator.package_interfaces(package)?;

    out.line("#include <hidladapter/HidlBinderAdapter.h>");

    for interface in &interfaces {
        if interface.name() == "types" {
            continue;
        }
        coordinator.parse(interface, Enforce::Full)?;
        emit_adapter_include(&mut out, interface, &interface.interface_adapter_name());
    }

    out.push("int main(int argc, char** argv) ");
    out.block(|out| {
        out.line("return ::android::hardware::adapterMain<");
        out.indented(|out| {
            let adapters: Vec<&FQName> = interfaces
                .iter()
                .filter(|interface| interface.name() != "types")
                .collect();
            for (i, interface) in adapters.iter().enumerate() {
                let separator = if i + 1 == adapters.len() { "" } else { "," };
                out.line(&format!(
                    "{}{separator}",
                    interface.interface_adapter_fq_name().cpp_name()
                ));
            }
            out.line(&format!(">(\"{package}\", argc, argv);"));
        });
    });
    out.endl();
    out.finish()
}
