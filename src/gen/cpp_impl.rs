//! Boilerplate C++ implementation skeletons (`-Lc++-impl`).
//!
//! Emits `Foo.h` and `Foo.cpp` directly into the output directory as a
//! starting point for a real implementation.

use anyhow::Result;

use crate::coordinator::Location;
use crate::core::ast::Ast;
use crate::gen::cpp;
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

fn open_impl_namespaces(out: &mut Formatter, ast: &Ast) {
    for component in ast.package().package().split('.') {
        out.line(&format!("namespace {component} {{"));
    }
    out.line(&format!("namespace {} {{", ast.package().sanitized_version()));
    out.line("namespace implementation {");
    out.endl();
}

fn close_impl_namespaces(out: &mut Formatter, ast: &Ast) {
    out.endl();
    out.line("}  // namespace implementation");
    out.line(&format!("}}  // namespace {}", ast.package().sanitized_version()));
    for component in ast.package().package().split('.').rev() {
        out.line(&format!("}}  // namespace {component}"));
    }
}

pub fn generate_header(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let Some(iface) = ast.interface() else {
        // types.hal has nothing to implement.
        return Ok(());
    };
    let fq_name = iface.fq_name();
    let base_name = fq_name.interface_base_name();

    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::Direct,
        &format!("{base_name}.h"),
    )?;

    let guard = format!(
        "{}_{}_H_",
        ast.package().token_name().to_uppercase(),
        base_name.to_uppercase()
    );
    out.line(&format!("#ifndef {guard}"));
    out.line(&format!("#define {guard}"));
    out.endl();
    out.line(&format!(
        "#include <{}/{}/{}.h>",
        ast.package().package().replace('.', "/"),
        ast.package().version_string(),
        fq_name.name()
    ));
    out.line("#include <hidl/Status.h>");
    out.endl();

    open_impl_namespaces(&mut out, ast);

    out.push(&format!("struct {base_name} : public {} ", fq_name.cpp_name()));
    out.block(|out| {
        out.line(&format!("// Methods from {} follow.", fq_name.cpp_name()));
        for method in iface.methods() {
            out.line(&format!(
                "{} {} override;",
                cpp::method_return(method),
                cpp::method_signature(method)
            ));
        }
    });
    out.line(";");

    close_impl_namespaces(&mut out, ast);
    out.endl();
    out.line(&format!("#endif  // {guard}"));
    out.finish()
}

pub fn generate_source(ctx: &GenContext<'_>, ast: &Ast, output_path: &str) -> Result<()> {
    let Some(iface) = ast.interface() else {
        return Ok(());
    };
    let fq_name = iface.fq_name();
    let base_name = fq_name.interface_base_name();

    let mut out = ctx.coordinator.formatter(
        output_path,
        fq_name,
        Location::Direct,
        &format!("{base_name}.cpp"),
    )?;

    out.line(&format!("#include \"{base_name}.h\""));
    out.endl();

    open_impl_namespaces(&mut out, ast);

    out.line(&format!("// Methods from {} follow.", fq_name.cpp_name()));
    for method in iface.methods() {
        out.push(&format!(
            "{} {base_name}::{} ",
            cpp::method_return(method),
            cpp::method_signature(method)
        ));
        out.block(|out| {
            out.line("// TODO implement");
            out.line("return ::android::hardware::Void();");
        });
        out.endl().endl();
    }

    close_impl_namespaces(&mut out, ast);
    out.finish()
}
