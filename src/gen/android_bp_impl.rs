//! `-Landroidbp-impl`: skeleton build file for a `-Lc++-impl` library.

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::coordinator::{Enforce, Location};
use crate::core::fqname::FQName;
use crate::gen::android_bp::{is_hidl_transport_package, library_name};
use crate::gen::GenContext;

/// Emit the `cc_library_shared` build file wrapping an implementation.
pub fn generate(ctx: &GenContext<'_>, package: &FQName, output_path: &str) -> Result<()> {
    let coordinator = ctx.coordinator;
    let impl_name = format!("{}-impl", library_name(package));

    let interfaces = coordinator.package_interfaces(package)?;

    let mut imported = BTreeSet::new();
    for fq_name in &interfaces {
        let ast = coordinator
            .parse(fq_name, Enforce::Full)
            .with_context(|| format!("could not parse {fq_name}"))?;
        ast.imported_packages(&mut imported);
    }

    let mut out = coordinator.formatter(output_path, package, Location::Direct, "Android.bp")?;

    out.push("cc_library_shared ");
    out.block(|out| {
        out.line(&format!("name: \"{impl_name}\","));
        out.line("relative_install_path: \"hw\",");
        out.line("proprietary: true,");
        out.line("srcs: [");
        out.indented(|out| {
            for fq_name in &interfaces {
                if fq_name.name() == "types" {
                    continue;
                }
                out.line(&format!("\"{}.cpp\",", fq_name.interface_base_name()));
            }
        });
        out.line("],");
        out.line("shared_libs: [");
        out.indented(|out| {
            out.line("\"libhidlbase\",");
            out.line("\"libhidltransport\",");
            out.line("\"libutils\",");
            out.line(&format!("\"{}\",", library_name(package)));
            for import in &imported {
                if is_hidl_transport_package(import) {
                    continue;
                }
                out.line(&format!("\"{}\",", library_name(import)));
            }
        });
        out.line("],");
    });
    out.endl();

    out.finish()
}
