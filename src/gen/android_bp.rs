//! Per-package build-file planner.
//!
//! Emits exactly one `Android.bp` describing every artifact derivable from
//! a package: the `.hal` file-group, C++ code-gen rules and library, Java
//! library and constants, and the versioning-adapter rules. Everything is
//! derived from the interface enumeration and the imported-package
//! hierarchy, serialized in FQName order so identical inputs produce
//! byte-identical output.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use crate::coordinator::{Coordinator, Enforce, Location};
use crate::core::ast::{Ast, NamedType};
use crate::core::fqname::{FQName, IBASE};
use crate::gen::GenContext;
use crate::util::formatter::Formatter;

/// Packages whose C++ binding ships inside libhidltransport and must not
/// be redefined by a generated library (any version).
const TRANSPORT_PACKAGES: &[&str] = &["android.hidl.base", "android.hidl.manager"];

/// Prefix namespaces owned by the system image; their libraries land in
/// the VNDK unless the run is planning for tests.
const SYSTEM_PREFIXES: &[&str] = &[
    "android.hardware",
    "android.hidl",
    "android.system",
    "android.frameworks",
];

/// Libraries allowed to be loaded into system processes.
const SYSTEM_PROCESS_PACKAGES: &[&str] = &[
    "android.hardware.graphics.allocator@2.0",
    "android.hardware.graphics.common@1.0",
    "android.hardware.graphics.mapper@2.0",
    "android.hardware.graphics.mapper@2.1",
    "android.hardware.renderscript@1.0",
    "android.hidl.memory@1.0",
];

const BASE_SHARED_LIBS: &[&str] = &[
    "libhidlbase",
    "libhidltransport",
    "libhwbinder",
    "liblog",
    "libutils",
    "libcutils",
];

const BASE_EXPORTED_SHARED_LIBS: &[&str] =
    &["libhidlbase", "libhidltransport", "libhwbinder", "libutils"];

pub fn is_hidl_transport_package(fq_name: &FQName) -> bool {
    TRANSPORT_PACKAGES.contains(&fq_name.package())
}

fn is_system_package(fq_name: &FQName) -> bool {
    SYSTEM_PREFIXES.iter().any(|prefix| fq_name.in_package(prefix))
}

fn is_system_process_supported_package(fq_name: &FQName) -> bool {
    SYSTEM_PROCESS_PACKAGES.contains(&fq_name.package_and_version().to_string().as_str())
}

pub fn library_name(package: &FQName) -> String {
    package.to_string()
}

pub fn hal_filegroup_name(package: &FQName) -> String {
    format!("{package}_hal")
}

pub fn java_library_name(package: &FQName) -> String {
    format!("{}-V{}-java", package.package(), package.version_string())
}

/// A package is Java-compatible iff every interface reachable through the
/// transitive import graph is. A parse failure is an error, not `false`.
pub fn is_package_java_compatible(coordinator: &Coordinator, package: &FQName) -> Result<bool> {
    let mut todo = coordinator.package_interfaces(package)?;
    let mut seen: BTreeSet<FQName> = todo.iter().cloned().collect();

    while let Some(fq_name) = todo.pop() {
        let ast = coordinator.parse(&fq_name, Enforce::Full)?;

        if !ast.is_java_compatible() {
            return Ok(false);
        }

        let mut imported = BTreeSet::new();
        ast.imported_packages(&mut imported);

        for import in imported {
            for interface in coordinator.package_interfaces(&import)? {
                if seen.insert(interface.clone()) {
                    todo.push(interface);
                }
            }
        }
    }

    Ok(true)
}

/// Java code is generated when the package has any interface file, or when
/// its lone `types.hal` declares a non-typedef type.
fn package_needs_java_code(interfaces: &[FQName], types_ast: Option<&Ast>) -> Result<bool> {
    if interfaces.is_empty() {
        return Ok(false);
    }

    if interfaces.len() > 1 || interfaces[0].name() != "types" {
        return Ok(true);
    }

    let types_ast =
        types_ast.context("package consists of types.hal but it was never parsed")?;

    Ok(types_ast
        .root_scope()
        .sub_types()
        .iter()
        .any(|sub_type| !sub_type.is_type_def()))
}

/// The sorted `-r` options reconstructing this invocation's roots: one per
/// imported package, plus the target package and IBase.
fn root_options(
    coordinator: &Coordinator,
    package: &FQName,
    imported: &BTreeSet<FQName>,
) -> Result<Vec<String>> {
    let mut options = BTreeSet::new();
    for import in imported {
        options.insert(coordinator.package_root_option(import)?);
    }
    options.insert(coordinator.package_root_option(package)?);
    options.insert(coordinator.package_root_option(&IBASE)?);
    Ok(options.into_iter().collect())
}

/// Imported packages as C++ library names, transport packages skipped.
fn dependency_lib_names(imported: &BTreeSet<FQName>) -> Vec<String> {
    imported
        .iter()
        .filter(|import| !is_hidl_transport_package(import))
        .map(library_name)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn gen_section(
    out: &mut Formatter,
    ctx: &GenContext<'_>,
    package: &FQName,
    filegroup_name: &str,
    gen_name: &str,
    language: &str,
    interfaces: &[FQName],
    root_options: &[String],
    output_fn: &dyn Fn(&mut Formatter, &FQName),
) {
    out.push("genrule ");
    out.block(|out| {
        out.line(&format!("name: \"{gen_name}\","));
        out.line(&format!("tools: [\"{}\"],", ctx.tool_name));
        out.push(&format!(
            "cmd: \"$(location {}) -o $(genDir) -L{language} ",
            ctx.tool_name
        ));
        for option in root_options {
            out.push(&format!("-r{option} "));
        }
        out.push(&format!("{package}\",\n"));
        out.line("srcs: [");
        out.indented(|out| {
            out.line(&format!("\":{filegroup_name}\","));
        });
        out.line("],");
        out.line("out: [");
        out.indented(|out| {
            for fq_name in interfaces {
                output_fn(out, fq_name);
            }
        });
        out.line("],");
    });
    out.endl().endl();
}

#[derive(Clone, Copy)]
enum LibraryPlacement {
    VendorAvailable,
    Vndk,
}

fn cpp_lib_section(
    out: &mut Formatter,
    placement: LibraryPlacement,
    package: &FQName,
    library_name: &str,
    gen_source_name: &str,
    gen_header_name: &str,
    extra_libs: &[String],
) {
    out.push("cc_library ");
    out.block(|out| {
        out.line(&format!("name: \"{library_name}\","));
        out.line("defaults: [\"hidl-module-defaults\"],");
        out.line(&format!("generated_sources: [\"{gen_source_name}\"],"));
        out.line(&format!("generated_headers: [\"{gen_header_name}\"],"));
        out.line(&format!("export_generated_headers: [\"{gen_header_name}\"],"));

        match placement {
            LibraryPlacement::VendorAvailable => {
                out.line("vendor_available: true,");
            }
            LibraryPlacement::Vndk => {
                out.line("vendor_available: true,");
                out.push("vndk: ");
                out.block(|out| {
                    out.line("enabled: true,");
                    if is_system_process_supported_package(package) {
                        out.line("support_system_process: true,");
                    }
                });
                out.push(",\n");
            }
        }

        out.line("shared_libs: [");
        out.indented(|out| {
            for lib in BASE_SHARED_LIBS {
                out.line(&format!("\"{lib}\","));
            }
            for lib in extra_libs {
                out.line(&format!("\"{lib}\","));
            }
        });
        out.line("],");

        out.line("export_shared_lib_headers: [");
        out.indented(|out| {
            for lib in BASE_EXPORTED_SHARED_LIBS {
                out.line(&format!("\"{lib}\","));
            }
            for lib in extra_libs {
                out.line(&format!("\"{lib}\","));
            }
        });
        out.line("],");
    });
    out.endl();
}

fn definition_libs_section(
    out: &mut Formatter,
    ctx: &GenContext<'_>,
    package: &FQName,
    interfaces: &[FQName],
    hierarchy: &BTreeSet<FQName>,
) -> Result<()> {
    let library_name = library_name(package);
    let filegroup_name = hal_filegroup_name(package);
    let gen_source_name = format!("{library_name}_genc++");
    let gen_header_name = format!("{library_name}_genc++_headers");
    let path_prefix = ctx
        .coordinator
        .get_filepath("", package, Location::GenOutput, "")?;
    let options = root_options(ctx.coordinator, package, hierarchy)?;

    // Rule to generate the C++ source files.
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_source_name,
        "c++-sources",
        interfaces,
        &options,
        &|out, fq_name| {
            if fq_name.name() == "types" {
                out.line(&format!("\"{path_prefix}types.cpp\","));
            } else {
                out.line(&format!(
                    "\"{path_prefix}{}All.cpp\",",
                    fq_name.interface_base_name()
                ));
            }
        },
    );

    // Rule to generate the C++ header files.
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_header_name,
        "c++-headers",
        interfaces,
        &options,
        &|out, fq_name| {
            out.line(&format!("\"{path_prefix}{}.h\",", fq_name.name()));
            if fq_name.name() != "types" {
                out.line(&format!("\"{path_prefix}{}.h\",", fq_name.interface_hw_name()));
                out.line(&format!("\"{path_prefix}{}.h\",", fq_name.interface_stub_name()));
                out.line(&format!("\"{path_prefix}{}.h\",", fq_name.interface_proxy_name()));
                out.line(&format!(
                    "\"{path_prefix}{}.h\",",
                    fq_name.interface_passthrough_name()
                ));
            } else {
                out.line(&format!("\"{path_prefix}hwtypes.h\","));
            }
        },
    );

    if is_hidl_transport_package(package) {
        out.line(&format!("// {package} is exported from libhidltransport"));
    } else {
        let is_vndk = !ctx.for_test && is_system_package(package);
        let placement = if is_vndk {
            LibraryPlacement::Vndk
        } else {
            LibraryPlacement::VendorAvailable
        };
        cpp_lib_section(
            out,
            placement,
            package,
            &library_name,
            &gen_source_name,
            &gen_header_name,
            &dependency_lib_names(hierarchy),
        );
    }

    out.endl();
    Ok(())
}

fn java_libs_section(
    out: &mut Formatter,
    ctx: &GenContext<'_>,
    package: &FQName,
    interfaces: &[FQName],
    hierarchy: &BTreeSet<FQName>,
    types_ast: Option<&Rc<Ast>>,
) -> Result<()> {
    let library_name = java_library_name(package);
    let filegroup_name = hal_filegroup_name(package);
    let gen_java_name = format!("{library_name}_gen_java");
    let path_prefix = ctx
        .coordinator
        .get_filepath("", package, Location::GenSanitized, "")?;
    let options = root_options(ctx.coordinator, package, hierarchy)?;

    let types_ast = types_ast.cloned();
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_java_name,
        "java",
        interfaces,
        &options,
        &|out, fq_name| {
            if fq_name.name() != "types" {
                out.line(&format!("\"{path_prefix}{}.java\",", fq_name.name()));
                return;
            }

            let Some(types_ast) = &types_ast else { return };

            let mut sub_types: Vec<&NamedType> =
                types_ast.root_scope().sub_types().iter().collect();
            sub_types.sort_by(|a, b| a.fq_name().cmp(b.fq_name()));

            for sub_type in sub_types {
                if sub_type.is_type_def() {
                    continue;
                }
                out.line(&format!("\"{path_prefix}{}.java\",", sub_type.local_name()));
            }
        },
    );

    out.push("java_library ");
    out.block(|out| {
        out.line(&format!("name: \"{library_name}\","));
        out.line("no_framework_libs: true,");
        out.line("defaults: [\"hidl-java-module-defaults\"],");
        out.line(&format!("srcs: [\":{gen_java_name}\"],"));
        out.line("libs: [");
        out.indented(|out| {
            out.line("\"hwbinder\",");
            for import in hierarchy {
                out.line(&format!("\"{}\",", java_library_name(import)));
            }
        });
        out.line("]");
    });
    out.endl().endl();

    Ok(())
}

fn java_exports_section(
    out: &mut Formatter,
    ctx: &GenContext<'_>,
    package: &FQName,
    interfaces: &[FQName],
    hierarchy: &BTreeSet<FQName>,
) -> Result<()> {
    let library_name = java_library_name(package);
    let filegroup_name = hal_filegroup_name(package);
    let constants_library_name = format!("{library_name}-constants");
    let gen_constants_name = format!("{constants_library_name}_gen_java");
    let path_prefix = ctx
        .coordinator
        .get_filepath("", package, Location::GenSanitized, "")?;
    let options = root_options(ctx.coordinator, package, hierarchy)?;

    // One Constants.java regardless of how many interfaces feed it.
    let emitted = Cell::new(false);
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_constants_name,
        "java-constants",
        interfaces,
        &options,
        &|out, _fq_name| {
            if !emitted.get() {
                out.line(&format!("\"{path_prefix}Constants.java\","));
                emitted.set(true);
            }
        },
    );

    out.push("java_library ");
    out.block(|out| {
        out.line(&format!("name: \"{constants_library_name}\","));
        out.line("no_framework_libs: true,");
        out.line("defaults: [\"hidl-java-module-defaults\"],");
        out.line(&format!("srcs: [\":{gen_constants_name}\"],"));
    });
    out.endl();

    Ok(())
}

fn adapter_libs_section(
    out: &mut Formatter,
    ctx: &GenContext<'_>,
    package: &FQName,
    interfaces: &[FQName],
    hierarchy: &BTreeSet<FQName>,
) -> Result<()> {
    let adapter_name = format!("{}-adapter", library_name(package));
    let filegroup_name = hal_filegroup_name(package);
    let gen_adapter_name = format!("{adapter_name}_genc++");
    let adapter_helper_name = format!("{adapter_name}-helper");
    let gen_adapter_sources_name = format!("{adapter_helper_name}_genc++");
    let gen_adapter_headers_name = format!("{adapter_helper_name}_genc++_headers");
    let path_prefix = ctx
        .coordinator
        .get_filepath("", package, Location::GenOutput, "")?;

    let mut adapter_packages = hierarchy.clone();
    adapter_packages.insert(package.clone());
    let options = root_options(ctx.coordinator, package, &adapter_packages)?;

    out.endl();
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_adapter_sources_name,
        "c++-adapter-sources",
        interfaces,
        &options,
        &|out, fq_name| {
            if fq_name.name() != "types" {
                out.line(&format!(
                    "\"{path_prefix}{}.cpp\",",
                    fq_name.interface_adapter_name()
                ));
            }
        },
    );
    gen_section(
        out,
        ctx,
        package,
        &filegroup_name,
        &gen_adapter_headers_name,
        "c++-adapter-headers",
        interfaces,
        &options,
        &|out, fq_name| {
            if fq_name.name() != "types" {
                out.line(&format!(
                    "\"{path_prefix}{}.h\",",
                    fq_name.interface_adapter_name()
                ));
            }
        },
    );

    // The helper wraps this package's library plus every interface-bearing
    // import's helper; each imported version is judged independently.
    let mut helper_libs = vec!["libhidladapter".to_string()];
    helper_libs.extend(dependency_lib_names(&adapter_packages));
    for import in hierarchy {
        if import == package {
            continue;
        }
        if ctx.coordinator.is_types_only_package(import)? {
            continue;
        }
        helper_libs.push(format!("{}-adapter-helper", library_name(import)));
    }

    cpp_lib_section(
        out,
        LibraryPlacement::VendorAvailable,
        package,
        &adapter_helper_name,
        &gen_adapter_sources_name,
        &gen_adapter_headers_name,
        &helper_libs,
    );
    out.endl();

    out.push("genrule ");
    out.block(|out| {
        out.line(&format!("name: \"{gen_adapter_name}\","));
        out.line(&format!("tools: [\"{}\"],", ctx.tool_name));
        out.push(&format!(
            "cmd: \"$(location {}) -o $(genDir) -Lc++-adapter-main ",
            ctx.tool_name
        ));
        for option in &options {
            out.push(&format!("-r{option} "));
        }
        out.push(&format!("{package}\",\n"));
        out.line("out: [\"main.cpp\"]");
    });
    out.endl().endl();

    out.push("cc_test ");
    out.block(|out| {
        out.line(&format!("name: \"{adapter_name}\","));
        out.line("defaults: [\"hidl-module-defaults\"],");
        out.line("shared_libs: [");
        out.indented(|out| {
            out.line("\"libhidladapter\",");
            out.line("\"libhidlbase\",");
            out.line("\"libhidltransport\",");
            out.line("\"libutils\",");
            for lib in dependency_lib_names(&adapter_packages) {
                out.line(&format!("\"{lib}\","));
            }
            out.line(&format!("\"{adapter_helper_name}\","));
        });
        out.line("],");
        out.line(&format!("generated_sources: [\"{gen_adapter_name}\"],"));
    });
    out.endl();

    Ok(())
}

/// Emit the package's `Android.bp` into the source tree.
pub fn generate(ctx: &GenContext<'_>, package: &FQName, output_path: &str) -> Result<()> {
    if package.is_fully_qualified() {
        bail!("build file generation requires a package name, got `{package}`");
    }

    let coordinator = ctx.coordinator;
    let interfaces = coordinator.package_interfaces(package)?;

    let mut hierarchy = BTreeSet::new();
    let mut has_exported_types = false;
    let mut types_ast = None;

    for fq_name in &interfaces {
        let ast = coordinator
            .parse(fq_name, Enforce::Full)
            .with_context(|| format!("could not parse {fq_name}"))?;

        if fq_name.name() == "types" {
            types_ast = Some(ast.clone());
        }

        coordinator.imported_packages_hierarchy(fq_name, &mut hierarchy)?;
        has_exported_types |= !ast.exported_types().is_empty();
    }

    let types_only = coordinator.is_types_only_package(package)?;
    let java_compatible = is_package_java_compatible(coordinator, package)?;
    let needs_java = package_needs_java_code(&interfaces, types_ast.as_deref())?;

    let mut out = coordinator.formatter(output_path, package, Location::PackageRoot, "Android.bp")?;

    out.line("// This file is autogenerated by hidl-gen. Do not edit manually.");
    out.endl();

    out.push("filegroup ");
    out.block(|out| {
        out.line(&format!("name: \"{}\",", hal_filegroup_name(package)));
        out.line("srcs: [");
        out.indented(|out| {
            for fq_name in &interfaces {
                out.line(&format!("\"{}.hal\",", fq_name.name()));
            }
        });
        out.line("],");
    });
    out.endl().endl();

    definition_libs_section(&mut out, ctx, package, &interfaces, &hierarchy)?;

    if needs_java {
        if java_compatible {
            java_libs_section(&mut out, ctx, package, &interfaces, &hierarchy, types_ast.as_ref())?;
        } else {
            out.line("// This package is not java compatible. Not creating java target.");
            out.endl();
        }

        if has_exported_types {
            java_exports_section(&mut out, ctx, package, &interfaces, &hierarchy)?;
        } else {
            out.line("// This package does not export any types. Not creating java constants export.");
            out.endl();
        }
    } else {
        out.line("// This package has nothing to generate Java code.");
        out.endl();
    }

    if !types_only {
        adapter_libs_section(&mut out, ctx, package, &interfaces, &hierarchy)?;
    } else {
        out.line("// This package has no interfaces. Not creating versioning adapter.");
    }

    out.finish()
}
