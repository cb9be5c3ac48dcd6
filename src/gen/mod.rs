//! Output handlers - the registry behind `-L`.
//!
//! Each handler binds a language key to a validator, a generator, and an
//! output-path requirement. Generators are a tagged enum so the key and the
//! code dispatching on it stay in one table.

pub mod adapter;
pub mod android_bp;
pub mod android_bp_impl;
pub mod cpp;
pub mod cpp_impl;
pub mod export;
pub mod hash;
pub mod java;
pub mod vts;

use anyhow::{bail, Context, Result};

use crate::coordinator::{Coordinator, Enforce};
use crate::core::fqname::FQName;

/// What the driver must provide in `-o` for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    NeedsDir,
    NeedsFile,
    /// Output lands in the source tree itself; `-o` defaults to the root.
    NeedsSrc,
    NotNeeded,
}

/// Everything a generator needs besides its target name.
pub struct GenContext<'a> {
    pub coordinator: &'a Coordinator,
    /// Tool name referenced by generated build rules.
    pub tool_name: &'a str,
    /// `-t`: plan build files for tests rather than the system image.
    pub for_test: bool,
}

type ValidateFn = fn(&FQName, &str) -> Result<()>;

/// The generation behavior bound to a language key.
pub enum Generator {
    /// Per-file codegen for the given language; a package name expands to
    /// all of its interfaces.
    SourcesFor(&'static str),
    AdapterMain,
    ExportHeader { for_java: bool },
    AndroidBp,
    AndroidBpImpl,
    Hash,
    /// Retired key kept for the error message; never generates.
    Removed,
}

pub struct OutputHandler {
    pub key: &'static str,
    pub description: &'static str,
    pub mode: OutputMode,
    pub validate: ValidateFn,
    pub generator: Generator,
}

impl OutputHandler {
    pub fn generate(&self, ctx: &GenContext<'_>, fq_name: &FQName, output_path: &str) -> Result<()> {
        match &self.generator {
            Generator::SourcesFor(language) => {
                if fq_name.is_fully_qualified() {
                    generate_sources_for_file(ctx, fq_name, output_path, language)
                } else {
                    for interface in ctx.coordinator.package_interfaces(fq_name)? {
                        generate_sources_for_file(ctx, &interface, output_path, language)?;
                    }
                    Ok(())
                }
            }
            Generator::AdapterMain => adapter::generate_main(ctx, fq_name, output_path),
            Generator::ExportHeader { for_java } => {
                export::generate(ctx, fq_name, output_path, *for_java)
            }
            Generator::AndroidBp => android_bp::generate(ctx, fq_name, output_path),
            Generator::AndroidBpImpl => android_bp_impl::generate(ctx, fq_name, output_path),
            Generator::Hash => hash::generate(ctx, fq_name),
            Generator::Removed => bail!("`{}` output is not supported", self.key),
        }
    }
}

fn generate_sources_for_file(
    ctx: &GenContext<'_>,
    fq_name: &FQName,
    output_path: &str,
    language: &str,
) -> Result<()> {
    let coordinator = ctx.coordinator;

    // `types.X` constrains java output to one top-level type; the AST is
    // still the whole types file.
    let (ast, limit_to_type) = match fq_name.name().strip_prefix("types.") {
        Some(type_name) => {
            let types_name = fq_name.types_for_package();
            let ast = coordinator
                .parse(&types_name, Enforce::Full)
                .with_context(|| format!("could not parse {types_name}"))?;
            (ast, Some(type_name.to_string()))
        }
        None => {
            let ast = coordinator
                .parse(fq_name, Enforce::Full)
                .with_context(|| format!("could not parse {fq_name}"))?;
            (ast, None)
        }
    };

    match language {
        "check" => Ok(()),
        "c++" => {
            cpp::generate_headers(ctx, &ast, output_path)?;
            cpp::generate_sources(ctx, &ast, output_path)
        }
        "c++-headers" => cpp::generate_headers(ctx, &ast, output_path),
        "c++-sources" => cpp::generate_sources(ctx, &ast, output_path),
        "c++-impl" => {
            cpp_impl::generate_header(ctx, &ast, output_path)?;
            cpp_impl::generate_source(ctx, &ast, output_path)
        }
        "c++-impl-headers" => cpp_impl::generate_header(ctx, &ast, output_path),
        "c++-impl-sources" => cpp_impl::generate_source(ctx, &ast, output_path),
        "c++-adapter" => {
            adapter::generate_header(ctx, &ast, output_path)?;
            adapter::generate_source(ctx, &ast, output_path)
        }
        "c++-adapter-headers" => adapter::generate_header(ctx, &ast, output_path),
        "c++-adapter-sources" => adapter::generate_source(ctx, &ast, output_path),
        "java" => java::generate(ctx, &ast, output_path, limit_to_type.as_deref()),
        "vts" => vts::generate(ctx, &ast, output_path),
        other => bail!("unknown language `{other}`"),
    }
}

fn validate_for_source(fq_name: &FQName, language: &str) -> Result<()> {
    let name = fq_name.name();
    if !name.is_empty() && name.contains('.') {
        // Only java output can be constrained to a single top-level type
        // with the `types.TopLevel` syntax.
        if language != "java" || !name.starts_with("types.") {
            bail!("dotted interface name `{fq_name}` is only valid as types.* with -Ljava");
        }
    }
    Ok(())
}

fn validate_is_package(fq_name: &FQName, _language: &str) -> Result<()> {
    if fq_name.is_fully_qualified() {
        bail!("expecting only package name and version, got `{fq_name}`");
    }
    Ok(())
}

fn validate_removed(_fq_name: &FQName, _language: &str) -> Result<()> {
    bail!("makefile output is not supported. Use -Landroidbp for all build file generation.")
}

static FORMATS: &[OutputHandler] = &[
    OutputHandler {
        key: "check",
        description: "Parses the interface to see if valid but doesn't write any files.",
        mode: OutputMode::NotNeeded,
        validate: validate_for_source,
        generator: Generator::SourcesFor("check"),
    },
    OutputHandler {
        key: "c++",
        description: "(internal) (deprecated) Generates C++ interface files for talking to HIDL interfaces.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++"),
    },
    OutputHandler {
        key: "c++-headers",
        description: "(internal) Generates C++ headers for interface files for talking to HIDL interfaces.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-headers"),
    },
    OutputHandler {
        key: "c++-sources",
        description: "(internal) Generates C++ sources for interface files for talking to HIDL interfaces.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-sources"),
    },
    OutputHandler {
        key: "export-header",
        description: "Generates a header file from @export enumerations to help maintain legacy code.",
        mode: OutputMode::NeedsFile,
        validate: validate_is_package,
        generator: Generator::ExportHeader { for_java: false },
    },
    OutputHandler {
        key: "c++-impl",
        description: "Generates boilerplate implementation of a hidl interface in C++ (for convenience).",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-impl"),
    },
    OutputHandler {
        key: "c++-impl-headers",
        description: "c++-impl but headers only",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-impl-headers"),
    },
    OutputHandler {
        key: "c++-impl-sources",
        description: "c++-impl but sources only",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-impl-sources"),
    },
    OutputHandler {
        key: "c++-adapter",
        description: "Takes a x.(y+n) interface and mocks an x.y interface.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-adapter"),
    },
    OutputHandler {
        key: "c++-adapter-headers",
        description: "c++-adapter but helper headers only",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-adapter-headers"),
    },
    OutputHandler {
        key: "c++-adapter-sources",
        description: "c++-adapter but helper sources only",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("c++-adapter-sources"),
    },
    OutputHandler {
        key: "c++-adapter-main",
        description: "c++-adapter but the adapter binary source only",
        mode: OutputMode::NeedsDir,
        validate: validate_is_package,
        generator: Generator::AdapterMain,
    },
    OutputHandler {
        key: "java",
        description: "(internal) Generates Java library for talking to HIDL interfaces in Java.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("java"),
    },
    OutputHandler {
        key: "java-constants",
        description: "(internal) Like export-header but for Java (always created by -Landroidbp if @export exists).",
        mode: OutputMode::NeedsDir,
        validate: validate_is_package,
        generator: Generator::ExportHeader { for_java: true },
    },
    OutputHandler {
        key: "vts",
        description: "(internal) Generates vts proto files for use in vtsd.",
        mode: OutputMode::NeedsDir,
        validate: validate_for_source,
        generator: Generator::SourcesFor("vts"),
    },
    OutputHandler {
        key: "makefile",
        description: "(removed) Used to generate makefiles for -Ljava and -Ljava-constants.",
        mode: OutputMode::NeedsSrc,
        validate: validate_removed,
        generator: Generator::Removed,
    },
    OutputHandler {
        key: "androidbp",
        description: "(internal) Generates Soong bp files for -Lc++-headers, -Lc++-sources, -Ljava, -Ljava-constants, and -Lc++-adapter.",
        mode: OutputMode::NeedsSrc,
        validate: validate_is_package,
        generator: Generator::AndroidBp,
    },
    OutputHandler {
        key: "androidbp-impl",
        description: "Generates boilerplate bp files for implementation created with -Lc++-impl.",
        mode: OutputMode::NeedsDir,
        validate: validate_is_package,
        generator: Generator::AndroidBpImpl,
    },
    OutputHandler {
        key: "hash",
        description: "Prints hashes of interface in `current.txt` format to standard out.",
        mode: OutputMode::NotNeeded,
        validate: validate_for_source,
        generator: Generator::Hash,
    },
];

/// Every registered output handler, in `usage()` order.
pub fn handlers() -> &'static [OutputHandler] {
    FORMATS
}

/// Look up a handler by its `-L` key.
pub fn handler_for(key: &str) -> Option<&'static OutputHandler> {
    FORMATS.iter().find(|handler| handler.key == key)
}
