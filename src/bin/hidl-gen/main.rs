//! hidl-gen CLI - dispatches fully-qualified names to output handlers.

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use hidl_gen::coordinator::Coordinator;
use hidl_gen::core::fqname::FQName;
use hidl_gen::gen::{self, GenContext, OutputMode};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn tool_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| std::path::Path::new(arg0).file_name()?.to_str().map(String::from))
        .unwrap_or_else(|| "hidl-gen".to_string())
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("hidl_gen=debug")
    } else {
        EnvFilter::new("hidl_gen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let handler = gen::handler_for(&cli.language)
        .ok_or_else(|| anyhow!("unrecognized -L option: \"{}\"", cli.language))?;

    if cli.for_test && handler.key != "androidbp" {
        bail!("-t option is for -Landroidbp only");
    }

    let mut coordinator = Coordinator::new();

    if let Some(root_path) = &cli.root_path {
        coordinator.set_root_path(root_path);
    } else if let Ok(build_top) = std::env::var("ANDROID_BUILD_TOP") {
        coordinator.set_root_path(&build_top);
    }

    for mapping in &cli.package_roots {
        let (prefix, path) = mapping
            .split_once(':')
            .ok_or_else(|| anyhow!("-r option must contain ':': {mapping}"))?;
        coordinator.add_package_path(prefix, path)?;
    }

    // Normalize the output path by what the handler needs from it.
    let mut output_path = cli.output_path.clone().unwrap_or_default();
    match handler.mode {
        OutputMode::NeedsDir | OutputMode::NeedsFile => {
            if output_path.is_empty() {
                bail!("-L{} requires an output path (-o)", handler.key);
            }
            if handler.mode == OutputMode::NeedsDir && !output_path.ends_with('/') {
                output_path.push('/');
            }
        }
        OutputMode::NeedsSrc => {
            if output_path.is_empty() {
                output_path = coordinator.root_path().to_string();
            }
            if !output_path.is_empty() && !output_path.ends_with('/') {
                output_path.push('/');
            }
        }
        OutputMode::NotNeeded => output_path.clear(),
    }

    coordinator.add_default_package_path("android.hardware", "hardware/interfaces");
    coordinator.add_default_package_path("android.hidl", "system/libhidl/transport");
    coordinator.add_default_package_path("android.frameworks", "frameworks/hardware/interfaces");
    coordinator.add_default_package_path("android.system", "system/hardware/interfaces");

    let tool_name = tool_name();
    let ctx = GenContext {
        coordinator: &coordinator,
        tool_name: &tool_name,
        for_test: cli.for_test,
    };

    for name in &cli.fq_names {
        let fq_name = FQName::parse(name).map_err(|e| anyhow!(e))?;

        (handler.validate)(&fq_name, handler.key)?;
        handler.generate(&ctx, &fq_name, &output_path)?;
    }

    Ok(())
}
