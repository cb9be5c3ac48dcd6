//! CLI definitions using clap.

use clap::Parser;

use hidl_gen::gen;

fn format_help() -> String {
    let mut help = String::from("Formats (-L):\n");
    for handler in gen::handlers() {
        help.push_str(&format!("  {:<20} {}\n", handler.key, handler.description));
    }
    help
}

/// hidl-gen - an IDL-to-code generator driver for HIDL
#[derive(Parser)]
#[command(name = "hidl-gen")]
#[command(version, about, long_about = None)]
#[command(after_help = format_help())]
pub struct Cli {
    /// Source tree root; defaults to $ANDROID_BUILD_TOP or the working
    /// directory.
    #[arg(short = 'p', value_name = "ROOT")]
    pub root_path: Option<String>,

    /// Location to output files.
    #[arg(short = 'o', value_name = "OUTPUT")]
    pub output_path: Option<String>,

    /// Output format; exactly one.
    #[arg(short = 'L', value_name = "FORMAT")]
    pub language: String,

    /// Package root mapping, e.g. android.hardware:hardware/interfaces.
    #[arg(short = 'r', value_name = "PREFIX:PATH")]
    pub package_roots: Vec<String>,

    /// Generate build scripts (Android.bp) for tests.
    #[arg(short = 't')]
    pub for_test: bool,

    /// Verbose output (locations of touched files).
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Fully-qualified names to generate for.
    #[arg(value_name = "FQNAME", required = true)]
    pub fq_names: Vec<String>,
}
