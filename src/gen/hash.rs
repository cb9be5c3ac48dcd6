//! `-Lhash`: print `current.txt`-format digest lines to standard out.

use anyhow::{Context, Result};

use crate::coordinator::Enforce;
use crate::core::fqname::FQName;
use crate::gen::GenContext;
use crate::util::hash::sha256_file;

/// One `<hex> <fqname>` line per interface, in enumeration order. Parses
/// with the hash gate disabled so a changed frozen interface can still be
/// re-hashed.
pub fn generate(ctx: &GenContext<'_>, fq_name: &FQName) -> Result<()> {
    let coordinator = ctx.coordinator;

    let interfaces = if fq_name.is_fully_qualified() {
        vec![fq_name.clone()]
    } else {
        coordinator.package_interfaces(fq_name)?
    };

    for current in &interfaces {
        let ast = coordinator
            .parse(current, Enforce::NoHash)
            .with_context(|| format!("could not parse {current}"))?;

        println!("{} {}", sha256_file(ast.filename())?, current);
    }

    Ok(())
}
