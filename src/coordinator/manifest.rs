//! `current.txt` interface-freeze manifests.
//!
//! Each package root may carry a `current.txt` recording the SHA-256
//! digests of released interfaces, one `<hex> <fqname>` pair per line. An
//! interface may be listed more than once (one line per release that shipped
//! it); any recorded digest is acceptable. The tool only ever reads these
//! files.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};

use crate::core::fqname::FQName;
use crate::util::fs;

/// The parsed digest table of one `current.txt`.
#[derive(Debug, Default)]
pub struct HashManifest {
    digests: HashMap<String, Vec<String>>,
}

impl HashManifest {
    /// Load the manifest at `path`. A missing file is an empty manifest:
    /// nothing under that root is frozen.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(HashManifest::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse manifest text, reporting malformed lines against `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut digests: HashMap<String, Vec<String>> = HashMap::new();

        for (lineno, raw) in text.lines().enumerate() {
            let line = match raw.split_once('#') {
                Some((before, _)) => before,
                None => raw,
            };

            let mut fields = line.split_whitespace();
            let (digest, fq_name) = match (fields.next(), fields.next()) {
                (None, _) => continue,
                (Some(digest), Some(fq_name)) => (digest, fq_name),
                (Some(_), None) => {
                    bail!(
                        "{}:{}: expected `<hash> <fqname>`",
                        path.display(),
                        lineno + 1
                    );
                }
            };
            if fields.next().is_some() {
                bail!(
                    "{}:{}: trailing fields after `<hash> <fqname>`",
                    path.display(),
                    lineno + 1
                );
            }

            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                bail!(
                    "{}:{}: `{}` is not a sha256 digest",
                    path.display(),
                    lineno + 1,
                    digest
                );
            }
            if FQName::parse(fq_name).is_err() {
                bail!(
                    "{}:{}: `{}` is not a fully-qualified name",
                    path.display(),
                    lineno + 1,
                    fq_name
                );
            }

            digests
                .entry(fq_name.to_string())
                .or_default()
                .push(digest.to_ascii_lowercase());
        }

        Ok(HashManifest { digests })
    }

    /// All digests frozen for `fq_name`, empty if the interface is not
    /// frozen under this root.
    pub fn digests_for(&self, fq_name: &FQName) -> &[String] {
        self.digests
            .get(&fq_name.to_string())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
