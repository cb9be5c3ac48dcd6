//! The coordinator - single point of reference for names, paths, and ASTs.
//!
//! Maps fully-qualified names to `.hal` files under a multi-root package
//! layout, parses and memoizes ASTs, enumerates package interfaces, walks
//! the imported-package closure, and gates parsing on the per-root
//! `current.txt` freeze manifests. One coordinator instance is handed to
//! every generator; the tool is single-threaded, so its caches use plain
//! interior mutability.

pub mod manifest;

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};

use crate::core::ast::Ast;
use crate::core::fqname::{FQName, IBASE};
use crate::parser;
use crate::util::formatter::Formatter;
use crate::util::fs;
use crate::util::hash::sha256_file;

use manifest::HashManifest;

/// How an output path is derived from an FQName.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Output path + file name.
    Direct,
    /// Back into the source tree at the package's directory.
    PackageRoot,
    /// Under a generated-code tree: `android/hardware/foo/1.0/`.
    GenOutput,
    /// Java-style sanitized tree: `android/hardware/foo/V1_0/`.
    GenSanitized,
}

/// How much package enforcement runs after a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enforce {
    /// Minor-version uprev checks and the hash gate.
    #[default]
    Full,
    /// Skip the hash gate; only `-Lhash` may use this.
    NoHash,
    /// Skip enforcement entirely; used when parsing implicit imports.
    None,
}

#[derive(Debug)]
struct PackageRoot {
    prefix: String,
    path: String,
}

enum CacheEntry {
    InFlight,
    Failed,
    Done(Rc<Ast>),
}

/// Owner of the package-root registry and the AST cache.
#[derive(Default)]
pub struct Coordinator {
    root_path: String,
    package_roots: Vec<PackageRoot>,
    cache: RefCell<HashMap<FQName, CacheEntry>>,
    enforced: RefCell<BTreeSet<FQName>>,
    manifests: RefCell<HashMap<String, Rc<HashManifest>>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator::default()
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Set the tree all relative paths resolve against.
    pub fn set_root_path(&mut self, root_path: &str) {
        self.root_path = root_path.to_string();
        if !self.root_path.is_empty() && !self.root_path.ends_with('/') {
            self.root_path.push('/');
        }
    }

    /// Register a package prefix -> directory mapping. Duplicate prefixes
    /// are configuration errors; nested prefixes are allowed and resolution
    /// picks the longest match.
    pub fn add_package_path(&mut self, prefix: &str, path: &str) -> Result<()> {
        FQName::parse(&format!("{prefix}@0.0"))
            .map_err(|_| anyhow!("invalid package root `{prefix}`"))?;

        if self.package_roots.iter().any(|r| r.prefix == prefix) {
            bail!("duplicate package root `{prefix}`");
        }

        self.package_roots.push(PackageRoot {
            prefix: prefix.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    /// Register a mapping only if the prefix is not already taken.
    pub fn add_default_package_path(&mut self, prefix: &str, path: &str) {
        if !self.package_roots.iter().any(|r| r.prefix == prefix) {
            let _ = self.add_package_path(prefix, path);
        }
    }

    /// The registered root whose prefix is the longest match for `fq_name`.
    fn find_package_root(&self, fq_name: &FQName) -> Result<&PackageRoot> {
        self.package_roots
            .iter()
            .filter(|root| fq_name.in_package(&root.prefix))
            .max_by_key(|root| root.prefix.len())
            .ok_or_else(|| anyhow!("unable to find package root for {fq_name}"))
    }

    /// The matched prefix, e.g. `android.hardware`.
    pub fn package_root(&self, fq_name: &FQName) -> Result<&str> {
        Ok(&self.find_package_root(fq_name)?.prefix)
    }

    /// The matched directory, e.g. `hardware/interfaces`.
    pub fn package_root_path(&self, fq_name: &FQName) -> Result<&str> {
        Ok(&self.find_package_root(fq_name)?.path)
    }

    /// `prefix:path`, the `-r` flag that selects this root.
    pub fn package_root_option(&self, fq_name: &FQName) -> Result<String> {
        let root = self.find_package_root(fq_name)?;
        Ok(format!("{}:{}", root.prefix, root.path))
    }

    /// The package directory, always with a trailing `/`. With `relative`
    /// the root directory is omitted; with `sanitized` the version
    /// directory is `V1_0` instead of `1.0`.
    pub fn package_path(&self, fq_name: &FQName, relative: bool, sanitized: bool) -> Result<String> {
        let root = self.find_package_root(fq_name)?;

        let suffix = fq_name
            .package()
            .strip_prefix(&root.prefix)
            .unwrap_or_default()
            .trim_start_matches('.');

        let mut components: Vec<&str> = Vec::new();
        if !relative {
            components.push(root.path.trim_end_matches('/'));
        }
        components.extend(suffix.split('.').filter(|c| !c.is_empty()));

        let version = if sanitized {
            fq_name.sanitized_version()
        } else {
            fq_name.version_string()
        };
        components.push(&version);

        Ok(format!("{}/", components.join("/")))
    }

    /// The matched prefix as a path fragment: `android.hardware` ->
    /// `android/hardware/`.
    fn convert_package_root_to_path(&self, fq_name: &FQName) -> Result<String> {
        let prefix = self.package_root(fq_name)?;
        Ok(format!("{}/", prefix.replace('.', "/")))
    }

    /// Absolute form of `path`: unchanged if already absolute or no root
    /// path is set, otherwise resolved against the root path.
    pub fn make_absolute(&self, path: &str) -> String {
        if path.starts_with('/') || self.root_path.is_empty() {
            path.to_string()
        } else {
            format!("{}{}", self.root_path, path)
        }
    }

    /// Derive the output path for `file_name` per the location rules.
    pub fn get_filepath(
        &self,
        output_path: &str,
        fq_name: &FQName,
        location: Location,
        file_name: &str,
    ) -> Result<String> {
        let mut path = output_path.to_string();

        match location {
            Location::Direct => {}
            Location::PackageRoot => {
                path.push_str(&self.package_path(fq_name, false, false)?);
            }
            Location::GenOutput => {
                path.push_str(&self.convert_package_root_to_path(fq_name)?);
                path.push_str(&self.package_path(fq_name, true, false)?);
            }
            Location::GenSanitized => {
                path.push_str(&self.convert_package_root_to_path(fq_name)?);
                path.push_str(&self.package_path(fq_name, true, true)?);
            }
        }

        path.push_str(file_name);
        Ok(path)
    }

    /// Open `file_name` for writing at its derived location, creating
    /// parent directories. The returned formatter flushes on `finish()` and
    /// best-effort on drop.
    pub fn formatter(
        &self,
        output_path: &str,
        fq_name: &FQName,
        location: Location,
        file_name: &str,
    ) -> Result<Formatter> {
        let filepath = self.get_filepath(output_path, fq_name, location, file_name)?;
        tracing::debug!("file access {} w", filepath);

        let path = PathBuf::from(&filepath);
        if let Some(parent) = path.parent() {
            fs::ensure_dir(parent)?;
        }
        let file =
            File::create(&path).with_context(|| format!("could not open file {filepath}"))?;

        Ok(Formatter::to_file(file, path))
    }

    /// The on-disk `.hal` path for a fully-qualified name.
    pub fn hal_filepath(&self, fq_name: &FQName) -> Result<String> {
        let package_path = self.make_absolute(&self.package_path(fq_name, false, false)?);
        Ok(format!("{}{}.hal", package_path, fq_name.name()))
    }

    /// Parse the interface or types file named by `fq_name`, memoized.
    pub fn parse(&self, fq_name: &FQName, enforcement: Enforce) -> Result<Rc<Ast>> {
        let mut parsed = Vec::new();
        self.parse_collecting(fq_name, &mut parsed, enforcement)
    }

    /// Like `parse`, also appending every AST parsed on behalf of this call
    /// (including cache hits) to `parsed`.
    pub fn parse_collecting(
        &self,
        fq_name: &FQName,
        parsed: &mut Vec<Rc<Ast>>,
        enforcement: Enforce,
    ) -> Result<Rc<Ast>> {
        if !fq_name.is_fully_qualified() {
            bail!("cannot parse `{fq_name}`: not a fully-qualified interface name");
        }

        {
            let cache = self.cache.borrow();
            match cache.get(fq_name) {
                Some(CacheEntry::Done(ast)) => {
                    let ast = ast.clone();
                    drop(cache);
                    collect(parsed, &ast);
                    return Ok(ast);
                }
                Some(CacheEntry::InFlight) => {
                    bail!("circular import chain involving {fq_name}");
                }
                Some(CacheEntry::Failed) => {
                    bail!("{fq_name} previously failed to parse");
                }
                None => {}
            }
        }

        self.cache
            .borrow_mut()
            .insert(fq_name.clone(), CacheEntry::InFlight);

        match self.parse_fresh(fq_name, parsed, enforcement) {
            Ok(ast) => Ok(ast),
            Err(e) => {
                self.cache
                    .borrow_mut()
                    .insert(fq_name.clone(), CacheEntry::Failed);
                Err(e)
            }
        }
    }

    fn parse_fresh(
        &self,
        fq_name: &FQName,
        parsed: &mut Vec<Rc<Ast>>,
        enforcement: Enforce,
    ) -> Result<Rc<Ast>> {
        // Any interface file implicitly imports its package's types.hal.
        // Imports are exempt from enforcement.
        if fq_name.name() != "types" {
            let types_name = fq_name.types_for_package();
            if Path::new(&self.hal_filepath(&types_name)?).exists() {
                self.parse_collecting(&types_name, parsed, Enforce::None)?;
            }
        }

        let path = self.hal_filepath(fq_name)?;
        tracing::debug!("file access {} r", path);

        let ast = Rc::new(parser::parse_file(Path::new(&path))?);

        if ast.package() != &fq_name.package_and_version() {
            bail!("file at '{path}' does not match expected package and/or version");
        }

        match ast.interface() {
            Some(iface) => {
                if fq_name.name() == "types" {
                    bail!(
                        "file at '{path}' declares an interface '{}' instead of the expected types common to the package",
                        iface.local_name()
                    );
                }
                if iface.local_name() != fq_name.name() {
                    bail!("file at '{path}' does not declare interface type '{}'", fq_name.name());
                }
            }
            None => {
                if fq_name.name() != "types" {
                    bail!(
                        "file at '{path}' declares types rather than the expected interface type '{}'",
                        fq_name.name()
                    );
                }
            }
        }

        self.cache
            .borrow_mut()
            .insert(fq_name.clone(), CacheEntry::Done(ast.clone()));
        collect(parsed, &ast);

        // Every parse re-checks the whole package once.
        self.enforce_restrictions_on_package(fq_name, enforcement)?;

        Ok(ast)
    }

    /// Parse only if the backing file exists; parse failures demote to a
    /// warning. Used when probing prior versions.
    fn try_parse_existing(&self, fq_name: &FQName) -> Option<Rc<Ast>> {
        let path = self.hal_filepath(fq_name).ok()?;
        if !Path::new(&path).exists() {
            return None;
        }
        match self.parse(fq_name, Enforce::Full) {
            Ok(ast) => Some(ast),
            Err(e) => {
                tracing::warn!("skipping {fq_name}: {e:#}");
                None
            }
        }
    }

    /// List the `.hal` file stems of a package directory: `types` first,
    /// remainder ascending.
    pub fn package_interface_files(&self, package: &FQName) -> Result<Vec<String>> {
        let package_path = self.make_absolute(&self.package_path(package, false, false)?);

        let entries = std::fs::read_dir(&package_path).with_context(|| {
            format!("could not open package path {package_path} for package {package}")
        })?;

        let mut file_names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".hal") {
                file_names.push(stem.to_string());
            }
        }

        file_names.sort_by(|lhs, rhs| {
            if lhs == "types" {
                std::cmp::Ordering::Less
            } else if rhs == "types" {
                std::cmp::Ordering::Greater
            } else {
                lhs.cmp(rhs)
            }
        });

        Ok(file_names)
    }

    /// The interfaces defined by a package, in enumeration order.
    pub fn package_interfaces(&self, package: &FQName) -> Result<Vec<FQName>> {
        let mut interfaces = Vec::new();
        for file_name in self.package_interface_files(package)? {
            let fq_name = FQName::parse(&format!(
                "{}{}::{}",
                package.package(),
                package.at_version(),
                file_name
            ))
            .map_err(|_| {
                anyhow!(
                    "invalid interface filename '{file_name}.hal' in package {}{}",
                    package.package(),
                    package.at_version()
                )
            })?;
            interfaces.push(fq_name);
        }
        Ok(interfaces)
    }

    /// True iff the package's only interface file is `types.hal`.
    pub fn is_types_only_package(&self, package: &FQName) -> Result<bool> {
        let interfaces = self.package_interfaces(package)?;
        Ok(interfaces.len() == 1 && interfaces[0].name() == "types")
    }

    /// The transitive closure of packages imported by `fq_name`, including
    /// the lower-versioned packages its interfaces inherit from.
    pub fn imported_packages_hierarchy(
        &self,
        fq_name: &FQName,
        out: &mut BTreeSet<FQName>,
    ) -> Result<()> {
        let ast = self.parse(fq_name, Enforce::Full)?;

        let mut todo = BTreeSet::new();
        ast.imported_packages(&mut todo);
        let mut todo: Vec<FQName> = todo.into_iter().collect();

        while let Some(package) = todo.pop() {
            if !out.insert(package.clone()) {
                continue;
            }
            for interface in self.package_interfaces(&package)? {
                let ast = self.parse(&interface, Enforce::Full)?;
                let mut direct = BTreeSet::new();
                ast.imported_packages(&mut direct);
                for import in direct {
                    if !out.contains(&import) {
                        todo.push(import);
                    }
                }
            }
        }

        Ok(())
    }

    /// Run the package-level restrictions for the package containing
    /// `fq_name`: minor-version uprev rules, then the hash gate. Memoized
    /// per package.
    pub fn enforce_restrictions_on_package(
        &self,
        fq_name: &FQName,
        enforcement: Enforce,
    ) -> Result<()> {
        if enforcement == Enforce::None {
            return Ok(());
        }

        let package = fq_name.package_and_version();
        if self.enforced.borrow().contains(&package) {
            return Ok(());
        }

        self.enforce_minor_version_uprevs(&package)?;

        if enforcement != Enforce::NoHash {
            self.enforce_hashes(&package)?;
        }

        self.enforced.borrow_mut().insert(package);
        Ok(())
    }

    /// `pkg@x.y` with `y > 0` must sit directly on `pkg@x.(y-1)`, and at
    /// least one interface must extend an interface of that package.
    fn enforce_minor_version_uprevs(&self, current: &FQName) -> Result<()> {
        if current.minor() == 0 {
            return Ok(());
        }

        let mut prev = current.clone();
        let mut has_prev = false;
        while prev.minor() > 0 {
            prev = prev.down_rev();
            let prev_path = self.make_absolute(&self.package_path(&prev, false, false)?);
            if Path::new(&prev_path).is_dir() {
                has_prev = true;
                break;
            }
        }
        if !has_prev {
            return Ok(());
        }

        if prev != current.down_rev() {
            bail!(
                "cannot enforce minor version uprevs for {current}: found package {prev} but missing {}; you cannot skip a minor version",
                current.down_rev()
            );
        }

        if self.is_types_only_package(&prev)? {
            // A types-only package can be extended in any way.
            return Ok(());
        }

        let mut extended_interface = false;
        for current_fq in self.package_interfaces(current)? {
            if current_fq.name() == "types" {
                continue;
            }

            let ast = match self.parse(&current_fq, Enforce::Full) {
                Ok(ast) => ast,
                Err(e) => {
                    tracing::warn!(
                        "skipping {current_fq}: it could not be parsed or {current} doesn't pass all requirements: {e:#}"
                    );
                    continue;
                }
            };
            let iface = match ast.interface() {
                Some(iface) => iface,
                None => continue,
            };

            let super_iface = match iface.super_iface() {
                Some(super_iface) => super_iface,
                None => {
                    // Only IBase may lack a superinterface.
                    assert_eq!(
                        iface.fq_name(),
                        &*IBASE,
                        "{} has no superinterface but is not IBase",
                        iface.fq_name()
                    );
                    continue;
                }
            };

            let mut last_fq = prev.with_name(current_fq.name());
            let mut last_ast = self.try_parse_existing(&last_fq);
            while last_fq.minor() > 0 && last_ast.as_ref().is_none_or(|a| a.interface().is_none()) {
                last_fq = last_fq.down_rev();
                last_ast = self.try_parse_existing(&last_fq);
            }

            let last_exists = last_ast.is_some_and(|a| a.interface().is_some());

            if last_exists && super_iface != &last_fq {
                bail!(
                    "cannot enforce minor version uprevs for {current}: {} extends {super_iface}, which is not allowed. It must extend {last_fq}",
                    iface.fq_name()
                );
            }

            // At least one interface must extend the previous version.
            if last_fq.package_and_version() == prev.package_and_version() {
                extended_interface = true;
            }

            tracing::debug!("minor version uprev check: {current_fq} passes");
        }

        if !extended_interface {
            bail!(
                "{current} doesn't pass minor version uprev requirement. Requires at least one interface to extend an interface with the same name from {prev}."
            );
        }

        Ok(())
    }

    /// Every frozen interface of the package must hash to a recorded digest.
    fn enforce_hashes(&self, package: &FQName) -> Result<()> {
        for fq_name in self.package_interfaces(package)? {
            let ast = self.parse(&fq_name, Enforce::Full)?;

            let hash_path = format!(
                "{}/current.txt",
                self.make_absolute(self.package_root_path(&fq_name)?)
            );
            let manifest = self.manifest(&hash_path)?;

            let frozen = manifest.digests_for(&fq_name);
            if frozen.is_empty() {
                continue;
            }

            let current = sha256_file(ast.filename())?;
            if !frozen.iter().any(|digest| digest == &current) {
                bail!(
                    "{fq_name} has hash {current} which does not match hash {} on record. This interface has been frozen. Do not change it!",
                    frozen.join(", ")
                );
            }
        }

        Ok(())
    }

    fn manifest(&self, hash_path: &str) -> Result<Rc<HashManifest>> {
        if let Some(manifest) = self.manifests.borrow().get(hash_path) {
            return Ok(manifest.clone());
        }
        let manifest = Rc::new(HashManifest::load(Path::new(hash_path))?);
        self.manifests
            .borrow_mut()
            .insert(hash_path.to_string(), manifest.clone());
        Ok(manifest)
    }
}

fn collect(parsed: &mut Vec<Rc<Ast>>, ast: &Rc<Ast>) {
    if !parsed.iter().any(|seen| Rc::ptr_eq(seen, ast)) {
        parsed.push(ast.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fq(s: &str) -> FQName {
        FQName::parse(s).unwrap()
    }

    /// Write a `.hal` file under `<root>/<rel>` and return the tree root.
    fn write_hal(tmp: &TempDir, rel: &str, contents: &str) {
        let path = tmp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn coordinator(tmp: &TempDir) -> Coordinator {
        let mut coordinator = Coordinator::new();
        coordinator.set_root_path(&tmp.path().display().to_string());
        coordinator.add_package_path("test", "interfaces").unwrap();
        coordinator
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let mut coordinator = Coordinator::new();
        coordinator.add_package_path("a.b", "x").unwrap();
        assert!(coordinator.add_package_path("a.b", "y").is_err());
        // Nested prefixes are fine.
        coordinator.add_package_path("a", "z").unwrap();
    }

    #[test]
    fn test_default_package_path_does_not_override() {
        let mut coordinator = Coordinator::new();
        coordinator.add_package_path("a", "user").unwrap();
        coordinator.add_default_package_path("a", "default");
        assert_eq!(coordinator.package_root_path(&fq("a.b@1.0")).unwrap(), "user");
    }

    #[test]
    fn test_package_path_resolution() {
        let mut coordinator = Coordinator::new();
        coordinator.add_package_path("a", "X").unwrap();

        assert_eq!(
            coordinator.package_path(&fq("a.b@1.0"), false, false).unwrap(),
            "X/b/1.0/"
        );
        assert_eq!(
            coordinator.package_path(&fq("a.b@1.0"), true, false).unwrap(),
            "b/1.0/"
        );
        assert_eq!(
            coordinator.package_path(&fq("a.b@1.0"), true, true).unwrap(),
            "b/V1_0/"
        );
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut coordinator = Coordinator::new();
        coordinator.add_package_path("a", "P").unwrap();
        coordinator.add_package_path("a.b", "Q").unwrap();

        assert_eq!(
            coordinator.package_path(&fq("a.b@1.0"), false, false).unwrap(),
            "Q/1.0/"
        );
        assert_eq!(
            coordinator.package_path(&fq("a.c@1.0"), false, false).unwrap(),
            "P/c/1.0/"
        );
    }

    #[test]
    fn test_unmapped_package_fails() {
        let coordinator = Coordinator::new();
        assert!(coordinator.package_path(&fq("a.b@1.0"), false, false).is_err());
    }

    #[test]
    fn test_get_filepath_locations() {
        let mut coordinator = Coordinator::new();
        coordinator.add_package_path("a", "iface").unwrap();
        let name = fq("a.b@1.2");

        assert_eq!(
            coordinator
                .get_filepath("out/", &name, Location::Direct, "f.txt")
                .unwrap(),
            "out/f.txt"
        );
        assert_eq!(
            coordinator
                .get_filepath("out/", &name, Location::PackageRoot, "Android.bp")
                .unwrap(),
            "out/iface/b/1.2/Android.bp"
        );
        assert_eq!(
            coordinator
                .get_filepath("out/", &name, Location::GenOutput, "types.cpp")
                .unwrap(),
            "out/a/b/1.2/types.cpp"
        );
        assert_eq!(
            coordinator
                .get_filepath("out/", &name, Location::GenSanitized, "IFoo.java")
                .unwrap(),
            "out/a/b/V1_2/IFoo.java"
        );
    }

    #[test]
    fn test_enumeration_order_types_first() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IZoo.hal", "package test.pkg@1.0;\ninterface IZoo {};\n");
        write_hal(&tmp, "interfaces/pkg/1.0/types.hal", "package test.pkg@1.0;\n");
        write_hal(&tmp, "interfaces/pkg/1.0/IAaa.hal", "package test.pkg@1.0;\ninterface IAaa {};\n");

        let coordinator = coordinator(&tmp);
        let files = coordinator
            .package_interface_files(&fq("test.pkg@1.0"))
            .unwrap();
        assert_eq!(files, vec!["types", "IAaa", "IZoo"]);

        let interfaces = coordinator.package_interfaces(&fq("test.pkg@1.0")).unwrap();
        assert_eq!(interfaces[0].to_string(), "test.pkg@1.0::types");
    }

    #[test]
    fn test_types_only_package() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/types.hal", "package test.pkg@1.0;\n");

        let coordinator = coordinator(&tmp);
        assert!(coordinator.is_types_only_package(&fq("test.pkg@1.0")).unwrap());

        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");
        assert!(!coordinator.is_types_only_package(&fq("test.pkg@1.0")).unwrap());
    }

    #[test]
    fn test_parse_caches() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");

        let coordinator = coordinator(&tmp);
        let first = coordinator.parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full).unwrap();
        let second = coordinator.parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parse_rejects_package_mismatch() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.other@1.0;\ninterface IFoo {};\n");

        let coordinator = coordinator(&tmp);
        let err = coordinator
            .parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full)
            .unwrap_err();
        assert!(err.to_string().contains("does not match expected package"));
    }

    #[test]
    fn test_parse_rejects_wrong_interface_name() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IBar {};\n");

        let coordinator = coordinator(&tmp);
        let err = coordinator
            .parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full)
            .unwrap_err();
        assert!(err.to_string().contains("does not declare interface type 'IFoo'"));
    }

    #[test]
    fn test_interface_implicitly_parses_types() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/types.hal", "package test.pkg@1.0;\nenum E : int32_t { A, };\n");
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");

        let coordinator = coordinator(&tmp);
        let mut parsed = Vec::new();
        coordinator
            .parse_collecting(&fq("test.pkg@1.0::IFoo"), &mut parsed, Enforce::Full)
            .unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_hash_gate() {
        let tmp = TempDir::new().unwrap();
        let source = "package test.pkg@1.0;\ninterface IFoo {};\n";
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", source);

        // Freeze with the wrong digest.
        write_hal(
            &tmp,
            "interfaces/current.txt",
            &format!("{} test.pkg@1.0::IFoo\n", "a".repeat(64)),
        );

        let coordinator = coordinator(&tmp);
        let err = coordinator
            .parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("has hash"));
        assert!(message.contains(&"a".repeat(64)));
        assert!(message.contains("frozen"));
    }

    #[test]
    fn test_hash_gate_accepts_matching_digest() {
        let tmp = TempDir::new().unwrap();
        let source = "package test.pkg@1.0;\ninterface IFoo {};\n";
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", source);
        write_hal(
            &tmp,
            "interfaces/current.txt",
            &format!(
                "{} test.pkg@1.0::IFoo\n",
                crate::util::hash::sha256_bytes(source.as_bytes())
            ),
        );

        let coordinator = coordinator(&tmp);
        assert!(coordinator.parse(&fq("test.pkg@1.0::IFoo"), Enforce::Full).is_ok());
    }

    #[test]
    fn test_hash_gate_skipped_with_no_hash() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");
        write_hal(
            &tmp,
            "interfaces/current.txt",
            &format!("{} test.pkg@1.0::IFoo\n", "a".repeat(64)),
        );

        let coordinator = coordinator(&tmp);
        assert!(coordinator.parse(&fq("test.pkg@1.0::IFoo"), Enforce::NoHash).is_ok());
    }

    #[test]
    fn test_hierarchy_includes_prior_version() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");
        write_hal(
            &tmp,
            "interfaces/pkg/1.1/IFoo.hal",
            "package test.pkg@1.1;\nimport test.pkg@1.0::IFoo;\ninterface IFoo extends @1.0::IFoo {};\n",
        );
        // The implicit IBase superinterface pulls the base package into the
        // closure, so the walk needs it on disk like any other import.
        write_hal(
            &tmp,
            "transport/base/1.0/IBase.hal",
            "package android.hidl.base@1.0;\ninterface IBase {};\n",
        );

        let mut coordinator = coordinator(&tmp);
        coordinator
            .add_package_path("android.hidl", "transport")
            .unwrap();

        let mut hierarchy = BTreeSet::new();
        coordinator
            .imported_packages_hierarchy(&fq("test.pkg@1.1::IFoo"), &mut hierarchy)
            .unwrap();
        assert!(hierarchy.contains(&fq("test.pkg@1.0")));
        assert!(hierarchy.contains(&fq("android.hidl.base@1.0")));
    }

    #[test]
    fn test_minor_uprev_requires_extension() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");
        // @1.1 exists but IFoo does not extend @1.0::IFoo.
        write_hal(&tmp, "interfaces/pkg/1.1/IFoo.hal", "package test.pkg@1.1;\ninterface IFoo {};\n");

        let coordinator = coordinator(&tmp);
        let err = coordinator
            .parse(&fq("test.pkg@1.1::IFoo"), Enforce::Full)
            .unwrap_err();
        assert!(format!("{err:#}").contains("minor version uprev"));
    }

    #[test]
    fn test_minor_uprev_passes_for_proper_extension() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/IFoo.hal", "package test.pkg@1.0;\ninterface IFoo {};\n");
        write_hal(
            &tmp,
            "interfaces/pkg/1.1/IFoo.hal",
            "package test.pkg@1.1;\nimport test.pkg@1.0::IFoo;\ninterface IFoo extends @1.0::IFoo {};\n",
        );

        let coordinator = coordinator(&tmp);
        assert!(coordinator.parse(&fq("test.pkg@1.1::IFoo"), Enforce::Full).is_ok());
    }

    #[test]
    fn test_minor_uprev_allows_types_only_prev() {
        let tmp = TempDir::new().unwrap();
        write_hal(&tmp, "interfaces/pkg/1.0/types.hal", "package test.pkg@1.0;\n");
        write_hal(&tmp, "interfaces/pkg/1.1/IFoo.hal", "package test.pkg@1.1;\ninterface IFoo {};\n");

        let coordinator = coordinator(&tmp);
        assert!(coordinator.parse(&fq("test.pkg@1.1::IFoo"), Enforce::Full).is_ok());
    }
}
