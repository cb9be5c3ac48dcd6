//! Fully-qualified interface names - `package@major.minor::Name`.
//!
//! FQName is the identity currency of the whole tool: the coordinator keys
//! its caches on it, package roots are matched against it, and every
//! generated filename is derived from it.

use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;

/// The base interface every HIDL interface implicitly extends.
pub static IBASE: LazyLock<FQName> =
    LazyLock::new(|| FQName::parse("android.hidl.base@1.0::IBase").unwrap());

/// Error produced when a string does not form a valid FQName.
#[derive(Debug, Error)]
pub enum FqNameError {
    #[error("invalid fully-qualified name `{0}`: missing package")]
    MissingPackage(String),

    #[error("invalid fully-qualified name `{0}`: missing version")]
    MissingVersion(String),

    #[error("invalid fully-qualified name `{0}`: malformed version `{1}`")]
    BadVersion(String, String),

    #[error("invalid fully-qualified name `{0}`: bad identifier `{1}`")]
    BadIdentifier(String, String),
}

/// A fully-qualified name: `package@major.minor` optionally followed by
/// `::Name`, where `Name` may itself be dotted (`types.TopLevel`).
///
/// A valid FQName is either package-only (empty name) or fully qualified
/// (non-empty name); the version is always present. Ordering is
/// lexicographic on (package, major, minor, name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FQName {
    package: String,
    major: u32,
    minor: u32,
    name: String,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn valid_dotted(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

impl FQName {
    /// Parse `pkg(.pkg)*@MAJOR.MINOR(::name(.name)*)?`.
    pub fn parse(input: &str) -> Result<Self, FqNameError> {
        let bad = |what: &str| FqNameError::BadIdentifier(input.to_string(), what.to_string());

        let (left, name) = match input.split_once("::") {
            Some((left, name)) => (left, name),
            None => (input, ""),
        };

        let (package, version) = match left.split_once('@') {
            Some((package, version)) => (package, version),
            None => return Err(FqNameError::MissingVersion(input.to_string())),
        };

        if package.is_empty() {
            return Err(FqNameError::MissingPackage(input.to_string()));
        }
        if !valid_dotted(package) {
            return Err(bad(package));
        }

        let (major, minor) = version
            .split_once('.')
            .ok_or_else(|| FqNameError::BadVersion(input.to_string(), version.to_string()))?;
        let major: u32 = major
            .parse()
            .map_err(|_| FqNameError::BadVersion(input.to_string(), version.to_string()))?;
        let minor: u32 = minor
            .parse()
            .map_err(|_| FqNameError::BadVersion(input.to_string(), version.to_string()))?;

        if !name.is_empty() && !valid_dotted(name) {
            return Err(bad(name));
        }

        Ok(FQName {
            package: package.to_string(),
            major,
            minor,
            name: name.to_string(),
        })
    }

    /// The same package and version with a different local name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        FQName {
            package: self.package.clone(),
            major: self.major,
            minor: self.minor,
            name: name.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff this names an interface or type, not just a package.
    pub fn is_fully_qualified(&self) -> bool {
        !self.name.is_empty()
    }

    /// Component-wise package prefix test: `a.b.c@1.0` is in `a.b` and in
    /// `a.b.c`, but not in `a.bc`.
    pub fn in_package(&self, prefix: &str) -> bool {
        self.package == prefix
            || (self.package.len() > prefix.len()
                && self.package.starts_with(prefix)
                && self.package.as_bytes()[prefix.len()] == b'.')
    }

    /// `@major.minor`
    pub fn at_version(&self) -> String {
        format!("@{}.{}", self.major, self.minor)
    }

    /// `major.minor`
    pub fn version_string(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// `Vmajor_minor`, usable in Java package names and filesystem paths.
    pub fn sanitized_version(&self) -> String {
        format!("V{}_{}", self.major, self.minor)
    }

    /// The package-level types file of this package.
    pub fn types_for_package(&self) -> Self {
        self.with_name("types")
    }

    /// This name with the local name dropped.
    pub fn package_and_version(&self) -> Self {
        self.with_name("")
    }

    /// The previous minor version of this package.
    pub fn down_rev(&self) -> Self {
        assert!(self.minor > 0, "cannot down-rev {self}: minor version is 0");
        FQName {
            package: self.package.clone(),
            major: self.major,
            minor: self.minor - 1,
            name: self.name.clone(),
        }
    }

    /// True iff the local name follows the interface naming convention.
    pub fn is_interface_name(&self) -> bool {
        let mut chars = self.name.chars();
        chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
    }

    fn base_name(&self) -> &str {
        assert!(
            self.is_interface_name(),
            "{self} does not name an interface"
        );
        &self.name[1..]
    }

    /// `IFoo` -> `Foo`
    pub fn interface_base_name(&self) -> &str {
        self.base_name()
    }

    /// `IFoo` -> `IHwFoo`
    pub fn interface_hw_name(&self) -> String {
        format!("IHw{}", self.base_name())
    }

    /// `IFoo` -> `BnHwFoo`
    pub fn interface_stub_name(&self) -> String {
        format!("BnHw{}", self.base_name())
    }

    /// `IFoo` -> `BpHwFoo`
    pub fn interface_proxy_name(&self) -> String {
        format!("BpHw{}", self.base_name())
    }

    /// `IFoo` -> `BsFoo`
    pub fn interface_passthrough_name(&self) -> String {
        format!("Bs{}", self.base_name())
    }

    /// `IFoo` -> `IFooAdapter`
    pub fn interface_adapter_name(&self) -> String {
        format!("{}Adapter", self.name)
    }

    /// The adapter class as a name in this package.
    pub fn interface_adapter_fq_name(&self) -> Self {
        self.with_name(self.interface_adapter_name())
    }

    /// Dotted Java package: `a.b@1.2` -> `a.b.V1_2`.
    pub fn java_package(&self) -> String {
        format!("{}.{}", self.package, self.sanitized_version())
    }

    /// Fully-qualified C++ name: `::a::b::V1_2::IFoo`.
    pub fn cpp_name(&self) -> String {
        let mut out = String::new();
        for component in self.package.split('.') {
            out.push_str("::");
            out.push_str(component);
        }
        out.push_str("::");
        out.push_str(&self.sanitized_version());
        if !self.name.is_empty() {
            out.push_str("::");
            out.push_str(&self.name);
        }
        out
    }

    /// Underscore-joined identifier safe for include guards:
    /// `a.b@1.2` -> `a_b_V1_2`.
    pub fn token_name(&self) -> String {
        let mut parts: Vec<&str> = self.package.split('.').collect();
        let version = self.sanitized_version();
        parts.push(&version);
        let joined = parts.join("_");
        if self.name.is_empty() {
            joined
        } else {
            format!("{}_{}", joined, self.name.replace('.', "_"))
        }
    }
}

impl fmt::Display for FQName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}.{}", self.package, self.major, self.minor)?;
        if !self.name.is_empty() {
            write!(f, "::{}", self.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_only() {
        let fq = FQName::parse("android.hardware.nfc@1.0").unwrap();
        assert_eq!(fq.package(), "android.hardware.nfc");
        assert_eq!(fq.major(), 1);
        assert_eq!(fq.minor(), 0);
        assert!(!fq.is_fully_qualified());
        assert_eq!(fq.to_string(), "android.hardware.nfc@1.0");
    }

    #[test]
    fn test_parse_fully_qualified() {
        let fq = FQName::parse("android.hardware.nfc@1.0::INfc").unwrap();
        assert!(fq.is_fully_qualified());
        assert_eq!(fq.name(), "INfc");
        assert_eq!(fq.to_string(), "android.hardware.nfc@1.0::INfc");
    }

    #[test]
    fn test_parse_dotted_local_name() {
        let fq = FQName::parse("a.b@2.3::types.TopLevel").unwrap();
        assert_eq!(fq.name(), "types.TopLevel");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(FQName::parse("").is_err());
        assert!(FQName::parse("a.b").is_err());
        assert!(FQName::parse("@1.0").is_err());
        assert!(FQName::parse("a.b@1").is_err());
        assert!(FQName::parse("a.b@x.y").is_err());
        assert!(FQName::parse("a..b@1.0").is_err());
        assert!(FQName::parse("a.b@1.0::").is_err());
        assert!(FQName::parse("1a@1.0").is_err());
    }

    #[test]
    fn test_round_trip() {
        for s in [
            "a@0.0",
            "a.b.c@10.2",
            "a.b@1.0::IFoo",
            "a.b@1.0::types.Inner",
        ] {
            assert_eq!(FQName::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_in_package() {
        let fq = FQName::parse("a.b.c@1.0::IFoo").unwrap();
        assert!(fq.in_package("a"));
        assert!(fq.in_package("a.b"));
        assert!(fq.in_package("a.b.c"));
        assert!(!fq.in_package("a.bc"));
        assert!(!fq.in_package("a.b.c.d"));
        assert!(!fq.in_package("b"));
    }

    #[test]
    fn test_interface_derivations() {
        let fq = FQName::parse("a.b@1.2::IFoo").unwrap();
        assert_eq!(fq.interface_base_name(), "Foo");
        assert_eq!(fq.interface_hw_name(), "IHwFoo");
        assert_eq!(fq.interface_stub_name(), "BnHwFoo");
        assert_eq!(fq.interface_proxy_name(), "BpHwFoo");
        assert_eq!(fq.interface_passthrough_name(), "BsFoo");
        assert_eq!(fq.interface_adapter_name(), "IFooAdapter");
        assert_eq!(
            fq.interface_adapter_fq_name().to_string(),
            "a.b@1.2::IFooAdapter"
        );
    }

    #[test]
    fn test_package_derivations() {
        let fq = FQName::parse("a.b@1.2::IFoo").unwrap();
        assert_eq!(fq.types_for_package().to_string(), "a.b@1.2::types");
        assert_eq!(fq.package_and_version().to_string(), "a.b@1.2");
        assert_eq!(fq.java_package(), "a.b.V1_2");
        assert_eq!(fq.sanitized_version(), "V1_2");
        assert_eq!(fq.token_name(), "a_b_V1_2_IFoo");
        assert_eq!(fq.package_and_version().token_name(), "a_b_V1_2");
        assert_eq!(fq.cpp_name(), "::a::b::V1_2::IFoo");
        assert_eq!(fq.at_version(), "@1.2");
    }

    #[test]
    fn test_down_rev() {
        let fq = FQName::parse("a.b@2.2").unwrap();
        assert_eq!(fq.down_rev().to_string(), "a.b@2.1");
    }

    #[test]
    fn test_ordering() {
        let mut names = vec![
            FQName::parse("b.a@1.0").unwrap(),
            FQName::parse("a.b@1.1").unwrap(),
            FQName::parse("a.b@1.0::IZoo").unwrap(),
            FQName::parse("a.b@1.0::IBar").unwrap(),
        ];
        names.sort();
        let strings: Vec<String> = names.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            strings,
            vec!["a.b@1.0::IBar", "a.b@1.0::IZoo", "a.b@1.1", "b.a@1.0"]
        );
    }

    #[test]
    fn test_is_interface_name() {
        assert!(FQName::parse("a@1.0::IFoo").unwrap().is_interface_name());
        assert!(!FQName::parse("a@1.0::types").unwrap().is_interface_name());
        assert!(!FQName::parse("a@1.0::Ifoo").unwrap().is_interface_name());
        assert!(!FQName::parse("a@1.0").unwrap().is_interface_name());
    }
}
