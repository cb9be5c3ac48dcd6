//! CLI integration tests for hidl-gen.
//!
//! These tests drive the compiled binary over small interface trees and
//! check the end-to-end scenarios: parse-only runs, hash printing, build
//! file planning, and the hash freeze gate.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the hidl-gen binary command.
fn hidl_gen() -> Command {
    let mut cmd = Command::cargo_bin("hidl-gen").unwrap();
    cmd.env_remove("ANDROID_BUILD_TOP");
    cmd
}

/// Create a temporary source tree.
fn temp_tree() -> TempDir {
    TempDir::new().unwrap()
}

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// The base package every interface implicitly extends, at its default
/// package root location.
fn write_base_package(root: &Path) {
    write_file(
        root,
        "system/libhidl/transport/base/1.0/IBase.hal",
        "package android.hidl.base@1.0;\ninterface IBase {};\n",
    );
}

// ============================================================================
// check / parse-only
// ============================================================================

#[test]
fn test_check_parses_without_writing_files() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {\n    ping() generates (int32_t pong);\n};\n",
    );

    hidl_gen()
        .args(["-L", "check"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // Parse-only: the package directory is untouched.
    let entries: Vec<_> = fs::read_dir(tmp.path().join("interfaces/foo/1.0"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_check_fails_on_syntax_error() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {\n    bogus(;\n};\n",
    );

    hidl_gen()
        .args(["-L", "check"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("IFoo.hal"));
}

#[test]
fn test_check_ignores_output_path() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    // NOT_NEEDED handlers clear -o; a bogus path must not matter.
    hidl_gen()
        .args(["-L", "check"])
        .args(["-o", "/nonexistent/output/dir"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .success();
}

// ============================================================================
// hash
// ============================================================================

#[test]
fn test_hash_prints_one_line_per_interface() {
    let tmp = temp_tree();
    let types_source = "package test.hal.foo@1.0;\nenum E : int32_t { A, };\n";
    write_file(tmp.path(), "interfaces/foo/1.0/types.hal", types_source);
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IBar.hal",
        "package test.hal.foo@1.0;\ninterface IBar {};\n",
    );

    let output = hidl_gen()
        .args(["-L", "hash"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);

    // Enumeration order: types first, remainder ascending.
    assert!(lines[0].ends_with(" test.hal.foo@1.0::types"));
    assert!(lines[1].ends_with(" test.hal.foo@1.0::IBar"));
    assert!(lines[2].ends_with(" test.hal.foo@1.0::IFoo"));

    // Each line is `<64-hex> <fqname>` and the digest is the file's.
    let expected = hidl_gen::util::hash::sha256_bytes(types_source.as_bytes());
    assert_eq!(lines[0], format!("{expected} test.hal.foo@1.0::types"));
    for line in &lines {
        let digest = line.split_whitespace().next().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// ============================================================================
// hash freeze gate
// ============================================================================

#[test]
fn test_frozen_interface_mismatch_fails_parse_but_not_hash() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );
    write_file(
        tmp.path(),
        "interfaces/current.txt",
        &format!("{} test.hal.foo@1.0::IFoo\n", "a".repeat(64)),
    );

    // Any format that parses the interface sees the mismatch.
    hidl_gen()
        .args(["-L", "check"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("a".repeat(64)))
        .stderr(predicate::str::contains("has hash"));

    // -Lhash opts out of the gate and prints the actual digest.
    hidl_gen()
        .args(["-L", "hash"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .success()
        .stdout(predicate::str::contains("test.hal.foo@1.0::IFoo"));
}

#[test]
fn test_frozen_interface_matching_digest_passes() {
    let tmp = temp_tree();
    let source = "package test.hal.foo@1.0;\ninterface IFoo {};\n";
    write_file(tmp.path(), "interfaces/foo/1.0/IFoo.hal", source);
    write_file(
        tmp.path(),
        "interfaces/current.txt",
        &format!(
            "{} test.hal.foo@1.0::IFoo\n",
            hidl_gen::util::hash::sha256_bytes(source.as_bytes())
        ),
    );

    hidl_gen()
        .args(["-L", "check"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .success();
}

// ============================================================================
// androidbp
// ============================================================================

#[test]
fn test_androidbp_types_only_package() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\n@export\nenum Color : uint32_t { RED = 1, GREEN, };\n",
    );

    hidl_gen()
        .args(["-L", "androidbp"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    // The build file lands in the source tree at the package directory.
    let bp = fs::read_to_string(tmp.path().join("interfaces/foo/1.0/Android.bp")).unwrap();

    assert!(bp.contains("name: \"test.hal.foo@1.0_hal\","));
    assert!(bp.contains("\"types.hal\","));
    assert!(bp.contains("name: \"test.hal.foo@1.0\","));
    assert!(bp.contains("name: \"test.hal.foo-V1.0-java\","));
    assert!(bp.contains("name: \"test.hal.foo-V1.0-java-constants\","));
    assert!(bp.contains("\"test/hal/foo/V1_0/Color.java\","));
    assert!(!bp.contains("-adapter"));
    assert!(bp.contains("// This package has no interfaces. Not creating versioning adapter."));
}

#[test]
fn test_androidbp_interface_package_with_prior_version() {
    let tmp = temp_tree();
    write_base_package(tmp.path());
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.1/IFoo.hal",
        "package test.hal.foo@1.1;\nimport test.hal.foo@1.0::IFoo;\ninterface IFoo extends @1.0::IFoo {};\n",
    );

    hidl_gen()
        .args(["-L", "androidbp"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.1")
        .assert()
        .success();

    let bp = fs::read_to_string(tmp.path().join("interfaces/foo/1.1/Android.bp")).unwrap();

    // The hierarchy pulls in the prior version as a library dependency and
    // as an adapter helper dependency.
    assert!(bp.contains("\"test.hal.foo@1.0\","));
    assert!(bp.contains("\"test.hal.foo@1.0-adapter-helper\","));
    assert!(bp.contains("name: \"test.hal.foo@1.1-adapter\","));
    assert!(bp.contains("name: \"test.hal.foo@1.1-adapter-helper\","));
    assert!(bp.contains("out: [\"main.cpp\"]"));
    // Generated filename schemas for IFoo.
    assert!(bp.contains("FooAll.cpp"));
    assert!(bp.contains("IHwFoo.h"));
    assert!(bp.contains("BnHwFoo.h"));
    assert!(bp.contains("BpHwFoo.h"));
    assert!(bp.contains("BsFoo.h"));
    // The -r flags are reconstructed for every involved root.
    assert!(bp.contains("-rtest.hal:interfaces"));
    assert!(bp.contains("-randroid.hidl:system/libhidl/transport"));
}

#[test]
fn test_androidbp_transport_package_skips_library() {
    let tmp = temp_tree();
    write_base_package(tmp.path());

    hidl_gen()
        .args(["-L", "androidbp"])
        .args(["-p", &tmp.path().display().to_string()])
        .arg("android.hidl.base@1.0")
        .assert()
        .success();

    let bp = fs::read_to_string(
        tmp.path()
            .join("system/libhidl/transport/base/1.0/Android.bp"),
    )
    .unwrap();

    assert!(bp.contains("// android.hidl.base@1.0 is exported from libhidltransport"));
    assert!(!bp.contains("name: \"android.hidl.base@1.0\",\n"));
    // The file-group and gen rules are still emitted.
    assert!(bp.contains("name: \"android.hidl.base@1.0_hal\","));
    assert!(bp.contains("name: \"android.hidl.base@1.0_genc++\","));
}

#[test]
fn test_androidbp_is_deterministic() {
    let tmp = temp_tree();
    write_base_package(tmp.path());
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nenum E : int32_t { A, };\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    let run = || {
        hidl_gen()
            .args(["-L", "androidbp"])
            .args(["-p", &tmp.path().display().to_string()])
            .args(["-r", "test.hal:interfaces"])
            .arg("test.hal.foo@1.0")
            .assert()
            .success();
        fs::read_to_string(tmp.path().join("interfaces/foo/1.0/Android.bp")).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn test_androidbp_rejects_fully_qualified_name() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    hidl_gen()
        .args(["-L", "androidbp"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("package name and version"));
}

// ============================================================================
// androidbp-impl
// ============================================================================

#[test]
fn test_androidbp_impl_skeleton() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    let out_dir = tmp.path().join("impl");

    hidl_gen()
        .args(["-L", "androidbp-impl"])
        .args(["-o", &out_dir.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    let bp = fs::read_to_string(out_dir.join("Android.bp")).unwrap();
    assert!(bp.contains("cc_library_shared {"));
    assert!(bp.contains("name: \"test.hal.foo@1.0-impl\","));
    assert!(bp.contains("\"Foo.cpp\","));
}

// ============================================================================
// source generation
// ============================================================================

#[test]
fn test_cpp_headers_for_package() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nstruct Point { int32_t x; int32_t y; };\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {\n    move(Point p) generates (Point q);\n};\n",
    );

    let out_dir = tmp.path().join("out");

    hidl_gen()
        .args(["-L", "c++-headers"])
        .args(["-o", &out_dir.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    let gen_dir = out_dir.join("test/hal/foo/1.0");
    for header in ["types.h", "hwtypes.h", "IFoo.h", "IHwFoo.h", "BnHwFoo.h", "BpHwFoo.h", "BsFoo.h"] {
        assert!(gen_dir.join(header).exists(), "missing {header}");
    }

    let iface = fs::read_to_string(gen_dir.join("IFoo.h")).unwrap();
    assert!(iface.contains("HIDL_GENERATED_TEST_HAL_FOO_V1_0_IFOO_H_"));
    assert!(iface.contains("namespace V1_0 {"));
    assert!(iface.contains("struct IFoo"));
}

#[test]
fn test_cpp_sources_for_package() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nstruct Point { int32_t x; int32_t y; };\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    let out_dir = tmp.path().join("out");

    hidl_gen()
        .args(["-L", "c++-sources"])
        .args(["-o", &out_dir.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    let gen_dir = out_dir.join("test/hal/foo/1.0");
    assert!(gen_dir.join("types.cpp").exists());
    assert!(gen_dir.join("FooAll.cpp").exists());
}

#[test]
fn test_java_limited_to_one_type() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nenum Color : uint32_t { RED = 1, GREEN, };\nenum Shape : uint32_t { CIRCLE, };\n",
    );

    let out_dir = tmp.path().join("out");

    hidl_gen()
        .args(["-L", "java"])
        .args(["-o", &out_dir.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::types.Color")
        .assert()
        .success();

    let gen_dir = out_dir.join("test/hal/foo/V1_0");
    assert!(gen_dir.join("Color.java").exists());
    assert!(!gen_dir.join("Shape.java").exists());

    let java = fs::read_to_string(gen_dir.join("Color.java")).unwrap();
    assert!(java.contains("package test.hal.foo.V1_0;"));
    assert!(java.contains("public static final int RED = 1;"));
    assert!(java.contains("public static final int GREEN = RED + 1;"));
}

#[test]
fn test_dotted_name_rejected_outside_java() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nenum Color : uint32_t { RED, };\n",
    );

    hidl_gen()
        .args(["-L", "c++-headers"])
        .args(["-o", &tmp.path().join("out").display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::types.Color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("-Ljava"));
}

#[test]
fn test_adapter_main_for_package() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IBar.hal",
        "package test.hal.foo@1.0;\ninterface IBar {};\n",
    );

    let out_dir = tmp.path().join("out");

    hidl_gen()
        .args(["-L", "c++-adapter-main"])
        .args(["-o", &out_dir.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    let main_cpp = fs::read_to_string(out_dir.join("main.cpp")).unwrap();
    assert!(main_cpp.contains("#include <hidladapter/HidlBinderAdapter.h>"));
    assert!(main_cpp.contains("adapterMain<"));
    assert!(main_cpp.contains("::test::hal::foo::V1_0::IBarAdapter,"));
    assert!(main_cpp.contains("::test::hal::foo::V1_0::IFooAdapter"));
    assert!(main_cpp.contains("(\"test.hal.foo@1.0\", argc, argv);"));
}

#[test]
fn test_export_header_with_exported_types() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\n@export\nenum Color : uint32_t { RED = 1, };\n",
    );

    let header = tmp.path().join("out/exported.h");

    hidl_gen()
        .args(["-L", "export-header"])
        .args(["-o", &header.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    let text = fs::read_to_string(&header).unwrap();
    assert!(text.contains("HIDL_GENERATED_TEST_HAL_FOO_V1_0_EXPORTED_CONSTANTS_H_"));
    assert!(text.contains("RED = 1,"));
}

#[test]
fn test_export_header_without_exported_types_writes_nothing() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/types.hal",
        "package test.hal.foo@1.0;\nenum Color : uint32_t { RED, };\n",
    );

    let header = tmp.path().join("out/exported.h");

    hidl_gen()
        .args(["-L", "export-header"])
        .args(["-o", &header.display().to_string()])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0")
        .assert()
        .success();

    assert!(!header.exists());
}

// ============================================================================
// argument handling
// ============================================================================

#[test]
fn test_missing_language_fails() {
    hidl_gen()
        .arg("test.hal.foo@1.0")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_unknown_language_fails() {
    hidl_gen()
        .args(["-L", "fortran"])
        .arg("test.hal.foo@1.0")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unrecognized -L option"));
}

#[test]
fn test_missing_fqname_fails() {
    hidl_gen().args(["-L", "check"]).assert().failure().code(1);
}

#[test]
fn test_invalid_fqname_fails() {
    hidl_gen()
        .args(["-L", "check"])
        .arg("not-a-name")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid fully-qualified name"));
}

#[test]
fn test_test_flag_requires_androidbp() {
    hidl_gen()
        .args(["-L", "check", "-t"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("-Landroidbp only"));
}

#[test]
fn test_package_root_requires_colon() {
    hidl_gen()
        .args(["-L", "check"])
        .args(["-r", "test.hal"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must contain ':'"));
}

#[test]
fn test_duplicate_package_root_fails() {
    hidl_gen()
        .args(["-L", "check"])
        .args(["-r", "test.hal:a"])
        .args(["-r", "test.hal:b"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("duplicate package root"));
}

#[test]
fn test_needs_dir_requires_output_path() {
    hidl_gen()
        .args(["-L", "c++-headers"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires an output path"));
}

#[test]
fn test_root_path_defaults_to_android_build_top() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    let mut cmd = Command::cargo_bin("hidl-gen").unwrap();
    cmd.env("ANDROID_BUILD_TOP", tmp.path());
    cmd.args(["-L", "check"])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .assert()
        .success();
}

#[test]
fn test_multiple_fqnames_stop_on_first_failure() {
    let tmp = temp_tree();
    write_file(
        tmp.path(),
        "interfaces/foo/1.0/IFoo.hal",
        "package test.hal.foo@1.0;\ninterface IFoo {};\n",
    );

    // The second name does not exist; the run fails overall.
    hidl_gen()
        .args(["-L", "check"])
        .args(["-p", &tmp.path().display().to_string()])
        .args(["-r", "test.hal:interfaces"])
        .arg("test.hal.foo@1.0::IFoo")
        .arg("test.hal.foo@1.0::IMissing")
        .assert()
        .failure()
        .code(1);
}
