//! End-to-end generation runs against a scratch output root.

use op_codegen::codegen::annotated::ANNOTATED_FN_ARGS_FILE;
use op_codegen::codegen::bindings::PYTHON_FUNCTIONS_FILE;
use op_codegen::codegen::variable_type::VARIABLE_TYPE_FILE;
use op_codegen::codegen::wrappers::UNBOXING_WRAPPERS_FILE;
use op_codegen::{
    GenerateOptions, OperatorSelector, OutputDirs, Subset, generate_code, load_declarations,
    select,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;

const DECLARATIONS: &str = r#"
- name: add
  overload_name: Tensor
  schema_string: "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor"
  arguments:
    - { name: self, dynamic_type: Tensor }
    - { name: other, dynamic_type: Tensor }
    - { name: alpha, dynamic_type: Scalar, default: 1, kwarg_only: true }
  returns:
    - { dynamic_type: Tensor }
- name: add
  overload_name: Scalar
  schema_string: "aten::add.Scalar(Tensor self, Scalar other, Scalar alpha=1) -> Tensor"
  arguments:
    - { name: self, dynamic_type: Tensor }
    - { name: other, dynamic_type: Scalar }
    - { name: alpha, dynamic_type: Scalar, default: 1 }
  returns:
    - { dynamic_type: Tensor }
- name: sub
  schema_string: "aten::sub(Tensor self, Tensor other) -> Tensor"
  arguments:
    - { name: self, dynamic_type: Tensor }
    - { name: other, dynamic_type: Tensor }
  returns:
    - { dynamic_type: Tensor }
"#;

fn write_declarations(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("Declarations.yaml");
    fs::write(&path, DECLARATIONS).unwrap();
    path
}

fn options(root: &Path, subset: Option<Subset>) -> GenerateOptions {
    GenerateOptions {
        subset,
        install_dir: Some(root.to_path_buf()),
        disable_autograd: false,
        force_schema_registration: false,
    }
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn full_build_creates_and_populates_every_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");

    let dirs =
        generate_code(&decls, &OperatorSelector::unrestricted(), &options(&root, None)).unwrap();

    assert_eq!(dirs, OutputDirs::resolve(Some(root.as_path())));
    assert!(dirs.autograd.join(PYTHON_FUNCTIONS_FILE).is_file());
    assert!(dirs.autograd.join(VARIABLE_TYPE_FILE).is_file());
    assert!(dirs.jit.join(UNBOXING_WRAPPERS_FILE).is_file());
    assert!(dirs.python.join(ANNOTATED_FN_ARGS_FILE).is_file());
}

#[test]
fn empty_selection_still_creates_every_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");
    let selector = OperatorSelector::from_legacy_allow_list(Vec::<String>::new(), true, true);

    let dirs = generate_code(&decls, &selector, &options(&root, None)).unwrap();

    for d in dirs.all() {
        assert!(d.is_dir(), "{} missing", d.display());
    }
    let wrappers = read(&dirs.jit, UNBOXING_WRAPPERS_FILE);
    assert!(!wrappers.contains("Operator("));
    assert!(!read(&dirs.autograd, VARIABLE_TYPE_FILE).contains("m.impl("));
}

#[test]
fn subset_limits_the_passes_but_not_the_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");

    let dirs = generate_code(
        &decls,
        &OperatorSelector::unrestricted(),
        &options(&root, Some(Subset::Python)),
    )
    .unwrap();

    assert!(dirs.python.join(ANNOTATED_FN_ARGS_FILE).is_file());
    assert!(dirs.jit.is_dir());
    assert!(!dirs.jit.join(UNBOXING_WRAPPERS_FILE).exists());
    assert!(!dirs.autograd.join(PYTHON_FUNCTIONS_FILE).exists());
}

#[test]
fn forced_schema_registration_keeps_excluded_operator_as_schema_only() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");
    let selector = OperatorSelector::from_legacy_allow_list(["add", "mul"], true, true);

    let opts = GenerateOptions {
        force_schema_registration: true,
        ..options(&root, Some(Subset::Libtorch))
    };
    let dirs = generate_code(&decls, &selector, &opts).unwrap();
    let wrappers = read(&dirs.jit, UNBOXING_WRAPPERS_FILE);

    assert!(wrappers.contains("m.def(\"aten::sub(Tensor self, Tensor other) -> Tensor\");"));
    assert!(!wrappers.contains("at::sub("));
    assert_eq!(wrappers.matches("auto result_ = at::add(").count(), 2);
}

#[test]
fn disabled_autograd_skips_kernels_and_guards_wrappers() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");

    let opts = GenerateOptions {
        disable_autograd: true,
        ..options(&root, Some(Subset::Libtorch))
    };
    let dirs = generate_code(&decls, &OperatorSelector::unrestricted(), &opts).unwrap();

    assert!(!dirs.autograd.join(VARIABLE_TYPE_FILE).exists());
    let wrappers = read(&dirs.jit, UNBOXING_WRAPPERS_FILE);
    assert_eq!(wrappers.matches("AutoNonVariableTypeMode").count(), 3);
}

#[test]
fn root_only_profile_drops_training_kernels() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let list = tmp.path().join("root_op_list.yaml");
    fs::write(&list, "- aten::add.Tensor\n").unwrap();
    let selector = select::load_selector(Some(list.as_path()), &[]).unwrap();
    let root = tmp.path().join("out");

    let dirs = generate_code(&decls, &selector, &options(&root, Some(Subset::Libtorch))).unwrap();

    assert!(!read(&dirs.autograd, VARIABLE_TYPE_FILE).contains("m.impl("));
    let wrappers = read(&dirs.jit, UNBOXING_WRAPPERS_FILE);
    assert_eq!(wrappers.matches("AutoNonVariableTypeMode").count(), 2);
    assert!(!wrappers.contains("aten::sub"));
}

#[test]
fn rerun_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");
    let selector = OperatorSelector::from_legacy_allow_list(["add"], true, false);
    let opts = GenerateOptions {
        force_schema_registration: true,
        ..options(&root, None)
    };

    let dirs = generate_code(&decls, &selector, &opts).unwrap();
    let files = [
        dirs.autograd.join(PYTHON_FUNCTIONS_FILE),
        dirs.autograd.join(VARIABLE_TYPE_FILE),
        dirs.jit.join(UNBOXING_WRAPPERS_FILE),
        dirs.python.join(ANNOTATED_FN_ARGS_FILE),
    ];
    let first: Vec<String> = files.iter().map(|f| fs::read_to_string(f).unwrap()).collect();

    // Unrelated files survive.
    fs::write(dirs.jit.join("keep.txt"), "mine").unwrap();

    generate_code(&decls, &selector, &opts).unwrap();
    let second: Vec<String> = files.iter().map(|f| fs::read_to_string(f).unwrap()).collect();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(dirs.jit.join("keep.txt")).unwrap(), "mine");
}

#[test]
fn output_path_collision_fails_before_any_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = load_declarations(&write_declarations(tmp.path())).unwrap();
    let root = tmp.path().join("out");
    fs::create_dir_all(root.join("jit")).unwrap();
    fs::write(root.join("jit").join("generated"), "not a dir").unwrap();

    let err = generate_code(&decls, &OperatorSelector::unrestricted(), &options(&root, None))
        .unwrap_err();

    assert!(format!("{:#}", err).contains("is not a directory"));
    assert!(!root.join("autograd").exists());
}

#[test]
fn cli_runs_selected_subset_and_exits_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = write_declarations(tmp.path());
    let list = tmp.path().join("ops.yaml");
    fs::write(&list, "- aten::add.Tensor\n").unwrap();
    let root = tmp.path().join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_generate-code"))
        .arg("--declarations-path")
        .arg(&decls)
        .arg("--install-dir")
        .arg(&root)
        .args(["--subset", "libtorch", "--force-schema-registration"])
        .arg("--selected-op-list-path")
        .arg(&list)
        .status()
        .unwrap();

    assert!(status.success());
    let wrappers =
        fs::read_to_string(root.join("jit/generated").join(UNBOXING_WRAPPERS_FILE)).unwrap();
    assert!(wrappers.contains("m.def(\"aten::sub(Tensor self, Tensor other) -> Tensor\");"));
    assert!(!root.join(ANNOTATED_FN_ARGS_FILE).exists());
}

#[test]
fn cli_exits_non_zero_on_malformed_declarations() {
    let tmp = tempfile::tempdir().unwrap();
    let decls = tmp.path().join("Declarations.yaml");
    fs::write(
        &decls,
        "- { name: add, schema_string: \"aten::mul(Tensor self) -> Tensor\" }\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_generate-code"))
        .arg("--declarations-path")
        .arg(&decls)
        .arg("--install-dir")
        .arg(tmp.path().join("out"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("disagrees with its schema"));
}
