use std::io::Write;

use lanec::ast::build::*;
use lanec::config::{TARGET_ENV, TargetConfig};
use lanec::diagnostics::{CompileError, DiagnosticKind, TypeErrorKind};
use lanec::typeck::types::Scalar;
use lanec::{check_program, check_program_from_env};

#[test]
fn presets() {
    let names: Vec<_> = TargetConfig::preset_names().collect();
    assert_eq!(names, vec!["sse4", "neon", "wasm-simd128", "avx2", "avx512"]);
    let avx512 = TargetConfig::preset("avx512").unwrap();
    assert_eq!(avx512.lane_width(Scalar::Float32), 16);
    assert_eq!(TargetConfig::preset("neon").unwrap().lane_width(Scalar::Int16), 8);
    assert_eq!(TargetConfig::default(), TargetConfig::preset("avx2").unwrap());
    assert!(TargetConfig::preset("mmx").is_none());
}

#[test]
fn load_custom_target_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[target]\nname = \"dsp\"\nregister_bits = 64").unwrap();
    let cfg = TargetConfig::load(file.path()).unwrap();
    assert_eq!(cfg.name, "dsp");
    assert_eq!(cfg.lane_width(Scalar::Int16), 4);

    let resolved = TargetConfig::resolve(file.path().to_str().unwrap()).unwrap();
    assert_eq!(resolved, cfg);
}

#[test]
fn bad_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target.toml");
    std::fs::write(&path, "[target]\nregister_bits = 96\n").unwrap();
    match TargetConfig::load(&path) {
        Err(CompileError::Config { path: Some(p), .. }) => assert_eq!(p, path),
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn missing_file_or_preset() {
    let err = TargetConfig::resolve("/nonexistent/lanec-target.toml").unwrap_err();
    assert!(err.to_string().contains("neither a target preset nor a config file"));
}

#[test]
fn acceptance_does_not_depend_on_target() {
    // 16 × int32 fills the widest register, whatever the native width is
    let p = program(vec![func("f", vec![param("v", varying_n("int32", 16))], None, vec![])]);
    for name in TargetConfig::preset_names() {
        let a = check_program(&p, TargetConfig::preset(name).unwrap());
        assert!(a.is_ok(), "rejected on {name}");
    }
    let p = program(vec![func("f", vec![param("v", varying_n("int64", 9))], None, vec![])]);
    for name in TargetConfig::preset_names() {
        let a = check_program(&p, TargetConfig::preset(name).unwrap());
        let kinds: Vec<_> = a.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Type(TypeErrorKind::ConstraintTooWide)], "on {name}");
    }
}

#[test]
fn target_from_environment() {
    let p = program(vec![func("f", vec![param("x", varying("int32"))], None, vec![])]);
    // SAFETY: the only test in this binary that touches the environment
    unsafe { std::env::set_var(TARGET_ENV, "sse4") };
    assert!(check_program_from_env(&p).unwrap().is_ok());
    assert_eq!(TargetConfig::from_env().unwrap().register_bits, 128);

    unsafe { std::env::set_var(TARGET_ENV, "not-a-target") };
    assert!(check_program_from_env(&p).is_err());
    unsafe { std::env::remove_var(TARGET_ENV) };
    assert_eq!(TargetConfig::from_env().unwrap(), TargetConfig::default());
}
