//! End-to-end scans with real TOML rule files
//!
//! These tests drive `ScanOrchestrator` with `TomlEngine` and verify the
//! namespace and outcome guarantees of the scan stream.

use sigscan_core::{
    CompiledRules, Error, ExternalContext, Outcome, RuleSource, ScanOptions, ScanOrchestrator,
    ScanRecord,
};
use sigscan_rule_engine::TomlEngine;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PE_RULES: &str = r#"
[[rules]]
name = "pe_header"
tags = ["pe"]

[[rules.strings]]
id = "mz"
hex = "4D 5A"

[[rules]]
name = "suspicious"
[[rules.strings]]
id = "cmd"
text = "cmd.exe"
nocase = true
"#;

const SCRIPT_RULES: &str = r#"
[[rules]]
name = "suspicious"
[[rules.strings]]
id = "ps"
text = "powershell"
nocase = true
"#;

fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn sources(paths: &[&PathBuf]) -> Vec<RuleSource> {
    paths.iter().map(|p| RuleSource::new(p.as_path())).collect()
}

fn scan_all(
    sources: Vec<RuleSource>,
    targets: Vec<PathBuf>,
) -> sigscan_core::Result<Vec<ScanRecord>> {
    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let options = ScanOptions {
        sources,
        ..Default::default()
    };
    orchestrator.scan(targets, options)?.collect()
}

#[test]
fn test_namespaces_equal_distinct_locations() {
    let temp = TempDir::new().unwrap();
    let pe = write(temp.path(), "pe.toml", PE_RULES.as_bytes());
    let scripts = write(temp.path(), "scripts.toml", SCRIPT_RULES.as_bytes());

    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let compilation = orchestrator
        .compile(&sources(&[&pe, &scripts, &pe]), &ExternalContext::new())
        .unwrap();

    assert!(compilation.diagnostics.is_empty());
    let rules = compilation.rules.unwrap();
    assert_eq!(
        rules.namespaces(),
        vec![
            pe.to_string_lossy().into_owned(),
            scripts.to_string_lossy().into_owned()
        ]
    );
    assert_eq!(rules.rule_count(), 3);
}

#[test]
fn test_empty_sources_raise_before_yielding() {
    let result = scan_all(vec![], vec![PathBuf::from("/nonexistent")]);
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[test]
fn test_same_rule_name_in_two_namespaces() {
    let temp = TempDir::new().unwrap();
    let pe = write(temp.path(), "pe.toml", PE_RULES.as_bytes());
    let scripts = write(temp.path(), "scripts.toml", SCRIPT_RULES.as_bytes());
    let target = write(
        temp.path(),
        "dropper.bin",
        b"MZ\x90\x00 start CMD.EXE /c powershell -enc",
    );

    let records = scan_all(sources(&[&pe, &scripts]), vec![target.clone()]).unwrap();

    let pe_ns = pe.to_string_lossy().into_owned();
    let scripts_ns = scripts.to_string_lossy().into_owned();
    let pairs: Vec<_> = records
        .iter()
        .map(|r| (r.outcome.rule().unwrap(), r.outcome.namespace().unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("pe_header", pe_ns.as_str()),
            ("suspicious", pe_ns.as_str()),
            ("suspicious", scripts_ns.as_str()),
        ]
    );
    assert!(records.iter().all(|r| r.path == target));

    let Outcome::Hit(hit) = &records[1].outcome else {
        panic!("expected a hit");
    };
    assert_eq!(hit.strings[0].identifier, "$cmd");
    assert_eq!(hit.strings[0].offset, 11);
    assert_eq!(hit.strings[0].data, b"CMD.EXE");
}

#[test]
fn test_clean_file_yields_single_no_hit() {
    let temp = TempDir::new().unwrap();
    let pe = write(temp.path(), "pe.toml", PE_RULES.as_bytes());
    let target = write(temp.path(), "notes.txt", b"just some notes");

    let records = scan_all(sources(&[&pe]), vec![target.clone()]).unwrap();
    assert_eq!(
        records,
        vec![ScanRecord {
            outcome: Outcome::NoHit,
            path: target
        }]
    );
}

#[test]
fn test_directory_of_clean_files() {
    let temp = TempDir::new().unwrap();
    let pe = write(temp.path(), "pe.toml", PE_RULES.as_bytes());
    let root = temp.path().join("evidence");
    let names = ["a.txt", "b.log", "sub/c.csv", "sub/deeper/d", "e"];
    for name in names {
        write(&root, name, b"nothing to see");
    }

    let records = scan_all(sources(&[&pe]), vec![root.clone()]).unwrap();
    assert_eq!(records.len(), names.len());
    assert!(records.iter().all(|r| r.outcome == Outcome::NoHit));

    let mut seen: Vec<_> = records.into_iter().map(|r| r.path).collect();
    seen.sort();
    let mut expected: Vec<_> = names.iter().map(|n| root.join(n)).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn test_warning_escalation_and_tolerance() {
    let temp = TempDir::new().unwrap();
    let noisy = write(
        temp.path(),
        "noisy.toml",
        br#"
[[rules]]
name = "catch_all"
"#,
    );
    let target = write(temp.path(), "any.bin", b"\x00\x01");

    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let strict = orchestrator.scan(
        vec![target.clone()],
        ScanOptions {
            sources: sources(&[&noisy]),
            escalate_warnings: true,
            ..Default::default()
        },
    );
    match strict {
        Err(Error::Warnings { warnings }) => {
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].message().contains("catch_all"));
        }
        Err(other) => panic!("expected warnings error, got {other:?}"),
        Ok(_) => panic!("expected warnings error"),
    }

    let mut lenient = orchestrator
        .scan(
            vec![target],
            ScanOptions {
                sources: sources(&[&noisy]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(lenient.diagnostics().len(), 1);
    let record = lenient.next().unwrap().unwrap();
    assert_eq!(record.outcome.rule(), Some("catch_all"));
}

#[test]
fn test_syntax_error_is_compile_error() {
    let temp = TempDir::new().unwrap();
    let broken = write(
        temp.path(),
        "broken.toml",
        br#"
[[rules]]
name = "bad_hex"
[[rules.strings]]
id = "x"
hex = "4D 5"
"#,
    );

    let result = scan_all(sources(&[&broken]), vec![PathBuf::from("/nonexistent")]);
    match result {
        Err(Error::Compile { sources, source }) => {
            assert_eq!(sources, vec![broken.to_string_lossy().into_owned()]);
            assert!(source.to_string().contains("odd number of digits"));
        }
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn test_external_conditions_use_file_context() {
    let temp = TempDir::new().unwrap();
    let rules = write(
        temp.path(),
        "ext.toml",
        br#"
[[rules]]
name = "installer"
[[rules.strings]]
id = "mz"
hex = "4D 5A"
[rules.condition.externals]
extension = ".exe"
environment = "prod"
"#,
    );
    let exe = write(temp.path(), "setup.exe", b"MZ....");
    let dll = write(temp.path(), "helper.dll", b"MZ....");

    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let externals: ExternalContext = [("environment", "prod")].into_iter().collect();
    let records: Vec<_> = orchestrator
        .scan(
            vec![exe.clone(), dll.clone()],
            ScanOptions {
                sources: sources(&[&rules]),
                externals,
                ..Default::default()
            },
        )
        .unwrap()
        .collect::<sigscan_core::Result<_>>()
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, exe);
    assert_eq!(records[0].outcome.rule(), Some("installer"));
    assert_eq!(records[1].path, dll);
    assert_eq!(records[1].outcome, Outcome::NoHit);
}

#[test]
fn test_undefined_external_fails_compile() {
    let temp = TempDir::new().unwrap();
    let rules = write(
        temp.path(),
        "ext.toml",
        br#"
[[rules]]
name = "owned"
[rules.condition.externals]
owner = "soc"
"#,
    );

    let result = scan_all(sources(&[&rules]), vec![]);
    assert!(matches!(result, Err(Error::Compile { .. })));
}

#[test]
fn test_unreadable_target_ends_stream() {
    let temp = TempDir::new().unwrap();
    let pe = write(temp.path(), "pe.toml", PE_RULES.as_bytes());
    let good = write(temp.path(), "good.bin", b"MZ");
    let missing = temp.path().join("gone.bin");

    let orchestrator = ScanOrchestrator::new(TomlEngine::new());
    let mut results = orchestrator
        .scan(
            vec![good, missing.clone(), temp.path().join("never.bin")],
            ScanOptions {
                sources: sources(&[&pe]),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(results.next().unwrap().unwrap().outcome.is_hit());
    match results.next() {
        Some(Err(Error::Match { path, .. })) => assert_eq!(path, missing),
        other => panic!("expected match error, got {other:?}"),
    }
    assert!(results.next().is_none());
}
