//! Exit behaviour of the `mutscan` binary. None of these tests load a model:
//! every run fails, or stops, before the first download.
use assert_cmd::Command;
use mutscan_test_data::{TestFile, EXAMPLE_SEQUENCE};
use std::fs;

fn mutscan(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mutscan").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn stderr_of(cmd: &mut Command) -> String {
    let output = cmd.assert().failure().get_output().clone();
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = mutscan(&dir).arg("--help").assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("models"));

    let output = mutscan(&dir).args(["scan", "--help"]).assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--model-location", "--dms-mutation", "--scoring-strategy", "--msa-path"] {
        assert!(stdout.contains(flag), "missing {}", flag);
    }
}

#[test]
fn test_models_lists_hub_names() {
    let dir = tempfile::tempdir().unwrap();
    let output = mutscan(&dir).arg("models").assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("amplify-120m"));
    assert!(stdout.contains("esm2-t6-8m"));
}

#[test]
fn test_unknown_model_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args(["scan", "-m", "esm1b", "--sequence", "ACD"]));
    assert!(stderr.contains("unknown model"));
}

#[test]
fn test_conflicting_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "esm2-t6-8m",
        "--sequence",
        "ACD",
        "--dms-mutation",
        "A1C",
        "--dms-indel",
        "AC,1",
    ]));
    assert!(stderr.contains("conflicting inputs"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_repeated_model_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "esm2-t6-8m",
        "ESM2-T6-8M",
        "--sequence",
        "ACD",
    ]));
    assert!(stderr.contains("listed more than once"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args(["scan", "-m", "esm2-t6-8m", "--sequence", "AXZ"]));
    assert!(stderr.contains("outside ACDEFGHIKLMNPQRSTVWY"));
}

#[test]
fn test_wild_type_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "esm2-t6-8m",
        "--sequence",
        "GCD",
        "--dms-mutation",
        "A1C",
    ]));
    assert!(stderr.contains("lists wild type 'A'"));
}

#[test]
fn test_indel_list_with_point_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "esm2-t6-8m",
        "--sequence",
        "ACD",
        "--dms-indel",
        "AD,2",
        "--scoring-strategy",
        "masked-marginals",
    ]));
    assert!(stderr.contains("conflicting inputs"));
}

#[test]
fn test_alignment_model_needs_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "msa-onnx:/nonexistent/msa.onnx",
        "--sequence",
        EXAMPLE_SEQUENCE,
        "--scoring-strategy",
        "masked-marginals",
    ]));
    assert!(stderr.contains("alignment required"));
}

#[test]
fn test_alignment_model_needs_masked_marginals() {
    let dir = tempfile::tempdir().unwrap();
    let (msa, _temp) = TestFile::alignment_01().create_temp().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "msa-onnx:/nonexistent/msa.onnx",
        "--sequence",
        EXAMPLE_SEQUENCE,
        "--msa-path",
        &msa,
    ]));
    assert!(stderr.contains("cannot be used with the 'wt-marginals' strategy"));
}

#[test]
fn test_alignment_query_must_match_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let (msa, _temp) = TestFile::alignment_01().create_temp().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "msa-onnx:/nonexistent/msa.onnx",
        "--sequence",
        "MKTAYIAKQA",
        "--msa-path",
        &msa,
        "--scoring-strategy",
        "masked-marginals",
    ]));
    assert!(stderr.contains("first alignment row"));
}

#[test]
fn test_missing_local_model_after_label_list() {
    let dir = tempfile::tempdir().unwrap();
    let (dms, _temp) = TestFile::dms_01().create_temp().unwrap();
    let stderr = stderr_of(mutscan(&dir).args([
        "scan",
        "-m",
        "onnx:/nonexistent/model.onnx",
        "--sequence",
        EXAMPLE_SEQUENCE,
        "--dms-input",
        &dms,
        "--output-prefix",
        "run",
        "--cpu",
    ]));
    assert!(stderr.contains("not found"));

    let list = fs::read_to_string(dir.path().join("run-user-mutants.txt")).unwrap();
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0], "mutant");
    assert_eq!(lines[1], "M1A");
    assert!(!dir.path().join("run-res-in-list.csv").exists());
}
