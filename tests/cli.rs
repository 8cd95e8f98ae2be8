use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn run(args: &[&str]) -> (bool, String, String) {
    let exe = env!("CARGO_BIN_EXE_tabmodel");
    let output = Command::new(exe).args(args).output().expect("run tabmodel cli");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn estimate_prints_closed_form_parameters() {
    let tmp = tempdir().expect("temporary directory");
    let table = tmp.path().join("counts.tsv");
    fs::write(&table, "id\tcount\nA\t1\nB\t2\nC\t3\nD\t5\n").expect("write table");

    let (ok, stdout, stderr) = run(&["estimate", table.to_str().expect("path str"), "--model", "poisson"]);
    assert!(ok, "estimate failed: {stderr}");
    assert!(stdout.starts_with("Poisson distribution"), "{stdout}");
    assert!(stdout.contains("log likelihood"), "{stdout}");
}

#[test]
fn conjugate_update_is_reported_as_the_prior_family() {
    let tmp = tempdir().expect("temporary directory");
    let table = tmp.path().join("waits.tsv");
    fs::write(&table, "wait\n0.5\n1.5\n2.0\n").expect("write table");

    let (ok, stdout, stderr) = run(&[
        "update",
        table.to_str().expect("path str"),
        "--prior",
        "gamma:1,1",
        "--likelihood",
        "exponential",
    ]);
    assert!(ok, "update failed: {stderr}");
    assert!(stdout.starts_with("Gamma distribution"), "{stdout}");
    assert!(stdout.contains('4') && stdout.contains('5'), "{stdout}");
}

#[test]
fn sampled_update_honours_the_options_file() {
    let tmp = tempdir().expect("temporary directory");
    let table = tmp.path().join("counts.tsv");
    fs::write(&table, "count\n2\n3\n4\n").expect("write table");
    let options = tmp.path().join("options.toml");
    fs::write(&options, "verbosity = 0\n[update]\nperiods = 300\nhistogram_bins = 5\n").expect("write options");

    let (ok, stdout, stderr) = run(&[
        "--config",
        options.to_str().expect("path str"),
        "update",
        table.to_str().expect("path str"),
        "--prior",
        "normal:3,1",
        "--likelihood",
        "poisson",
        "--seed",
        "11",
    ]);
    assert!(ok, "update failed: {stderr}");
    assert!(stdout.starts_with("Histogram"), "{stdout}");
}

#[test]
fn cdf_prints_one_line_per_row() {
    let tmp = tempdir().expect("temporary directory");
    let table = tmp.path().join("points.tsv");
    fs::write(&table, "x\n0\n1\n").expect("write table");

    let (ok, stdout, stderr) = run(&["cdf", table.to_str().expect("path str"), "--model", "exponential:1"]);
    assert!(ok, "cdf failed: {stderr}");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "0\t0");
    assert!(lines[1].starts_with("1\t0.632"), "{stdout}");
}

#[test]
fn bad_input_fails_with_a_message() {
    let (ok, _, stderr) = run(&["estimate", "/nonexistent/table.tsv", "--model", "poisson"]);
    assert!(!ok);
    assert!(stderr.contains("Error"), "{stderr}");

    let tmp = tempdir().expect("temporary directory");
    let table = tmp.path().join("x.tsv");
    fs::write(&table, "x\n1\n").expect("write table");
    let (ok, _, stderr) = run(&["cdf", table.to_str().expect("path str"), "--model", "zipf:1"]);
    assert!(!ok);
    assert!(stderr.contains("unknown model"), "{stderr}");
}
