//! Integration tests driving the built `fluid` binary via
//! `std::process::Command`, asserting exit codes and the stderr
//! diagnostic line (spec §6.1, §7).

use std::process::Command;

fn fluid_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fluid"))
}

#[test]
fn renders_a_plain_template_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greet.liquid");
    std::fs::write(&path, "hello {{ name }}").unwrap();

    let output = fluid_bin().arg(&path).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "hello {{ name }}");
}

#[test]
fn writes_to_outfile_when_given() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.liquid");
    let out = dir.path().join("out.txt");
    std::fs::write(&input, "{% comment %}x{% endcomment %}kept").unwrap();

    let status = fluid_bin()
        .arg("--outfile")
        .arg(&out)
        .arg(&input)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "kept");
}

#[test]
fn missing_template_file_is_a_usage_error() {
    let output = fluid_bin().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn pipeline_error_exits_nonzero_with_a_category_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.liquid");
    std::fs::write(&path, "{% if a == 1 %}no endif").unwrap();

    let output = fluid_bin().arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ParseError"), "stderr was: {stderr}");
}

#[test]
fn nonexistent_template_file_is_a_generic_error() {
    let output = fluid_bin().arg("/no/such/template.liquid").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("GenericError"), "stderr was: {stderr}");
}
