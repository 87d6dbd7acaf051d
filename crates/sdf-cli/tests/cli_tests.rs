//! Integration tests for the `sdf` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the print, query,
//! validate, and export subcommands through the actual binary, including
//! stdin/stdout piping, file I/O, and error handling.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the library.sdf fixture.
fn library_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/library.sdf")
}

/// Helper: path to the library.schema.sdf fixture.
fn library_schema_path() -> &'static str {
    concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/library.schema.sdf"
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Print subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn print_stdin_to_stdout() {
    // Pipe a compact document via stdin, get a pretty-printed one on stdout
    let input = r#"(book {year 1851 title "Moby-Dick"} "Call me Ishmael.")"#;

    Command::cargo_bin("sdf")
        .unwrap()
        .arg("print")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("year 1851"))
        .stdout(predicate::str::contains("title \"Moby-Dick\""))
        .stdout(predicate::str::contains("\t"));
}

#[test]
fn print_file_to_file() {
    let output_path = "/tmp/sdf-test-print-output.sdf";

    // Clean up from any prior run
    let _ = std::fs::remove_file(output_path);

    Command::cargo_bin("sdf")
        .unwrap()
        .args(["print", "-i", library_path(), "-o", output_path])
        .assert()
        .success();

    let content = std::fs::read_to_string(output_path).expect("output file must exist");
    assert!(
        content.contains("City Library"),
        "printed output should contain the library name"
    );
    assert!(
        content.contains("Leviathan Wakes"),
        "printed output should contain every book"
    );

    // A pretty-printed file parses back to the same document
    let original = sdf_core::parse(
        &std::fs::read_to_string(library_path()).expect("fixture must exist"),
    )
    .expect("fixture parses");
    let reprinted = sdf_core::parse(&content).expect("printed output parses");
    assert_eq!(original, reprinted);

    // Clean up
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn print_invalid_document_fails() {
    Command::cargo_bin("sdf")
        .unwrap()
        .arg("print")
        .write_stdin("(book {unterminated")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse document"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Query subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn query_prints_matched_paths() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args(["query", "book", "-i", library_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/library/book#0"))
        .stdout(predicate::str::contains("/library/book#1"))
        .stdout(predicate::str::contains("/library/book#2"));
}

#[test]
fn query_values_prints_matched_elements() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args(["query", "[@year>=1897]", "--values", "-i", library_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dracula"))
        .stdout(predicate::str::contains("Leviathan Wakes"))
        .stdout(predicate::str::contains("Moby-Dick").not());
}

#[test]
fn query_with_no_matches_prints_nothing() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args(["query", "/library/magazine", "-i", library_path()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn query_invalid_selector_fails() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args(["query", "[year", "-i", library_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid selector"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn validate_valid_document() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args([
            "validate",
            "--schema",
            library_schema_path(),
            "-i",
            library_path(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Document is valid."));
}

#[test]
fn validate_valid_document_streaming() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args([
            "validate",
            "--schema",
            library_schema_path(),
            "--streaming",
            "-i",
            library_path(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Document is valid."));
}

#[test]
fn validate_reports_missing_attribute() {
    let input = r#"(library {name "x"} [(book {title "No Year"} "text")])"#;

    Command::cargo_bin("sdf")
        .unwrap()
        .args(["validate", "--schema", library_schema_path()])
        .write_stdin(input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Required attribute 'year' is missing on element '/library/book'.",
        ));
}

#[test]
fn validate_streaming_stops_on_unfixable_prefix() {
    let input = r#"(library {name "x"} [(book {year 1 title "t"} ["a" "b"])])"#;

    Command::cargo_bin("sdf")
        .unwrap()
        .args(["validate", "--schema", library_schema_path(), "--streaming"])
        .write_stdin(input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Document already does not match the schema:",
        ))
        .stderr(predicate::str::contains(
            "One literal expected, multiple found.",
        ));
}

#[test]
fn validate_missing_schema_file_fails() {
    Command::cargo_bin("sdf")
        .unwrap()
        .args([
            "validate",
            "--schema",
            "/tmp/sdf-test-no-such-schema.sdf",
            "-i",
            library_path(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read schema file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Export subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn export_produces_json() {
    let output = Command::cargo_bin("sdf")
        .unwrap()
        .args(["export", "-i", library_path()])
        .output()
        .expect("export should succeed");

    assert!(output.status.success(), "export must succeed");
    let json_text = String::from_utf8(output.stdout).expect("JSON should be valid UTF-8");

    let json: serde_json::Value =
        serde_json::from_str(&json_text).expect("export output is valid JSON");
    assert_eq!(json["name"], "library");
    assert!(
        json_text.contains("Moby-Dick"),
        "exported JSON should contain the book titles"
    );
}

#[test]
fn export_to_file() {
    let output_path = "/tmp/sdf-test-export-output.json";

    let _ = std::fs::remove_file(output_path);

    Command::cargo_bin("sdf")
        .unwrap()
        .args(["export", "-i", library_path(), "-o", output_path])
        .assert()
        .success();

    let content = std::fs::read_to_string(output_path).expect("output file must exist");
    let _: serde_json::Value =
        serde_json::from_str(&content).expect("exported file is valid JSON");

    let _ = std::fs::remove_file(output_path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Edge cases
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("sdf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("print"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("sdf")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("unrecognized")));
}
