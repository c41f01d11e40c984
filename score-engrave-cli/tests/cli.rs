use std::{fs, process::Command};

use tempfile::TempDir;

const EVENTS: &str = r#"[
    [0, "meter", 4, 1],
    [0, "key", "F"],
    [0, "chord", "F", "maj7", 4],
    [0, "note", 65, 0.8, 1],
    [1, "note", "A4", 0.8, 1],
    [2, "note", "Bb4", 0.8, 2],
    [4, "note", 72, 0.6, 6]
]"#;

fn run(dir: &TempDir, extra: &[&str]) -> String {
    let input = dir.path().join("events.json");
    fs::write(&input, EVENTS).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_score-engrave"))
        .arg(&input)
        .args(extra)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn musicxml_to_stdout() {
    let dir = TempDir::new().unwrap();
    let xml = run(&dir, &[]);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<fifths>-1</fifths>"));
    assert!(xml.contains("<kind text=\"maj7\">major-seventh</kind>"));
    assert_eq!(xml.matches("<measure ").count(), 3);
    assert!(xml.contains("<tie type=\"start\"/>"));
}

#[test]
fn symbols_to_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("symbols.json");
    let stdout = run(
        &dir,
        &["--format", "symbols", "--output", output.to_str().unwrap()],
    );
    assert!(stdout.is_empty());
    let json = fs::read_to_string(output).unwrap();
    assert!(json.contains("\"type\": \"bar\""));
    assert!(json.contains("\"type\": \"chord\""));
}

#[test]
fn settings_and_overrides() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("settings.json");
    fs::write(&config, r#"{"divisions": 8, "stave": "bass"}"#).unwrap();
    let xml = run(
        &dir,
        &["--config", config.to_str().unwrap(), "--stave", "piano"],
    );
    assert!(xml.contains("<divisions>8</divisions>"));
    assert!(xml.contains("<staves>2</staves>"));
}

#[test]
fn bad_input_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("events.json");
    fs::write(&input, r#"[[0, "note", 60]]"#).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_score-engrave"))
        .arg(&input)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
