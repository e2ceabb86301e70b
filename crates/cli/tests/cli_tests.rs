//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("legible")
}

const ARTICLE: &str = r#"
    <html>
    <head><meta property="og:title" content="Story Title"></head>
    <body>
        <nav><a href="/">home</a></nav>
        <article><h1>Story Title</h1><p>Body with a <a href="/ref">link</a>.</p></article>
        <footer>copyright</footer>
    </body>
    </html>
"#;

#[test]
fn test_cli_stdin_extracts_and_sanitizes() {
    cmd()
        .arg("-")
        .write_stdin(ARTICLE)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Story Title</h1>"))
        .stdout(predicate::str::contains("Body with a link."))
        .stdout(predicate::str::contains("<a").not())
        .stdout(predicate::str::contains("home").not());
}

#[test]
fn test_cli_fragment_mode_sanitizes_raw_input() {
    cmd()
        .args(["-", "--fragment"])
        .write_stdin(r#"<p>hi <a href="/x">link</a></p><script>evil()</script>"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("<p>hi link</p>"))
        .stdout(predicate::str::contains("script").not());
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", "-"])
        .write_stdin(ARTICLE)
        .assert()
        .success()
        .stdout(predicate::str::contains("Story Title"))
        .stdout(predicate::str::contains("<h1").not());
}

#[test]
fn test_cli_json_format() {
    cmd()
        .args(["-f", "json", "-"])
        .write_stdin(ARTICLE)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"title\": \"Story Title\""))
        .stdout(predicate::str::contains("html_content"));
}

#[test]
fn test_cli_legacy_flag_keeps_hr() {
    cmd()
        .args(["-", "--fragment", "--legacy"])
        .write_stdin("<p>a</p><hr>")
        .assert()
        .success()
        .stdout(predicate::str::contains("<hr>"));

    cmd()
        .args(["-", "--fragment"])
        .write_stdin("<p>a</p><hr>")
        .assert()
        .success()
        .stdout(predicate::str::contains("<hr>").not());
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("output.html");

    cmd()
        .args(["-o", output.to_str().unwrap(), "-", "--fragment"])
        .write_stdin("<p>saved</p>")
        .assert()
        .success();

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(contents, "<p>saved</p>");
}

#[test]
fn test_cli_empty_stdin() {
    cmd()
        .args(["-", "--fragment"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cli_invalid_file() {
    cmd().arg("nonexistent.html").assert().failure();
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", "-", "--fragment"])
        .write_stdin("<p>x</p>")
        .assert()
        .success()
        .stderr(predicate::str::contains("Legible"));
}
