use indoc::indoc;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn civtext_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("civtext"))
}

const GAME_TEXT: &str = indoc! {r#"
    <?xml version="1.0" encoding="ISO-8859-1"?>
    <Civ4GameText xmlns="http://www.firaxis.com">
        <TEXT>
            <Tag>TXT_KEY_CITY</Tag>
            <English>City</English>
            <Russian>&#195;&#238;&#240;&#238;&#228;</Russian>
        </TEXT>
        <TEXT>
            <Tag>TXT_KEY_UNIT_WARRIOR</Tag>
            <English>Warrior</English>
            <Russian>Warrior</Russian>
        </TEXT>
    </Civ4GameText>
"#};

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn run(args: &[&str]) -> Output {
    civtext_cmd().args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_check_valid_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["check", "-i", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Entries: 2"));
    assert!(out.contains("Language scheme: English;Russian"));
    assert!(stderr(&output).contains("OK Validated"));
}

#[test]
fn test_check_reports_scheme_mismatch_and_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        &temp_dir,
        "text.xml",
        indoc! {r#"
            <Civ4GameText>
                <TEXT><Tag>A</Tag><English>a</English><Russian>a</Russian></TEXT>
                <TEXT><Tag>B</Tag><English>b</English></TEXT>
            </Civ4GameText>
        "#},
    );

    let output = run(&["check", "-i", &input]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("ERROR Language scheme mismatch"), "stderr: {}", err);
    assert!(err.contains("Error: 1 error(s) found"));
    assert!(stdout(&output).contains("Entries off scheme: B"));
}

#[test]
fn test_check_json_lists_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        &temp_dir,
        "text.xml",
        indoc! {r#"
            <Civ4GameText>
                <TEXT><Tag>A</Tag><English>first</English></TEXT>
                <TEXT><Tag>A</Tag><English>second</English></TEXT>
            </Civ4GameText>
        "#},
    );

    let output = run(&["check", "-i", &input, "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(v["entries"], 1);
    assert_eq!(v["duplicates"][0]["tag"], "A");
    assert_eq!(v["duplicates"][0]["discarded"], 1);
    assert_eq!(v["language_scheme"][0], "English");
    assert_eq!(v["diagnostics"][0]["severity"], "warning");
}

#[test]
fn test_check_missing_file() {
    let output = run(&["check", "-i", "/no/such/file.xml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("File does not exist"));
}

#[test]
fn test_check_wrong_root() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "strings.xml", "<resources><string name=\"a\">A</string></resources>");

    let output = run(&["check", "-i", &input]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Civ4GameText"));
}

#[test]
fn test_format_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["format", "-i", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n  <Civ4GameText"));
    assert!(out.contains("\r\n  <Russian>&#195;&#238;&#240;&#238;&#228;</Russian>\r\n"));
}

#[test]
fn test_create_writes_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);
    let output_path = temp_dir.path().join("out").join("text.xml");

    let output = run(&[
        "create",
        "-i",
        &input,
        "-k",
        "TXT_KEY_LEADER_BARBARIAN",
        "-o",
        output_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Created new entry"));

    let written = fs::read_to_string(&output_path).unwrap();
    assert!(written.contains("<Tag>TXT_KEY_LEADER_BARBARIAN</Tag>"));
    assert!(written.contains("<English>Leader Barbarian</English>"));
    assert!(written.contains("<Russian>Leader Barbarian</Russian>"));
}

#[test]
fn test_add_language() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["add-language", "-i", &input, "-l", "German", "-b", "English"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("<German>City</German>"));
    assert!(out.contains("<German>Warrior</German>"));
}

#[test]
fn test_add_language_rejects_bad_name() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["add-language", "-i", &input, "-l", "Bad Name"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid language name"));
}

#[test]
fn test_unify_reorders_languages() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["unify", "-i", &input, "--order", "Russian,English,French"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    let russian = out.find("<Russian>").unwrap();
    let english = out.find("<English>").unwrap();
    assert!(russian < english);
    assert!(out.contains("<French>City</French>"));
    assert!(stderr(&output).contains("Russian;English;French"));
}

#[test]
fn test_unify_rejects_empty_order() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["unify", "-i", &input, "--order", " , "]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Language order cannot be empty"));
}

#[test]
fn test_import_updates_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);
    let source = write_input(
        &temp_dir,
        "translated.xml",
        indoc! {r#"
            <Civ4GameText>
                <TEXT><Tag>TXT_KEY_UNIT_WARRIOR</Tag><English>Warrior</English><Russian>Воин</Russian></TEXT>
            </Civ4GameText>
        "#},
    );

    let output = run(&["import", "-i", &input, "--from", &source, "-o", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Updated 1 value(s) in 1 entries"));

    let written = fs::read_to_string(Path::new(&input)).unwrap();
    assert!(written.contains("<Russian>&#194;&#238;&#232;&#237;</Russian>"));
}

#[test]
fn test_search_and_untranslated() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["search", "-i", &input, "-q", "город"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "TXT_KEY_CITY");

    let output = run(&["untranslated", "-i", &input, "-a", "English", "-b", "Russian"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "TXT_KEY_UNIT_WARRIOR");
    assert!(stderr(&output).contains("1 of 2 entries"));
}

#[test]
fn test_dump_json() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "text.xml", GAME_TEXT);

    let output = run(&["dump", "-i", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let v: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(v[0]["tag"], "TXT_KEY_CITY");
    assert_eq!(v[0]["languages"]["Russian"]["text"], "Город");
}

#[test]
fn test_wrap_fragments() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(
        &temp_dir,
        "fragment.xml",
        "<TEXT><Tag>TXT_KEY_A</Tag><English>A</English></TEXT>",
    );

    let output = run(&["--wrap", "format", "-i", &input]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("<Civ4GameText xmlns=\"http://www.firaxis.com\">"));
}
