use civtext::{ReadOptions, Severity};
use civtext_cli::{StderrSink, load_document};
use serde_json::json;

/// Parse a file and summarize its health. Fails if any error was reported.
pub fn run_check_command(input: &str, json_output: bool, options: &ReadOptions) -> Result<(), String> {
    let mut sink = if json_output {
        StderrSink::quiet()
    } else {
        StderrSink::new()
    };
    let document = load_document(input, options, &mut sink)?;

    let scheme = document.language_scheme();
    let mismatches = document.scheme_mismatches();
    let duplicate_count: usize = document.duplicates().iter().map(|d| d.discarded.len()).sum();

    if json_output {
        let duplicates: Vec<_> = document
            .duplicates()
            .iter()
            .map(|d| json!({ "tag": d.tag, "discarded": d.discarded.len() }))
            .collect();
        let body = json!({
            "file": input,
            "entries": document.len(),
            "duplicates": duplicates,
            "language_scheme": scheme,
            "scheme_mismatches": mismatches,
            "diagnostics": sink.diagnostics,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| format!("Error encoding report: {}", e))?;
        println!("{}", text);
    } else {
        println!("=== {} ===", input);
        println!("Entries: {}", document.len());
        println!(
            "Duplicates: {} key(s), {} discarded occurrence(s)",
            document.duplicates().len(),
            duplicate_count
        );
        match &scheme {
            Some(languages) => println!("Language scheme: {}", languages.join(";")),
            None => println!("Language scheme: inconsistent"),
        }
        if !mismatches.is_empty() {
            println!("Entries off scheme: {}", mismatches.join(", "));
        }
        println!(
            "Warnings: {}, errors: {}",
            sink.count(Severity::Warning),
            sink.error_count()
        );
    }

    if sink.error_count() > 0 {
        return Err(format!("{} error(s) found in {}", sink.error_count(), input));
    }
    Ok(())
}
