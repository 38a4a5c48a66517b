use civtext::{NullSink, ReadOptions};
use civtext_cli::{load_document, write_output};

/// Print the tags of every entry containing `query`, one per line.
pub fn run_search_command(input: &str, query: &str, options: &ReadOptions) -> Result<(), String> {
    let document = load_document(input, options, &mut NullSink)?;
    let matches = document.search(query);
    if matches.is_empty() {
        eprintln!("No entries found containing '{}'", query);
        return Ok(());
    }
    for entry in matches {
        println!("{}", entry.tag());
    }
    Ok(())
}

pub fn run_untranslated_command(
    input: &str,
    first: &str,
    second: &str,
    options: &ReadOptions,
) -> Result<(), String> {
    let document = load_document(input, options, &mut NullSink)?;
    let entries = document.untranslated(first, second);
    for entry in &entries {
        println!("{}", entry.tag());
    }
    eprintln!(
        "{} of {} entries have identical {} and {} text",
        entries.len(),
        document.len(),
        first,
        second
    );
    Ok(())
}

/// Dump the decoded entries as JSON.
pub fn run_dump_command(input: &str, output: &Option<String>, options: &ReadOptions) -> Result<(), String> {
    let document = load_document(input, options, &mut NullSink)?;
    let json = document
        .to_json()
        .map_err(|e| format!("Error encoding entries: {}", e))?;
    write_output(&json, output)
}
