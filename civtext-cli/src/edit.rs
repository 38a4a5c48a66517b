use civtext::ReadOptions;
use civtext_cli::{StderrSink, load_document, write_document};
use civtext_cli::validation::validate_language_name;

pub fn run_format_command(
    input: &str,
    output: &Option<String>,
    options: &ReadOptions,
) -> Result<(), String> {
    let mut sink = StderrSink::new();
    let document = load_document(input, options, &mut sink)?;
    write_document(&document, output)
}

pub fn run_create_command(
    input: &str,
    key: &str,
    output: &Option<String>,
    options: &ReadOptions,
) -> Result<(), String> {
    let mut sink = StderrSink::new();
    let mut document = load_document(input, options, &mut sink)?;
    if document.create_entry(key, &mut sink).is_none() {
        return Err(format!("Could not create entry '{}'", key));
    }
    write_document(&document, output)
}

pub fn run_add_language_command(
    input: &str,
    language: &str,
    base: &str,
    output: &Option<String>,
    options: &ReadOptions,
) -> Result<(), String> {
    validate_language_name(language)?;
    let mut sink = StderrSink::new();
    let mut document = load_document(input, options, &mut sink)?;
    let added = document.add_language_to_all_entries(language, base, &mut sink);
    tracing::debug!(added, language, base, "added language");
    write_document(&document, output)
}

pub fn run_unify_command(
    input: &str,
    order: &[String],
    output: &Option<String>,
    options: &ReadOptions,
) -> Result<(), String> {
    let mut sink = StderrSink::new();
    let mut document = load_document(input, options, &mut sink)?;
    if !document.unify_language_order(order, &mut sink) {
        return Err("Language order was rejected".to_string());
    }
    write_document(&document, output)
}

pub fn run_import_command(
    input: &str,
    from: &str,
    output: &Option<String>,
    options: &ReadOptions,
) -> Result<(), String> {
    let mut sink = StderrSink::new();
    let mut document = load_document(input, options, &mut sink)?;
    let source = load_document(from, options, &mut sink)?;

    let report = document.import_from(&source, &mut sink);
    if report.common_languages.is_empty() {
        return Err(format!("Nothing imported from {}", from));
    }
    eprintln!(
        "Updated {} value(s) in {} entries; {} unchanged, {} key(s) only in {}",
        report.updated_values, report.updated_entries, report.unchanged_values, report.skipped_tags, from
    );
    write_document(&document, output)
}
