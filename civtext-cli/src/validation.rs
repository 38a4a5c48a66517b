use std::path::Path;

use civtext::entry::is_valid_language_name;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if let Some(parent) = path_obj.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Cannot create output directory {}: {}", parent.display(), e))?;
    }

    if path_obj.is_dir() {
        return Err(format!("Output path is a directory: {}", path));
    }

    Ok(())
}

/// Validate a language element name such as `English` or `Russian`.
pub fn validate_language_name(name: &str) -> Result<(), String> {
    if is_valid_language_name(name) {
        Ok(())
    } else {
        Err(format!("Invalid language name: '{}'", name))
    }
}

/// Parse a comma-separated language order like `"English, Russian"`.
pub fn parse_language_order(order: &str) -> Result<Vec<String>, String> {
    let languages: Vec<String> = order
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if languages.is_empty() {
        return Err("Language order cannot be empty".to_string());
    }
    for language in &languages {
        validate_language_name(language)?;
    }
    Ok(languages)
}
