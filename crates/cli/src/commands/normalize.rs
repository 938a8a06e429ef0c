use std::path::Path;
use std::process;

use crate::{report_error, OutputFormat};

/// Normalize one file, or every .json file in a directory, in place.
pub(crate) fn cmd_normalize(path: &Path, output: OutputFormat, quiet: bool) {
    let files = if path.is_dir() {
        match super::json_files(path) {
            Ok(files) => files,
            Err(e) => {
                report_error(
                    &format!("error reading directory '{}': {}", path.display(), e),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        }
    } else {
        vec![path.to_path_buf()]
    };

    let mut processed = Vec::new();
    for file in files {
        if let Err(msg) = normalize_file(&file) {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        processed.push(file.display().to_string());
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            for file in &processed {
                println!("normalized {}", file);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({"normalized": processed});
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
    }
}

fn normalize_file(path: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    let doc: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))?;
    let normalized = flowbridge_core::normalize(&doc);
    let pretty = serde_json::to_string_pretty(&normalized)
        .map_err(|e| format!("error serializing '{}': {}", path.display(), e))?;
    std::fs::write(path, pretty + "\n")
        .map_err(|e| format!("error writing file '{}': {}", path.display(), e))
}
