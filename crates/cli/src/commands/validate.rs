use std::path::Path;
use std::process;

use flowbridge_core::EnvironmentMap;
use flowbridge_validate::{validate_all, TemplateSource};

use crate::{report_error, OutputFormat};

/// Run the full cross-artifact validation pass: every template, every
/// environment map. Exit is non-zero on any blocking error; warnings never
/// change the exit code.
pub(crate) fn cmd_validate(flows: &Path, env_dir: &Path, output: OutputFormat, quiet: bool) {
    let mut templates = Vec::new();
    let template_files = match super::json_files(flows) {
        Ok(files) => files,
        Err(e) => {
            report_error(
                &format!("error reading directory '{}': {}", flows.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    for file in template_files {
        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                report_error(
                    &format!("error reading file '{}': {}", file.display(), e),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        };
        let doc = match serde_json::from_str(&text) {
            Ok(doc) => doc,
            Err(e) => {
                report_error(
                    &format!("error parsing JSON in '{}': {}", file.display(), e),
                    output,
                    quiet,
                );
                process::exit(1);
            }
        };
        templates.push(TemplateSource {
            name: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string()),
            doc,
        });
    }

    let env_paths = match super::env_files(env_dir) {
        Ok(files) => files,
        Err(e) => {
            report_error(
                &format!("error reading directory '{}': {}", env_dir.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    };
    let mut envs = Vec::new();
    for path in env_paths {
        match EnvironmentMap::from_path(&path) {
            Ok(env) => envs.push(env),
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                process::exit(1);
            }
        }
    }

    let report = validate_all(&templates, &envs);

    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&report.to_json_value()).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !quiet {
                for issue in &report.errors {
                    println!(
                        "error[{}] {}: {}",
                        issue.check,
                        issue.subject.as_deref().unwrap_or("-"),
                        issue.message
                    );
                }
                for issue in &report.warnings {
                    println!(
                        "warning[{}] {}: {}",
                        issue.check,
                        issue.subject.as_deref().unwrap_or("-"),
                        issue.message
                    );
                }
                if report.passed() {
                    println!(
                        "valid ({} template(s), {} environment(s), {} warning(s))",
                        templates.len(),
                        envs.len(),
                        report.warnings.len()
                    );
                } else {
                    println!(
                        "invalid: {} error(s), {} warning(s)",
                        report.errors.len(),
                        report.warnings.len()
                    );
                }
            }
        }
    }

    if !report.passed() {
        process::exit(1);
    }
}
