use std::path::Path;
use std::process;

use flowbridge_core::EnvironmentMap;

use crate::{report_error, OutputFormat};

/// Render every template in the flows directory against one environment,
/// writing a rendered artifact per template. Any failure is blocking.
pub(crate) fn cmd_render(
    env_name: &str,
    flows: &Path,
    env_dir: &Path,
    out_dir: &Path,
    output: OutputFormat,
    quiet: bool,
) {
    let env_path = ["yaml", "yml"]
        .iter()
        .map(|ext| env_dir.join(format!("{}.{}", env_name, ext)))
        .find(|p| p.is_file());
    let Some(env_path) = env_path else {
        report_error(
            &format!(
                "no environment file for '{}' under '{}'",
                env_name,
                env_dir.display()
            ),
            output,
            quiet,
        );
        process::exit(1);
    };

    let env = match EnvironmentMap::from_path(&env_path) {
        Ok(env) => env,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let templates = match super::json_files(flows) {
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

    if let Err(e) = std::fs::create_dir_all(out_dir) {
        report_error(
            &format!("error creating directory '{}': {}", out_dir.display(), e),
            output,
            quiet,
        );
        process::exit(1);
    }

    let mut failures: Vec<String> = Vec::new();
    let mut written: Vec<String> = Vec::new();
    for template in &templates {
        match render_one(template, &env, out_dir) {
            Ok(path) => written.push(path),
            Err(msg) => failures.push(msg),
        }
    }

    if !failures.is_empty() {
        match output {
            OutputFormat::Json => {
                let value = serde_json::json!({"rendered": written, "errors": failures});
                eprintln!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            }
            OutputFormat::Text => {
                if !quiet {
                    for msg in &failures {
                        eprintln!("{}", msg);
                    }
                }
            }
        }
        process::exit(1);
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => {
            for path in &written {
                println!("rendered {}", path);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({"environment": env.name, "rendered": written});
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
    }
}

fn render_one(template: &Path, env: &EnvironmentMap, out_dir: &Path) -> Result<String, String> {
    let text = std::fs::read_to_string(template)
        .map_err(|e| format!("error reading file '{}': {}", template.display(), e))?;
    let artifact = flowbridge_core::render_flow(&text, env)
        .map_err(|e| format!("{}: {}", template.display(), e))?;

    let file_name = template
        .file_name()
        .ok_or_else(|| format!("invalid template path '{}'", template.display()))?;
    let out_path = out_dir.join(file_name);
    let pretty = serde_json::to_string_pretty(&artifact)
        .map_err(|e| format!("error serializing '{}': {}", template.display(), e))?;
    std::fs::write(&out_path, pretty + "\n")
        .map_err(|e| format!("error writing file '{}': {}", out_path.display(), e))?;
    Ok(out_path.display().to_string())
}
