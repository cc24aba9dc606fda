//! Convert command - Turn an XML file into configured JSON.

use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use gopher_core::{ConvertOptions, Converter, OutputAssembly};

use super::Cli;
use crate::banner;

/// Run a conversion. Returns `false` when `--strict` is set and the
/// conversion reported errors.
pub fn execute(cli: Cli) -> Result<bool> {
    if !cli.no_banner && !cli.quiet {
        banner::print();
    }

    let options = build_options(&cli)?;
    let converter = Converter::new(options);

    if !cli.quiet {
        eprintln!(
            "Processing {} using {}",
            cli.input.display(),
            cli.config.display()
        );
        eprintln!();
    }

    let result = converter
        .convert_files(&cli.input, &cli.config)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    if !result.diagnostics.is_empty() && !cli.quiet {
        for error in result.diagnostics.errors() {
            eprintln!("   ❌ {}", error);
        }
        for warning in result.diagnostics.warnings() {
            eprintln!("   ⚠️  {}", warning);
        }
        eprintln!();
    }

    let rendered = render(&result.value, cli.compact)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} objects to {:?}", result.value.object_count(), path);
        }
        None => {
            if !cli.quiet {
                eprintln!("Output JSON");
                eprintln!();
            }
            println!("{}", rendered);
        }
    }

    Ok(!(cli.strict && result.diagnostics.has_errors()))
}

/// Options from `--options`, overridden by individual flags.
fn build_options(cli: &Cli) -> Result<ConvertOptions> {
    let mut options = match &cli.options {
        Some(path) => ConvertOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ConvertOptions::default(),
    };

    if let Some(date) = cli.reference_date {
        options = options.reference_date(date);
    }
    if let Some(depth) = cli.max_depth {
        options = options.max_depth(depth);
    }
    if cli.reset_on_reopen {
        options = options.reset_on_reopen(true);
    }
    if let Some(policy) = cli.duplicates {
        options = options.duplicate_policy(policy.into());
    }

    Ok(options)
}

fn render(output: &OutputAssembly, compact: bool) -> Result<String> {
    let rendered = if compact {
        serde_json::to_string(output)?
    } else {
        output.to_json_pretty()?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gopher_core::DuplicatePolicy;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    const CONFIG: &str = r#"{"Patients":[{"id":"<Patients.Patient.ID>","age":"<Patients.Patient.DateOfBirth transform=yearsElapsed>"}]}"#;

    #[test]
    fn test_build_options_flags_override_file() {
        let temp = tempdir().unwrap();
        let options_path = temp.path().join("gopherhole.toml");
        fs::write(&options_path, "max_depth = 5\nreset_on_reopen = true\n").unwrap();

        let cli = Cli::parse_from([
            "gopherhole",
            "--options",
            options_path.to_str().unwrap(),
            "--max-depth",
            "3",
            "--duplicates",
            "first-wins",
        ]);
        let options = build_options(&cli).unwrap();
        assert_eq!(options.max_depth, Some(3));
        assert!(options.reset_on_reopen);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::FirstWins);
    }

    #[test]
    fn test_execute_writes_output_file() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("input.xml");
        let config = temp.path().join("config.json");
        let output = temp.path().join("out.json");
        fs::write(
            &input,
            r#"<Patients><Patient ID="7"><DateOfBirth>2024-01-01</DateOfBirth></Patient></Patients>"#,
        )
        .unwrap();
        fs::write(&config, CONFIG).unwrap();

        let cli = Cli::parse_from([
            "gopherhole",
            input.to_str().unwrap(),
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--reference-date",
            "2025-01-01",
            "--quiet",
        ]);
        assert!(execute(cli).unwrap());

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, json!({ "Patients": [{ "id": "7", "age": "1" }] }));
    }

    #[test]
    fn test_execute_strict_fails_on_errors() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("input.xml");
        let config = temp.path().join("config.json");
        fs::write(
            &input,
            r#"<Patients><Patient ID="7"><DateOfBirth>yesterday</DateOfBirth></Patient></Patients>"#,
        )
        .unwrap();
        fs::write(&config, CONFIG).unwrap();

        let args = [
            "gopherhole",
            input.to_str().unwrap(),
            config.to_str().unwrap(),
            "--output",
            temp.path().join("out.json").to_str().unwrap(),
            "--quiet",
        ]
        .map(String::from);

        assert!(execute(Cli::parse_from(args.clone())).unwrap());

        let mut strict = args.to_vec();
        strict.push("--strict".to_string());
        assert!(!execute(Cli::parse_from(strict)).unwrap());
    }

    #[test]
    fn test_execute_missing_config() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("input.xml");
        fs::write(&input, "<Patients/>").unwrap();

        let cli = Cli::parse_from([
            "gopherhole",
            input.to_str().unwrap(),
            temp.path().join("missing.json").to_str().unwrap(),
            "--quiet",
        ]);
        let err = execute(cli).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));
    }
}
