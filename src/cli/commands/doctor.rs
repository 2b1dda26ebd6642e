//! Doctor command - verify credentials, documents and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::loader::ExtractorRegistry;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Arbitro Doctor");
    println!();
    println!("Checking credentials, documents and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let credential_checks = vec![
        check_env_token(&settings.telegram.token_env, "Get a token from @BotFather"),
        check_env_token(
            &settings.inference.token_env,
            "Create a token at https://huggingface.co/settings/tokens",
        ),
    ];
    for check in &credential_checks {
        check.print();
    }
    checks.extend(credential_checks);

    println!();

    println!("{}", style("Documents").bold());
    let doc_check = check_documents(&settings.data_dir());
    doc_check.print();
    checks.push(doc_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);
    Output::kv("Inference model", &settings.inference.model);
    Output::kv(
        "Embeddings",
        &format!("{} ({})", settings.embedding.provider, settings.embedding.model),
    );

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before starting the bot.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Arbitro is ready to run.");
    }

    Ok(())
}

/// Check that a token environment variable is present, showing only its tail.
fn check_env_token(name: &str, hint: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => CheckResult::error(name, "empty", hint),
        Ok(value) => {
            let chars: Vec<char> = value.chars().collect();
            let masked = if chars.len() > 8 {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("configured (...{})", tail)
            } else {
                "configured".to_string()
            };
            CheckResult::ok(name, &masked)
        }
        Err(_) => CheckResult::error(name, "not set", hint),
    }
}

/// Check the document directory and count the files the loader will read.
fn check_documents(dir: &Path) -> CheckResult {
    let name = "Data directory";
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            return CheckResult::error(
                name,
                &format!("{} ({})", dir.display(), e),
                "Create it and copy the regulation PDFs and PPTX files into it",
            )
        }
    };

    let registry = ExtractorRegistry::with_defaults();
    let mut supported = 0usize;
    let mut total_bytes = 0u64;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && registry.find(&path).is_some() {
            supported += 1;
            total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }

    let message = format!(
        "{} ({} documents, {})",
        dir.display(),
        supported,
        format_size(total_bytes)
    );
    if supported == 0 {
        CheckResult::warning(
            name,
            &message,
            &format!(
                "No supported files; the bot will answer without context. Supported: {}",
                registry.supported_extensions().join(", ")
            ),
        )
    } else {
        CheckResult::ok(name, &message)
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: arbitro config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
