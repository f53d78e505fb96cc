//! `rota check` — config validation and schedule preview.
//!
//! Prints a structured report with `[ok]`, `[warn]`, `[fail]`, `[skip]`,
//! or `[info]` status indicators per item, then previews the next fire
//! time of every job. Exits non-zero when the config has errors.

use std::path::Path;

use {
    anyhow::{Result, bail},
    chrono::{DateTime, Utc},
    rota_config::{
        RotaConfig,
        validate::{self, Severity, ValidationResult},
    },
    rota_dispatch::next_occurrence,
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Per-check result used to build the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub fn handle_check(config_path: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}rota check{RESET}");
    eprintln!("{BOLD}=========={RESET}\n");

    let result = validate::validate(config_path);
    let mut sections = vec![config_section(&result)];

    // The preview only makes sense once the config parses cleanly.
    if !result.has_errors() {
        let config = match result.config_path {
            Some(ref path) => rota_config::load_config(path)?,
            None => RotaConfig::default(),
        };
        sections.push(preview_section(&config, Utc::now()));
    }

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    if result.config_path.is_none() {
        bail!("no config file found; create rota.toml or pass --config");
    }

    Ok(())
}

// ── Config validation ───────────────────────────────────────────────────────

fn config_section(result: &ValidationResult) -> Section {
    let label = result
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no config file".into());
    let mut section = Section::new(format!("Config ({label})"));

    let has_syntax_error = result.diagnostics.iter().any(|d| d.category == "syntax");
    if has_syntax_error {
        for d in &result.diagnostics {
            if d.category == "syntax" {
                section.push(Status::Fail, d.message.clone());
            }
        }
        // Nothing else is meaningful behind broken syntax.
        return section;
    }

    section.push(Status::Ok, "syntax valid");

    let unknown: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.category == "unknown-field")
        .collect();
    if unknown.is_empty() {
        section.push(Status::Ok, "all fields recognized");
    } else {
        for d in &unknown {
            section.push(Status::Fail, format!("{}: {}", d.path, d.message));
        }
    }

    for d in &result.diagnostics {
        if d.category == "unknown-field" {
            continue;
        }
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
            Severity::Info => Status::Info,
        };
        let message = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(status, message);
    }

    section
}

// ── Schedule preview ────────────────────────────────────────────────────────

fn preview_section(config: &RotaConfig, now: DateTime<Utc>) -> Section {
    let mut section = Section::new("Schedule preview");

    if config.jobs.is_empty() {
        section.push(
            Status::Warn,
            "no jobs configured; the dispatcher will not start",
        );
        return section;
    }

    for job in &config.jobs {
        if !job.enabled {
            section.push(Status::Skip, format!("{} — disabled", job.name));
            continue;
        }
        let timezone = job
            .timezone
            .as_deref()
            .or(config.dispatcher.timezone.as_deref());
        match next_occurrence(&job.schedule, timezone, now) {
            Ok(Some(at)) => {
                let until = format_until(at - now);
                section.push(
                    Status::Ok,
                    format!(
                        "{} ({}) — next at {} ({until})",
                        job.name,
                        job.schedule,
                        at.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                );
            },
            Ok(None) => section.push(
                Status::Warn,
                format!("{} ({}) — no future occurrence", job.name, job.schedule),
            ),
            Err(e) => section.push(Status::Fail, format!("{} — {e}", job.name)),
        }
    }

    section
}

fn format_until(until: chrono::Duration) -> String {
    let secs = until.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    if days > 0 {
        format!("in {days}d {hours}h")
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else if minutes > 0 {
        format!("in {minutes}m {}s", secs % 60)
    } else {
        format!("in {secs}s")
    }
}
