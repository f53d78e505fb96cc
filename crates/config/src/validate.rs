//! Configuration validation engine.
//!
//! Validates config files against the known schema, detects
//! unknown/misspelled fields, and runs semantic checks on the job table.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use crate::schema::{RotaConfig, TaskSpec};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "jobs",
    /// "timezone", "http", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "jobs[0].schedule"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Represents the expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// A map with dynamic keys (e.g. a task's `env`) whose values have a
    /// known shape.
    Map(Box<KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

/// HTTP methods that need no typo warning.
const COMMON_HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "HEAD", "PATCH"];

/// Build the full schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Map, Struct};

    // One merged shape for every task kind; a field on the wrong kind
    // surfaces as a type error, not an unknown field.
    let task = || {
        Struct(HashMap::from([
            ("kind", Leaf),
            ("program", Leaf),
            ("args", Leaf),
            ("env", Map(Box::new(Leaf))),
            ("timeout_secs", Leaf),
            ("message", Leaf),
            ("url", Leaf),
            ("method", Leaf),
        ]))
    };

    let job_entry = || {
        Struct(HashMap::from([
            ("name", Leaf),
            ("schedule", Leaf),
            ("timezone", Leaf),
            ("enabled", Leaf),
            ("task", task()),
        ]))
    };

    Struct(HashMap::from([
        ("dispatcher", Struct(HashMap::from([("timezone", Leaf)]))),
        ("jobs", Array(Box::new(job_entry()))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (diagonal + cost).min(row[j + 1] + 1).min(row[j] + 1);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    *row.last().unwrap_or(&0)
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(needle, candidate)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(candidate, _)| candidate)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let ext = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml");
    let mut result = if ext == "toml" {
        match std::fs::read_to_string(actual_path) {
            Ok(content) => validate_toml_str(&content),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: None,
            },
        }
    } else {
        // YAML/JSON: unknown fields are not walked, but the full
        // deserialization and the job-table checks still apply.
        let mut diagnostics = Vec::new();
        match crate::loader::load_config(actual_path) {
            Ok(config) => check_jobs(&config, &mut diagnostics),
            Err(e) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "type-error",
                path: String::new(),
                message: format!("{e}"),
            }),
        }
        ValidationResult {
            diagnostics,
            config_path: None,
        }
    };
    result.config_path = Some(actual_path.clone());
    result
}

/// Validate a TOML string without file-system side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax: parse raw TOML
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields: walk the TOML tree against KnownKeys
    let schema = build_schema_map();
    check_unknown_fields(&toml_value, &schema, "", &mut diagnostics);

    // 3. Type check via full deserialization, then job-table semantics
    match toml::from_str::<RotaConfig>(toml_str) {
        Ok(config) => check_jobs(&config, &mut diagnostics),
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "type-error",
                path: String::new(),
                message: format!("type error: {e}"),
            });
        },
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Walk the TOML value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (toml::Value::Table(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                } else {
                    let level = if prefix.is_empty() {
                        "at top level "
                    } else {
                        ""
                    };
                    let suggestion = suggest(key, &known_keys, 3);
                    let msg = if let Some(s) = suggestion {
                        format!("unknown field {level}(did you mean \"{s}\"?)")
                    } else {
                        format!("unknown field {level}")
                    };
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        category: "unknown-field",
                        path,
                        message: msg.trim().to_string(),
                    });
                }
            }
        },
        (toml::Value::Table(table), KnownKeys::Map(value_schema)) => {
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                check_unknown_fields(child_value, value_schema, &path, diagnostics);
            }
        },
        (toml::Value::Array(arr), KnownKeys::Array(item_schema)) => {
            for (i, item) in arr.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch: stop recursion (type errors caught later)
        _ => {},
    }
}

/// Semantic checks on a successfully parsed config.
fn check_jobs(config: &RotaConfig, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(ref tz) = config.dispatcher.timezone {
        check_timezone(tz, "dispatcher.timezone".into(), diagnostics);
    }

    if config.jobs.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "jobs",
            path: "jobs".into(),
            message: "no jobs defined; the dispatcher refuses to start without any".into(),
        });
        return;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (idx, job) in config.jobs.iter().enumerate() {
        let path = format!("jobs[{idx}]");

        if job.name.trim().is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "jobs",
                path: format!("{path}.name"),
                message: "job name is empty".into(),
            });
        } else if !seen.insert(job.name.as_str()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "jobs",
                path: format!("{path}.name"),
                message: format!("duplicate job name \"{}\"", job.name),
            });
        }

        if let Some(ref tz) = job.timezone {
            check_timezone(tz, format!("{path}.timezone"), diagnostics);
        }

        match &job.task {
            TaskSpec::Command { program, .. } => {
                if program.trim().is_empty() {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        category: "jobs",
                        path: format!("{path}.task.program"),
                        message: "command program is empty".into(),
                    });
                }
            },
            TaskSpec::Http { url, method, .. } => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        category: "http",
                        path: format!("{path}.task.url"),
                        message: format!("url \"{url}\" is not http(s)"),
                    });
                }
                if !COMMON_HTTP_METHODS.contains(&method.to_uppercase().as_str()) {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        category: "http",
                        path: format!("{path}.task.method"),
                        message: format!(
                            "unusual HTTP method \"{method}\" (custom methods are valid, but check for typos)"
                        ),
                    });
                }
            },
            TaskSpec::Announce { .. } => {},
        }
    }
}

/// Flag an unparsable IANA timezone, suggesting the nearest known name.
fn check_timezone(tz: &str, path: String, diagnostics: &mut Vec<Diagnostic>) {
    if tz.parse::<chrono_tz::Tz>().is_ok() {
        return;
    }
    let candidates: Vec<&str> = chrono_tz::TZ_VARIANTS.iter().map(|v| v.name()).collect();
    let message = match suggest(tz, &candidates, 3) {
        Some(s) => format!("unknown timezone \"{tz}\" (did you mean \"{s}\"?)"),
        None => format!("unknown timezone \"{tz}\""),
    };
    diagnostics.push(Diagnostic {
        severity: Severity::Error,
        category: "timezone",
        path,
        message,
    });
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_identical() {
        assert_eq!(levenshtein("schedule", "schedule"), 0);
    }

    #[test]
    fn levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn levenshtein_single_edit() {
        assert_eq!(levenshtein("schedule", "schedle"), 1); // deletion
        assert_eq!(levenshtein("name", "nane"), 1); // substitution
        assert_eq!(levenshtein("tak", "task"), 1); // insertion
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_toml_str("dispacher = 42\n");
        let unknown = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "dispacher");
        assert!(
            unknown.is_some(),
            "expected unknown-field diagnostic for 'dispacher'"
        );
        let d = unknown.unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert!(
            d.message.contains("dispatcher"),
            "expected suggestion 'dispatcher' in message: {}",
            d.message
        );
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let toml = r#"
[dispatcher]
timzone = "UTC"
"#;
        let result = validate_toml_str(toml);
        let unknown = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "dispatcher.timzone");
        assert!(
            unknown.is_some(),
            "expected unknown-field for 'dispatcher.timzone', got: {:?}",
            result.diagnostics
        );
        assert!(unknown.unwrap().message.contains("timezone"));
    }

    #[test]
    fn unknown_field_inside_job_entry() {
        let toml = r#"
[[jobs]]
name = "sync"
schedle = "@daily"
[jobs.task]
kind = "announce"
message = "hi"
"#;
        let result = validate_toml_str(toml);
        let unknown = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "jobs[0].schedle");
        assert!(
            unknown.is_some(),
            "expected unknown-field for 'jobs[0].schedle', got: {:?}",
            result.diagnostics
        );
        assert!(unknown.unwrap().message.contains("schedule"));
    }

    #[test]
    fn empty_config_missing_jobs() {
        let result = validate_toml_str("");
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.category == "jobs"));
    }

    #[test]
    fn duplicate_job_name_rejected() {
        let toml = r#"
[[jobs]]
name = "sync"
[jobs.task]
kind = "announce"
message = "one"

[[jobs]]
name = "sync"
[jobs.task]
kind = "announce"
message = "two"
"#;
        let result = validate_toml_str(toml);
        let dup = result
            .diagnostics
            .iter()
            .find(|d| d.category == "jobs" && d.path == "jobs[1].name");
        assert!(dup.is_some(), "got: {:?}", result.diagnostics);
        assert!(dup.unwrap().message.contains("duplicate"));
    }

    #[test]
    fn empty_job_name_rejected() {
        let toml = r#"
[[jobs]]
name = ""
[jobs.task]
kind = "announce"
message = "hi"
"#;
        let result = validate_toml_str(toml);
        assert!(result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "jobs[0].name" && d.message.contains("empty"))
        );
    }

    #[test]
    fn unknown_timezone_with_suggestion() {
        let toml = r#"
[[jobs]]
name = "sync"
timezone = "Europe/Pariss"
[jobs.task]
kind = "announce"
message = "hi"
"#;
        let result = validate_toml_str(toml);
        let tz = result
            .diagnostics
            .iter()
            .find(|d| d.category == "timezone");
        assert!(tz.is_some(), "got: {:?}", result.diagnostics);
        let d = tz.unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("Europe/Paris"));
    }

    #[test]
    fn dispatcher_timezone_checked() {
        let toml = r#"
[dispatcher]
timezone = "Nowhere/Special"

[[jobs]]
name = "sync"
[jobs.task]
kind = "announce"
message = "hi"
"#;
        let result = validate_toml_str(toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "timezone" && d.path == "dispatcher.timezone")
        );
    }

    #[test]
    fn empty_command_program_rejected() {
        let toml = r#"
[[jobs]]
name = "run"
[jobs.task]
kind = "command"
program = ""
"#;
        let result = validate_toml_str(toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "jobs[0].task.program")
        );
    }

    #[test]
    fn non_http_url_warned() {
        let toml = r#"
[[jobs]]
name = "ping"
[jobs.task]
kind = "http"
url = "ftp://example.org/drop"
"#;
        let result = validate_toml_str(toml);
        let warn = result
            .diagnostics
            .iter()
            .find(|d| d.category == "http" && d.path == "jobs[0].task.url");
        assert!(warn.is_some(), "got: {:?}", result.diagnostics);
        assert_eq!(warn.unwrap().severity, Severity::Warning);
    }

    #[test]
    fn unusual_http_method_warned() {
        let toml = r#"
[[jobs]]
name = "ping"
[jobs.task]
kind = "http"
url = "https://example.org"
method = "FETCH"
"#;
        let result = validate_toml_str(toml);
        let warn = result
            .diagnostics
            .iter()
            .find(|d| d.path == "jobs[0].task.method");
        assert!(warn.is_some(), "got: {:?}", result.diagnostics);
        assert!(warn.unwrap().message.contains("custom methods are valid"));
    }

    #[test]
    fn type_error_reported() {
        let result = validate_toml_str("jobs = 42\n");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[test]
    fn missing_task_is_type_error() {
        let toml = r#"
[[jobs]]
name = "incomplete"
"#;
        let result = validate_toml_str(toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[test]
    fn full_valid_config_no_diagnostics() {
        let toml = r#"
[dispatcher]
timezone = "Europe/Berlin"

[[jobs]]
name = "backup"
schedule = "0 3 * * *"
[jobs.task]
kind = "command"
program = "/usr/local/bin/backup"
args = ["--quiet"]

[[jobs]]
name = "ping"
schedule = "*/15 * * * *"
[jobs.task]
kind = "http"
url = "https://example.org/ping"
method = "POST"
"#;
        let result = validate_toml_str(toml);
        assert!(
            result.diagnostics.is_empty(),
            "expected clean config, got: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn schema_drift_guard() {
        // Every field the schema serializes must be known to the walker.
        let toml = toml::to_string(&RotaConfig::default()).unwrap();
        let result = validate_toml_str(&toml);
        assert!(
            !result
                .diagnostics
                .iter()
                .any(|d| d.category == "unknown-field"),
            "schema and validator drifted apart: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rota.toml");
        let result = validate(Some(&path));
        assert!(result.has_errors());
        assert!(result.diagnostics[0].message.contains("failed to read"));
    }

    #[test]
    fn yaml_config_gets_semantic_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rota.yaml");
        std::fs::write(
            &path,
            r#"
jobs:
  - name: sync
    task:
      kind: announce
      message: one
  - name: sync
    task:
      kind: announce
      message: two
"#,
        )
        .unwrap();
        let result = validate(Some(&path));
        assert!(result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.message.contains("duplicate"))
        );
    }
}
