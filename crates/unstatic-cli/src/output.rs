//! Output formatting for unstatic
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::path::Path;
use unstatic_rules::{Diagnostic, Severity};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Information about a single diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticInfo {
    pub rule: String,
    pub id: String,
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticInfo {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            rule: diagnostic.rule.to_string(),
            id: diagnostic.id.to_string(),
            severity: diagnostic.severity,
            line: diagnostic.line,
            column: diagnostic.column,
            message: diagnostic.message.clone(),
        }
    }
}

/// Result of processing a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticInfo>,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(path: &Path, diagnostics: Vec<DiagnosticInfo>, changed: bool) -> Self {
        Self {
            path: path.display().to_string(),
            diagnostics,
            changed,
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            diagnostics: Vec::new(),
            changed: false,
            error: Some(error),
        }
    }

    #[cfg(test)]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_diagnostics: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileResult>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report a file with pending changes (check mode)
    pub fn report_check(
        &mut self,
        path: &Path,
        diagnostics: Vec<DiagnosticInfo>,
        old_source: &str,
        new_source: &str,
    ) {
        self.summary.files_processed += 1;
        self.summary.files_with_changes += 1;
        self.summary.total_diagnostics += diagnostics.len();

        match self.format {
            OutputFormat::Text => {
                println!("{}", path.display().to_string().bold());
                print_diagnostics(&diagnostics);
                print_diff(old_source, new_source);
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(path, old_source, new_source);
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }

        self.results.push(FileResult::success(path, diagnostics, true));
    }

    /// Report a file after applying fixes
    pub fn report_fix(&mut self, path: &Path, diagnostics: Vec<DiagnosticInfo>) {
        self.summary.files_processed += 1;
        self.summary.files_with_changes += 1;
        self.summary.total_diagnostics += diagnostics.len();

        if self.format == OutputFormat::Text {
            println!("{}", path.display().to_string().bold());
            println!(
                "  {} Fixed {} diagnostic(s)",
                "OK".green(),
                diagnostics.len()
            );
            println!();
        }

        self.results.push(FileResult::success(path, diagnostics, true));
    }

    /// Report a file that needs no changes
    pub fn report_skipped(&mut self, path: &Path, diagnostics: Vec<DiagnosticInfo>) {
        self.summary.files_processed += 1;
        self.summary.total_diagnostics += diagnostics.len();

        if self.format == OutputFormat::Text {
            if !diagnostics.is_empty() {
                println!("{}", path.display().to_string().bold());
                print_diagnostics(&diagnostics);
                println!();
            } else if self.verbose {
                println!("{}: No changes needed", path.display());
            }
        }

        self.results.push(FileResult::success(path, diagnostics, false));
    }

    /// Report an error processing a file
    pub fn report_error(&mut self, path: &Path, error: &str) {
        self.summary.files_processed += 1;
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!(
                "{}: {} - {}",
                "Warning".yellow(),
                path.display(),
                error
            );
        }

        self.results.push(FileResult::error(path, error.to_string()));
    }

    /// Print final summary/output
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Files processed: {}", self.summary.files_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Diagnostics: {}", self.summary.total_diagnostics);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }

                if check_mode && self.summary.files_with_changes > 0 {
                    println!();
                    println!("{}", "Run with --fix to apply changes".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialize JSON output")?;
                println!("{}", json);
            }
            OutputFormat::Diff => {
                // Patch-compatible output has no summary
            }
        }
        Ok(())
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

fn print_diagnostics(diagnostics: &[DiagnosticInfo]) {
    for diagnostic in diagnostics {
        println!(
            "  {}:{} {} {} [{}]",
            diagnostic.line,
            diagnostic.column,
            diagnostic.severity.to_string().cyan(),
            diagnostic.message,
            diagnostic.id
        );
    }
}

/// Print a colored diff between old and new content
fn print_diff(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => {
                println!("  {}", format!("- {}", l).red());
            }
            diff::Result::Right(r) => {
                println!("  {}", format!("+ {}", r).green());
            }
            diff::Result::Both(_, _) => {
                // Skip unchanged lines for cleaner output
            }
        }
    }
}

/// Print unified diff format (standard diff -u compatible)
fn print_unified_diff(path: &Path, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();
    let mut out = String::new();

    out.push_str(&format!("--- a/{}\n", path_str));
    out.push_str(&format!("+++ b/{}\n", path_str));

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            out.push_str(&format!("{}{}", sign, change));
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> DiagnosticInfo {
        DiagnosticInfo {
            rule: "unstatic_class".to_string(),
            id: "UnstaticClass".to_string(),
            severity: Severity::Info,
            line: 11,
            column: 22,
            message: "Type TypeName can be made into non-static with singleton".to_string(),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_file_result_error() {
        let result = FileResult::error(Path::new("Broken.cs"), "parse error".to_string());
        assert!(!result.changed);
        assert!(result.has_error());
    }

    #[test]
    fn test_json_serialization() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                files_processed: 3,
                files_with_changes: 1,
                total_diagnostics: 1,
                errors: 0,
            },
            files: vec![FileResult::success(Path::new("Test0.cs"), vec![info()], true)],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"files_processed\":3"));
        assert!(json.contains("\"id\":\"UnstaticClass\""));
        assert!(json.contains("\"severity\":\"info\""));
        assert!(json.contains("\"changed\":true"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_reporter_counts() {
        let mut reporter = Reporter::new(OutputFormat::Json, false);
        reporter.report_check(Path::new("a.cs"), vec![info()], "static class A {}\n", "class A {}\n");
        reporter.report_skipped(Path::new("b.cs"), vec![]);
        reporter.report_error(Path::new("c.cs"), "Parse error, skipping");

        let summary = reporter.summary();
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_with_changes, 1);
        assert_eq!(summary.total_diagnostics, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(
            Path::new("src/A.cs"),
            "namespace N\n{\n    static class A { }\n}\n",
            "namespace N\n{\n    class A { }\n}\n",
        );
        assert!(diff.starts_with("--- a/src/A.cs\n+++ b/src/A.cs\n@@"));
        assert!(diff.contains("-    static class A { }\n"));
        assert!(diff.contains("+    class A { }\n"));
        assert!(diff.contains(" namespace N\n"));
    }
}
