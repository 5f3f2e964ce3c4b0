//! Report rendering for stdout.
//!
//! Every command produces a [`Report`]; this module turns it into JSON (with
//! a stable envelope), Markdown, or a one-line summary.

use pp_common::{format_error_human, Error, OutputFormat, StructuredError};
use serde::Serialize;

use crate::exit_codes::ExitCode;

/// A command result that can be rendered in every output format.
pub trait Report: Serialize {
    fn command(&self) -> &'static str;

    fn exit_code(&self) -> ExitCode;

    /// One line, no trailing newline.
    fn summary(&self) -> String;

    fn markdown(&self) -> String;
}

/// Render a report in `format`.
pub fn render<R: Report>(report: &R, format: OutputFormat, run_id: &str) -> Result<String, Error> {
    match format {
        OutputFormat::Json => {
            let exit = report.exit_code();
            let envelope = serde_json::json!({
                "command": report.command(),
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": exit.code_name(),
                "exit_code": exit.as_i32(),
                "result": report,
            });
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
        OutputFormat::Md => Ok(report.markdown()),
        OutputFormat::Summary => Ok(format!("[{}] {}", run_id, report.summary())),
    }
}

/// Render an error that aborted `command`.
pub fn render_error(err: &Error, command: &str, format: OutputFormat, run_id: &str) -> String {
    let exit = ExitCode::for_error(err);
    match format {
        OutputFormat::Json => {
            let envelope = serde_json::json!({
                "command": command,
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": exit.code_name(),
                "exit_code": exit.as_i32(),
                "error": StructuredError::from(err),
            });
            serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| StructuredError::from(err).to_json())
        }
        OutputFormat::Md => format_error_human(err, false),
        OutputFormat::Summary => format!("[{}] {} error {}: {}", run_id, command, err.code(), err),
    }
}

/// Markdown table from a header row and data rows.
pub(crate) fn md_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Dummy {
        placed: usize,
    }

    impl Report for Dummy {
        fn command(&self) -> &'static str {
            "dummy"
        }
        fn exit_code(&self) -> ExitCode {
            ExitCode::from_work(self.placed > 0)
        }
        fn summary(&self) -> String {
            format!("placed {}", self.placed)
        }
        fn markdown(&self) -> String {
            "# dummy\n".to_string()
        }
    }

    #[test]
    fn test_json_envelope() {
        let out = render(&Dummy { placed: 2 }, OutputFormat::Json, "run-abc").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["command"], "dummy");
        assert_eq!(value["run_id"], "run-abc");
        assert_eq!(value["status"], "OK_WORK_DONE");
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["result"]["placed"], 2);
    }

    #[test]
    fn test_summary_and_md() {
        let d = Dummy { placed: 0 };
        assert_eq!(render(&d, OutputFormat::Summary, "run-x").unwrap(), "[run-x] placed 0");
        assert_eq!(render(&d, OutputFormat::Md, "run-x").unwrap(), "# dummy\n");
    }

    #[test]
    fn test_error_json() {
        let err = Error::UnknownNode { name: "nas".into() };
        let out = render_error(&err, "zip", OutputFormat::Json, "run-x");
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["exit_code"], 11);
        assert_eq!(value["error"]["code"], 11);
        assert_eq!(value["error"]["category"], "config");
        assert_eq!(value["error"]["context"]["node"], "nas");
    }

    #[test]
    fn test_md_table() {
        let table = md_table(&["a", "b"], &[vec!["1".into(), "2".into()]]);
        assert_eq!(table, "| a | b |\n|---|---|\n| 1 | 2 |\n");
    }
}
