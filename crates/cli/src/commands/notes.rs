//! Notes command handler.
//!
//! Checks extraction results produced upstream against the note schema and
//! the output contract.

use clap::{Args, Subcommand};
use docpipe_core::{AppError, AppResult};
use docpipe_extraction::{intake, IntakeReport};
use std::path::PathBuf;

/// Extraction note validation
#[derive(Args, Debug)]
pub struct NotesCommand {
    #[command(subcommand)]
    pub action: NotesAction,
}

#[derive(Subcommand, Debug)]
pub enum NotesAction {
    /// Validate an extraction result JSON file
    Validate(NotesValidateCommand),
}

/// Validate an extraction result JSON file
#[derive(Args, Debug)]
pub struct NotesValidateCommand {
    /// Path to the extraction result (JSON)
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl NotesValidateCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Validating extraction result: {:?}", self.file);

        let contents = std::fs::read_to_string(&self.file).map_err(|e| {
            AppError::Extraction(format!("Failed to read {:?}: {}", self.file, e))
        })?;
        let raw: serde_json::Value = serde_json::from_str(&contents)?;

        let report = intake(raw)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
        } else {
            print_report(&report);
        }

        if report.is_clean() {
            Ok(())
        } else {
            Err(AppError::Extraction(format!(
                "{} note(s) rejected, {} contract violation(s)",
                report.note_errors.len(),
                report.contract_violations.len()
            )))
        }
    }
}

fn report_json(report: &IntakeReport) -> serde_json::Value {
    let errors: Vec<serde_json::Value> = report
        .note_errors
        .iter()
        .map(|(index, violation)| {
            serde_json::json!({ "index": index, "error": violation.to_string() })
        })
        .collect();

    let violations: Vec<String> = report
        .contract_violations
        .iter()
        .map(|v| v.to_string())
        .collect();

    serde_json::json!({
        "valid": report.result.extraction_notes,
        "errors": errors,
        "contractViolations": violations,
        "conformant": report.is_clean(),
    })
}

fn print_report(report: &IntakeReport) {
    println!(
        "Notes: {} valid, {} rejected",
        report.result.extraction_notes.len(),
        report.note_errors.len()
    );

    for note in &report.result.extraction_notes {
        println!("  [{}] {}: {}", note.status(), note.field(), note.note());
    }

    for (index, violation) in &report.note_errors {
        println!("  #{} rejected: {}", index, violation);
    }

    for violation in &report.contract_violations {
        println!("Contract: {}", violation);
    }
}

impl NotesCommand {
    pub fn execute(&self) -> AppResult<()> {
        match &self.action {
            NotesAction::Validate(cmd) => cmd.execute(),
        }
    }
}
