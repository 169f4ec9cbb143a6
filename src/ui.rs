//! Terminal front end: step progress, field review and results.
//!
//! Uses `indicatif` for the spinner shown while a backend call is in flight
//! and `console` for colored output. Everything here only reads
//! [`WorkflowState`]; changes go through the session.

use std::collections::BTreeSet;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::workflow::validation::{REQUIRED_FIELDS, missing_required};
use crate::workflow::{AppealProbability, ConfidenceBand, Step, StepStatus, WorkflowState};

/// Spinner for a pending backend call.
pub struct CallProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl CallProgress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn succeed(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }
}

fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "✓",
        StepStatus::Active => "▶",
        StepStatus::Pending => "·",
    }
}

/// One line per step plus the "step N of M" counter.
pub fn progress_lines(state: &WorkflowState) -> Vec<String> {
    let mut lines = vec![format!(
        "Step {} of {} ({:.0}%)",
        state.current_step(),
        state.total_steps(),
        state.progress_ratio() * 100.0
    )];
    lines.extend(Step::ALL.iter().map(|step| {
        format!(
            "  {} {}. {}",
            status_marker(state.step_status(*step)),
            step.index(),
            step.title()
        )
    }));
    lines
}

pub fn render_progress(state: &WorkflowState) {
    let bold = Style::new().bold();
    let mut lines = progress_lines(state).into_iter();
    if let Some(header) = lines.next() {
        println!("{}", bold.apply_to(header));
    }
    for line in lines {
        println!("{line}");
    }
    if let Some(error) = state.error() {
        println!("  {} {error}", Style::new().yellow().apply_to("!"));
    }
}

fn band_style(band: ConfidenceBand) -> Style {
    match band {
        ConfidenceBand::VeryHigh | ConfidenceBand::High => Style::new().green(),
        ConfidenceBand::Medium => Style::new().yellow(),
        ConfidenceBand::Low | ConfidenceBand::VeryLow => Style::new().red(),
    }
}

/// Extracted fields with their confidence, required ones first.
pub fn render_fields(state: &WorkflowState) {
    let ocr = &state.step_data().ocr;
    let required: BTreeSet<&str> = REQUIRED_FIELDS.into_iter().collect();
    let names = REQUIRED_FIELDS
        .iter()
        .map(|s| s.to_string())
        .chain(
            ocr.extracted_fields
                .keys()
                .filter(|k| !required.contains(k.as_str()))
                .cloned(),
        );

    println!();
    for name in names {
        let value = ocr
            .extracted_fields
            .get(&name)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let band = ConfidenceBand::for_field(&ocr.confidence_scores, &name);
        let score = ocr.confidence_scores.get(&name).copied().unwrap_or(0.0);
        let marker = if required.contains(name.as_str()) { "*" } else { " " };
        let review = if band.needs_review() { " check" } else { "" };
        println!(
            "  {marker}{name:<16} {value:<32} {}",
            band_style(band).apply_to(format!("{band} ({:.0}%){review}", score * 100.0))
        );
    }

    let missing = missing_required(&ocr.extracted_fields);
    if !missing.is_empty() {
        println!(
            "  {} missing required: {}",
            Style::new().red().apply_to("✗"),
            missing.join(", ")
        );
    }
}

fn probability_style(probability: AppealProbability) -> Style {
    match probability {
        AppealProbability::High => Style::new().green().bold(),
        AppealProbability::Medium => Style::new().yellow().bold(),
        AppealProbability::Low => Style::new().red().bold(),
    }
}

/// Analysis outcome and the derived summary.
pub fn render_results(state: &WorkflowState) {
    let data = state.step_data();
    let Some(result) = &data.analysis.results else {
        println!("  no analysis result yet");
        return;
    };
    println!();
    if !result.is_authoritative() {
        println!(
            "{}",
            Style::new()
                .yellow()
                .bold()
                .apply_to("Automated analysis unavailable: showing a placeholder result")
        );
    }
    if let Some(conclusion) = &data.results.conclusion {
        println!("{}", Style::new().bold().apply_to(conclusion));
    }
    println!(
        "  appeal chances: {}",
        probability_style(result.appeal_probability).apply_to(result.appeal_probability)
    );
    println!("  legal section:  {}", result.legal_section);
    println!("  points:         {}", result.points);
    println!("  issues found:   {}", result.technical_issues.len());
    for issue in &result.technical_issues {
        println!("    - [{}] {}: {}", issue.severity, issue.kind, issue.description);
    }
    if !data.results.explanation.is_empty() {
        println!();
        println!("  {}", data.results.explanation);
    }
}
