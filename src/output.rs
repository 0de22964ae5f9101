//! Terminal rendering of per-row progress and the run summary.

use crate::batch::{BatchSummary, RowOutcome, RowReport};
use crate::policy::FinalLabel;
use std::path::Path;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Color a final label: skipped rows red, neutral dim, the rest green.
fn label_color(label: FinalLabel) -> &'static str {
    match label {
        FinalLabel::FileNotFound => RED,
        FinalLabel::Neutral => DIM,
        _ => GREEN,
    }
}

fn paint(color: &str, text: &str, colored: bool) -> String {
    if colored && !color.is_empty() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// One line per row, e.g.
/// `[1/3] 001.wav  audio=happy text=+0.80/1.20 -> happy (happy_agreed)`.
pub fn format_row(report: &RowReport, total: usize, colored: bool) -> String {
    let file = report
        .audio_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.audio_path.display().to_string());
    let prefix = paint(DIM, &format!("[{}/{}]", report.row + 1, total), colored);
    let label = report.label();

    match &report.outcome {
        RowOutcome::Skipped => format!(
            "{prefix} {file}  {}",
            paint(label_color(label), &format!("missing -> {label}"), colored)
        ),
        RowOutcome::Labeled(labeled) => {
            let audio = if labeled.audio.is_degraded() {
                paint(YELLOW, labeled.audio.signal.as_str(), colored)
            } else {
                labeled.audio.signal.to_string()
            };
            let text_value = format!(
                "{:+.2}/{:.2}",
                labeled.text.signal.score, labeled.text.signal.magnitude
            );
            let text = if labeled.text.is_degraded() {
                paint(YELLOW, &text_value, colored)
            } else {
                text_value
            };
            format!(
                "{prefix} {file}  audio={audio} text={text} -> {} {}",
                paint(label_color(label), label.as_str(), colored),
                paint(DIM, &format!("({})", labeled.decision.rule_name), colored)
            )
        }
    }
}

/// Multi-line summary ending with the output location.
pub fn format_summary(summary: &BatchSummary, output: &Path, colored: bool) -> String {
    let mut lines = vec![format!(
        "Labeled {} of {} rows ({} skipped: audio file not found)",
        summary.labeled, summary.rows, summary.skipped
    )];
    if summary.audio_failures > 0 || summary.text_failures > 0 {
        lines.push(paint(
            YELLOW,
            &format!(
                "Classifier failures: audio {}, text {} (sentinel signals used)",
                summary.audio_failures, summary.text_failures
            ),
            colored,
        ));
    }
    lines.push(paint(
        GREEN,
        &format!("Wrote {}", output.display()),
        colored,
    ));
    lines.join("\n")
}

/// Writes progress to stderr unless quiet.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    quiet: bool,
    colored: bool,
}

impl Reporter {
    pub fn new(quiet: bool, colored: bool) -> Self {
        Self { quiet, colored }
    }

    pub fn row(&self, report: &RowReport, total: usize) {
        if !self.quiet {
            eprintln!("{}", format_row(report, total, self.colored));
        }
    }

    pub fn summary(&self, summary: &BatchSummary, output: &Path) {
        if !self.quiet {
            eprintln!("{}", format_summary(summary, output, self.colored));
        }
    }

    pub fn dry_run_notice(&self) {
        if !self.quiet {
            eprintln!(
                "{}",
                paint(
                    YELLOW,
                    "Dry run: using fixed classifiers, no network calls",
                    self.colored
                )
            );
        }
    }
}
