//! Batch driver: label every row of a metadata table.
//!
//! Each record goes `pending -> skipped(file_not_found) | labeled(label)`.
//! Records never influence each other, so up to `jobs` of them may be in
//! flight at once; results are still produced in input order.

use crate::classify::{AudioAdapter, Observed, TextAdapter};
use crate::config::TableConfig;
use crate::error::Result;
use crate::policy::{Decision, FinalLabel, decide};
use crate::signal::{AudioSignal, TextSignal};
use crate::table::{Record, Table};
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};

/// Signals and decision for a record whose audio file exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Labeled {
    pub audio: Observed<AudioSignal>,
    pub text: Observed<TextSignal>,
    pub decision: Decision,
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The audio file was missing; no classifier ran.
    Skipped,
    Labeled(Labeled),
}

/// What happened to one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    pub row: usize,
    pub audio_path: PathBuf,
    pub outcome: RowOutcome,
}

impl RowReport {
    pub fn label(&self) -> FinalLabel {
        match &self.outcome {
            RowOutcome::Skipped => FinalLabel::FileNotFound,
            RowOutcome::Labeled(labeled) => labeled.decision.label,
        }
    }

    /// True when either signal is a sentinel for a failed classifier call.
    pub fn is_degraded(&self) -> bool {
        match &self.outcome {
            RowOutcome::Skipped => false,
            RowOutcome::Labeled(labeled) => labeled.audio.is_degraded() || labeled.text.is_degraded(),
        }
    }
}

/// Counts for the end-of-run message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub labeled: usize,
    pub skipped: usize,
    pub audio_failures: usize,
    pub text_failures: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[RowReport]) -> Self {
        let mut summary = Self {
            rows: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match &report.outcome {
                RowOutcome::Skipped => summary.skipped += 1,
                RowOutcome::Labeled(labeled) => {
                    summary.labeled += 1;
                    if labeled.audio.is_degraded() {
                        summary.audio_failures += 1;
                    }
                    if labeled.text.is_degraded() {
                        summary.text_failures += 1;
                    }
                }
            }
        }
        summary
    }
}

/// Owns the classifier adapters and labels records with them.
#[derive(Clone)]
pub struct BatchDriver {
    audio: AudioAdapter,
    text: TextAdapter,
    audio_dir: PathBuf,
    jobs: usize,
}

impl BatchDriver {
    pub fn new(audio: AudioAdapter, text: TextAdapter, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio,
            text,
            audio_dir: audio_dir.into(),
            jobs: 1,
        }
    }

    /// Process up to `jobs` rows concurrently (minimum 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Label a single record. Never fails: a missing file short-circuits to
    /// `file_not_found`, classifier failures arrive here as sentinels.
    pub async fn label_record(&self, record: &Record) -> RowReport {
        let audio_path = self.audio_dir.join(&record.audio_filename);

        let exists = tokio::fs::try_exists(&audio_path).await.unwrap_or(false);
        if !exists {
            tracing::debug!(row = record.row, path = %audio_path.display(), "audio file missing, skipping");
            return RowReport {
                row: record.row,
                audio_path,
                outcome: RowOutcome::Skipped,
            };
        }

        // Audio before text.
        let audio = self.audio.analyze(&audio_path).await;
        let text = self.text.analyze(&record.text).await;
        let decision = decide(&audio.signal, &text.signal);
        tracing::debug!(
            row = record.row,
            audio = %audio.signal,
            score = text.signal.score,
            magnitude = text.signal.magnitude,
            rule = decision.rule_name,
            label = %decision.label,
            "record labeled"
        );

        RowReport {
            row: record.row,
            audio_path,
            outcome: RowOutcome::Labeled(Labeled {
                audio,
                text,
                decision,
            }),
        }
    }

    /// Label every record, calling `on_row` as each report becomes available.
    /// Reports come back in the order of `records`.
    pub async fn label_records<F>(&self, records: &[Record], mut on_row: F) -> Vec<RowReport>
    where
        F: FnMut(&RowReport),
    {
        stream::iter(records)
            .map(|record| self.label_record(record))
            .buffered(self.jobs)
            .inspect(|report| on_row(report))
            .collect()
            .await
    }

    /// Read `input`, label it, and write the augmented table to `output`.
    /// `on_row` receives each report together with the total row count.
    ///
    /// Only table-level problems (missing or malformed input, missing
    /// columns, unwritable output) are errors. Nothing is written if the
    /// input cannot be read.
    pub async fn run<F>(
        &self,
        input: &Path,
        output: &Path,
        layout: &TableConfig,
        mut on_row: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&RowReport, usize),
    {
        let delimiter = layout.delimiter_byte()?;
        let table = Table::read(input, delimiter)?;
        let records = table.records(layout)?;
        tracing::info!(rows = records.len(), jobs = self.jobs, input = %input.display(), "labeling table");

        let total = records.len();
        let reports = self
            .label_records(&records, |report| on_row(report, total))
            .await;

        let labels = reports
            .iter()
            .map(|report| report.label().as_str().to_string())
            .collect();
        table
            .with_column(&layout.label_column, labels)?
            .write(output, delimiter)?;

        Ok(BatchSummary::from_reports(&reports))
    }
}
