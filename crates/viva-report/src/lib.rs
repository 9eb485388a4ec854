//! CSV score reports.
//!
//! Renders a batch of scored performances into a sectioned CSV file: a
//! `Scores` grid with one row per audio file, a `Conversions` grid with
//! per-student aggregates, and a `Failed Files` list when any file failed
//! scoring. Identity columns are parsed from the audio file
//! name; names outside the `<student>-<session>-t<task>.mp3` convention get
//! `Unknown` in all three.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use viva_scoring::SpeakingPerformance;

/// Result type for report generation.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Report generation errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Assembling the CSV text failed
    #[error("Export generation failed: {0}")]
    GenerationFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

static IDENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)-(\d+)-t(\d+)\.mp3$").expect("identity regex should be valid")
});

/// Identity columns for one report row.
struct FileIdentity {
    student_id: String,
    session_id: String,
    task_id: String,
}

fn parse_identity(file_name: &str) -> FileIdentity {
    match IDENTITY_REGEX.captures(file_name) {
        Some(caps) => FileIdentity {
            student_id: caps[1].to_string(),
            session_id: caps[2].to_string(),
            task_id: format!("t{}", &caps[3]),
        },
        None => FileIdentity {
            student_id: "Unknown".to_string(),
            session_id: "Unknown".to_string(),
            task_id: "Unknown".to_string(),
        },
    }
}

/// Per-student running totals for the Conversions grid.
#[derive(Default)]
struct StudentAggregate {
    adjusted: Vec<i64>,
    holistic: Vec<i64>,
    off_topic_count: usize,
}

fn opt_band(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Mean over the present values, two decimals; empty when nothing present.
fn opt_mean(values: &[i64]) -> String {
    if values.is_empty() {
        return String::new();
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    format!("{:.2}", mean)
}

/// CSV exporter for scored speaking performances.
pub struct CsvExporter;

impl CsvExporter {
    /// Renders the full report: a `Scores` grid, a `Conversions` grid, and
    /// a `Failed Files` section when any file failed.
    ///
    /// # Errors
    /// Returns an error when CSV generation fails.
    pub fn export(
        &self,
        performances: &[SpeakingPerformance],
        failed_files: &[String],
    ) -> Result<String> {
        let scores = Self::scores_grid(performances)?;
        let conversions = Self::conversions_grid(performances)?;
        let mut report = format!("# Scores\n{}\n# Conversions\n{}", scores, conversions);
        if !failed_files.is_empty() {
            report.push_str("\n# Failed Files\n");
            for file_name in failed_files {
                report.push_str(file_name);
                report.push('\n');
            }
        }
        Ok(report)
    }

    /// Renders the report and writes it into `output_dir` with a
    /// timestamped file name. Returns the path written.
    ///
    /// # Errors
    /// Returns an error when CSV generation or the file write fails.
    pub fn export_to_file(
        &self,
        performances: &[SpeakingPerformance],
        failed_files: &[String],
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let contents = self.export(performances, failed_files)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = output_dir.join(format!("speaking_scores_{}.csv", timestamp));
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    fn scores_grid(performances: &[SpeakingPerformance]) -> Result<String> {
        let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(Vec::new());

        writer.write_record([
            "File Name",
            "Student ID",
            "Session ID",
            "Task ID",
            "Grammar",
            "Vocabulary",
            "Content",
            "Fluency",
            "Pronunciation",
            "Overall",
            "Holistic Score",
            "Analytic Score",
            "Off Topic",
            "Off Topic Confidence",
            "Off Topic Explanation",
        ])?;

        for perf in performances {
            let identity = parse_identity(&perf.file_name);
            let analytic = perf.analytic_scores.as_ref();
            let off_topic = perf.off_topic_analysis.as_ref();

            writer.write_record([
                perf.file_name.clone(),
                identity.student_id,
                identity.session_id,
                identity.task_id,
                opt_band(analytic.map(|a| a.grammar)),
                opt_band(analytic.map(|a| a.vocabulary)),
                opt_band(analytic.map(|a| a.content)),
                opt_band(analytic.map(|a| a.fluency)),
                opt_band(analytic.map(|a| a.pronunciation)),
                opt_band(analytic.map(|a| a.overall)),
                opt_band(perf.holistic_score.as_ref().map(|h| h.overall_score)),
                opt_band(perf.adjusted_score),
                off_topic
                    .map(|o| if o.is_off_topic { "Yes" } else { "No" }.to_string())
                    .unwrap_or_default(),
                off_topic.map(|o| format!("{:.2}", o.confidence)).unwrap_or_default(),
                off_topic.map(|o| o.explanation.clone()).unwrap_or_default(),
            ])?;
        }

        Self::finish_grid(writer)
    }

    fn conversions_grid(performances: &[SpeakingPerformance]) -> Result<String> {
        let mut students: BTreeMap<String, StudentAggregate> = BTreeMap::new();
        for perf in performances {
            let identity = parse_identity(&perf.file_name);
            let entry = students.entry(identity.student_id).or_default();
            if let Some(adjusted) = perf.adjusted_score {
                entry.adjusted.push(adjusted);
            }
            if let Some(holistic) = &perf.holistic_score {
                entry.holistic.push(holistic.overall_score);
            }
            if perf.off_topic_analysis.as_ref().is_some_and(|o| o.is_off_topic) {
                entry.off_topic_count += 1;
            }
        }

        let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        writer.write_record([
            "Student ID",
            "Avg Analytic Score",
            "Avg Holistic Score",
            "Off Topic Task Count",
        ])?;

        for (student_id, aggregate) in &students {
            writer.write_record([
                student_id.clone(),
                opt_mean(&aggregate.adjusted),
                opt_mean(&aggregate.holistic),
                aggregate.off_topic_count.to_string(),
            ])?;
        }

        Self::finish_grid(writer)
    }

    fn finish_grid(mut writer: csv::Writer<Vec<u8>>) -> Result<String> {
        writer.flush()?;
        let data = writer
            .into_inner()
            .map_err(|e| ExportError::GenerationFailed(format!("Failed to get CSV data: {}", e)))?;
        String::from_utf8(data)
            .map_err(|e| ExportError::GenerationFailed(format!("Invalid UTF-8 in CSV: {}", e)))
    }
}
