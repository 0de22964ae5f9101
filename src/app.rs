//! Tagging run entry point.
//!
//! Builds the classifier backends named in the config, wraps them in
//! adapters, and drives one pass over the input table.

use crate::batch::{BatchDriver, BatchSummary};
use crate::classify::audio::{AudioClassifier, FixedAudioClassifier};
use crate::classify::text::{FixedSentimentAnalyzer, SentimentAnalyzer};
use crate::classify::{AudioAdapter, TextAdapter};
use crate::config::{AudioBackend, AudioConfig, Config, TextBackend, TextConfig};
use crate::error::Result;
#[cfg(not(feature = "http"))]
use crate::error::EmotagError;
use crate::output::Reporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Paths for one run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input: PathBuf,
    pub audio_dir: PathBuf,
    pub output: PathBuf,
}

/// Instantiate the audio backend selected by `config.backend`.
pub fn create_audio_classifier(config: &AudioConfig) -> Result<Arc<dyn AudioClassifier>> {
    match config.backend {
        AudioBackend::Fixed => Ok(Arc::new(FixedAudioClassifier::new(&config.fixed_label))),
        #[cfg(feature = "http")]
        AudioBackend::Http => Ok(Arc::new(
            crate::classify::audio::HttpAudioClassifier::new(config)?,
        )),
        #[cfg(not(feature = "http"))]
        AudioBackend::Http => Err(EmotagError::BackendUnavailable {
            backend: "http".to_string(),
            message: "built without the 'http' feature".to_string(),
        }),
    }
}

/// Instantiate the text backend selected by `config.backend`.
pub fn create_sentiment_analyzer(config: &TextConfig) -> Result<Arc<dyn SentimentAnalyzer>> {
    match config.backend {
        TextBackend::Fixed => Ok(Arc::new(FixedSentimentAnalyzer::new(
            config.fixed_score,
            config.fixed_magnitude,
        ))),
        #[cfg(feature = "http")]
        TextBackend::Google => Ok(Arc::new(
            crate::classify::text::GoogleSentimentAnalyzer::new(config)?,
        )),
        #[cfg(not(feature = "http"))]
        TextBackend::Google => Err(EmotagError::BackendUnavailable {
            backend: "google".to_string(),
            message: "built without the 'http' feature".to_string(),
        }),
    }
}

/// Build a driver from config. Backend construction errors surface here,
/// before any row is processed.
pub fn build_driver(config: &Config, audio_dir: &Path) -> Result<BatchDriver> {
    let audio = AudioAdapter::new(
        create_audio_classifier(&config.audio)?,
        config.audio.timeout()?,
    );
    let text = TextAdapter::new(
        create_sentiment_analyzer(&config.text)?,
        config.text.timeout()?,
    );
    tracing::debug!(
        audio = audio.backend(),
        text = text.backend(),
        jobs = config.batch.jobs,
        "classifier backends ready"
    );
    Ok(BatchDriver::new(audio, text, audio_dir).with_jobs(config.batch.jobs))
}

/// Run the tag command: read the table, label every row, write the output.
///
/// # Arguments
/// * `config` - Validated configuration (CLI overrides already applied)
/// * `paths` - Input table, audio directory and output table
/// * `reporter` - Progress output
pub async fn run_tag_command(
    config: &Config,
    paths: &RunPaths,
    reporter: Reporter,
) -> Result<BatchSummary> {
    let driver = build_driver(config, &paths.audio_dir)?;
    let summary = driver
        .run(&paths.input, &paths.output, &config.table, |report, total| {
            reporter.row(report, total)
        })
        .await?;
    reporter.summary(&summary, &paths.output);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::encode_wav;
    use crate::table::Table;
    use tempfile::TempDir;

    #[test]
    fn fixed_backends_need_no_credentials() {
        let config = Config::default().dry_run();
        let audio = create_audio_classifier(&config.audio).unwrap();
        let text = create_sentiment_analyzer(&config.text).unwrap();
        assert_eq!(audio.name(), "fixed");
        assert_eq!(text.name(), "fixed");
    }

    #[test]
    fn build_driver_applies_jobs() {
        let mut config = Config::default().dry_run();
        config.batch.jobs = 4;
        let driver = build_driver(&config, Path::new("wavs")).unwrap();
        assert_eq!(driver.jobs(), 4);
        assert_eq!(driver.audio_dir(), Path::new("wavs"));
    }

    #[tokio::test]
    async fn dry_run_labels_every_row() {
        let dir = TempDir::new().unwrap();
        let wavs = dir.path().join("wavs");
        std::fs::create_dir(&wavs).unwrap();
        std::fs::write(wavs.join("001.wav"), encode_wav(&[0i16; 160]).unwrap()).unwrap();
        let input = dir.path().join("metadata.csv");
        std::fs::write(
            &input,
            "audio_filename|text\n001.wav|こんにちは\n002.wav|さようなら\n",
        )
        .unwrap();
        let paths = RunPaths {
            input,
            audio_dir: wavs,
            output: dir.path().join("out.csv"),
        };

        let summary = run_tag_command(
            &Config::default().dry_run(),
            &paths,
            Reporter::new(true, false),
        )
        .await
        .unwrap();

        assert_eq!(summary.labeled, 1);
        assert_eq!(summary.skipped, 1);
        let written = Table::read(&paths.output, b'|').unwrap();
        assert_eq!(written.rows()[0][2], "neutral");
        assert_eq!(written.rows()[1][2], "file_not_found");
    }
}
