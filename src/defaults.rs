//! Default configuration constants for emotag.
//!
//! Shared by the config layer, the adapters, and the batch driver so that
//! column names, sentinels, and backend endpoints are defined in one place.

/// Canonical sample rate in Hz that audio is decoded to before classification.
///
/// Speech emotion models (WavLM, wav2vec2 family) are trained on 16kHz mono.
pub const SAMPLE_RATE: u32 = 16000;

/// Field delimiter of the metadata tables.
pub const DELIMITER: u8 = b'|';

/// Column holding the audio file name, relative to the audio directory.
pub const AUDIO_COLUMN: &str = "audio_filename";

/// Column holding the transcript.
pub const TEXT_COLUMN: &str = "text";

/// Column appended to the output table.
pub const LABEL_COLUMN: &str = "emotion_label";

/// Audio label substituted when decoding or inference fails.
pub const AUDIO_ERROR_LABEL: &str = "error";

/// Default audio-classification endpoint (Hugging Face Inference API).
pub const AUDIO_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Default speech emotion model served at [`AUDIO_ENDPOINT`].
pub const AUDIO_MODEL: &str = "Bagus/wavlm-base-plus-jp-emotion";

/// Environment variable holding the bearer token for the audio endpoint.
pub const AUDIO_TOKEN_ENV: &str = "HF_TOKEN";

/// Default sentiment endpoint (Cloud Natural Language REST API).
pub const TEXT_ENDPOINT: &str = "https://language.googleapis.com/v1/documents:analyzeSentiment";

/// Environment variable holding the Cloud Natural Language API key.
pub const TEXT_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Document language sent with sentiment requests.
pub const TEXT_LANGUAGE: &str = "ja";

/// Per-call timeout for either classifier.
pub const CLASSIFIER_TIMEOUT: &str = "30s";

/// Label returned by the fixed audio backend.
pub const FIXED_AUDIO_LABEL: &str = "normal";

/// Rows processed concurrently by default.
pub const JOBS: usize = 1;
