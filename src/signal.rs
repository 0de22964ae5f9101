//! Classifier outputs as seen by the integration policy.

use crate::defaults::AUDIO_ERROR_LABEL;
use std::fmt;

/// Categorical output of the audio emotion classifier.
///
/// The label set is open-ended. `angry`, `happy`, `sad`, `normal` and the
/// `error` sentinel carry meaning in the rule table; anything else is treated
/// as unrecognized and non-normal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSignal(String);

impl AudioSignal {
    pub const ANGRY: &'static str = "angry";
    pub const HAPPY: &'static str = "happy";
    pub const SAD: &'static str = "sad";
    pub const NORMAL: &'static str = "normal";

    /// Build a signal from a raw classifier label, trimmed and lower-cased.
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_lowercase())
    }

    /// The sentinel substituted when the audio adapter fails.
    pub fn error() -> Self {
        Self(AUDIO_ERROR_LABEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is(&self, label: &str) -> bool {
        self.0 == label
    }

    /// `angry`, `happy` or `sad`: categories trusted without text agreement.
    pub fn is_strong(&self) -> bool {
        matches!(self.0.as_str(), Self::ANGRY | Self::HAPPY | Self::SAD)
    }
}

impl fmt::Display for AudioSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the text sentiment analyzer.
///
/// `score` is nominally in [-1, 1] and is not clamped. `magnitude` is carried
/// alongside but no rule reads it yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSignal {
    pub score: f64,
    pub magnitude: f64,
}

impl TextSignal {
    pub fn new(score: f64, magnitude: f64) -> Self {
        Self { score, magnitude }
    }

    /// The sentinel substituted when the text adapter fails.
    ///
    /// Indistinguishable from genuinely neutral text downstream.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            magnitude: 0.0,
        }
    }
}

impl Default for TextSignal {
    fn default() -> Self {
        Self::neutral()
    }
}
