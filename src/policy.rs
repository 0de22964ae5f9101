//! Label integration: reconcile an audio category and a text score into one
//! final label.
//!
//! The policy is an ordered rule table evaluated first-match. Rules 1-3 need
//! the text score to corroborate the audio category, rule 4 trusts a strong
//! audio category on its own, rules 5-6 let a strongly polarized text score
//! speak when audio is uninformative, and rules 7-8 fall back to neutral.
//!
//! ```
//! use emotag::policy::{FinalLabel, integrate};
//! use emotag::signal::{AudioSignal, TextSignal};
//!
//! let label = integrate(&AudioSignal::new("happy"), &TextSignal::new(0.8, 1.2));
//! assert_eq!(label, FinalLabel::Happy);
//! ```

use crate::signal::{AudioSignal, TextSignal};
use std::fmt;

/// Text score a strong audio category must exceed (in its direction).
pub const AGREEMENT_THRESHOLD: f64 = 0.3;

/// Text score that decides on its own when audio is not a strong category.
pub const POLARIZED_THRESHOLD: f64 = 0.7;

/// The single emotion tag assigned to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalLabel {
    Angry,
    Happy,
    Sad,
    VeryHappy,
    VerySadOrAngry,
    Neutral,
    /// The record's audio file did not exist; no classifier ran.
    FileNotFound,
}

impl FinalLabel {
    pub const ALL: [FinalLabel; 7] = [
        FinalLabel::Angry,
        FinalLabel::Happy,
        FinalLabel::Sad,
        FinalLabel::VeryHappy,
        FinalLabel::VerySadOrAngry,
        FinalLabel::Neutral,
        FinalLabel::FileNotFound,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FinalLabel::Angry => "angry",
            FinalLabel::Happy => "happy",
            FinalLabel::Sad => "sad",
            FinalLabel::VeryHappy => "very_happy",
            FinalLabel::VerySadOrAngry => "very_sad_or_angry",
            FinalLabel::Neutral => "neutral",
            FinalLabel::FileNotFound => "file_not_found",
        }
    }

    /// Map a strong audio category onto its label.
    fn from_strong_audio(audio: &AudioSignal) -> Option<Self> {
        match audio.as_str() {
            AudioSignal::ANGRY => Some(FinalLabel::Angry),
            AudioSignal::HAPPY => Some(FinalLabel::Happy),
            AudioSignal::SAD => Some(FinalLabel::Sad),
            _ => None,
        }
    }
}

impl fmt::Display for FinalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A fixed label.
    Label(FinalLabel),
    /// The audio category itself (only reachable for strong categories).
    AudioCategory,
}

/// One entry of the decision table.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable name used in diagnostics.
    pub name: &'static str,
    pub matches: fn(&AudioSignal, &TextSignal) -> bool,
    pub outcome: Outcome,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// The decision table, in evaluation order.
///
/// `normal_audio` and `fallback` produce the same label today but stay
/// separate entries so either can change independently.
pub const RULES: &[Rule] = &[
    Rule {
        name: "angry_agreed",
        matches: |audio, text| audio.is(AudioSignal::ANGRY) && text.score < -AGREEMENT_THRESHOLD,
        outcome: Outcome::Label(FinalLabel::Angry),
    },
    Rule {
        name: "happy_agreed",
        matches: |audio, text| audio.is(AudioSignal::HAPPY) && text.score > AGREEMENT_THRESHOLD,
        outcome: Outcome::Label(FinalLabel::Happy),
    },
    Rule {
        name: "sad_agreed",
        matches: |audio, text| audio.is(AudioSignal::SAD) && text.score < -AGREEMENT_THRESHOLD,
        outcome: Outcome::Label(FinalLabel::Sad),
    },
    Rule {
        name: "audio_trusted",
        matches: |audio, _| audio.is_strong(),
        outcome: Outcome::AudioCategory,
    },
    Rule {
        name: "text_very_positive",
        matches: |_, text| text.score > POLARIZED_THRESHOLD,
        outcome: Outcome::Label(FinalLabel::VeryHappy),
    },
    Rule {
        name: "text_very_negative",
        matches: |_, text| text.score < -POLARIZED_THRESHOLD,
        outcome: Outcome::Label(FinalLabel::VerySadOrAngry),
    },
    Rule {
        name: "normal_audio",
        matches: |audio, _| audio.is(AudioSignal::NORMAL),
        outcome: Outcome::Label(FinalLabel::Neutral),
    },
    Rule {
        name: "fallback",
        matches: |_, _| true,
        outcome: Outcome::Label(FinalLabel::Neutral),
    },
];

/// Result of evaluating the table: the label and the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub label: FinalLabel,
    /// 1-based position of the matching rule in [`RULES`].
    pub rule: usize,
    pub rule_name: &'static str,
}

/// Evaluate [`RULES`] first-match and report which rule fired.
pub fn decide(audio: &AudioSignal, text: &TextSignal) -> Decision {
    for (index, rule) in RULES.iter().enumerate() {
        if !(rule.matches)(audio, text) {
            continue;
        }
        let label = match rule.outcome {
            Outcome::Label(label) => Some(label),
            Outcome::AudioCategory => FinalLabel::from_strong_audio(audio),
        };
        // AudioCategory on a non-strong label would be a table bug; keep
        // scanning so the function stays total.
        if let Some(label) = label {
            return Decision {
                label,
                rule: index + 1,
                rule_name: rule.name,
            };
        }
    }

    // Unreachable while the last rule matches everything.
    Decision {
        label: FinalLabel::Neutral,
        rule: RULES.len(),
        rule_name: "fallback",
    }
}

/// Integrate the two signals into one label. Pure, total, deterministic.
pub fn integrate(audio: &AudioSignal, text: &TextSignal) -> FinalLabel {
    decide(audio, text).label
}
