// Mood categories and the textual cues read from a mood string.
//
// Key selection uses the exact category (`Mood::from_name`), while mode and
// tempo adjustments look for substrings anywhere in the text, so "dark and
// energetic" is both minor and fast.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Mysterious,
    Romantic,
    Other,
}

impl Mood {
    pub const KNOWN: [Mood; 6] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Mysterious,
        Mood::Romantic,
    ];

    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim();
        Mood::KNOWN
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .unwrap_or(Mood::Other)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Mysterious => "mysterious",
            Mood::Romantic => "romantic",
            Mood::Other => "other",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tempo direction implied by a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoLean {
    Faster,
    Slower,
    Neutral,
}

/// Substring cues read from the raw mood text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodCues {
    /// "sad" or "dark": forces the minor mode.
    pub dark: bool,
    pub tempo: TempoLean,
}

impl MoodCues {
    pub fn from_text(mood: &str) -> Self {
        let lower = mood.to_lowercase();
        // Fast cues win when both are present.
        let tempo = if lower.contains("energetic") || lower.contains("fast") {
            TempoLean::Faster
        } else if lower.contains("slow") || lower.contains("calm") {
            TempoLean::Slower
        } else {
            TempoLean::Neutral
        };
        MoodCues {
            dark: lower.contains("sad") || lower.contains("dark"),
            tempo,
        }
    }
}
