// Genre and instrument registry.
//
// A genre arrives as free text. `Genre::from_name` matches it
// case-insensitively against the known set and maps everything else to the
// explicit `Other` arm, which carries the documented defaults (instrument
// set drums/bass/guitar/piano, default tempo range, 4/4). Some selection
// rules look for substrings instead (a "smooth jazz" request still gets a
// jazz mode); those checks live on `GenreCues` and read the raw text.
//
// Depends on nothing else in the crate. Used by engine.rs for the
// arrangement and parameter selection and by chord.rs for genre colour.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Genres with their own table entries. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Pop,
    Rock,
    Electronic,
    Jazz,
    Classical,
    HipHop,
    Country,
    Folk,
    Waltz,
    Progressive,
    Other,
}

impl Genre {
    pub const KNOWN: [Genre; 10] = [
        Genre::Pop,
        Genre::Rock,
        Genre::Electronic,
        Genre::Jazz,
        Genre::Classical,
        Genre::HipHop,
        Genre::Country,
        Genre::Folk,
        Genre::Waltz,
        Genre::Progressive,
    ];

    /// Exact, case-insensitive match against the known genre names.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim();
        Genre::KNOWN
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(wanted))
            .unwrap_or(Genre::Other)
    }

    pub fn name(self) -> &'static str {
        match self {
            Genre::Pop => "pop",
            Genre::Rock => "rock",
            Genre::Electronic => "electronic",
            Genre::Jazz => "jazz",
            Genre::Classical => "classical",
            Genre::HipHop => "hip-hop",
            Genre::Country => "country",
            Genre::Folk => "folk",
            Genre::Waltz => "waltz",
            Genre::Progressive => "progressive",
            Genre::Other => "other",
        }
    }

    /// The curated instrument set for this genre, in canonical order.
    pub fn instruments(self) -> &'static [Instrument] {
        use Instrument::*;
        match self {
            Genre::Pop => &[Drums, Bass, Guitar, Piano, Synth, Vocals],
            Genre::Rock => &[Drums, Bass, Guitar, Vocals],
            Genre::Electronic => &[Drums, Bass, Synth, Pad, Lead],
            Genre::Jazz => &[Drums, Bass, Piano, Saxophone, Trumpet],
            Genre::Classical => &[Strings, Piano, Woodwinds, Brass],
            _ => &DEFAULT_INSTRUMENTS,
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fallback instrument set for genres without their own entry.
pub const DEFAULT_INSTRUMENTS: [Instrument; 4] = [
    Instrument::Drums,
    Instrument::Bass,
    Instrument::Guitar,
    Instrument::Piano,
];

/// Instrument identifiers handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Drums,
    Bass,
    Guitar,
    Piano,
    Synth,
    Vocals,
    Pad,
    Lead,
    Saxophone,
    Trumpet,
    Strings,
    Woodwinds,
    Brass,
}

impl Instrument {
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Drums => "drums",
            Instrument::Bass => "bass",
            Instrument::Guitar => "guitar",
            Instrument::Piano => "piano",
            Instrument::Synth => "synth",
            Instrument::Vocals => "vocals",
            Instrument::Pad => "pad",
            Instrument::Lead => "lead",
            Instrument::Saxophone => "saxophone",
            Instrument::Trumpet => "trumpet",
            Instrument::Strings => "strings",
            Instrument::Woodwinds => "woodwinds",
            Instrument::Brass => "brass",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruments eligible for a free-text genre. Never empty.
pub fn instruments_for_genre(genre: &str) -> Vec<Instrument> {
    Genre::from_name(genre).instruments().to_vec()
}

/// Substring cues read from the raw genre text.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenreCues {
    pub jazzy: bool,
    pub folky: bool,
}

impl GenreCues {
    pub fn from_text(genre: &str) -> Self {
        let lower = genre.to_lowercase();
        GenreCues {
            jazzy: lower.contains("jazz"),
            folky: lower.contains("folk") || lower.contains("country"),
        }
    }
}
