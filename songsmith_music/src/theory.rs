// Pitch classes, modes and meters: the vocabulary every other module uses.
//
// Keys are one of the 12 pitch classes, spelled with sharps on output.
// Free-text key names coming from callers are parsed leniently: flats are
// accepted as enharmonics ("Bb" is A#) and anything unrecognised becomes C.
// Modes carry their semitone interval tables; Pentatonic has five degrees,
// the others seven. Unknown mode names fall back to Major.
//
// Used by chord.rs for triad derivation, melody.rs for scale membership and
// engine.rs for parameter selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sharp spellings, indexed by pitch class.
const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the 12 pitch classes (0 = C, 11 = B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// All 12 pitch classes in chromatic order.
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..12).map(PitchClass)
    }

    /// Wraps any integer into the 0..12 range.
    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(12) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        SHARP_NAMES[self.0 as usize]
    }

    /// Transpose upward by `semitones`, wrapping at the octave.
    pub fn transpose(self, semitones: i32) -> Self {
        PitchClass::new(i32::from(self.0) + semitones)
    }

    /// Upward distance in semitones from `self` to `other` (0..12).
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.0 + 12 - self.0) % 12
    }

    /// Parse a note name such as "C", "f#" or "Bb".
    ///
    /// Returns `None` unless the whole string is a note letter followed by
    /// at most one accidental.
    pub fn parse(name: &str) -> Option<Self> {
        let (pc, rest) = split_note_name(name.trim())?;
        rest.is_empty().then_some(pc)
    }

    /// Lenient parse for caller-supplied keys: unknown names become C.
    pub fn from_name_or_c(name: &str) -> Self {
        PitchClass::parse(name).unwrap_or(PitchClass::C)
    }

    /// MIDI note number of this pitch class in `octave` (C4 = 60).
    pub fn midi(self, octave: i32) -> i32 {
        (octave + 1) * 12 + i32::from(self.0)
    }
}

/// Split a leading note name ("C#", "Bb", "G") off the front of `text`.
///
/// Returns the pitch class and whatever follows the accidental. Shared with
/// chord-symbol parsing in chord.rs.
pub fn split_note_name(text: &str) -> Option<(PitchClass, &str)> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let natural: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let after_letter = &text[1..];
    if let Some(rest) = after_letter.strip_prefix('#') {
        Some((PitchClass::new(natural + 1), rest))
    } else if let Some(rest) = after_letter.strip_prefix('b') {
        Some((PitchClass::new(natural - 1), rest))
    } else {
        Some((PitchClass::new(natural), after_letter))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::parse(s).ok_or_else(|| format!("not a note name: {s:?}"))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(pc: PitchClass) -> Self {
        pc.name().to_string()
    }
}

/// Scale modes supported by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Ionian: 0 2 4 5 7 9 11
    Major,
    /// Natural minor (Aeolian): 0 2 3 5 7 8 10
    Minor,
    /// Minor with raised 6th: 0 2 3 5 7 9 10
    Dorian,
    /// Major with lowered 7th: 0 2 4 5 7 9 10
    Mixolydian,
    /// Major pentatonic: 0 2 4 7 9
    Pentatonic,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Major,
        Mode::Minor,
        Mode::Dorian,
        Mode::Mixolydian,
        Mode::Pentatonic,
    ];

    /// Semitone offsets of each scale degree above the tonic.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Mode::Major => &[0, 2, 4, 5, 7, 9, 11],
            Mode::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Mode::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Mode::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Mode::Pentatonic => &[0, 2, 4, 7, 9],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
            Mode::Dorian => "Dorian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Pentatonic => "Pentatonic",
        }
    }

    /// Case-insensitive lookup; unknown names fall back to Major.
    pub fn from_name_or_major(name: &str) -> Self {
        let wanted = name.trim();
        Mode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .unwrap_or(Mode::Major)
    }

    /// Whether `pc` lies in this mode built on `tonic`.
    pub fn contains(self, tonic: PitchClass, pc: PitchClass) -> bool {
        self.intervals().contains(&tonic.interval_to(pc))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A meter, e.g. 4/4 or 7/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar; also the divisor in the bar-budget arithmetic.
    pub numerator: u8,
    /// Note value of one beat (4 = quarter, 8 = eighth).
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature::new(4, 4);
    pub const WALTZ: TimeSignature = TimeSignature::new(3, 4);

    pub const fn new(numerator: u8, denominator: u8) -> Self {
        TimeSignature {
            numerator,
            denominator,
        }
    }

    pub fn as_pair(self) -> (u8, u8) {
        (self.numerator, self.denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
