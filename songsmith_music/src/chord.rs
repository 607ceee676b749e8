// Diatonic harmony: scale chords, section progressions and chord voicings.
//
// For a (key, mode) pair we stack thirds on every scale degree: degree i
// takes its root, third and fifth from interval[i], interval[i+2] and
// interval[i+4] (indices wrap at the mode's degree count, so Pentatonic
// reuses its five intervals). The triad quality comes from the resulting
// root-to-third and root-to-fifth distances. The seven chords are a pure
// function of (key, mode) and are memoized per `ChordProgression` instance.
//
// The cache is a `DashMap`: concurrent readers never block each other, and
// two tasks racing on the first computation of the same key simply both
// insert an equal value. Nothing is ever evicted.
//
// A section's progression is its category's four-degree pattern (cycled to
// 4 or 8 chords), mapped to scale chords and then repeated cyclically to
// exactly one chord per bar.
//
// Genre colour is optional: each chord independently gets a jazz extension,
// rock suspension/power suffix or electronic add-tone with a per-genre
// probability from config.rs.
//
// `chord_notes` goes the other way, from a chord symbol back to MIDI pitches,
// by reading the symbol's text markers.

use crate::config::VariationConfig;
use crate::genre::Genre;
use crate::structure::SectionKind;
use crate::theory::{Mode, PitchClass, split_note_name};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use songsmith_prng::SongRng;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const JAZZ_EXTENSIONS: [&str; 5] = ["7", "maj7", "9", "11", "13"];
const ROCK_VARIATIONS: [&str; 4] = ["5", "sus2", "sus4", "add9"];
const ELECTRONIC_VARIATIONS: [&str; 4] = ["sus2", "sus4", "add9", "6"];

/// Third above the chord root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Third {
    Minor,
    Major,
}

/// Fifth above the chord root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fifth {
    Diminished,
    Perfect,
    Augmented,
}

/// A chord: root, triad quality and an optional colour suffix ("7", "sus4").
///
/// Serialized as its symbol, e.g. `"Am7"` or `"Bdim"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chord {
    pub root: PitchClass,
    pub third: Third,
    pub fifth: Fifth,
    pub suffix: String,
}

impl Chord {
    pub fn triad(root: PitchClass, third: Third, fifth: Fifth) -> Self {
        Chord {
            root,
            third,
            fifth,
            suffix: String::new(),
        }
    }

    /// Build the triad `root`/`third`/`fifth` from pitch classes.
    ///
    /// A 3-semitone third is minor and anything else major; a 6-semitone
    /// fifth is diminished, 8 augmented, anything else perfect.
    pub fn from_tones(root: PitchClass, third: PitchClass, fifth: PitchClass) -> Self {
        let third = match root.interval_to(third) {
            3 => Third::Minor,
            _ => Third::Major,
        };
        let fifth = match root.interval_to(fifth) {
            6 => Fifth::Diminished,
            8 => Fifth::Augmented,
            _ => Fifth::Perfect,
        };
        Chord::triad(root, third, fifth)
    }

    /// Copy with `extra` appended to the colour suffix.
    pub fn with_suffix(&self, extra: &str) -> Self {
        let mut chord = self.clone();
        chord.suffix.push_str(extra);
        chord
    }

    /// Quality part of the symbol between root and suffix.
    fn quality_symbol(&self) -> &'static str {
        match (self.third, self.fifth) {
            (Third::Minor, Fifth::Diminished) => "dim",
            (Third::Major, Fifth::Diminished) => "(b5)",
            (Third::Minor, Fifth::Perfect) => "m",
            (Third::Major, Fifth::Perfect) => "",
            (Third::Minor, Fifth::Augmented) => "maug",
            (Third::Major, Fifth::Augmented) => "aug",
        }
    }

    pub fn symbol(&self) -> String {
        format!("{}{}{}", self.root, self.quality_symbol(), self.suffix)
    }

    /// Parse a symbol produced by [`Chord::symbol`].
    pub fn parse(symbol: &str) -> Option<Self> {
        let (root, rest) = split_note_name(symbol.trim())?;
        let (third, fifth, suffix) = if let Some(s) = rest.strip_prefix("dim") {
            (Third::Minor, Fifth::Diminished, s)
        } else if let Some(s) = rest.strip_prefix("maug") {
            (Third::Minor, Fifth::Augmented, s)
        } else if let Some(s) = rest.strip_prefix("aug") {
            (Third::Major, Fifth::Augmented, s)
        } else if let Some(s) = rest.strip_prefix("(b5)") {
            (Third::Major, Fifth::Diminished, s)
        } else if rest.starts_with('m') && !rest.starts_with("maj") {
            (Third::Minor, Fifth::Perfect, &rest[1..])
        } else {
            (Third::Major, Fifth::Perfect, rest)
        };
        Some(Chord {
            root,
            third,
            fifth,
            suffix: suffix.to_string(),
        })
    }

    /// Semitones above the root, in the order `chord_notes` emits them.
    fn intervals(&self) -> Vec<i32> {
        let suffix = self.suffix.as_str();
        let mut intervals = vec![0];

        let power_chord = suffix == "5" && self.fifth == Fifth::Perfect;
        if suffix.contains("sus2") {
            intervals.push(2);
        } else if suffix.contains("sus4") {
            intervals.push(5);
        } else if !power_chord {
            intervals.push(match self.third {
                Third::Minor => 3,
                Third::Major => 4,
            });
        }

        intervals.push(match self.fifth {
            Fifth::Diminished => 6,
            Fifth::Perfect => 7,
            Fifth::Augmented => 8,
        });

        if suffix.contains("maj7") {
            intervals.push(11);
        } else if suffix.contains('7') {
            intervals.push(10);
        }
        if suffix.contains('9') {
            intervals.push(14);
        }
        intervals
    }

    /// MIDI pitches of this chord with its root in `octave`.
    ///
    /// Matches `chord_notes(&self.symbol(), octave)`.
    pub fn notes(&self, octave: i32) -> Vec<i32> {
        let root = self.root.midi(octave);
        self.intervals().into_iter().map(|i| root + i).collect()
    }

    /// Distinct pitch classes sounded by this chord.
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        let mut pcs: Vec<PitchClass> = self
            .intervals()
            .into_iter()
            .map(|i| self.root.transpose(i))
            .collect();
        pcs.sort();
        pcs.dedup();
        pcs
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

impl TryFrom<String> for Chord {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Chord::parse(&value).ok_or_else(|| format!("not a chord symbol: {value:?}"))
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> Self {
        chord.symbol()
    }
}

/// Expand a chord symbol to MIDI pitches with the root in `octave` (C4 = 60).
///
/// Reads markers in the text after the root: an "m" outside "maj" gives a
/// minor third, "sus2"/"sus4" replace the third, a bare "5" drops it,
/// "dim"/"b5"/"aug" alter the fifth, "7" adds a minor seventh ("maj7" a major
/// one) and "9" adds the ninth. An unreadable root is treated as C.
pub fn chord_notes(symbol: &str, octave: i32) -> Vec<i32> {
    let symbol = symbol.trim();
    let (root, rest) = split_note_name(symbol).unwrap_or((PitchClass::C, symbol));
    let root_note = root.midi(octave);
    let without_maj = rest.replace("maj", "");

    let mut notes = vec![root_note];

    let power_chord = rest.trim_start_matches('m') == "5";
    if rest.contains("sus2") {
        notes.push(root_note + 2);
    } else if rest.contains("sus4") {
        notes.push(root_note + 5);
    } else if power_chord {
        // root and fifth only
    } else if without_maj.contains('m') {
        notes.push(root_note + 3);
    } else {
        notes.push(root_note + 4);
    }

    if rest.contains("dim") || rest.contains("b5") {
        notes.push(root_note + 6);
    } else if rest.contains("aug") {
        notes.push(root_note + 8);
    } else {
        notes.push(root_note + 7);
    }

    if rest.contains("maj7") {
        notes.push(root_note + 11);
    } else if rest.contains('7') {
        notes.push(root_note + 10);
    }

    if rest.contains('9') {
        notes.push(root_note + 14);
    }

    notes
}

/// Cycle `chords` until there is exactly one chord per bar.
///
/// An empty input stays empty; callers guarantee at least one chord.
pub fn fit_to_bars(chords: &[Chord], bars: usize) -> Vec<Chord> {
    chords.iter().cycle().take(bars).cloned().collect()
}

/// Scale-degree pattern for a section, `length` degrees long.
///
/// Eight degrees is the four-chord pattern stated twice; any other length
/// cycles the pattern.
pub fn progression_pattern(kind: SectionKind, length: usize) -> Vec<u8> {
    let base = kind.progression_pattern();
    (0..length).map(|i| base[i % base.len()]).collect()
}

/// Chord colouring styles keyed off the exact genre.
fn variation_palette(genre: Genre) -> &'static [&'static str] {
    match genre {
        Genre::Jazz => &JAZZ_EXTENSIONS,
        Genre::Rock => &ROCK_VARIATIONS,
        Genre::Electronic => &ELECTRONIC_VARIATIONS,
        _ => &[],
    }
}

/// Harmony generator with its own scale-chord memo.
#[derive(Debug, Default)]
pub struct ChordProgression {
    cache: DashMap<(PitchClass, Mode), Arc<[Chord]>>,
    variations: VariationConfig,
}

impl ChordProgression {
    pub fn new(variations: VariationConfig) -> Self {
        ChordProgression {
            cache: DashMap::new(),
            variations,
        }
    }

    /// The seven diatonic triads of `key` in `mode`, in degree order.
    pub fn scale_chords(&self, key: PitchClass, mode: Mode) -> Arc<[Chord]> {
        if let Some(hit) = self.cache.get(&(key, mode)) {
            return Arc::clone(hit.value());
        }

        let intervals = mode.intervals();
        let n = intervals.len();
        let tone = |idx: usize| key.transpose(i32::from(intervals[idx % n]));
        let chords: Arc<[Chord]> = (0..7)
            .map(|i| Chord::from_tones(tone(i), tone(i + 2), tone(i + 4)))
            .collect();
        debug!(key = %key, mode = %mode, "scale chords computed");

        // A racing task may have inserted the same value; overwriting is harmless.
        self.cache.insert((key, mode), Arc::clone(&chords));
        chords
    }

    /// `scale_chords` for caller-supplied names, with the C / Major fallbacks.
    pub fn scale_chords_by_name(&self, key: &str, mode: &str) -> Arc<[Chord]> {
        self.scale_chords(PitchClass::from_name_or_c(key), Mode::from_name_or_major(mode))
    }

    /// Number of memoized (key, mode) pairs.
    pub fn cached_scales(&self) -> usize {
        self.cache.len()
    }

    /// One chord per bar for a section of `kind`.
    pub fn generate_progression(
        &self,
        key: PitchClass,
        mode: Mode,
        kind: SectionKind,
        bars: u32,
    ) -> Vec<Chord> {
        let chords = self.scale_chords(key, mode);
        let length = if bars <= 8 { 4 } else { 8 };

        let mut progression: Vec<Chord> = progression_pattern(kind, length)
            .into_iter()
            .filter(|degree| (1..=7).contains(degree))
            .map(|degree| chords[usize::from(degree) - 1].clone())
            .collect();
        if progression.is_empty() {
            progression.push(chords[0].clone());
        }

        let progression = fit_to_bars(&progression, bars as usize);
        let symbols: Vec<String> = progression.iter().map(Chord::symbol).collect();
        debug!(section = %kind, bars, chords = ?symbols, "progression generated");
        progression
    }

    /// Colour individual chords according to the genre's style.
    ///
    /// Each chord is considered independently; genres without a style come
    /// back unchanged. Length is preserved.
    pub fn apply_genre_variations(
        &self,
        progression: &[Chord],
        genre: &str,
        rng: &mut SongRng,
    ) -> Vec<Chord> {
        let genre = Genre::from_name(genre);
        let palette = variation_palette(genre);
        let p = self.variations.probability_for(genre);
        if palette.is_empty() || p <= 0.0 {
            return progression.to_vec();
        }

        progression
            .iter()
            .map(|chord| {
                if rng.chance(p) {
                    match rng.pick(palette) {
                        Some(extra) => chord.with_suffix(extra),
                        None => chord.clone(),
                    }
                } else {
                    chord.clone()
                }
            })
            .collect()
    }

    /// Verse progression with genre colouring applied.
    pub fn progression_with_variations(
        &self,
        key: PitchClass,
        mode: Mode,
        genre: &str,
        bars: u32,
        rng: &mut SongRng,
    ) -> Vec<Chord> {
        let base = self.generate_progression(key, mode, SectionKind::Verse, bars);
        self.apply_genre_variations(&base, genre, rng)
    }
}
