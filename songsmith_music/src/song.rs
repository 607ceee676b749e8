// The composer's output: one fully populated song plan.
//
// A `SongStructure` is built once by the engine, checked with `validate`,
// and then only read. Sections own their chords, melody, rhythm and active
// instruments, so two Verses of different lengths each carry material of the
// right size. The by-category lookups (`chords_for` and friends) return the
// first occurrence of that category.
//
// Serializes to JSON for downstream renderers.

use crate::chord::Chord;
use crate::error::ComposeError;
use crate::genre::Instrument;
use crate::melody::BEATS_PER_BAR;
use crate::rhythm::RhythmPattern;
use crate::structure::{Section, SectionKind, total_bars};
use crate::theory::{Mode, PitchClass, TimeSignature};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongStructure {
    pub(crate) title: Option<String>,
    pub(crate) genre: String,
    pub(crate) mood: String,
    pub(crate) lyrics: Option<String>,
    pub(crate) duration_minutes: u32,
    pub(crate) key: PitchClass,
    pub(crate) mode: Mode,
    pub(crate) bpm: u32,
    pub(crate) time_signature: TimeSignature,
    pub(crate) sections: Vec<Section>,
    /// Every instrument eligible for the genre.
    pub(crate) instruments: Vec<Instrument>,
}

impl SongStructure {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn mood(&self) -> &str {
        &self.mood
    }

    pub fn lyrics(&self) -> Option<&str> {
        self.lyrics.as_deref()
    }

    pub fn has_vocals(&self) -> bool {
        self.lyrics.is_some()
    }

    /// Length the song was planned for, after clamping.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn key(&self) -> PitchClass {
        self.key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn total_bars(&self) -> u32 {
        self.sections.iter().map(Section::bars).sum()
    }

    /// The section containing `bar` (0-based), if the song is that long.
    pub fn section_at_bar(&self, bar: u32) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains_bar(bar))
    }

    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind() == kind)
    }

    /// First section of `kind`.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections_of(kind).next()
    }

    pub fn chords_for(&self, kind: SectionKind) -> Option<&[Chord]> {
        self.section(kind).map(Section::chords)
    }

    pub fn melody_for(&self, kind: SectionKind) -> Option<&[u8]> {
        self.section(kind).map(Section::melody)
    }

    pub fn rhythm_for(&self, kind: SectionKind) -> Option<&RhythmPattern> {
        self.section(kind).map(Section::rhythm)
    }

    pub fn instruments_for(&self, kind: SectionKind) -> Option<&[Instrument]> {
        self.section(kind).map(Section::instruments)
    }

    /// Playing time implied by the bars, meter and tempo.
    pub fn duration_ms(&self) -> u64 {
        if self.bpm == 0 {
            return 0;
        }
        let beats = u64::from(self.total_bars()) * u64::from(self.time_signature.numerator);
        beats * 60_000 / u64::from(self.bpm)
    }

    /// Multi-line description for display.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Title: {}", self.title().unwrap_or("Untitled"));
        let _ = writeln!(out, "Genre: {}, Mood: {}", self.genre, self.mood);
        let _ = writeln!(
            out,
            "Key: {} {}, BPM: {}, Time: {}",
            self.key, self.mode, self.bpm, self.time_signature
        );
        let _ = writeln!(
            out,
            "Duration: {} minutes ({} bars)",
            self.duration_minutes,
            self.total_bars()
        );
        out.push_str("Sections:\n");
        for section in &self.sections {
            let _ = writeln!(out, "  - {section}");
        }
        let names: Vec<&str> = self.instruments.iter().map(|i| i.name()).collect();
        let _ = writeln!(out, "Instruments: {}", names.join(", "));
        out
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check every structural invariant of a finished song.
    pub fn validate(&self) -> Result<(), ComposeError> {
        let fail = |msg: String| -> Result<(), ComposeError> { Err(ComposeError::Invariant(msg)) };

        if self.sections.is_empty() {
            return fail("song has no sections".into());
        }

        let expected = total_bars(self.bpm, self.duration_minutes, self.time_signature);
        if self.total_bars() != expected {
            return fail(format!(
                "sections cover {} bars, budget is {expected}",
                self.total_bars()
            ));
        }

        let eligible: BTreeSet<Instrument> = self.instruments.iter().copied().collect();
        let mut next_start = 0;
        for (i, section) in self.sections.iter().enumerate() {
            let label = format!("section {i} ({})", section.name());
            if section.bars() == 0 {
                return fail(format!("{label} has zero bars"));
            }
            if section.start_bar() != next_start
                || section.end_bar() != section.start_bar() + section.bars() - 1
            {
                return fail(format!(
                    "{label} spans {}..={} but should start at {next_start} for {} bars",
                    section.start_bar(),
                    section.end_bar(),
                    section.bars()
                ));
            }
            next_start = section.end_bar() + 1;

            if section.chords().len() != section.bars() as usize {
                return fail(format!(
                    "{label} has {} chords for {} bars",
                    section.chords().len(),
                    section.bars()
                ));
            }
            if section.melody().len() != section.bars() as usize * BEATS_PER_BAR {
                return fail(format!(
                    "{label} has {} melody notes for {} bars",
                    section.melody().len(),
                    section.bars()
                ));
            }
            if !section.rhythm().is_well_formed() {
                return fail(format!("{label} has a malformed rhythm pattern"));
            }

            let mut seen = BTreeSet::new();
            for inst in section.instruments() {
                if !eligible.contains(inst) {
                    return fail(format!("{label} uses {inst}, not in the genre's set"));
                }
                if !seen.insert(*inst) {
                    return fail(format!("{label} lists {inst} twice"));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for SongStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SongStructure[{} - {} {}, {} bars, {} instruments]",
            self.title().unwrap_or("Untitled"),
            self.genre,
            self.mood,
            self.total_bars(),
            self.instruments.len()
        )
    }
}
