// Song form: section categories, bar budget and the section timeline.
//
// The timeline is planned before any notes exist. From the tempo, requested
// length and meter we get a bar budget; an Intro is taken off the front,
// Verse/Chorus pairs (with the occasional Bridge) are carved out while more
// than a threshold of bars remain, and an Outro absorbs whatever is left.
// Every section length is capped by what remains, so the plan always sums
// to the budget exactly and no section is empty.
//
// `Section::layout` then assigns start/end bars. Positions are derived here
// and nowhere else.
//
// Depends on config.rs for the timeline tunables. Consumed by engine.rs.

use crate::chord::Chord;
use crate::config::{SectionBudget, TimelineConfig};
use crate::genre::Instrument;
use crate::rhythm::RhythmPattern;
use crate::theory::TimeSignature;
use serde::{Deserialize, Serialize};
use songsmith_prng::SongRng;
use std::fmt;

/// Structural section categories.
///
/// The timeline only produces the five named kinds. `Other` is the default
/// arm for names that come from outside (e.g. `SectionKind::from_name`), and
/// gets the fallback progression and a rhythm-section-only arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectionKind {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Outro,
    Other,
}

impl SectionKind {
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Intro => "Intro",
            SectionKind::Verse => "Verse",
            SectionKind::Chorus => "Chorus",
            SectionKind::Bridge => "Bridge",
            SectionKind::Outro => "Outro",
            SectionKind::Other => "Other",
        }
    }

    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim();
        [
            SectionKind::Intro,
            SectionKind::Verse,
            SectionKind::Chorus,
            SectionKind::Bridge,
            SectionKind::Outro,
        ]
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(wanted))
        .unwrap_or(SectionKind::Other)
    }

    /// Canonical four-chord pattern as 1-indexed scale degrees.
    pub fn progression_pattern(self) -> [u8; 4] {
        match self {
            SectionKind::Intro => [1, 4, 1, 5],
            SectionKind::Verse => [6, 4, 1, 5],
            SectionKind::Chorus => [1, 5, 6, 4],
            SectionKind::Bridge => [4, 1, 2, 5],
            SectionKind::Outro => [4, 5, 1, 1],
            SectionKind::Other => [1, 4, 5, 1],
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A planned section before positions and material are assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPlan {
    pub kind: SectionKind,
    pub bars: u32,
    /// Loudness/density weight in [0, 1].
    pub intensity: f32,
}

/// One section of a finished song, with its position and musical material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    kind: SectionKind,
    bars: u32,
    intensity: f32,
    start_bar: u32,
    end_bar: u32,
    pub(crate) chords: Vec<Chord>,
    pub(crate) melody: Vec<u8>,
    pub(crate) rhythm: RhythmPattern,
    pub(crate) instruments: Vec<Instrument>,
}

impl Section {
    /// Lay plans end to end starting at bar 0.
    pub fn layout(plans: &[SectionPlan]) -> Vec<Section> {
        let mut current_bar = 0;
        plans
            .iter()
            .map(|plan| {
                let section = Section {
                    kind: plan.kind,
                    bars: plan.bars,
                    intensity: plan.intensity,
                    start_bar: current_bar,
                    end_bar: current_bar.saturating_add(plan.bars).saturating_sub(1),
                    chords: Vec::new(),
                    melody: Vec::new(),
                    rhythm: RhythmPattern::default(),
                    instruments: Vec::new(),
                };
                current_bar = current_bar.saturating_add(plan.bars);
                section
            })
            .collect()
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn bars(&self) -> u32 {
        self.bars
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// First bar of the section (0-based, inclusive).
    pub fn start_bar(&self) -> u32 {
        self.start_bar
    }

    /// Last bar of the section (inclusive).
    pub fn end_bar(&self) -> u32 {
        self.end_bar
    }

    pub fn contains_bar(&self, bar: u32) -> bool {
        (self.start_bar..=self.end_bar).contains(&bar)
    }

    /// One chord per bar.
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    /// MIDI pitches, four per bar.
    pub fn melody(&self) -> &[u8] {
        &self.melody
    }

    pub fn rhythm(&self) -> &RhythmPattern {
        &self.rhythm
    }

    /// Instruments playing in this section.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} bars, {:.1} intensity)",
            self.kind, self.bars, self.intensity
        )
    }
}

/// Bars needed to fill `minutes` at `bpm` in the given meter (rounded up).
///
/// Saturates at `u32::MAX`.
pub fn total_bars(bpm: u32, minutes: u32, time_signature: TimeSignature) -> u32 {
    let beats = u64::from(bpm) * u64::from(minutes);
    let per_bar = u64::from(time_signature.numerator.max(1));
    u32::try_from(beats.div_ceil(per_bar)).unwrap_or(u32::MAX)
}

/// Draw a section length from `budget`, capped at `cap` but never below 1.
fn draw_bars(budget: &SectionBudget, cap: u32, rng: &mut SongRng) -> u32 {
    rng.range_u32_inclusive(budget.min_bars, budget.max_bars)
        .min(cap)
        .max(1)
}

/// Plan the ordered section list for a bar budget.
///
/// The result is non-empty whenever `total` is, and its bar counts sum to
/// `total`.
pub fn build_timeline(total: u32, config: &TimelineConfig, rng: &mut SongRng) -> Vec<SectionPlan> {
    let mut plans = Vec::new();
    if total == 0 {
        return plans;
    }

    let intro_bars = rng
        .range_u32_inclusive(config.intro.min_bars, config.intro.max_bars)
        .min(total);
    plans.push(SectionPlan {
        kind: SectionKind::Intro,
        bars: intro_bars,
        intensity: config.intro.intensity,
    });
    let mut remaining = total - intro_bars;

    while remaining > config.loop_threshold {
        let verse_bars = draw_bars(&config.verse, remaining / 3, rng);
        plans.push(SectionPlan {
            kind: SectionKind::Verse,
            bars: verse_bars,
            intensity: config.verse.intensity,
        });
        remaining -= verse_bars;

        if remaining <= config.loop_threshold {
            break;
        }

        let chorus_bars = draw_bars(&config.chorus, remaining / 2, rng);
        plans.push(SectionPlan {
            kind: SectionKind::Chorus,
            bars: chorus_bars,
            intensity: config.chorus.intensity,
        });
        remaining -= chorus_bars;

        if plans.len() >= config.bridge_min_sections
            && rng.chance(config.bridge_chance)
            && remaining > config.bridge_min_remaining
        {
            let bridge_bars = draw_bars(&config.bridge, remaining / 3, rng);
            plans.push(SectionPlan {
                kind: SectionKind::Bridge,
                bars: bridge_bars,
                intensity: config.bridge.intensity,
            });
            remaining -= bridge_bars;
        }
    }

    if remaining > 0 {
        plans.push(SectionPlan {
            kind: SectionKind::Outro,
            bars: remaining,
            intensity: config.outro_intensity,
        });
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_sum(plans: &[SectionPlan]) -> u32 {
        plans.iter().map(|p| p.bars).sum()
    }

    #[test]
    fn bar_budget_rounds_up() {
        assert_eq!(total_bars(120, 3, TimeSignature::COMMON), 90);
        assert_eq!(total_bars(121, 1, TimeSignature::COMMON), 31);
        assert_eq!(total_bars(100, 1, TimeSignature::new(7, 8)), 15);
        assert_eq!(total_bars(60, 0, TimeSignature::COMMON), 0);
    }

    #[test]
    fn bar_budget_saturates() {
        assert_eq!(total_bars(200, u32::MAX, TimeSignature::COMMON), u32::MAX);
        assert_eq!(total_bars(u32::MAX, u32::MAX, TimeSignature::new(7, 8)), u32::MAX);
        // 4 * (2^32 - 1) beats in 4/4 fits exactly.
        assert_eq!(total_bars(4, u32::MAX, TimeSignature::COMMON), u32::MAX);
    }

    #[test]
    fn timeline_sums_to_budget() {
        let config = TimelineConfig::default();
        for seed in 0..200 {
            let mut rng = SongRng::new(seed);
            let total = 9 + (seed as u32 * 7) % 400;
            let plans = build_timeline(total, &config, &mut rng);
            assert_eq!(plan_sum(&plans), total, "seed {seed}");
            assert!(plans.iter().all(|p| p.bars > 0), "seed {seed}: empty section");
            assert_eq!(plans[0].kind, SectionKind::Intro);
        }
    }

    #[test]
    fn long_songs_get_verse_chorus_and_outro() {
        let config = TimelineConfig::default();
        let mut rng = SongRng::new(4);
        let plans = build_timeline(90, &config, &mut rng);
        let kinds: Vec<SectionKind> = plans.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&SectionKind::Verse));
        assert!(kinds.contains(&SectionKind::Chorus));
        assert_eq!(kinds.last(), Some(&SectionKind::Outro));
    }

    #[test]
    fn tiny_budget_is_intro_and_outro_only() {
        let config = TimelineConfig::default();
        let mut rng = SongRng::new(1);
        let plans = build_timeline(12, &config, &mut rng);
        assert_eq!(plans[0].kind, SectionKind::Intro);
        assert!(plans.len() <= 2);
        if let Some(last) = plans.get(1) {
            assert_eq!(last.kind, SectionKind::Outro);
        }
        assert_eq!(plan_sum(&plans), 12);
    }

    #[test]
    fn intro_is_capped_by_budget() {
        let config = TimelineConfig::default();
        let mut rng = SongRng::new(9);
        let plans = build_timeline(2, &config, &mut rng);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].bars, 2);
        assert!(build_timeline(0, &config, &mut rng).is_empty());
    }

    #[test]
    fn layout_is_contiguous() {
        let plans = [
            SectionPlan { kind: SectionKind::Intro, bars: 4, intensity: 0.6 },
            SectionPlan { kind: SectionKind::Verse, bars: 16, intensity: 0.8 },
            SectionPlan { kind: SectionKind::Outro, bars: 3, intensity: 0.7 },
        ];
        let sections = Section::layout(&plans);
        assert_eq!(sections[0].start_bar(), 0);
        assert_eq!(sections[0].end_bar(), 3);
        assert_eq!(sections[1].start_bar(), 4);
        assert_eq!(sections[1].end_bar(), 19);
        assert_eq!(sections[2].start_bar(), 20);
        assert_eq!(sections[2].end_bar(), 22);
        assert!(sections[1].contains_bar(19));
        assert!(!sections[1].contains_bar(20));
    }

    #[test]
    fn section_names_round_trip() {
        assert_eq!(SectionKind::from_name("chorus"), SectionKind::Chorus);
        assert_eq!(SectionKind::from_name("Pre-Chorus"), SectionKind::Other);
        assert_eq!(SectionKind::Other.progression_pattern(), [1, 4, 5, 1]);
    }

    #[test]
    fn section_display_matches_summary_line() {
        let plans = [SectionPlan { kind: SectionKind::Chorus, bars: 12, intensity: 1.0 }];
        let sections = Section::layout(&plans);
        assert_eq!(sections[0].to_string(), "Chorus (12 bars, 1.0 intensity)");
    }
}
