// Data-driven composer configuration.
//
// Every tunable the composer reads lives in `ComposerConfig`: the mood to
// key-candidate table, genre tempo ranges, the tempo clamp, timeline section
// budgets and bridge odds, genre chord-colour probabilities and the melody
// pitch window. `Default` reproduces the built-in tables. A config can also
// be loaded from JSON so tables are tunable without recompiling; loading
// always validates, and `CompositionEngine::new` refuses an invalid config,
// so generation never runs against broken tables.
//
// Tables are keyed by the closed `Genre`/`Mood` enums. Lookups that miss go
// to the explicit default fields (`default_tempo`, the full chromatic key
// list), never to an error.

use crate::error::ConfigError;
use crate::genre::Genre;
use crate::mood::Mood;
use crate::theory::PitchClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Half-open tempo range `[min, max)` in BPM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoRange {
    pub min: u32,
    pub max: u32,
}

impl TempoRange {
    pub const fn new(min: u32, max: u32) -> Self {
        TempoRange { min, max }
    }

    pub fn contains(&self, bpm: u32) -> bool {
        (self.min..self.max).contains(&bpm)
    }
}

/// Tempo selection: per-genre base ranges, mood shift and hard clamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TempoConfig {
    pub genre_ranges: BTreeMap<Genre, TempoRange>,
    /// Used for genres missing from `genre_ranges`.
    pub default_range: TempoRange,
    /// Size of the mood push toward faster or slower, `[min, max)`.
    pub mood_shift: TempoRange,
    /// Inclusive lower clamp.
    pub min_bpm: u32,
    /// Inclusive upper clamp.
    pub max_bpm: u32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        let genre_ranges = BTreeMap::from([
            (Genre::Pop, TempoRange::new(120, 140)),
            (Genre::Rock, TempoRange::new(110, 160)),
            (Genre::Electronic, TempoRange::new(128, 140)),
            (Genre::Jazz, TempoRange::new(90, 120)),
            (Genre::Classical, TempoRange::new(60, 120)),
            (Genre::HipHop, TempoRange::new(70, 100)),
            (Genre::Country, TempoRange::new(100, 130)),
            (Genre::Folk, TempoRange::new(80, 110)),
        ]);
        TempoConfig {
            genre_ranges,
            default_range: TempoRange::new(100, 130),
            mood_shift: TempoRange::new(10, 30),
            min_bpm: 60,
            max_bpm: 200,
        }
    }
}

impl TempoConfig {
    pub fn range_for(&self, genre: Genre) -> TempoRange {
        self.genre_ranges
            .get(&genre)
            .copied()
            .unwrap_or(self.default_range)
    }
}

/// Length range (inclusive) and intensity for one section category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionBudget {
    pub min_bars: u32,
    pub max_bars: u32,
    pub intensity: f32,
}

impl SectionBudget {
    pub const fn new(min_bars: u32, max_bars: u32, intensity: f32) -> Self {
        SectionBudget {
            min_bars,
            max_bars,
            intensity,
        }
    }
}

/// Parameters for the section timeline builder in structure.rs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub intro: SectionBudget,
    pub verse: SectionBudget,
    pub chorus: SectionBudget,
    pub bridge: SectionBudget,
    pub outro_intensity: f32,
    /// Keep adding Verse/Chorus pairs while more than this many bars remain.
    pub loop_threshold: u32,
    /// Probability of a Bridge after a Chorus, once it is eligible.
    pub bridge_chance: f64,
    /// A Bridge needs at least this many sections already planned.
    pub bridge_min_sections: usize,
    /// ...and strictly more than this many bars remaining.
    pub bridge_min_remaining: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            intro: SectionBudget::new(4, 8, 0.6),
            verse: SectionBudget::new(16, 24, 0.8),
            chorus: SectionBudget::new(12, 16, 1.0),
            bridge: SectionBudget::new(8, 16, 0.9),
            outro_intensity: 0.7,
            loop_threshold: 16,
            bridge_chance: 0.3,
            bridge_min_sections: 4,
            bridge_min_remaining: 20,
        }
    }
}

/// Per-chord probability of genre colouring (extensions, suspensions).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariationConfig {
    pub probabilities: BTreeMap<Genre, f64>,
}

impl Default for VariationConfig {
    fn default() -> Self {
        VariationConfig {
            probabilities: BTreeMap::from([
                (Genre::Jazz, 0.30),
                (Genre::Rock, 0.20),
                (Genre::Electronic, 0.25),
            ]),
        }
    }
}

impl VariationConfig {
    /// Zero for genres without a colouring style.
    pub fn probability_for(&self, genre: Genre) -> f64 {
        self.probabilities.get(&genre).copied().unwrap_or(0.0)
    }
}

/// MIDI pitch window for melodies, `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyConfig {
    pub low: u8,
    pub high: u8,
}

impl Default for MelodyConfig {
    fn default() -> Self {
        // C4 up to (but excluding) C6.
        MelodyConfig { low: 60, high: 84 }
    }
}

/// Complete composer configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Key candidates per mood. Moods without an entry draw from all 12 keys.
    pub mood_keys: BTreeMap<Mood, Vec<PitchClass>>,
    pub tempo: TempoConfig,
    pub timeline: TimelineConfig,
    pub variations: VariationConfig,
    pub melody: MelodyConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        let keys = |names: [&str; 5]| -> Vec<PitchClass> {
            names.iter().map(|n| PitchClass::from_name_or_c(n)).collect()
        };
        let mood_keys = BTreeMap::from([
            (Mood::Happy, keys(["C", "G", "D", "A", "E"])),
            (Mood::Sad, keys(["A", "E", "B", "F#", "C#"])),
            (Mood::Energetic, keys(["E", "B", "F#", "C#", "G#"])),
            (Mood::Calm, keys(["F", "Bb", "Eb", "Ab", "Db"])),
            (Mood::Mysterious, keys(["F#", "C#", "G#", "D#", "A#"])),
            (Mood::Romantic, keys(["F", "C", "G", "D", "A"])),
        ]);
        ComposerConfig {
            mood_keys,
            tempo: TempoConfig::default(),
            timeline: TimelineConfig::default(),
            variations: VariationConfig::default(),
            melody: MelodyConfig::default(),
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Key candidates for a mood, falling back to the chromatic set.
    pub fn keys_for(&self, mood: Mood) -> Vec<PitchClass> {
        match self.mood_keys.get(&mood) {
            Some(keys) if !keys.is_empty() => keys.clone(),
            _ => PitchClass::all().collect(),
        }
    }

    /// Check every table for values the generators cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (mood, keys) in &self.mood_keys {
            if keys.is_empty() {
                return Err(ConfigError::EmptyKeyList(mood.name().to_string()));
            }
        }

        let tempo = &self.tempo;
        let ranges = tempo
            .genre_ranges
            .iter()
            .map(|(g, r)| (g.name().to_string(), *r))
            .chain([
                ("default".to_string(), tempo.default_range),
                ("mood shift".to_string(), tempo.mood_shift),
            ]);
        for (name, range) in ranges {
            if range.min >= range.max {
                return Err(ConfigError::EmptyTempoRange {
                    name,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        if tempo.min_bpm == 0 || tempo.min_bpm > tempo.max_bpm {
            return Err(ConfigError::BadTempoClamp {
                min: tempo.min_bpm,
                max: tempo.max_bpm,
            });
        }

        let timeline = &self.timeline;
        for (name, budget) in [
            ("intro", &timeline.intro),
            ("verse", &timeline.verse),
            ("chorus", &timeline.chorus),
            ("bridge", &timeline.bridge),
        ] {
            if budget.min_bars == 0 || budget.min_bars > budget.max_bars {
                return Err(ConfigError::BadSectionBars {
                    section: name.to_string(),
                    min: budget.min_bars,
                    max: budget.max_bars,
                });
            }
            check_intensity(name, budget.intensity)?;
        }
        check_intensity("outro", timeline.outro_intensity)?;
        check_probability("bridge", timeline.bridge_chance)?;

        for (genre, p) in &self.variations.probabilities {
            check_probability(genre.name(), *p)?;
        }

        let melody = self.melody;
        if melody.low >= melody.high || melody.high > 128 || melody.high - melody.low < 12 {
            return Err(ConfigError::BadMelodyWindow {
                low: melody.low,
                high: melody.high,
            });
        }

        Ok(())
    }
}

fn check_intensity(section: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::BadIntensity {
            section: section.to_string(),
            value,
        })
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::BadProbability {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ComposerConfig::default().validate().unwrap();
    }

    #[test]
    fn json_round_trip_preserves_tables() {
        let config = ComposerConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"hip-hop\""));
        assert!(json.contains("\"calm\""));
        let back = ComposerConfig::from_json(&json).unwrap();
        assert_eq!(back.tempo.range_for(Genre::Rock), TempoRange::new(110, 160));
        assert_eq!(back.keys_for(Mood::Happy), config.keys_for(Mood::Happy));
    }

    #[test]
    fn calm_keys_are_flat_keys_not_c() {
        let names: Vec<&str> = ComposerConfig::default()
            .keys_for(Mood::Calm)
            .into_iter()
            .map(PitchClass::name)
            .collect();
        assert_eq!(names, vec!["F", "A#", "D#", "G#", "C#"]);
    }

    #[test]
    fn unknown_mood_uses_all_keys() {
        assert_eq!(ComposerConfig::default().keys_for(Mood::Other).len(), 12);
    }

    #[test]
    fn unlisted_genre_uses_default_tempo() {
        let tempo = TempoConfig::default();
        assert_eq!(tempo.range_for(Genre::Other), TempoRange::new(100, 130));
        assert_eq!(tempo.range_for(Genre::Waltz), TempoRange::new(100, 130));
    }

    #[test]
    fn rejects_inverted_tempo_range() {
        let mut config = ComposerConfig::default();
        config.tempo.genre_ranges.insert(Genre::Pop, TempoRange::new(140, 120));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTempoRange { .. })
        ));
    }

    #[test]
    fn rejects_empty_key_list() {
        let mut config = ComposerConfig::default();
        config.mood_keys.insert(Mood::Sad, Vec::new());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyKeyList(_))));
    }

    #[test]
    fn rejects_zero_bar_sections_and_bad_odds() {
        let mut config = ComposerConfig::default();
        config.timeline.verse.min_bars = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadSectionBars { .. })
        ));

        let mut config = ComposerConfig::default();
        config.timeline.bridge_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadProbability { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ComposerConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
