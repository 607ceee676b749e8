// Composition pipeline: one request in, one validated `SongStructure` out.
//
// Stages run in a fixed order against a single `&mut SongRng`, so a seed
// fully determines the song:
//
//   1. parameters   key from the mood's candidates, mode from mood/genre
//                   cues, tempo from the genre range plus mood shift, meter
//                   from the genre
//   2. timeline     bar budget, then Intro / Verse-Chorus (Bridge) / Outro
//   3. harmony      one chord per bar per section, optionally genre-coloured
//   4. melody       four chord-aware pitches per bar
//   5. rhythm       one pattern per section from genre and meter
//   6. arrangement  genre instrument set and per-section active subsets
//
// The finished song is validated before it is returned; a failure there is a
// generator bug and comes back as `ComposeError::Invariant` instead of a
// malformed song.
//
// `CompositionEngine` holds only the validated config and the chord cache,
// both safe to share, so one engine can serve many threads at once, each
// with its own RNG.

use crate::chord::ChordProgression;
use crate::config::ComposerConfig;
use crate::error::ComposeError;
use crate::genre::{Genre, GenreCues, Instrument, instruments_for_genre};
use crate::melody::generate_melody;
use crate::mood::{Mood, MoodCues, TempoLean};
use crate::rhythm::generate_pattern;
use crate::song::SongStructure;
use crate::structure::{Section, SectionKind, build_timeline, total_bars};
use crate::theory::{Mode, PitchClass, TimeSignature};
use serde::{Deserialize, Serialize};
use songsmith_prng::SongRng;
use tracing::{debug, info, warn};

const PROGRESSIVE_METERS: [TimeSignature; 3] = [
    TimeSignature::new(7, 8),
    TimeSignature::new(5, 4),
    TimeSignature::new(6, 8),
];

/// Bridge sections draw at most this many instruments from the genre set.
const BRIDGE_PICKS: usize = 4;

/// Longest song the engine will plan; longer requests are clamped.
pub const MAX_DURATION_MINUTES: u32 = 60;

/// One generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRequest {
    pub genre: String,
    pub mood: String,
    pub lyrics: Option<String>,
    pub duration_minutes: u32,
    pub title: Option<String>,
    /// Colour progressions with the genre's extensions and suspensions.
    #[serde(default)]
    pub genre_variations: bool,
}

impl SongRequest {
    pub fn new(genre: impl Into<String>, mood: impl Into<String>, duration_minutes: u32) -> Self {
        SongRequest {
            genre: genre.into(),
            mood: mood.into(),
            duration_minutes,
            ..Default::default()
        }
    }

    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.lyrics = Some(lyrics.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_genre_variations(mut self, on: bool) -> Self {
        self.genre_variations = on;
        self
    }
}

/// Song-wide musical parameters chosen in the first stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SongParameters {
    pub key: PitchClass,
    pub mode: Mode,
    pub bpm: u32,
    pub time_signature: TimeSignature,
}

/// Mode from the mood and genre text: dark moods are minor, jazz is modal,
/// folk and country are pentatonic, everything else major.
pub fn select_mode(genre: &str, mood: &str, rng: &mut SongRng) -> Mode {
    let genre_cues = GenreCues::from_text(genre);
    if MoodCues::from_text(mood).dark {
        Mode::Minor
    } else if genre_cues.jazzy {
        if rng.coin_flip() { Mode::Dorian } else { Mode::Mixolydian }
    } else if genre_cues.folky {
        Mode::Pentatonic
    } else {
        Mode::Major
    }
}

/// Meter by exact genre: waltz in three, jazz in four or three, progressive
/// in an odd meter, common time otherwise.
pub fn select_time_signature(genre: &str, rng: &mut SongRng) -> TimeSignature {
    match Genre::from_name(genre) {
        Genre::Waltz => TimeSignature::WALTZ,
        Genre::Jazz => {
            if rng.coin_flip() {
                TimeSignature::COMMON
            } else {
                TimeSignature::WALTZ
            }
        }
        Genre::Progressive => rng
            .pick(&PROGRESSIVE_METERS)
            .copied()
            .unwrap_or(TimeSignature::COMMON),
        _ => TimeSignature::COMMON,
    }
}

/// Instruments active in one section, rhythm section first, no repeats.
pub fn active_instruments(
    available: &[Instrument],
    kind: SectionKind,
    intensity: f32,
    rng: &mut SongRng,
) -> Vec<Instrument> {
    use Instrument::*;
    let has = |inst: Instrument| available.contains(&inst);
    let mut selected: Vec<Instrument> = [Drums, Bass].into_iter().filter(|&i| has(i)).collect();

    let extra: Vec<Instrument> = match kind {
        SectionKind::Intro => vec![Piano],
        SectionKind::Verse => {
            let mut v = vec![Guitar, Piano];
            if intensity > 0.7 {
                v.push(Strings);
            }
            v
        }
        SectionKind::Chorus => available.to_vec(),
        SectionKind::Bridge => {
            let mut pool = available.to_vec();
            rng.shuffle(&mut pool);
            pool.truncate(BRIDGE_PICKS);
            pool
        }
        SectionKind::Outro => vec![Piano, Strings],
        SectionKind::Other => Vec::new(),
    };

    for inst in extra {
        if has(inst) && !selected.contains(&inst) {
            selected.push(inst);
        }
    }
    selected
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[derive(Debug)]
pub struct CompositionEngine {
    config: ComposerConfig,
    chords: ChordProgression,
}

impl CompositionEngine {
    /// Build an engine from a config, rejecting tables it cannot use.
    pub fn new(config: ComposerConfig) -> Result<Self, ComposeError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Engine over the built-in tables.
    pub fn with_defaults() -> Self {
        Self::from_validated(ComposerConfig::default())
    }

    /// `config` must already pass `ComposerConfig::validate`.
    fn from_validated(config: ComposerConfig) -> Self {
        let chords = ChordProgression::new(config.variations.clone());
        info!("composition engine initialized");
        CompositionEngine { config, chords }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn chord_progression(&self) -> &ChordProgression {
        &self.chords
    }

    /// A key drawn uniformly from the mood's candidates.
    pub fn select_key(&self, mood: &str, rng: &mut SongRng) -> PitchClass {
        let keys = self.config.keys_for(Mood::from_name(mood));
        rng.pick(&keys).copied().unwrap_or(PitchClass::C)
    }

    /// Genre base tempo, pushed by the mood, clamped to the configured bounds.
    pub fn select_bpm(&self, genre: &str, mood: &str, rng: &mut SongRng) -> u32 {
        let tempo = &self.config.tempo;
        let range = tempo.range_for(Genre::from_name(genre));
        let base = i64::from(rng.range_u32(range.min, range.max));

        let mut shift = || i64::from(rng.range_u32(tempo.mood_shift.min, tempo.mood_shift.max));
        let adjusted = match MoodCues::from_text(mood).tempo {
            TempoLean::Faster => base + shift(),
            TempoLean::Slower => base - shift(),
            TempoLean::Neutral => base,
        };
        adjusted.clamp(i64::from(tempo.min_bpm), i64::from(tempo.max_bpm)) as u32
    }

    pub fn select_parameters(&self, genre: &str, mood: &str, rng: &mut SongRng) -> SongParameters {
        let key = self.select_key(mood, rng);
        let mode = select_mode(genre, mood, rng);
        let bpm = self.select_bpm(genre, mood, rng);
        let time_signature = select_time_signature(genre, rng);
        debug!(key = %key, mode = %mode, bpm, time = %time_signature, "parameters selected");
        SongParameters {
            key,
            mode,
            bpm,
            time_signature,
        }
    }

    /// Run the whole pipeline for `request`.
    pub fn generate(
        &self,
        request: &SongRequest,
        rng: &mut SongRng,
    ) -> Result<SongStructure, ComposeError> {
        info!(
            genre = %request.genre,
            mood = %request.mood,
            minutes = request.duration_minutes,
            "generating song"
        );

        let minutes = match request.duration_minutes {
            0 => {
                warn!("duration of 0 minutes requested, using 1");
                1
            }
            m if m > MAX_DURATION_MINUTES => {
                warn!(requested = m, max = MAX_DURATION_MINUTES, "duration too long, clamping");
                MAX_DURATION_MINUTES
            }
            m => m,
        };

        let params = self.select_parameters(&request.genre, &request.mood, rng);

        let budget = total_bars(params.bpm, minutes, params.time_signature);
        let plans = build_timeline(budget, &self.config.timeline, rng);
        debug!(bars = budget, sections = plans.len(), "timeline planned");
        let mut sections = Section::layout(&plans);

        for section in &mut sections {
            let base = self.chords.generate_progression(
                params.key,
                params.mode,
                section.kind(),
                section.bars(),
            );
            section.chords = if request.genre_variations {
                self.chords.apply_genre_variations(&base, &request.genre, rng)
            } else {
                base
            };
        }

        for section in &mut sections {
            section.melody = generate_melody(
                params.key,
                params.mode,
                &section.chords,
                section.bars(),
                self.config.melody,
                rng,
            );
        }

        for section in &mut sections {
            section.rhythm = generate_pattern(&request.genre, section.kind(), params.time_signature);
        }

        let instruments = instruments_for_genre(&request.genre);
        for section in &mut sections {
            section.instruments =
                active_instruments(&instruments, section.kind(), section.intensity(), rng);
        }

        let song = SongStructure {
            title: non_blank(request.title.as_deref()),
            genre: request.genre.clone(),
            mood: request.mood.clone(),
            lyrics: non_blank(request.lyrics.as_deref()),
            duration_minutes: minutes,
            key: params.key,
            mode: params.mode,
            bpm: params.bpm,
            time_signature: params.time_signature,
            sections,
            instruments,
        };

        song.validate()?;
        let tempo = &self.config.tempo;
        if !(tempo.min_bpm..=tempo.max_bpm).contains(&song.bpm()) {
            return Err(ComposeError::Invariant(format!(
                "tempo {} outside [{}, {}]",
                song.bpm(),
                tempo.min_bpm,
                tempo.max_bpm
            )));
        }

        info!(
            key = %song.key(),
            bpm = song.bpm(),
            sections = song.sections().len(),
            bars = song.total_bars(),
            "song generated"
        );
        Ok(song)
    }
}
