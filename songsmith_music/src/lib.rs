// Songsmith procedural composer
//
// Turns a free-text genre and mood, optional lyrics and a target length into
// a complete song plan: key, mode, tempo, meter, an ordered list of
// sections with exact bar boundaries, and for every section its chords,
// melody, rhythm pattern and active instruments. No audio is produced; the
// `SongStructure` is handed to rendering, vocal and export collaborators.
//
// Architecture:
// - theory.rs: pitch classes, modes with interval tables, time signatures
// - genre.rs: genre categories, instrument registry and genre text cues
// - mood.rs: mood categories and mood text cues (dark, faster, slower)
// - config.rs: every tunable table (mood keys, tempo ranges, section budgets,
//   chord-colour odds, melody window), JSON-loadable and validated
// - structure.rs: section categories, bar budget and the section timeline
// - chord.rs: diatonic scale chords (memoized), section progressions, genre
//   colour and symbol-to-pitch expansion
// - melody.rs: chord-tone melodies with small-leap weighting
// - rhythm.rs: meter-aware one-bar beat/velocity patterns
// - song.rs: the output model with derived queries, summary and validation
// - engine.rs: the ordered generation pipeline and arrangement rules
// - error.rs: configuration and invariant errors
//
// The composer is deterministic given a seed: all randomness comes from a
// `songsmith_prng::SongRng` passed into `CompositionEngine::generate`.

pub mod chord;
pub mod config;
pub mod engine;
pub mod error;
pub mod genre;
pub mod melody;
pub mod mood;
pub mod rhythm;
pub mod song;
pub mod structure;
pub mod theory;

pub use config::ComposerConfig;
pub use engine::{CompositionEngine, SongRequest};
pub use error::{ComposeError, ConfigError};
pub use song::SongStructure;
