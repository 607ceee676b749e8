// Melody generation: one pitch per beat, four beats per bar.
//
// Each bar follows the chord active at that bar (`chords[bar % len]`).
// Strong beats (the first and third) sing a tone of that chord; weak beats
// may use any tone of the key's mode as passing motion. All pitches stay in
// the configured singing window (C4 up to C6 by default).
//
// Candidates are weighted toward small leaps from the previous note, with
// the chord root favoured at the start of each bar, and sampled from the
// cumulative weights. The output length is always `bars * 4`.
//
// Depends on chord.rs for chord pitch classes and theory.rs for scale
// membership.

use crate::chord::Chord;
use crate::config::MelodyConfig;
use crate::theory::{Mode, PitchClass};
use songsmith_prng::SongRng;
use tracing::debug;

/// Melody notes per bar.
pub const BEATS_PER_BAR: usize = 4;

/// Generate `bars * 4` MIDI pitches over `chords` in `key`/`mode`.
pub fn generate_melody(
    key: PitchClass,
    mode: Mode,
    chords: &[Chord],
    bars: u32,
    window: MelodyConfig,
    rng: &mut SongRng,
) -> Vec<u8> {
    let bars = bars as usize;
    let window_pitches: Vec<u8> = (window.low..window.high).collect();
    let scale_pitches: Vec<u8> = window_pitches
        .iter()
        .copied()
        .filter(|&p| mode.contains(key, PitchClass::new(i32::from(p))))
        .collect();

    let mut melody = Vec::with_capacity(bars * BEATS_PER_BAR);
    let mut previous: Option<u8> = None;

    for bar in 0..bars {
        let chord = (!chords.is_empty()).then(|| &chords[bar % chords.len()]);
        let chord_tones: Vec<PitchClass> = chord.map(Chord::pitch_classes).unwrap_or_default();
        let chord_pitches: Vec<u8> = window_pitches
            .iter()
            .copied()
            .filter(|&p| chord_tones.contains(&PitchClass::new(i32::from(p))))
            .collect();
        let root = chord.map(|c| c.root).unwrap_or(key);

        for beat in 0..BEATS_PER_BAR {
            let strong = beat % 2 == 0;
            let pool = [
                if strong { &chord_pitches } else { &scale_pitches },
                &chord_pitches,
                &scale_pitches,
                &window_pitches,
            ]
            .into_iter()
            .find(|pool| !pool.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

            let pitch = choose_pitch(pool, previous, root, beat == 0, rng)
                .unwrap_or(window.low);
            melody.push(pitch);
            previous = Some(pitch);
        }
    }

    debug!(bars, notes = melody.len(), "melody generated");
    melody
}

/// Weighted choice from `pool`, favouring small steps from `previous`.
fn choose_pitch(
    pool: &[u8],
    previous: Option<u8>,
    root: PitchClass,
    downbeat: bool,
    rng: &mut SongRng,
) -> Option<u8> {
    let weights: Vec<f64> = pool
        .iter()
        .map(|&p| {
            let leap = previous.map_or(0.0, |prev| (f64::from(p) - f64::from(prev)).abs());
            let mut w = 1.0 / (1.0 + leap / 2.0);
            if downbeat && PitchClass::new(i32::from(p)) == root {
                w *= 2.0;
            }
            w
        })
        .collect();
    weighted_pick(pool, &weights, rng)
}

/// Sample one item with probability proportional to `weights`.
fn weighted_pick<T: Copy>(items: &[T], weights: &[f64], rng: &mut SongRng) -> Option<T> {
    let total: f64 = weights.iter().sum();
    if items.is_empty() || total <= 0.0 {
        return None;
    }
    let r = rng.next_f64() * total;
    let mut cum = 0.0;
    for (item, w) in items.iter().zip(weights) {
        cum += w;
        if cum > r {
            return Some(*item);
        }
    }
    items.last().copied()
}
