// End-to-end composition scenarios.
//
// Drives `CompositionEngine::generate` across many seeds and checks the
// whole-song properties: the bar budget is met exactly, sections are
// contiguous, every section's chords and melody match its length, tempo
// stays clamped, and the genre/mood rules pick the expected key, mode and
// meter. Also covers a shared engine used from several threads, JSON config
// loading and the degenerate short-song boundary.

use songsmith_music::config::TempoRange;
use songsmith_music::genre::{Genre, Instrument};
use songsmith_music::structure::{SectionKind, total_bars};
use songsmith_music::theory::{Mode, PitchClass, TimeSignature};
use songsmith_music::{ComposeError, ComposerConfig, CompositionEngine, SongRequest, SongStructure};
use songsmith_prng::SongRng;

fn compose(engine: &CompositionEngine, request: &SongRequest, seed: u64) -> SongStructure {
    engine
        .generate(request, &mut SongRng::new(seed))
        .unwrap_or_else(|e| panic!("seed {seed}: {e}"))
}

/// The properties every generated song must have.
fn check_song(song: &SongStructure) {
    let budget = total_bars(song.bpm(), song.duration_minutes(), song.time_signature());
    assert_eq!(song.total_bars(), budget);
    assert!((60..=200).contains(&song.bpm()));

    let mut next = 0;
    for section in song.sections() {
        assert!(section.bars() > 0);
        assert_eq!(section.start_bar(), next);
        assert_eq!(section.end_bar(), section.start_bar() + section.bars() - 1);
        next = section.end_bar() + 1;

        assert_eq!(section.chords().len(), section.bars() as usize);
        assert_eq!(section.melody().len(), section.bars() as usize * 4);
        let rhythm = section.rhythm();
        assert!(!rhythm.beats.is_empty());
        assert_eq!(rhythm.beats.len(), rhythm.velocities.len());
    }

    for kind in [
        SectionKind::Intro,
        SectionKind::Verse,
        SectionKind::Chorus,
        SectionKind::Bridge,
        SectionKind::Outro,
    ] {
        if let Some(first) = song.section(kind) {
            assert_eq!(song.chords_for(kind).map(<[_]>::len), Some(first.bars() as usize));
            assert_eq!(song.melody_for(kind).map(<[_]>::len), Some(first.bars() as usize * 4));
            assert!(song.rhythm_for(kind).is_some());
            assert!(song.instruments_for(kind).is_some());
        }
    }
}

#[test]
fn pop_happy_three_minutes() {
    let engine = CompositionEngine::with_defaults();
    let request = SongRequest::new("pop", "happy", 3);
    let happy_keys: Vec<PitchClass> = ["C", "G", "D", "A", "E"]
        .iter()
        .map(|n| PitchClass::from_name_or_c(n))
        .collect();

    for seed in 0..100 {
        let song = compose(&engine, &request, seed);
        check_song(&song);
        assert!(happy_keys.contains(&song.key()), "seed {seed}");
        assert_eq!(song.mode(), Mode::Major);
        assert_eq!(song.time_signature(), TimeSignature::COMMON);
        assert_eq!(song.total_bars(), (song.bpm() * 3).div_ceil(4));
        for kind in [
            SectionKind::Intro,
            SectionKind::Verse,
            SectionKind::Chorus,
            SectionKind::Outro,
        ] {
            assert!(song.section(kind).is_some(), "seed {seed}: no {kind}");
        }
        assert_eq!(song.sections()[0].kind(), SectionKind::Intro);
        assert_eq!(song.sections().last().map(|s| s.kind()), Some(SectionKind::Outro));
    }
}

#[test]
fn jazz_sad_is_minor_in_four_or_three() {
    let engine = CompositionEngine::with_defaults();
    let request = SongRequest::new("jazz", "sad", 2);
    let mut meters = Vec::new();
    for seed in 0..100 {
        let song = compose(&engine, &request, seed);
        check_song(&song);
        assert_eq!(song.mode(), Mode::Minor);
        let ts = song.time_signature().as_pair();
        assert!(ts == (4, 4) || ts == (3, 4), "seed {seed}: {ts:?}");
        if !meters.contains(&ts) {
            meters.push(ts);
        }
    }
    assert_eq!(meters.len(), 2, "both meters should appear over 100 seeds");
}

#[test]
fn progressive_odd_meters_fill_the_budget() {
    let engine = CompositionEngine::with_defaults();
    let request = SongRequest::new("progressive", "mysterious", 1);
    for seed in 0..100 {
        let song = compose(&engine, &request, seed);
        check_song(&song);
        let ts = song.time_signature().as_pair();
        assert!([(7, 8), (5, 4), (6, 8)].contains(&ts), "seed {seed}: {ts:?}");
        let expected = (song.bpm()).div_ceil(u32::from(ts.0));
        assert_eq!(song.total_bars(), expected);
    }
}

#[test]
fn unknown_genre_uses_defaults() {
    let engine = CompositionEngine::with_defaults();
    let request = SongRequest::new("unknown_genre", "happy", 2);
    for seed in 0..100 {
        let song = compose(&engine, &request, seed);
        check_song(&song);
        assert_eq!(
            song.instruments(),
            &[Instrument::Drums, Instrument::Bass, Instrument::Guitar, Instrument::Piano]
        );
        assert!(TempoRange::new(100, 130).contains(song.bpm()), "seed {seed}: {}", song.bpm());
    }
}

#[test]
fn every_genre_and_mood_holds_the_invariants() {
    let engine = CompositionEngine::with_defaults();
    let genres = Genre::KNOWN.iter().map(|g| g.name()).chain(["Smooth Jazz", "", "polka"]);
    let moods = ["happy", "sad", "energetic", "calm", "mysterious", "romantic", "slow", "fast and dark"];
    let mut seed = 0;
    for genre in genres {
        for mood in moods {
            for minutes in [1, 2, 5] {
                let request = SongRequest::new(genre, mood, minutes).with_genre_variations(seed % 2 == 0);
                check_song(&compose(&engine, &request, seed));
                seed += 1;
            }
        }
    }
}

#[test]
fn sections_never_repeat_an_instrument() {
    let engine = CompositionEngine::with_defaults();
    for (i, genre) in ["pop", "rock", "electronic", "jazz", "classical"].iter().enumerate() {
        for seed in 0..20 {
            let song = compose(&engine, &SongRequest::new(*genre, "happy", 4), seed * 10 + i as u64);
            for section in song.sections() {
                let mut seen = section.instruments().to_vec();
                seen.sort();
                seen.dedup();
                assert_eq!(seen.len(), section.instruments().len(), "{genre} {section}");
                assert!(section.instruments().iter().all(|i| song.instruments().contains(i)));
            }
        }
    }
}

#[test]
fn scale_chords_are_stable() {
    let engine = CompositionEngine::with_defaults();
    let chords = engine.chord_progression();
    let first: Vec<String> = chords
        .scale_chords_by_name("C", "Major")
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert_eq!(first, ["C", "Dm", "Em", "F", "G", "Am", "Bdim"]);
    for _ in 0..10 {
        let again: Vec<String> = chords
            .scale_chords_by_name("C", "Major")
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert_eq!(again, first);
    }
    assert_eq!(chords.cached_scales(), 1);
}

#[test]
fn shared_engine_across_threads() {
    let engine = CompositionEngine::with_defaults();
    let requests = [
        SongRequest::new("pop", "happy", 3),
        SongRequest::new("jazz", "sad", 2),
        SongRequest::new("rock", "energetic", 4).with_genre_variations(true),
        SongRequest::new("folk", "calm", 2),
    ];
    let sequential: Vec<SongStructure> = requests
        .iter()
        .enumerate()
        .map(|(i, r)| compose(&engine, r, i as u64))
        .collect();

    let parallel: Vec<SongStructure> = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let engine = &engine;
                scope.spawn(move || compose(engine, r, i as u64))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, sequential);
}

#[test]
fn config_file_drives_generation() {
    let mut config = ComposerConfig::default();
    config.tempo.genre_ranges.insert(Genre::Pop, TempoRange::new(90, 91));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composer.json");
    std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

    let loaded = ComposerConfig::load(&path).unwrap();
    let engine = CompositionEngine::new(loaded).unwrap();
    let song = compose(&engine, &SongRequest::new("pop", "happy", 2), 3);
    assert_eq!(song.bpm(), 90);
    check_song(&song);
}

#[test]
fn broken_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ \"mood_keys\": 3 }").unwrap();
    assert!(ComposerConfig::load(&path).is_err());
    assert!(ComposerConfig::load(&dir.path().join("missing.json")).is_err());

    let mut config = ComposerConfig::default();
    config.timeline.verse.min_bars = 0;
    assert!(matches!(
        CompositionEngine::new(config),
        Err(ComposeError::Config(_))
    ));
}

#[test]
fn zero_minutes_is_treated_as_one() {
    let engine = CompositionEngine::with_defaults();
    for seed in 0..20 {
        let song = compose(&engine, &SongRequest::new("pop", "happy", 0), seed);
        assert_eq!(song.duration_minutes(), 1);
        check_song(&song);
    }
}

#[test]
fn slowest_single_minute_is_intro_and_outro() {
    let mut config = ComposerConfig::default();
    config.tempo.genre_ranges.insert(Genre::Classical, TempoRange::new(60, 61));
    let engine = CompositionEngine::new(config).unwrap();
    for seed in 0..20 {
        let song = compose(&engine, &SongRequest::new("classical", "calm", 1), seed);
        assert_eq!(song.bpm(), 60);
        assert_eq!(song.total_bars(), 15);
        let kinds: Vec<SectionKind> = song.sections().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, [SectionKind::Intro, SectionKind::Outro]);
        check_song(&song);
    }
}

#[test]
fn intro_longer_than_budget_is_capped() {
    let mut config = ComposerConfig::default();
    config.tempo.genre_ranges.insert(Genre::Classical, TempoRange::new(60, 61));
    config.timeline.intro.min_bars = 20;
    config.timeline.intro.max_bars = 24;
    let engine = CompositionEngine::new(config).unwrap();
    let song = compose(&engine, &SongRequest::new("classical", "calm", 1), 1);
    assert_eq!(song.sections().len(), 1);
    assert_eq!(song.sections()[0].bars(), 15);
    check_song(&song);
}

#[test]
fn json_output_round_trips() {
    let engine = CompositionEngine::with_defaults();
    let request = SongRequest::new("electronic", "energetic", 2)
        .with_title("Night Drive")
        .with_lyrics("lights on the road")
        .with_genre_variations(true);
    let song = compose(&engine, &request, 11);
    let json = song.to_json_pretty().unwrap();
    let back: SongStructure = serde_json::from_str(&json).unwrap();
    assert_eq!(back, song);
    assert!(back.has_vocals());
    assert!(song.to_string().starts_with("SongStructure[Night Drive - electronic energetic,"));
}
