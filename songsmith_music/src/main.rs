// Songsmith CLI entry point.
//
// Composes one song from a genre, mood and length and prints its summary (or
// the full structure as JSON) to stdout. Logs go to stderr, filtered by
// RUST_LOG (default "warn").
//
// Usage:
//   cargo run -p songsmith_music -- --genre jazz --mood sad --minutes 2
//     [--lyrics TEXT] [--title TEXT] [--seed N] [--variations] [--json]
//     [--config PATH]

use anyhow::{Context, Result};
use clap::Parser;
use songsmith_music::{ComposerConfig, CompositionEngine, SongRequest};
use songsmith_prng::SongRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Compose a song structure from genre, mood and length")]
#[command(version)]
struct Cli {
    /// Genre, e.g. pop, rock, jazz, progressive
    #[arg(short, long, default_value = "pop")]
    genre: String,

    /// Mood, e.g. happy, sad, energetic, calm
    #[arg(short, long, default_value = "happy")]
    mood: String,

    /// Target length in minutes
    #[arg(long, default_value_t = 3)]
    minutes: u32,

    /// Lyrics to be sung (blank means instrumental)
    #[arg(long)]
    lyrics: Option<String>,

    #[arg(long)]
    title: Option<String>,

    /// Seed for reproducible output; random if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Colour chords with genre extensions and suspensions
    #[arg(long)]
    variations: bool,

    /// Print the full song as JSON instead of the summary
    #[arg(long)]
    json: bool,

    /// Composer config JSON replacing the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = match &cli.config {
        Some(path) => {
            let config = ComposerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            CompositionEngine::new(config)?
        }
        None => CompositionEngine::with_defaults(),
    };

    let (mut rng, seed) = match cli.seed {
        Some(seed) => (SongRng::new(seed), seed),
        None => SongRng::from_entropy().context("seeding from OS entropy")?,
    };
    info!(seed, "rng seeded");

    let mut request = SongRequest::new(cli.genre, cli.mood, cli.minutes)
        .with_genre_variations(cli.variations);
    request.lyrics = cli.lyrics;
    request.title = cli.title;

    let song = engine.generate(&request, &mut rng)?;

    if cli.json {
        println!("{}", song.to_json_pretty()?);
    } else {
        print!("{}", song.summary());
        println!("Seed: {seed}");
    }
    Ok(())
}
