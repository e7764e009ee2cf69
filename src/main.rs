use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod generation;
mod models;
mod session;
mod store;
mod workflow;


use crate::config::{BackendKind, Config, load_config};
use crate::generation::{GeminiClient, SongGenerationAdapter, SongGenerator};
use crate::models::{InsertionMode, Playlist};
use crate::session::CurationSession;
use crate::store::{FileStorage, LocalPlaylistStore, PlaylistStore, RemotePlaylistStore};

#[derive(Parser)]
#[command(name = "playlist-curator")]
#[command(about = "Curate playlists from AI-generated song candidates")]
#[command(version)]
struct Args {
    /// Bearer token used for every playlist operation (falls back to MUSIC_TOKEN)
    #[arg(short = 't', long = "token", global = true)]
    token: Option<String>,

    /// Playlist backend to use (falls back to CURATOR_BACKEND, then local)
    #[arg(short = 'b', long = "backend", value_enum, global = true)]
    backend: Option<BackendKind>,

    /// Quiet mode - only log warnings and errors
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    /// Verbose mode - log requests and state changes
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all playlists
    Playlists {
        /// Also print every song
        #[arg(short = 's', long = "songs")]
        songs: bool,
    },
    /// Generate candidates and add the selected ones to a playlist
    Generate {
        /// Target playlist id (defaults to the first playlist)
        #[arg(short = 'p', long = "playlist")]
        playlist: Option<String>,

        #[command(flatten)]
        source: Source,

        /// Deselect candidate number N (1-based, repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<usize>,

        /// Print the candidates without adding them
        #[arg(short = 'd', long = "dry-run")]
        dry_run: bool,
    },
    /// Create an empty playlist
    Create {
        /// Display name of the new playlist
        name: String,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Ask for popular songs by this artist
    #[arg(short = 'a', long = "artist")]
    artist: Option<String>,

    /// File with one song per line
    #[arg(short = 'l', long = "list")]
    list: Option<PathBuf>,

    /// Songs given inline, one per line
    #[arg(long = "list-text")]
    list_text: Option<String>,
}

impl Source {
    fn into_input(self) -> Result<(InsertionMode, String)> {
        if let Some(artist) = self.artist {
            return Ok((InsertionMode::ByArtist, artist));
        }
        if let Some(path) = self.list {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                anyhow::anyhow!("Failed to read song list '{}': {e}", path.display())
            })?;
            return Ok((InsertionMode::ByList, text));
        }
        match self.list_text {
            Some(text) => Ok((InsertionMode::ByList, text)),
            None => bail!("Give --artist, --list or --list-text"),
        }
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("playlist_curator={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_store(config: &Config) -> Box<dyn PlaylistStore> {
    match config.backend {
        BackendKind::Local => {
            let storage = FileStorage::new(&config.local_db_dir);
            info!(dir = %storage.dir().display(), "Using local playlist store");
            Box::new(LocalPlaylistStore::new(storage).with_latency(config.network_delay))
        }
        BackendKind::Remote => {
            let store = RemotePlaylistStore::new(&config.api_base_url);
            info!(url = store.base_url(), "Using remote playlist store");
            Box::new(store)
        }
    }
}

fn build_generator(config: &Config) -> Box<dyn SongGenerator> {
    let client = GeminiClient::new(config.gemini_api_key.clone().unwrap_or_default())
        .with_base_url(&config.gemini_base_url)
        .with_model(config.gemini_model.clone());
    Box::new(SongGenerationAdapter::new(client).with_artist_batch_size(config.artist_batch_size))
}

fn print_playlists(playlists: &[Playlist], target: Option<&str>, with_songs: bool) {
    for playlist in playlists {
        let marker = if Some(playlist.id.as_str()) == target { "▶" } else { " " };
        let pin = if playlist.pinned() { " 📌" } else { "" };
        println!(
            "{marker} {}{pin}  [{}] ({} songs)",
            playlist.name,
            playlist.id,
            playlist.songs.len()
        );
        if let Some(description) = &playlist.description {
            println!("     {description}");
        }
        if with_songs {
            for (i, song) in playlist.songs.iter().enumerate() {
                println!(
                    "     {}. \"{}\" by {} [{}] {}",
                    i + 1,
                    song.title,
                    song.artist,
                    song.album.as_deref().unwrap_or("-"),
                    song.duration.as_deref().unwrap_or("-:-")
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);

    // Load configuration from .env
    let mut config = load_config()?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    let Some(token) = args.token.or_else(|| config.token.clone()) else {
        eprintln!("Error: no token given.");
        eprintln!("Pass --token or set MUSIC_TOKEN in the environment or .env.");
        bail!("Missing token");
    };

    if matches!(args.command, Command::Generate { .. }) && config.gemini_api_key.is_none() {
        bail!("GEMINI_API_KEY is not set; it is required to generate songs");
    }

    let mut session = CurationSession::login(&token, build_store(&config), build_generator(&config))?;
    println!("Logged in as {}", session.user().username);

    println!("Loading playlists...");
    if let Err(e) = session.refresh().await {
        eprintln!("✗ Failed to load playlists: {e}");
        return Err(e.into());
    }

    match args.command {
        Command::Playlists { songs } => {
            let workflow = session.workflow();
            println!("\n{} playlists:", workflow.playlists().len());
            print_playlists(workflow.playlists(), None, songs);
        }
        Command::Create { name } => {
            let playlists = session.create_playlist(&name).await?;
            println!("\n{} playlists:", playlists.len());
            print_playlists(playlists, None, false);
        }
        Command::Generate {
            playlist,
            source,
            exclude,
            dry_run,
        } => {
            let (mode, input) = source.into_input()?;
            run_generate(&mut session, playlist, mode, input, &exclude, dry_run).await?;
        }
    }

    session.logout();
    Ok(())
}

async fn run_generate(
    session: &mut CurationSession,
    playlist: Option<String>,
    mode: InsertionMode,
    input: String,
    exclude: &[usize],
    dry_run: bool,
) -> Result<()> {
    if let Some(id) = playlist {
        if !session.workflow().playlists().iter().any(|p| p.id == id) {
            let known: Vec<_> = session
                .workflow()
                .playlists()
                .iter()
                .map(|p| p.id.as_str())
                .collect();
            bail!("Unknown playlist '{id}'. Known playlists: {}", known.join(", "));
        }
        session.workflow_mut().select_target(&id)?;
    }
    session.workflow_mut().select_mode(mode)?;
    session.workflow_mut().set_input(input);

    let Some((target_id, target)) = session
        .workflow()
        .target_playlist()
        .map(|p| (p.id.clone(), p.name.clone()))
    else {
        bail!("There is no playlist to add songs to");
    };

    println!("\nGenerating candidates ({mode}) for '{target}'...");
    let count = session.generate().await?;
    if count == 0 {
        println!(
            "{}",
            session.workflow().notice().unwrap_or("No candidates found")
        );
        return Ok(());
    }

    for n in exclude {
        let Some(candidate) = n
            .checked_sub(1)
            .and_then(|i| session.workflow().candidates().get(i))
        else {
            bail!("--exclude {n} is out of range (1-{count})");
        };
        let id = candidate.id.clone();
        session.deselect(&id)?;
    }

    println!("\n=== CANDIDATES ===");
    let workflow = session.workflow();
    for (i, candidate) in workflow.candidates().iter().enumerate() {
        let mark = if workflow.is_selected(&candidate.id) { "✓" } else { " " };
        println!(
            "[{mark}] {}. \"{}\" by {} [{}] {}",
            i + 1,
            candidate.song.title,
            candidate.song.artist,
            candidate.song.album,
            candidate.song.duration
        );
    }
    println!("{} of {count} selected", workflow.selected_count());

    if dry_run {
        println!(
            "\n🔍 DRY RUN: would add {} songs to '{target}'",
            workflow.selected_count()
        );
        return Ok(());
    }

    println!("\nAdding {} songs to '{target}'...", workflow.selected_count());
    match session.commit().await {
        Ok(playlists) => {
            println!("✓ Songs added");
            print_playlists(playlists, Some(&target_id), false);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Failed to add songs: {e}");
            if let Some(message) = session.workflow().last_error() {
                eprintln!("  Selection kept; rerun to retry ({message})");
            }
            Err(e.into())
        }
    }
}
