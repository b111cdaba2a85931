//! Command-line interface.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::summarizer::DEFAULT_TOP_K;

#[derive(Parser)]
#[command(name = "ytprod")]
#[command(about = "YouTube productivity backend: smoke tests, local store, video processing")]
#[command(version)]
pub struct Cli {
    /// Local SQLite store path (overrides the config file)
    #[arg(long, global = true, env = "YTPROD_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, env = "BACKEND_HOST")]
        host: Option<String>,
        /// Port (default: 8000)
        #[arg(long, short, env = "BACKEND_PORT")]
        port: Option<u16>,
    },
    /// Smoke tests against the hosted Supabase project
    Smoke {
        #[command(subcommand)]
        command: SmokeCommands,
    },
    /// Local store and schema management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Process a video: metadata, transcript, summary and keywords
    Process {
        /// YouTube video URL
        url: String,
        /// Owning user id
        #[arg(long)]
        user: Option<String>,
        /// Keep downloaded files in the work directory
        #[arg(long)]
        keep_files: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the video id of a YouTube URL
    VideoId {
        url: String,
    },
    /// Convert a WebVTT subtitle file to plain text
    Vtt {
        file: PathBuf,
    },
    /// Summarize a text or VTT file
    Summarize {
        file: PathBuf,
        /// Skip keyword extraction
        #[arg(long)]
        no_keywords: bool,
    },
    /// Extract keywords from a text or VTT file
    Keywords {
        file: PathBuf,
        /// Number of keywords
        #[arg(long, short = 'k', default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
}

#[derive(Subcommand)]
enum SmokeCommands {
    /// Upload, verify and delete a test object in the storage bucket
    Storage {
        /// Bucket name (default: ytprod)
        #[arg(long, env = "SUPABASE_BUCKET")]
        bucket: Option<String>,
    },
    /// Check the database tables and storage bucket are reachable
    Connection {
        /// Bucket name (default: ytprod)
        #[arg(long, env = "SUPABASE_BUCKET")]
        bucket: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the local store and apply migrations
    Init,
    /// Print the Postgres schema for the hosted project
    Schema,
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut settings = load_settings().await;
    if let Some(database) = cli.database {
        settings.database = database;
    }

    match cli.command {
        Commands::Serve { host, port } => commands::cmd_serve(&settings, host, port).await,
        Commands::Smoke { command } => match command {
            SmokeCommands::Storage { bucket } => {
                commands::cmd_smoke_storage(&settings, bucket).await
            }
            SmokeCommands::Connection { bucket } => {
                commands::cmd_smoke_connection(&settings, bucket).await
            }
        },
        Commands::Db { command } => match command {
            DbCommands::Init => commands::cmd_db_init(&settings).await,
            DbCommands::Schema => commands::cmd_db_schema(),
        },
        Commands::Process {
            url,
            user,
            keep_files,
            json,
        } => commands::cmd_process(&settings, &url, user.as_deref(), keep_files, json).await,
        Commands::VideoId { url } => commands::cmd_video_id(&url),
        Commands::Vtt { file } => commands::cmd_vtt(&file).await,
        Commands::Summarize { file, no_keywords } => {
            commands::cmd_summarize(&settings, &file, !no_keywords).await
        }
        Commands::Keywords { file, top_k } => commands::cmd_keywords(&file, top_k).await,
    }
}
