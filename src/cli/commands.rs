//! Command implementations.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::repository::migrations::{self, POSTGRES_SCHEMA};
use crate::repository::Repositories;
use crate::services::ProcessingService;
use crate::smoke::{run_connection_smoke, run_storage_smoke, SmokeReport};
use crate::summarizer::{extract_keywords, Summarizer};
use crate::supabase::SupabaseClient;
use crate::worker::{extract_video_id, vtt_file_to_text, YtDlp};

pub async fn cmd_serve(
    settings: &Settings,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<ExitCode> {
    let host = host.unwrap_or_else(|| settings.backend_host.clone());
    let port = port.unwrap_or(settings.backend_port);
    crate::server::serve(settings, &host, port).await?;
    Ok(ExitCode::SUCCESS)
}

fn exit_code(report: &SmokeReport) -> ExitCode {
    if report.is_success() {
        println!(
            "\n{}",
            style(format!("{}: all checks passed", report.title())).green().bold()
        );
        ExitCode::SUCCESS
    } else {
        println!(
            "\n{}",
            style(format!(
                "{}: {} check(s) failed",
                report.title(),
                report.failures()
            ))
            .red()
            .bold()
        );
        ExitCode::FAILURE
    }
}

/// Build the client, or print why it can't be built.
fn supabase_client(settings: &Settings) -> Option<SupabaseClient> {
    match SupabaseClient::from_settings(settings) {
        Ok(client) => Some(client),
        Err(e) => {
            println!("{} {}", style("❌").red(), e);
            println!("   Set SUPABASE_URL and SUPABASE_KEY (or SUPABASE_ANON_KEY) in .env");
            None
        }
    }
}

pub async fn cmd_smoke_storage(
    settings: &Settings,
    bucket: Option<String>,
) -> anyhow::Result<ExitCode> {
    let Some(client) = supabase_client(settings) else {
        return Ok(ExitCode::FAILURE);
    };
    let bucket = bucket.unwrap_or_else(|| settings.storage_bucket.clone());

    let report = run_storage_smoke(&client.storage(), &bucket).await;
    Ok(exit_code(&report))
}

pub async fn cmd_smoke_connection(
    settings: &Settings,
    bucket: Option<String>,
) -> anyhow::Result<ExitCode> {
    let Some(client) = supabase_client(settings) else {
        return Ok(ExitCode::FAILURE);
    };
    let bucket = bucket.unwrap_or_else(|| settings.storage_bucket.clone());

    let report = run_connection_smoke(&client.rest(), &client.storage(), &bucket).await;
    Ok(exit_code(&report))
}

pub async fn cmd_db_init(settings: &Settings) -> anyhow::Result<ExitCode> {
    let db_path = settings.database_path();
    Repositories::open(&db_path)
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    println!(
        "{} Local store ready at {} ({} migration(s) known)",
        style("✓").green(),
        db_path.display(),
        migrations::known_versions().count()
    );
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_db_schema() -> anyhow::Result<ExitCode> {
    print!("{}", POSTGRES_SCHEMA);
    Ok(ExitCode::SUCCESS)
}

pub async fn cmd_process(
    settings: &Settings,
    url: &str,
    user_id: Option<&str>,
    keep_files: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let source = YtDlp::locate()?;
    let summarizer = Summarizer::from_config(&settings.summarizer)?;
    let repos = Repositories::open(&settings.database_path()).await?;

    let service = ProcessingService::new(
        repos,
        Arc::new(source),
        summarizer,
        settings.work_dir.clone(),
    )
    .with_keep_files(keep_files);

    let outcome = service.process(url, user_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", style("✓").green(), style(&outcome.title).bold());
    println!("  Job:      {}", outcome.job_id);
    println!("  Video:    {} ({})", outcome.video_id, outcome.youtube_id);
    println!("  Chunks:   {}", outcome.summary.num_chunks);
    println!("  Tokens:   ~{}", outcome.summary.total_tokens);
    println!("\n{}", style("Summary").bold());
    println!("  {}", outcome.summary.short_summary);
    if !outcome.summary.keywords.is_empty() {
        println!("\n{} {}", style("Keywords:").bold(), outcome.summary.keywords.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_video_id(url: &str) -> anyhow::Result<ExitCode> {
    match extract_video_id(url) {
        Some(id) => {
            println!("{}", id);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{} Could not extract video ID from URL: {}", style("✗").red(), url);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn cmd_vtt(file: &Path) -> anyhow::Result<ExitCode> {
    println!("{}", vtt_file_to_text(file).await?);
    Ok(ExitCode::SUCCESS)
}

/// Read a text file, converting VTT subtitles to plain text.
async fn read_text(file: &Path) -> anyhow::Result<String> {
    let is_vtt = file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("vtt"))
        .unwrap_or(false);
    if is_vtt {
        return Ok(vtt_file_to_text(file).await?);
    }
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))
}

pub async fn cmd_summarize(
    settings: &Settings,
    file: &Path,
    with_keywords: bool,
) -> anyhow::Result<ExitCode> {
    let text = read_text(file).await?;
    let summarizer = Summarizer::from_config(&settings.summarizer)?;
    let result = summarizer.process_text(&text, with_keywords).await?;

    println!("{}", style("Short summary").bold());
    println!("  {}\n", result.short_summary);
    println!("{}", style("Long summary").bold());
    println!("  {}\n", result.long_summary);
    println!(
        "{} chunk(s), ~{} tokens",
        result.num_chunks, result.total_tokens
    );
    if with_keywords {
        println!("{} {}", style("Keywords:").bold(), result.keywords.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn cmd_keywords(file: &Path, top_k: usize) -> anyhow::Result<ExitCode> {
    let text = read_text(file).await?;
    for keyword in extract_keywords(&text, top_k) {
        println!("{}", keyword);
    }
    Ok(ExitCode::SUCCESS)
}
