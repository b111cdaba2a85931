//! WebVTT subtitle to plain text conversion.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::WorkerError;

fn timing_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}\s*-->\s*(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}")
            .expect("static timing pattern")
    })
}

fn markup() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static markup pattern"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Convert WebVTT content to a single line of plain text.
///
/// Drops the header block, `NOTE`/`STYLE`/`REGION` blocks, cue timings
/// (with their settings), numeric cue identifiers and inline markup. Cue
/// lines repeated back-to-back, as rolling auto-captions do, are kept once.
pub fn vtt_to_text(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_header = false;
    let mut in_block = false;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_start_matches('\u{feff}').trim();

        if index == 0 && line.starts_with("WEBVTT") {
            in_header = true;
            continue;
        }
        if in_header || in_block {
            if line.is_empty() {
                in_header = false;
                in_block = false;
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line == "NOTE"
            || line.starts_with("NOTE ")
            || line.starts_with("STYLE")
            || line.starts_with("REGION")
        {
            in_block = true;
            continue;
        }
        if timing_line().is_match(line) {
            continue;
        }
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let stripped = markup().replace_all(line, "");
        let cleaned = decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if cleaned.is_empty() || out.last() == Some(&cleaned) {
            continue;
        }
        out.push(cleaned);
    }

    out.join(" ")
}

/// Read a VTT file and convert it to plain text.
pub async fn vtt_file_to_text(path: &Path) -> Result<String, WorkerError> {
    if !path.exists() {
        return Err(WorkerError::MissingOutput(format!(
            "VTT file not found: {}",
            path.display()
        )));
    }
    let content = tokio::fs::read_to_string(path).await?;
    let text = vtt_to_text(&content);
    tracing::info!("Converted VTT to text: {} characters", text.chars().count());
    Ok(text)
}
