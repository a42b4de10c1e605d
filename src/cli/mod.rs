//! One-shot CLI handlers.

pub mod args;

pub use args::{Cli, CliCommand, MinutesCliArgs};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use tracing::info;

use crate::config::{self, Config};
use crate::minutes::{export, GeminiGenerator, MinutesGenerator};

/// Generate minutes for an existing recording and print the plain-text
/// export. The same generator the live service uses, minus the capture.
pub async fn handle_minutes_command(args: MinutesCliArgs) -> Result<()> {
    if !args.file.exists() {
        bail!("File not found: {}", args.file.display());
    }

    let mime_type = mime_type_for_extension(&args.file)?;

    let config = Config::load()?;
    let api_key = config::api_key_from_env()?;
    let model = args.model.unwrap_or(config.minutes.model);

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if bytes.is_empty() {
        bail!("File is empty: {}", args.file.display());
    }

    info!(
        "Generating minutes for {} ({} bytes, {})",
        args.file.display(),
        bytes.len(),
        mime_type
    );

    let generator = GeminiGenerator::new(api_key, config.minutes.endpoint, model);
    let payload = BASE64.encode(&bytes);
    let minutes = generator.generate(&payload, mime_type).await?;

    let text = export::render_plain_text(&minutes);
    println!("{}", text);

    if args.copy {
        export::copy_to_clipboard(&text)?;
        eprintln!("\nMinutes copied to clipboard.");
    }

    Ok(())
}

fn mime_type_for_extension(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "wav" => Ok("audio/wav"),
        "mp3" => Ok("audio/mpeg"),
        "ogg" | "oga" => Ok("audio/ogg"),
        "webm" => Ok("audio/webm"),
        "flac" => Ok("audio/flac"),
        "m4a" | "mp4" => Ok("audio/mp4"),
        other => bail!(
            "Unsupported file extension '{}'. Supported: wav, mp3, ogg, webm, flac, m4a",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mime_type_for_known_extensions() {
        assert_eq!(
            mime_type_for_extension(&PathBuf::from("a.wav")).unwrap(),
            "audio/wav"
        );
        assert_eq!(
            mime_type_for_extension(&PathBuf::from("A.MP3")).unwrap(),
            "audio/mpeg"
        );
        assert_eq!(
            mime_type_for_extension(&PathBuf::from("dir/meeting.webm")).unwrap(),
            "audio/webm"
        );
    }

    #[test]
    fn test_mime_type_rejects_unknown() {
        assert!(mime_type_for_extension(&PathBuf::from("notes.txt")).is_err());
        assert!(mime_type_for_extension(&PathBuf::from("noextension")).is_err());
    }
}
