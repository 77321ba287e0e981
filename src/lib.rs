use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

pub mod capture;
pub mod logging;
pub mod ocr;
mod paths;
pub mod playback;
pub mod reader;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use capture::{Region, read_region};
pub use ocr::{OcrEngine, TesseractOcr, Token};
pub use playback::{PlaybackOutcome, PlaybackSession, PlaybackState, play};
pub use reader::{ReaderOptions, Reading, Segment, process, process_with};

use playback::{CommandSpeech, SpeechConfig, SpeechEngine, TerminalDisplay};
use settings::Settings;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tokens_path: Option<String>,
    pub image_path: Option<String>,
    pub region: Option<Region>,
    pub ocr_languages: Option<String>,
    pub rate: Option<u32>,
    pub voice: Option<String>,
    pub settings_path: Option<String>,
    pub json: bool,
    pub print_speech: bool,
    pub no_highlight: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    display_text: &'a str,
    speech_text: &'a str,
    segments: &'a [Segment],
}

pub fn load_settings(config: &Config) -> Result<Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    settings::load_settings(settings_path)
}

/// Produces a reading from either a token dump or a screenshot.
pub fn load_reading(config: &Config, settings: &Settings) -> Result<Reading> {
    let options = ReaderOptions {
        header_ratio: settings.header_ratio,
    };

    if let Some(path) = config.tokens_path.as_deref() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read tokens: {}", path))?;
        let tokens: Vec<Token> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse tokens JSON: {}", path))?;
        return Ok(process_with(&tokens, &options));
    }

    let Some(image_path) = config.image_path.as_deref() else {
        return Err(anyhow!("either --tokens or --image is required"));
    };
    let image_path = Path::new(image_path);
    let region = match config.region {
        Some(region) => region,
        None => full_image_region(image_path)?,
    };
    let languages = config
        .ocr_languages
        .as_deref()
        .unwrap_or(&settings.ocr_languages);
    let ocr = TesseractOcr::new(languages, settings.ocr_psm)?;
    debug!("ocr languages: {}", ocr.languages());
    read_region(region, capture::screenshot_file(image_path), &ocr, &options)
}

fn full_image_region(path: &Path) -> Result<Region> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    Ok(Region::from_drag((0, 0), (width, height)))
}

pub fn format_output(reading: &Reading, config: &Config) -> Result<String> {
    if config.json {
        let output = JsonOutput {
            display_text: &reading.display_text,
            speech_text: &reading.speech_text,
            segments: &reading.segments,
        };
        return Ok(serde_json::to_string_pretty(&output)?);
    }
    if config.print_speech {
        return Ok(reading.speech_text.trim_end().to_string());
    }
    Ok(reading.display_text.trim().to_string())
}

/// Speaks the reading through the configured speech command, echoing each
/// segment to stdout as it is read.
pub async fn speak_reading(
    reading: &Reading,
    config: &Config,
    settings: &Settings,
) -> Result<PlaybackOutcome> {
    if reading.is_empty() {
        return Ok(PlaybackOutcome::Completed);
    }
    let speech = SpeechConfig::new(
        config.rate.unwrap_or(settings.speech_rate),
        config.voice.clone().or_else(|| settings.speech_voice.clone()),
    );
    let engine = SpeechEngine::new(CommandSpeech::new(&settings.speech_command), speech)?;
    let highlight = settings.highlight && !config.no_highlight;
    let mut session =
        PlaybackSession::new(engine, TerminalDisplay::new(std::io::stdout())).with_highlight(highlight);

    session.start(reading).await?;
    let outcome = session
        .wait()
        .await?
        .unwrap_or(PlaybackOutcome::Completed);
    Ok(outcome)
}
