use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::playback::{DEFAULT_RATE, MAX_RATE, MIN_RATE};
use crate::reader::DEFAULT_HEADER_RATIO;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ocr_languages: String,
    pub ocr_psm: u32,
    pub header_ratio: f64,
    pub highlight: bool,
    pub speech_command: String,
    pub speech_rate: u32,
    pub speech_voice: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: "eng".to_string(),
            ocr_psm: 3,
            header_ratio: DEFAULT_HEADER_RATIO,
            highlight: true,
            speech_command: "espeak-ng".to_string(),
            speech_rate: DEFAULT_RATE,
            speech_voice: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    reader: Option<ReaderSettings>,
    speech: Option<SpeechSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    psm: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ReaderSettings {
    header_ratio: Option<f64>,
    highlight: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechSettings {
    command: Option<String>,
    rate: Option<u32>,
    voice: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages.trim().to_string();
                }
            }
            if let Some(psm) = ocr.psm {
                if psm <= 13 {
                    self.ocr_psm = psm;
                }
            }
        }
        if let Some(reader) = incoming.reader {
            // below 1.0 a lone line would outgrow its own median
            if let Some(ratio) = reader.header_ratio {
                if ratio.is_finite() && ratio >= 1.0 {
                    self.header_ratio = ratio;
                }
            }
            if let Some(highlight) = reader.highlight {
                self.highlight = highlight;
            }
        }
        if let Some(speech) = incoming.speech {
            if let Some(command) = speech.command {
                if !command.trim().is_empty() {
                    self.speech_command = command.trim().to_string();
                }
            }
            if let Some(rate) = speech.rate {
                if rate > 0 {
                    self.speech_rate = rate.clamp(MIN_RATE, MAX_RATE);
                }
            }
            if let Some(voice) = speech.voice {
                let voice = voice.trim();
                self.speech_voice = if voice.is_empty() {
                    None
                } else {
                    Some(voice.to_string())
                };
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
