use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use super::parse::parse_tsv_tokens;
use super::{OcrEngine, Token};

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    languages: String,
    psm: u32,
}

impl TesseractOcr {
    pub fn new(languages: &str, psm: u32) -> Result<Self> {
        Ok(Self {
            languages: normalize_ocr_languages(languages)?,
            psm,
        })
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Token>> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush().ok();

        let tsv = run_tesseract_tsv(tmp.path(), &self.languages, self.psm)?;
        let tokens = parse_tsv_tokens(&tsv);
        debug!("tesseract returned {} tokens", tokens.len());
        Ok(tokens)
    }
}

pub fn list_tesseract_languages() -> Result<Vec<String>> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .with_context(|| "failed to run tesseract --list-langs")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    // first line is the "List of available languages" banner
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn normalize_ocr_languages(requested: &str) -> Result<String> {
    let available = match list_tesseract_languages() {
        Ok(list) => list,
        Err(_) => {
            let trimmed = requested.trim();
            if trimmed.is_empty() {
                return Err(anyhow!("ocr languages is empty"));
            }
            return Ok(trimmed.to_string());
        }
    };
    select_languages(requested, &available)
}

fn select_languages(requested: &str, available: &[String]) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr languages is empty"));
    }

    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in trimmed.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        warn!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        );
    }

    Ok(chosen.join("+"))
}

fn run_tesseract_tsv(path: &Path, languages: &str, psm: u32) -> Result<String> {
    let output = Command::new("tesseract")
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg(psm.to_string())
        .arg("tsv")
        .output()
        .with_context(|| "failed to run tesseract (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn keeps_available_languages_in_request_order() {
        let available = langs(&["eng", "deu", "osd"]);
        let chosen = select_languages("deu+eng", &available).unwrap();
        assert_eq!(chosen, "deu+eng");
    }

    #[test]
    fn drops_missing_languages_when_some_remain() {
        let available = langs(&["eng"]);
        let chosen = select_languages("eng, jpn", &available).unwrap();
        assert_eq!(chosen, "eng");
    }

    #[test]
    fn rejects_request_without_available_language() {
        let available = langs(&["eng"]);
        let err = select_languages("jpn", &available).unwrap_err();
        assert!(err.to_string().contains("jpn"));
        assert!(select_languages("  ", &available).is_err());
    }

    #[test]
    fn skips_banner_line_of_language_list() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (2):\neng\nosd\n\n";
        assert_eq!(parse_language_list(stdout), langs(&["eng", "osd"]));
    }
}
