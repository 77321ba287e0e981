mod parse;
mod tesseract;

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub use parse::parse_tsv_tokens;
pub use tesseract::{TesseractOcr, list_tesseract_languages};

/// One word reported by the OCR engine, in engine reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub height: i32,
    pub confidence: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, left: i32, top: i32, height: i32, confidence: f32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            height,
            confidence,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<Token>>;
}
