use anyhow::Result;
use clap::Parser;

use screen_text_reader::{PlaybackOutcome, Region};

#[derive(Parser, Debug)]
#[command(
    name = "screen-text-reader",
    version,
    about = "Rebuild OCR'd screen text into readable lines and read it aloud"
)]
struct Cli {
    /// JSON array of OCR tokens ({text, left, top, height, confidence})
    #[arg(short = 't', long = "tokens", conflicts_with = "image")]
    tokens: Option<String>,

    /// Screenshot to run OCR on
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Region of the screenshot to read: x1,y1,x2,y2 (any corner order)
    #[arg(short = 'r', long = "region", requires = "image")]
    region: Option<Region>,

    /// Tesseract languages, e.g. eng+deu (overrides settings [ocr])
    #[arg(short = 'l', long = "ocr-lang")]
    ocr_lang: Option<String>,

    /// Speech rate in words per minute (50-300)
    #[arg(long = "rate")]
    rate: Option<u32>,

    /// Speech voice name
    #[arg(long = "voice")]
    voice: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(long = "read-settings")]
    read_settings: Option<String>,

    /// Print display text, speech text and segments as JSON
    #[arg(long = "json")]
    json: bool,

    /// Print the speech text (with header pauses) instead of the display text
    #[arg(long = "print-speech")]
    print_speech: bool,

    /// Read the text aloud, echoing each sentence as it is spoken
    #[arg(short = 's', long = "speak")]
    speak: bool,

    /// Do not echo sentences while speaking
    #[arg(long = "no-highlight")]
    no_highlight: bool,

    /// List installed tesseract languages and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    screen_text_reader::logging::init(cli.verbose)?;

    if cli.show_ocr_languages {
        for lang in screen_text_reader::ocr::list_tesseract_languages()? {
            println!("{}", lang);
        }
        return Ok(());
    }

    let speak = cli.speak;
    let config = screen_text_reader::Config {
        tokens_path: cli.tokens,
        image_path: cli.image,
        region: cli.region,
        ocr_languages: cli.ocr_lang,
        rate: cli.rate,
        voice: cli.voice,
        settings_path: cli.read_settings,
        json: cli.json,
        print_speech: cli.print_speech,
        no_highlight: cli.no_highlight,
    };
    let settings = screen_text_reader::load_settings(&config)?;
    let reading = screen_text_reader::load_reading(&config, &settings)?;

    println!("{}", screen_text_reader::format_output(&reading, &config)?);

    if speak {
        let outcome = screen_text_reader::speak_reading(&reading, &config, &settings).await?;
        if let PlaybackOutcome::Failed(reason) = outcome {
            eprintln!("warning: playback stopped early: {}", reason);
        }
    }
    Ok(())
}
