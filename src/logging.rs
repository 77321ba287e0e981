use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Logs go to stderr so stdout stays clean for the reading itself. Warnings
/// (missing OCR languages, failed speech) are always shown; `verbose` adds
/// the per-line header classification trace.
pub fn init(verbose: bool) -> Result<()> {
    let _ = fmt()
        .with_max_level(max_level(verbose))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn max_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}
