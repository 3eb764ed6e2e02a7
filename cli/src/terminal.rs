//! Inline image display for terminals with graphics support.
//!
//! - Kitty graphics protocol (kitty, WezTerm with kitty support)
//! - iTerm2 inline images protocol

use std::io::{Cursor, Write as _};

use anyhow::{Context as _, Result, bail};
use base64::Engine as _;
use outfits_business::ImageFile;
use outfits_business::images::PNG;

/// Kitty payloads are sent in chunks of at most this many base64 bytes.
const KITTY_CHUNK_SIZE: usize = 4096;

/// Terminal graphics protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Kitty,
    ITerm,
    /// No graphics support, print info only
    None,
}

/// Detect the graphics protocol supported by the current terminal.
///
/// Detection is based on environment variables:
/// - `TERM_PROGRAM` for iTerm2
/// - `TERM` containing "kitty", or `KITTY_WINDOW_ID`, for Kitty
/// - `WEZTERM_EXECUTABLE` for WezTerm (supports kitty protocol)
pub fn detect_protocol() -> Protocol {
    if let Ok(term_program) = std::env::var("TERM_PROGRAM")
        && term_program.contains("iTerm")
    {
        return Protocol::ITerm;
    }

    if std::env::var("KITTY_WINDOW_ID").is_ok() || std::env::var("WEZTERM_EXECUTABLE").is_ok() {
        return Protocol::Kitty;
    }

    if let Ok(term) = std::env::var("TERM")
        && term.contains("kitty")
    {
        return Protocol::Kitty;
    }

    Protocol::None
}

/// Parse a `--display` value into a Protocol.
pub fn parse_format(format: &str) -> Result<Protocol> {
    match format.to_lowercase().as_str() {
        "auto" => Ok(detect_protocol()),
        "kitty" => Ok(Protocol::Kitty),
        "iterm" | "iterm2" => Ok(Protocol::ITerm),
        "none" | "off" => Ok(Protocol::None),
        _ => bail!("Unknown display format: {format}. Valid options: auto, kitty, iterm, none"),
    }
}

/// Shows `image` inline. Returns false when the terminal can't.
pub fn display(protocol: Protocol, image: &ImageFile) -> Result<bool> {
    match protocol {
        Protocol::Kitty => display_kitty(&as_png(image)?)?,
        Protocol::ITerm => display_iterm(&image.bytes)?,
        Protocol::None => return Ok(false),
    }
    Ok(true)
}

/// Kitty only takes PNG payloads.
fn as_png(image: &ImageFile) -> Result<Vec<u8>> {
    if image.mime_type == PNG {
        return Ok(image.bytes.clone());
    }
    let decoded = image::load_from_memory(&image.bytes).context("Failed to decode image")?;
    let mut out = Cursor::new(Vec::new());
    decoded
        .write_to(&mut out, image::ImageFormat::Png)
        .context("Failed to re-encode image as PNG")?;
    Ok(out.into_inner())
}

/// The Kitty graphics protocol transmits images as base64-encoded PNG data
/// using `ESC _ G <control> ; <payload> ESC \`.
fn display_kitty(png_data: &[u8]) -> Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_data);
    let mut stdout = std::io::stdout().lock();

    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(KITTY_CHUNK_SIZE).collect();
    for (i, chunk) in chunks.iter().enumerate() {
        // m=1: more chunks follow
        let more = u8::from(i + 1 < chunks.len());
        if i == 0 {
            write!(stdout, "\x1b_Ga=T,f=100,m={more};")?;
        } else {
            write!(stdout, "\x1b_Gm={more};")?;
        }
        stdout.write_all(chunk)?;
        write!(stdout, "\x1b\\")?;
    }

    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// OSC 1337 with the base64 file inline.
fn display_iterm(data: &[u8]) -> Result<()> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let mut stdout = std::io::stdout().lock();

    write!(
        stdout,
        "\x1b]1337;File=inline=1;size={}:{}\x07",
        data.len(),
        encoded
    )?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
