//! Chat message rendering
//!
//! Turns a [`RaceCardResult`] (or a lookup failure) into markdown text for a
//! chat reply. The message layout follows the bot's embed: a title line,
//! date and course, one line per entrant, and a footer with the count.

mod message;

pub use message::{format_error, format_race_card, RenderOptions};

use crate::racecard::RaceCardResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a rendered race card message to a file
///
/// # Arguments
///
/// * `card` - The race card to render
/// * `options` - Rendering limits
/// * `output_path` - Path where the message should be written
pub fn write_race_card(
    card: &RaceCardResult,
    options: &RenderOptions,
    output_path: &Path,
) -> std::io::Result<()> {
    let message = format_race_card(card, options);

    let mut file = File::create(output_path)?;
    file.write_all(message.as_bytes())?;

    Ok(())
}
