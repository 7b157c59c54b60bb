//! Result printing for one-shot searches.

use crate::search::Hit;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print hits one per line as `file:line:content`, highlighting the matched
/// positions. The filename and line number are omitted for stdin input.
pub fn print_hits(hits: &[Hit], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for hit in hits {
        if !hit.info.filename.is_empty() {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(stdout, "{}", hit.info.filename)?;
            stdout.reset()?;
            write!(stdout, ":")?;
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(stdout, "{}", hit.info.lineno)?;
            stdout.reset()?;
            write!(stdout, ":")?;
        }
        print_highlighted(&mut stdout, &hit.info.text, &hit.result.positions)?;
        writeln!(stdout)?;
    }

    Ok(())
}

/// Write `text` with the byte positions in `positions` (sorted ascending)
/// highlighted. Writes raw bytes, so positions falling inside multi-byte
/// characters cannot split the output incorrectly.
fn print_highlighted(
    stdout: &mut StandardStream,
    text: &str,
    positions: &[usize],
) -> io::Result<()> {
    let bytes = text.as_bytes();
    let mut cursor = 0;
    for &(start, end) in &runs(positions) {
        let start = start.min(bytes.len());
        let end = end.min(bytes.len());
        if cursor < start {
            stdout.write_all(&bytes[cursor..start])?;
        }
        if start < end {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            stdout.write_all(&bytes[start..end])?;
            stdout.reset()?;
        }
        cursor = end.max(cursor);
    }
    if cursor < bytes.len() {
        stdout.write_all(&bytes[cursor..])?;
    }
    Ok(())
}

/// Collapse sorted positions into half-open `[start, end)` runs.
pub fn runs(positions: &[usize]) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &p in positions {
        match out.last_mut() {
            Some((_, end)) if p < *end => {}
            Some((_, end)) if *end == p => *end = p + 1,
            _ => out.push((p, p + 1)),
        }
    }
    out
}
