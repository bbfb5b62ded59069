//! Interactive session-length prompt.

use std::io::{self, BufRead, Write};

use arena_core::config::DEFAULT_SESSION_SECS;

/// Interpret a typed session length in seconds.
///
/// Blank, unparsable and non-positive input all fall back to `default`.
#[must_use]
pub fn parse_duration_input(input: &str, default: u64) -> u64 {
    match input.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => secs.unsigned_abs(),
        _ => default,
    }
}

/// Ask for the session length on `output` and read one line from `input`.
///
/// End of input counts as blank.
pub fn prompt_duration<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<u64> {
    write!(
        output,
        "Enter session length in seconds (default {DEFAULT_SESSION_SECS}): "
    )?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_duration_input(&line, DEFAULT_SESSION_SECS))
}
