// SPDX-License-Identifier: GPL-3.0-only

//! Interactive terminal prompts
//!
//! Menus and prompts are written to `output` (stderr in the binary) so stdout
//! stays free for progress lines. Invalid answers re-prompt; end of input is
//! an error.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

fn read_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line.trim().to_string())
}

/// Ask until the answer is a whole number in `1..=max`
pub fn read_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    max: u64,
) -> io::Result<u64> {
    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        match read_line(input)?.parse::<u64>() {
            Ok(n) if (1..=max).contains(&n) => return Ok(n),
            _ => writeln!(output, "Invalid input. Try again")?,
        }
    }
}

/// Print a numbered menu and return the zero-based index picked
pub fn choose<R: BufRead, W: Write, T: Display>(
    input: &mut R,
    output: &mut W,
    noun: &str,
    items: &[T],
) -> io::Result<usize> {
    if items.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {} to choose from", noun),
        ));
    }

    for (i, item) in items.iter().enumerate() {
        writeln!(output, "[{}] {}", i + 1, item)?;
    }
    let prompt = format!("Choose {} [1-{}]: ", noun, items.len());
    let choice = read_choice(input, output, &prompt, items.len() as u64)?;
    Ok(choice as usize - 1)
}

/// Ask for the capture interval in whole seconds (at least 1)
pub fn read_interval_secs<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<u64> {
    writeln!(output, "time lag (in seconds):")?;
    read_choice(input, output, "", u64::MAX)
}

/// Block until the user presses Enter
pub fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
    writeln!(output, "Press Enter to start capturing frames")?;
    output.flush()?;
    read_line(input).map(|_| ())
}
