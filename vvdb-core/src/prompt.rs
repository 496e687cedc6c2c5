use anyhow::Result;
use std::io::{BufRead, Write};

pub const CONTINUE_PROMPT: &str = "Do you wish to continue? [y/n] ";

/// Print `prompt` and read one line; only an exact `y` confirms.
/// End of input counts as a refusal.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, mut input: R, mut output: W) -> Result<bool> {
    output.write_all(prompt.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(line.trim_end_matches(['\n', '\r']) == "y")
}
