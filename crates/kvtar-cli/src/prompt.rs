use std::io::{self, BufRead, Write};

use colored::Colorize;
use kvtar_engine::{answer_is_yes, Confirm};

/// Asks on stderr and reads the answer from stdin.
///
/// Stdin is only locked while waiting for an answer, so `put -` can still
/// read its payload from it.
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, count: u64, label: &str) -> io::Result<bool> {
        let stdin = io::stdin();
        ask(&mut stdin.lock(), &mut io::stderr(), count, label)
    }
}

/// Print the removal warning to `output` and read one line from `input`.
/// End of input counts as no.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, count: u64, label: &str) -> io::Result<bool> {
    write!(
        output,
        "{} About to delete {} keys in {}!  Continue [Y/*]? ",
        "WARNING:".yellow().bold(),
        count.to_string().bold(),
        label
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(answer_is_yes(&line))
}
