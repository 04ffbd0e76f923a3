//! Line-based interactive prompts.

use std::io::{self, BufRead, Write};

use console::Term;

use crate::error::{Error, Result};

/// Asks questions on one stream and reads answers from another.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and return the next line, without its line ending.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        writeln!(self.output, "{}", question)?;
        self.output.flush()?;
        self.read_line()
    }

    /// Ask a y/n question until the answer is exactly `y` or `n`.
    pub fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        writeln!(self.output, "{} (y/n)", question)?;
        self.output.flush()?;
        loop {
            match self.read_line()?.trim().to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => continue,
            }
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )));
        }
        Ok(line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string())
    }
}

/// Block until any key is pressed on an interactive terminal.
pub fn wait_for_key() {
    let term = Term::stdout();
    if !term.is_term() {
        return;
    }
    println!("Press any key...");
    let _ = term.read_key();
}
