use super::{Decision, DecisionPrompt};
use crate::common::types::ActivityRecord;
use std::io::{BufRead, Write};
use tracing::warn;

const QUESTION: &str = "Upload (y), Skip (n) or Exit (x)?";

/// Line-oriented prompt: prints each candidate and reads `y`, `n` or `x`.
///
/// Any other answer repeats the question. End of input counts as `x`.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self) {
        if let Err(e) = writeln!(self.output, "{QUESTION}").and_then(|_| self.output.flush()) {
            warn!("Failed to write prompt: {e}");
        }
    }
}

fn parse_answer(line: &str) -> Option<Decision> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" => Some(Decision::Upload),
        "n" => Some(Decision::Skip),
        "x" => Some(Decision::Exit),
        _ => None,
    }
}

impl<R: BufRead, W: Write> DecisionPrompt for TerminalPrompt<R, W> {
    fn present(&mut self, activity: &ActivityRecord) {
        if let Err(e) = writeln!(self.output, "{activity}") {
            warn!("Failed to write activity: {e}");
        }
    }

    fn decide(&mut self) -> Decision {
        self.ask();
        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => return Decision::Exit,
                Ok(_) => {
                    if let Some(decision) = parse_answer(&line) {
                        return decision;
                    }
                    self.ask();
                }
                Err(e) => {
                    warn!("Failed to read answer, exiting: {e}");
                    return Decision::Exit;
                }
            }
        }
    }
}
