use std::io::{self, BufRead, Write};

use crate::config::{DEFAULT_MARKETPLACE_URL, SniperConfig};

/// Line-oriented questions on any reader/writer pair; `main` wires it to
/// stdin/stdout.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Fills in the target and search text when they are still empty; with
    /// `ask_all`, also asks for the tuning values.
    pub fn complete(&mut self, config: &mut SniperConfig, ask_all: bool) -> io::Result<()> {
        if config.search.url.is_empty() || ask_all {
            config.search.url = self.url()?;
        }

        if config.search.search_token.is_empty() || ask_all {
            config.search.search_token = self.text("\nEnter the search text (e.g., 5080): ")?;
        }

        if ask_all {
            config.search.workers =
                self.integer("\nEnter the number of workers to run (recommended: 6): ", 1)? as usize;
            config.search.timeout_secs =
                self.integer("\nEnter the timeout value in seconds (recommended: 60): ", 1)?;
            config.search.start_delay_secs = self.integer(
                "\nEnter the delay between each worker in seconds (recommended: 10): ",
                0,
            )?;
            config.notifications.alert_duration_ms =
                self.integer("\nEnter the length of the alarm in ms (recommended: 5000): ", 0)?;
        }

        Ok(())
    }

    pub fn url(&mut self) -> io::Result<String> {
        loop {
            writeln!(self.output, "\nURL Selection:")?;
            writeln!(
                self.output,
                "1. Use default NVIDIA marketplace URL (Recommended for 50XX series Founder Edition)"
            )?;
            writeln!(self.output, "2. Enter custom marketplace URL")?;

            match self.text("Enter your choice (1 or 2): ")?.as_str() {
                "1" => return Ok(DEFAULT_MARKETPLACE_URL.to_string()),
                "2" => return self.text("Enter your custom URL: "),
                _ => writeln!(self.output, "Invalid choice. Please enter 1 or 2.")?,
            }
        }
    }

    pub fn text(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Re-asks until the answer parses and is at least `min`.
    pub fn integer(&mut self, prompt: &str, min: u64) -> io::Result<u64> {
        loop {
            match self.text(prompt)?.parse::<u64>() {
                Ok(value) if value >= min => return Ok(value),
                Ok(_) => writeln!(
                    self.output,
                    "Please enter a number greater than or equal to {}",
                    min
                )?,
                Err(_) => writeln!(self.output, "Please enter a valid number")?,
            }
        }
    }
}
