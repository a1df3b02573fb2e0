//! Command-line wrapper.
//!
//! # Responsibilities
//! - Expose the process's invocation arguments
//! - Write line-oriented output to stdout
//! - Track everything written for inspection in tests
//!
//! # Design Decisions
//! - Output is append-only and ordered; a line is never rewritten
//! - The null variant still emits to trackers so tests see identical
//!   behavior to production

use std::io::{self, Write};

use crate::tracker::{OutputListener, OutputTracker};

/// Process argument and stdout wrapper with interchangeable production
/// and null variants.
pub struct CommandLine {
    args: ArgSource,
    sink: Sink,
    output: OutputListener<String>,
}

enum ArgSource {
    Process,
    Preset(Vec<String>),
}

enum Sink {
    Stdout,
    Discard,
}

impl CommandLine {
    /// Command line backed by the real process arguments and stdout.
    pub fn new() -> Self {
        Self {
            args: ArgSource::Process,
            sink: Sink::Stdout,
            output: OutputListener::new(),
        }
    }

    /// Null command line with no arguments; writes go nowhere.
    pub fn create_null() -> Self {
        Self::create_null_with_args(Vec::<String>::new())
    }

    /// Null command line with preconfigured arguments.
    pub fn create_null_with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: ArgSource::Preset(args.into_iter().map(Into::into).collect()),
            sink: Sink::Discard,
            output: OutputListener::new(),
        }
    }

    /// The ordered invocation arguments, program name excluded.
    pub fn args(&self) -> Vec<String> {
        match &self.args {
            ArgSource::Process => std::env::args().skip(1).collect(),
            ArgSource::Preset(args) => args.clone(),
        }
    }

    /// Append one line of output.
    pub fn write_output(&self, text: &str) -> io::Result<()> {
        self.output.emit(text.to_string());
        match self.sink {
            Sink::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{text}")
            }
            Sink::Discard => Ok(()),
        }
    }

    /// Track every line written through [`write_output`](Self::write_output).
    pub fn track_output(&self) -> OutputTracker<String> {
        self.output.track()
    }
}

impl Default for CommandLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_command_line_defaults_to_no_arguments() {
        let command_line = CommandLine::create_null();
        assert!(command_line.args().is_empty());
    }

    #[test]
    fn null_command_line_provides_configured_arguments() {
        let command_line = CommandLine::create_null_with_args(["one", "two"]);
        assert_eq!(command_line.args(), ["one", "two"]);
    }

    #[test]
    fn tracks_output_in_write_order() {
        let command_line = CommandLine::create_null();
        let output = command_line.track_output();

        command_line.write_output("first").unwrap();
        command_line.write_output("second").unwrap();

        assert_eq!(output.data(), ["first", "second"]);
    }

    #[test]
    fn trackers_record_independently() {
        let command_line = CommandLine::create_null();
        let first = command_line.track_output();

        command_line.write_output("a").unwrap();
        let second = command_line.track_output();
        command_line.write_output("b").unwrap();

        assert_eq!(first.data(), ["a", "b"]);
        assert_eq!(second.data(), ["b"]);
    }
}
