//! Structured, leveled logging.
//!
//! # Data Flow
//! ```text
//! log.info(data)
//!     → merge alert level into payload
//!     → real sink: "<timestamp> <JSON>" via CommandLine,
//!       failures expanded to full detail
//!     → trackers: payload as JSON value,
//!       failures collapsed to their message
//! ```
//!
//! # Design Decisions
//! - Production lines carry full diagnostic detail (the failure's
//!   message plus its whole source chain); tracked output carries only
//!   the message, so test assertions don't depend on chain formatting
//! - Time and output are injected (`Clock`, `CommandLine`), never read
//!   from ambient globals

use std::error::Error;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::command_line::CommandLine;
use crate::tracker::{OutputListener, OutputTracker};

const TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %H:%M:%S UTC";

/// Severity of a log entry, merged into the payload as `alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Debug,
    Info,
    Monitor,
    Action,
    Emergency,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Debug => "debug",
            AlertLevel::Info => "info",
            AlertLevel::Monitor => "monitor",
            AlertLevel::Action => "action",
            AlertLevel::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure value carried inside a log payload.
pub type Failure = Arc<dyn Error + Send + Sync + 'static>;

/// One field of a log payload: plain data or a failure.
#[derive(Clone)]
pub enum LogValue {
    Data(Value),
    Failure(Failure),
}

/// Structured payload passed to the level methods.
#[derive(Clone, Default)]
pub struct LogData {
    fields: Vec<(String, LogValue)>,
}

impl LogData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload with a single `message` field.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new().with("message", text.into())
    }

    /// Add a plain data field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), LogValue::Data(value.into())));
        self
    }

    /// Add a failure field. Expanded in the real sink, collapsed to its
    /// message in tracked output.
    pub fn with_failure(mut self, key: impl Into<String>, failure: impl Into<Failure>) -> Self {
        self.fields
            .push((key.into(), LogValue::Failure(failure.into())));
        self
    }
}

/// Leveled log sink with interchangeable production and null variants.
///
/// Cheap to clone; clones share the same sink and trackers.
#[derive(Clone)]
pub struct Log {
    shared: Arc<Shared>,
}

struct Shared {
    command_line: Arc<CommandLine>,
    clock: Clock,
    output: OutputListener<Value>,
}

impl Log {
    pub fn new(command_line: Arc<CommandLine>, clock: Clock) -> Self {
        Self {
            shared: Arc::new(Shared {
                command_line,
                clock,
                output: OutputListener::new(),
            }),
        }
    }

    /// Null log: frozen clock, output goes nowhere but is trackable.
    pub fn create_null() -> Self {
        Self::new(Arc::new(CommandLine::create_null()), Clock::create_null())
    }

    /// Track the payloads of every subsequent log call. Failure fields
    /// are recorded as their message string only.
    pub fn track_output(&self) -> OutputTracker<Value> {
        self.shared.output.track()
    }

    pub fn debug(&self, data: LogData) {
        self.write(AlertLevel::Debug, data);
    }

    pub fn info(&self, data: LogData) {
        self.write(AlertLevel::Info, data);
    }

    pub fn monitor(&self, data: LogData) {
        self.write(AlertLevel::Monitor, data);
    }

    pub fn action(&self, data: LogData) {
        self.write(AlertLevel::Action, data);
    }

    pub fn emergency(&self, data: LogData) {
        self.write(AlertLevel::Emergency, data);
    }

    fn write(&self, level: AlertLevel, data: LogData) {
        if self.shared.output.is_tracking() {
            self.shared
                .output
                .emit(serialize(level, &data, FailureForm::MessageOnly));
        }

        let line = format!(
            "{} {}",
            self.shared.clock.now().format(TIMESTAMP_FORMAT),
            serialize(level, &data, FailureForm::FullDetail),
        );
        // a broken stdout leaves nowhere to report the loss
        let _ = self.shared.command_line.write_output(&line);
    }
}

#[derive(Clone, Copy)]
enum FailureForm {
    MessageOnly,
    FullDetail,
}

fn serialize(level: AlertLevel, data: &LogData, form: FailureForm) -> Value {
    let mut payload = Map::new();
    payload.insert("alert".to_string(), Value::String(level.as_str().to_string()));
    for (key, value) in &data.fields {
        let rendered = match (value, form) {
            (LogValue::Data(data), _) => data.clone(),
            (LogValue::Failure(failure), FailureForm::MessageOnly) => {
                Value::String(failure.to_string())
            }
            (LogValue::Failure(failure), FailureForm::FullDetail) => {
                Value::String(render_failure(failure))
            }
        };
        payload.insert(key.clone(), rendered);
    }
    Value::Object(payload)
}

/// Message plus the entire source chain, one cause per line.
fn render_failure(failure: &Failure) -> String {
    let mut rendered = failure.to_string();
    let mut source = failure.source();
    while let Some(cause) = source {
        let _ = write!(rendered, "\n    caused by: {cause}");
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("my error")]
    struct TestFailure {
        #[source]
        cause: Option<Box<TestFailure>>,
    }

    fn create_log() -> (Log, OutputTracker<String>, OutputTracker<Value>) {
        let command_line = Arc::new(CommandLine::create_null());
        let stdout = command_line.track_output();
        let log = Log::new(command_line, Clock::create_null());
        let output = log.track_output();
        (log, stdout, output)
    }

    #[test]
    fn writes_current_time_and_structured_data_as_one_line() {
        let (log, stdout, _) = create_log();

        log.info(LogData::new().with("output", "my output"));

        let expected_payload = json!({ "alert": "info", "output": "my output" });
        assert_eq!(
            stdout.data(),
            [format!("Jan 1, 1970, 00:00:00 UTC {expected_payload}")]
        );
    }

    #[test]
    fn provides_every_alert_level() {
        let (log, _, output) = create_log();

        log.debug(LogData::new());
        log.info(LogData::new());
        log.monitor(LogData::new());
        log.action(LogData::new());
        log.emergency(LogData::new());

        assert_eq!(
            output.data(),
            [
                json!({ "alert": "debug" }),
                json!({ "alert": "info" }),
                json!({ "alert": "monitor" }),
                json!({ "alert": "action" }),
                json!({ "alert": "emergency" }),
            ]
        );
    }

    #[test]
    fn tracked_output_records_the_payload() {
        let (log, _, output) = create_log();

        log.info(LogData::new().with("output", "my output"));

        assert_eq!(
            output.data(),
            [json!({ "alert": "info", "output": "my output" })]
        );
    }

    #[test]
    fn sink_expands_failures_to_their_full_source_chain() {
        let (log, stdout, _) = create_log();
        let failure = TestFailure {
            cause: Some(Box::new(TestFailure { cause: None })),
        };

        log.info(LogData::new().with_failure("output", Arc::new(failure) as Failure));

        let line = &stdout.data()[0];
        assert!(line.contains("my error\\n    caused by: my error"), "line: {line}");
    }

    #[test]
    fn tracker_collapses_failures_to_their_message() {
        let (log, _, output) = create_log();
        let failure = TestFailure {
            cause: Some(Box::new(TestFailure { cause: None })),
        };

        log.info(LogData::new().with_failure("output", Arc::new(failure) as Failure));

        assert_eq!(
            output.data(),
            [json!({ "alert": "info", "output": "my error" })]
        );
    }

    #[test]
    fn trackers_attached_separately_each_record_every_call() {
        let (log, _, first) = create_log();
        let second = log.track_output();

        log.info(LogData::message("once"));

        assert_eq!(first.data().len(), 1);
        assert_eq!(second.data().len(), 1);
    }

    #[test]
    fn uses_the_injected_clock_for_timestamps() {
        let command_line = Arc::new(CommandLine::create_null());
        let stdout = command_line.track_output();
        let clock = Clock::create_null();
        clock.advance(chrono::Duration::seconds(61)).unwrap();
        let log = Log::new(command_line, clock);

        log.info(LogData::new());

        assert!(stdout.data()[0].starts_with("Jan 1, 1970, 00:01:01 UTC "));
    }
}
