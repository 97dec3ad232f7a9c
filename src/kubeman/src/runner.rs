use std::time::Duration;

use tracing::debug;

use crate::console;
use crate::CancelToken;
use crate::HistoryLog;
use crate::KubemanError;
use crate::Shell;
use crate::ShellError;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

const COMMENT: char = '#';

/// how a line is handed to the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// output goes to the terminal, only the exit code is kept
    Status,
    /// standard output is captured and echoed verbatim
    Capture,
}

#[derive(Debug)]
pub enum LineOutcome {
    Comment { line: String },
    Exited { command: String, code: i32 },
    Captured { command: String, output: String },
    Failed { command: String, error: ShellError },
}

impl LineOutcome {
    pub fn line(&self) -> &str {
        match self {
            Self::Comment { line } => line,
            Self::Exited { command, .. } => command,
            Self::Captured { command, .. } => command,
            Self::Failed { command, .. } => command,
        }
    }

    /// `None` when there is nothing to classify: comments and captured output
    pub fn succeeded(&self) -> Option<bool> {
        match self {
            Self::Exited { code, .. } => Some(*code == 0),
            Self::Failed { .. } => Some(false),
            Self::Comment { .. } | Self::Captured { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<LineOutcome>,
}

impl BatchReport {
    /// concatenated per-line results: exit codes in decimal, captured output
    /// verbatim. comments and failed lines add nothing
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            match outcome {
                LineOutcome::Exited { code, .. } => out.push_str(&code.to_string()),
                LineOutcome::Captured { output, .. } => out.push_str(output),
                LineOutcome::Comment { .. } | LineOutcome::Failed { .. } => {}
            }
        }
        out
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded() == Some(false))
            .count()
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT)
}

/// Runs command batches line by line, recording each line in history.
pub struct CommandRunner<S> {
    shell: S,
    history: HistoryLog,
    delay: Duration,
    cancel: CancelToken,
}

impl<S: Shell> CommandRunner<S> {
    pub fn new(shell: S, history: HistoryLog) -> Self {
        Self {
            shell,
            history,
            delay: DEFAULT_DELAY,
            cancel: CancelToken::default(),
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Run every non-blank line of `batch` in order.
    ///
    /// A failing line is reported and the batch moves on; the only errors are
    /// a history write failure and cancellation, which is checked before each
    /// line.
    pub fn run(&self, batch: &str, driver: Driver) -> Result<BatchReport, KubemanError> {
        console::hline('-');
        println!("{}", batch.trim());
        console::hline('-');

        let mut report = BatchReport::default();
        for line in batch.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.cancel.is_cancelled() {
                debug!(line, "cancelled before line");
                return Err(KubemanError::Cancelled);
            }
            self.history.append(line)?;

            if is_comment(line) {
                console::info(line);
                report.outcomes.push(LineOutcome::Comment {
                    line: line.to_owned(),
                });
                continue;
            }

            report.outcomes.push(self.execute(line, driver));

            if !self.cancel.sleep(self.delay) {
                return Err(KubemanError::Cancelled);
            }
        }
        Ok(report)
    }

    /// Run a single line with the capture driver, recorded in history.
    pub fn capture(&self, command: &str) -> Result<String, KubemanError> {
        match self.run(command, Driver::Capture)?.outcomes.pop() {
            Some(LineOutcome::Captured { output, .. }) => Ok(output),
            Some(LineOutcome::Failed { error, .. }) => Err(error.into()),
            _ => Ok(String::new()),
        }
    }

    fn execute(&self, command: &str, driver: Driver) -> LineOutcome {
        console::info(&format!("running: {}", command));
        match driver {
            Driver::Status => match self.shell.status(command) {
                Ok(code) => {
                    if code == 0 {
                        println!();
                        console::ok(&format!("# {} .ok.", command));
                    } else {
                        console::error(&format!("# {}\n{}", command, code));
                    }
                    console::hline('.');
                    LineOutcome::Exited {
                        command: command.to_owned(),
                        code,
                    }
                }
                Err(error) => self.failed(command, error),
            },
            Driver::Capture => match self.shell.capture(command) {
                Ok(output) => {
                    println!("{}", output);
                    LineOutcome::Captured {
                        command: command.to_owned(),
                        output,
                    }
                }
                Err(error) => self.failed(command, error),
            },
        }
    }

    fn failed(&self, command: &str, error: ShellError) -> LineOutcome {
        debug!(command, %error, "line failed");
        console::error(&format!("# {}\n{}", command, error));
        console::hline('.');
        LineOutcome::Failed {
            command: command.to_owned(),
            error,
        }
    }
}
