use std::io::Error as IoError;
use std::process::Command;
use std::process::ExitStatus;

use thiserror::Error;
use tracing::debug;
use tracing::trace;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: IoError,
    },
    #[error("`{command}` exited with status {code}")]
    Exit {
        command: String,
        code: i32,
        output: String,
    },
}

impl ShellError {
    /// whether running the same command again could succeed.
    /// any exit status may change once the cluster settles, including 127
    /// while a binary is still being installed. a missing shell never will.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Launch { .. } => false,
            Self::Exit { .. } => true,
        }
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Launch { command, .. } => command,
            Self::Exit { command, .. } => command,
        }
    }
}

/// Executes single command lines.
///
/// `status` is the fire-and-forget style: output goes straight to the terminal
/// and only the exit code comes back. `capture` returns standard output and
/// treats a non-zero exit as an error.
pub trait Shell {
    fn status(&self, command: &str) -> Result<i32, ShellError>;

    fn capture(&self, command: &str) -> Result<String, ShellError>;
}

impl<S: Shell + ?Sized> Shell for &S {
    fn status(&self, command: &str) -> Result<i32, ShellError> {
        (**self).status(command)
    }

    fn capture(&self, command: &str) -> Result<String, ShellError> {
        (**self).capture(command)
    }
}

/// runs every line through `sh -c`
#[derive(Debug, Clone)]
pub struct SystemShell {
    program: String,
}

impl Default for SystemShell {
    fn default() -> Self {
        Self {
            program: "sh".to_owned(),
        }
    }
}

impl SystemShell {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The line runs in its own process group, so a Ctrl-C at the terminal
    /// reaches only kubeman and the running line is allowed to finish.
    fn command(&self, line: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-c").arg(line);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }
}

impl Shell for SystemShell {
    fn status(&self, command: &str) -> Result<i32, ShellError> {
        debug!(command, "status");
        let status = self
            .command(command)
            .status()
            .map_err(|source| ShellError::Launch {
                command: command.to_owned(),
                source,
            })?;
        Ok(exit_code(status))
    }

    fn capture(&self, command: &str) -> Result<String, ShellError> {
        debug!(command, "capture");
        let output = self
            .command(command)
            .output()
            .map_err(|source| ShellError::Launch {
                command: command.to_owned(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!(command, %stdout, "captured");
        let code = exit_code(output.status);
        if code == 0 {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ShellError::Exit {
                command: command.to_owned(),
                code,
                output: format!("{}{}", stdout, stderr),
            })
        }
    }
}

/// exit code of the process, `128 + signal` when it was killed by a signal
#[cfg(unix)]
pub fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    match status.code() {
        Some(code) => code,
        None => 128 + status.signal().unwrap_or(0),
    }
}

#[cfg(not(unix))]
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod test {

    use super::ShellError;

    fn exit(code: i32) -> ShellError {
        ShellError::Exit {
            command: "kubectl get pods".to_owned(),
            code,
            output: String::new(),
        }
    }

    #[test]
    fn test_every_exit_code_is_retryable() {
        assert!(exit(1).is_retryable());
        assert!(exit(2).is_retryable());
        // not executable / not found, e.g. kubectl not installed yet
        assert!(exit(126).is_retryable());
        assert!(exit(127).is_retryable());
        assert!(exit(130).is_retryable());
    }

    #[test]
    fn test_launch_error_is_fatal() {
        let err = ShellError::Launch {
            command: "minikube ip".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "sh"),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.command(), "minikube ip");
    }
}
