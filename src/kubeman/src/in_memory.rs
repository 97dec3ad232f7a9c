use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;

use crate::shell::Shell;
use crate::shell::ShellError;

#[derive(Debug, Clone)]
enum Reply {
    Status(i32),
    Output(String),
    Fail(i32, String),
}

/// Scripted shell that never spawns a process.
///
/// Replies are queued per command line. The last queued reply for a line keeps
/// being returned once the queue drains, so a single reply acts as a constant.
/// Unscripted lines succeed with status 0 and empty output.
#[derive(Debug, Default)]
pub struct InMemoryShell {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    invocations: RefCell<Vec<String>>,
}

impl InMemoryShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, command: &str, code: i32) -> Self {
        self.push(command, Reply::Status(code));
        self
    }

    pub fn with_output(self, command: &str, output: &str) -> Self {
        self.push(command, Reply::Output(output.to_owned()));
        self
    }

    /// capture of `command` exits with `code`
    pub fn with_failure(self, command: &str, code: i32, output: &str) -> Self {
        self.push(command, Reply::Fail(code, output.to_owned()));
        self
    }

    /// every line handed to the shell, in order
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.borrow().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.invocations
            .borrow()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    fn push(&self, command: &str, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry(command.to_owned())
            .or_default()
            .push_back(reply);
    }

    fn next(&self, command: &str) -> Option<Reply> {
        self.invocations.borrow_mut().push(command.to_owned());
        let mut replies = self.replies.borrow_mut();
        let queue = replies.get_mut(command)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Shell for InMemoryShell {
    fn status(&self, command: &str) -> Result<i32, ShellError> {
        match self.next(command) {
            None | Some(Reply::Output(_)) => Ok(0),
            Some(Reply::Status(code)) | Some(Reply::Fail(code, _)) => Ok(code),
        }
    }

    fn capture(&self, command: &str) -> Result<String, ShellError> {
        match self.next(command) {
            None => Ok(String::new()),
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Status(0)) => Ok(String::new()),
            Some(Reply::Status(code)) => Err(ShellError::Exit {
                command: command.to_owned(),
                code,
                output: String::new(),
            }),
            Some(Reply::Fail(code, output)) => Err(ShellError::Exit {
                command: command.to_owned(),
                code,
                output,
            }),
        }
    }
}
