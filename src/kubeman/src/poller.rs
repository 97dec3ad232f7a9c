use std::time::Duration;

use tracing::debug;
use tracing::trace;

use crate::console;
use crate::CancelToken;
use crate::KubemanError;
use crate::ShellError;

pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 300;

/// value returned by a successful poll and the attempt that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
}

/// Blocks until an external condition holds.
///
/// Shell errors from a command that ran count as "not yet", whatever its exit
/// status. The loop ends on success, when `sh` itself cannot be launched,
/// when `max_attempts` is used up or when cancelled.
/// With `max_attempts` unset it only ends on success or cancel.
#[derive(Debug, Clone)]
pub struct Poller {
    delay: Duration,
    max_attempts: Option<u32>,
    cancel: CancelToken,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            delay: DEFAULT_POLL_DELAY,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            cancel: CancelToken::default(),
        }
    }
}

impl Poller {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
            ..Default::default()
        }
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Call `attempt` until it yields `Some`.
    pub fn poll<T, F>(&self, what: &str, mut attempt: F) -> Result<Polled<T>, KubemanError>
    where
        F: FnMut() -> Result<Option<T>, KubemanError>,
    {
        let mut attempts = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Err(KubemanError::Cancelled);
            }
            attempts += 1;
            match attempt() {
                Ok(Some(value)) => {
                    debug!(what, attempts, "condition met");
                    return Ok(Polled { value, attempts });
                }
                Ok(None) => trace!(what, attempts, "condition not met"),
                Err(KubemanError::ShellError(err)) if err.is_retryable() => {
                    trace!(what, attempts, %err, "retrying after error")
                }
                Err(err) => return Err(err),
            }

            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(KubemanError::PollTimeout {
                        what: what.to_owned(),
                        attempts,
                    });
                }
            }
            console::progress();
            if !self.cancel.sleep(self.delay) {
                return Err(KubemanError::Cancelled);
            }
        }
    }

    /// Run `query` until `predicate` accepts its output; returns that output.
    pub fn wait_for<Q, P>(
        &self,
        what: &str,
        mut query: Q,
        predicate: P,
    ) -> Result<Polled<String>, KubemanError>
    where
        Q: FnMut() -> Result<String, ShellError>,
        P: Fn(&str) -> bool,
    {
        self.poll(what, || {
            let output = query()?;
            Ok(if predicate(&output) { Some(output) } else { None })
        })
    }
}

/// whether the first listing line naming `name` also shows `state`
pub fn pod_in_state(listing: &str, name: &str, state: &str) -> bool {
    listing
        .lines()
        .find(|line| line.contains(name))
        .map(|line| line.contains(state))
        .unwrap_or(false)
}

#[cfg(test)]
mod test {

    use std::cell::Cell;
    use std::time::Duration;
    use std::time::Instant;

    use crate::CancelToken;
    use crate::KubemanError;
    use crate::ShellError;

    use super::pod_in_state;
    use super::Poller;

    fn exit(code: i32) -> ShellError {
        ShellError::Exit {
            command: "kubectl get pods".to_owned(),
            code,
            output: String::new(),
        }
    }

    #[test]
    fn test_returns_on_kth_attempt() {
        //given
        let poller = Poller::new(Duration::ZERO, Some(10));
        let calls = Cell::new(0);

        //when
        let polled = poller
            .poll("third call", || {
                calls.set(calls.get() + 1);
                Ok(if calls.get() == 3 { Some("ready") } else { None })
            })
            .expect("poll");

        //then
        assert_eq!(polled.value, "ready");
        assert_eq!(polled.attempts, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_sleeps_only_between_attempts() {
        let delay = Duration::from_millis(30);
        let poller = Poller::new(delay, None);

        let start = Instant::now();
        let polled = poller.poll("first call", || Ok(Some(()))).expect("poll");
        assert_eq!(polled.attempts, 1);
        assert!(start.elapsed() < delay);

        let calls = Cell::new(0);
        let start = Instant::now();
        poller
            .poll("third call", || {
                calls.set(calls.get() + 1);
                Ok(if calls.get() == 3 { Some(()) } else { None })
            })
            .expect("poll");
        assert!(start.elapsed() >= delay * 2);
    }

    #[test]
    fn test_retryable_errors_are_retried() {
        let poller = Poller::new(Duration::ZERO, Some(5));
        let calls = Cell::new(0);

        let polled = poller
            .wait_for(
                "pods",
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err(exit(1))
                    } else {
                        Ok("web Running".to_owned())
                    }
                },
                |out| out.contains("Running"),
            )
            .expect("poll");

        assert_eq!(polled.attempts, 3);
        assert_eq!(polled.value, "web Running");
    }

    #[test]
    fn test_command_not_found_is_retried_until_timeout() {
        let poller = Poller::new(Duration::ZERO, Some(3));
        let calls = Cell::new(0);

        let result = poller.wait_for(
            "pods",
            || {
                calls.set(calls.get() + 1);
                Err(exit(127))
            },
            |_| true,
        );

        match result {
            Err(KubemanError::PollTimeout { what, attempts }) => {
                assert_eq!(what, "pods");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_binary_appearing_late_is_picked_up() {
        let poller = Poller::new(Duration::ZERO, Some(5));
        let calls = Cell::new(0);

        let polled = poller
            .wait_for(
                "pods",
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err(exit(127))
                    } else {
                        Ok("web Running".to_owned())
                    }
                },
                |out| out.contains("Running"),
            )
            .expect("poll");

        assert_eq!(polled.attempts, 3);
    }

    #[test]
    fn test_launch_error_aborts() {
        let poller = Poller::new(Duration::ZERO, None);
        let calls = Cell::new(0);

        let result = poller.wait_for(
            "pods",
            || {
                calls.set(calls.get() + 1);
                Err(ShellError::Launch {
                    command: "kubectl get pods".to_owned(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "sh"),
                })
            },
            |_| true,
        );

        assert!(matches!(result, Err(KubemanError::ShellError(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_timeout_after_max_attempts() {
        let poller = Poller::new(Duration::ZERO, Some(4));
        let calls = Cell::new(0);

        let result = poller.wait_for(
            "dashboard",
            || {
                calls.set(calls.get() + 1);
                Ok(String::new())
            },
            |out| out.contains("<title>"),
        );

        match result {
            Err(KubemanError::PollTimeout { what, attempts }) => {
                assert_eq!(what, "dashboard");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_cancel_stops_polling() {
        let cancel = CancelToken::new();
        let poller = Poller::new(Duration::ZERO, None).cancel_token(cancel.clone());
        let calls = Cell::new(0);

        let result = poller.poll::<(), _>("never", || {
            calls.set(calls.get() + 1);
            if calls.get() == 2 {
                cancel.cancel();
            }
            Ok(None)
        });

        assert!(matches!(result, Err(KubemanError::Cancelled)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_pod_in_state() {
        let listing = "NAME             READY   STATUS              RESTARTS   AGE\n\
                       redis-5d4f       1/1     Running             0          3m\n\
                       myapp-7f8c9-x2   0/1     ContainerCreating   0          5s\n";
        assert!(!pod_in_state(listing, "myapp-7f8", "Running"));
        assert!(pod_in_state(listing, "myapp-7f8", "ContainerCreating"));
        assert!(pod_in_state(listing, "redis", "Running"));
        assert!(!pod_in_state(listing, "nginx", "Running"));
        assert!(!pod_in_state("", "myapp-7f8", "Running"));
    }
}
