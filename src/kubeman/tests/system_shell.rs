use std::cell::Cell;
use std::time::Duration;

use kubeman::CommandRunner;
use kubeman::Driver;
use kubeman::HistoryLog;
use kubeman::KubemanError;
use kubeman::Poller;
use kubeman::Shell;
use kubeman::ShellError;
use kubeman::SystemShell;

fn runner(dir: &tempfile::TempDir) -> CommandRunner<SystemShell> {
    CommandRunner::new(SystemShell::default(), HistoryLog::new(dir.path().join("history.txt")))
        .delay(Duration::ZERO)
}

#[test]
fn test_status_batch_through_sh() {
    fluvio_future::subscriber::init_tracer(None);
    let dir = tempfile::tempdir().expect("tempdir");
    let runner = runner(&dir);

    let report = runner
        .run("echo hi\n# comment\nexit 1", Driver::Status)
        .expect("run");

    assert_eq!(report.transcript(), "01");
    assert_eq!(report.failures(), 1);
    assert_eq!(
        runner.history().lines().expect("history"),
        vec!["echo hi", "# comment", "exit 1"]
    );
}

#[test]
fn test_capture_through_sh() {
    let shell = SystemShell::default();

    assert_eq!(shell.capture("printf 'a\\nb'").expect("capture"), "a\nb");

    match shell.capture("echo oops >&2; exit 3") {
        Err(ShellError::Exit { code, output, .. }) => {
            assert_eq!(code, 3);
            assert!(output.contains("oops"));
        }
        other => panic!("expected exit error, got {:?}", other),
    }
}

#[test]
fn test_signal_exit_code() {
    let shell = SystemShell::default();
    // SIGTERM is 15
    assert_eq!(shell.status("kill -TERM $$").expect("status"), 143);
}

#[test]
fn test_missing_command_is_polled_until_timeout() {
    let shell = SystemShell::default();
    let poller = Poller::new(Duration::ZERO, Some(3));
    let calls = Cell::new(0);

    let result = poller.wait_for(
        "missing binary",
        || {
            calls.set(calls.get() + 1);
            shell.capture("kubeman-no-such-binary get pods")
        },
        |_| true,
    );

    match result {
        Err(KubemanError::PollTimeout { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_missing_shell_is_launch_error() {
    let shell = SystemShell::new("/nonexistent/sh");
    assert!(matches!(
        shell.status("true"),
        Err(ShellError::Launch { .. })
    ));
}

#[test]
fn test_poll_until_file_appears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let marker = dir.path().join("ready");
    let shell = SystemShell::default();
    let poller = Poller::new(Duration::from_millis(10), Some(50));
    let query = format!("cat {}", marker.display());

    let mut attempts = 0;
    let polled = poller
        .wait_for(
            "marker",
            || {
                attempts += 1;
                if attempts == 3 {
                    std::fs::write(&marker, "Running\n").expect("write");
                }
                shell.capture(&query)
            },
            |out| out.contains("Running"),
        )
        .expect("poll");

    assert_eq!(polled.attempts, 3);
}

// a Ctrl-C on the terminal goes to the foreground group, which the line is not in
#[cfg(target_os = "linux")]
#[test]
fn test_line_leads_its_own_process_group() {
    let shell = SystemShell::default();
    let output = shell
        .capture("echo $$ $(cut -d' ' -f5 /proc/$$/stat)")
        .expect("capture");
    let ids: Vec<&str> = output.split_whitespace().collect();
    assert_eq!(ids.len(), 2, "unexpected output {:?}", output);
    assert_eq!(ids[0], ids[1]);

    let own = std::fs::read_to_string("/proc/self/stat").expect("stat");
    let own_group = own.split_whitespace().nth(4).expect("pgrp");
    assert_ne!(ids[1], own_group);
}
