use std::sync::mpsc;

use tracing::debug;

use kubeman::CancelToken;

#[cfg(unix)]
type Interrupts = tokio::signal::unix::Signal;

#[cfg(windows)]
type Interrupts = tokio::signal::windows::CtrlC;

/// registers the handler immediately, unlike `tokio::signal::ctrl_c` which
/// only does so when first polled
#[cfg(unix)]
fn interrupts() -> std::io::Result<Interrupts> {
    use tokio::signal::unix::signal;
    use tokio::signal::unix::SignalKind;

    signal(SignalKind::interrupt())
}

#[cfg(windows)]
fn interrupts() -> std::io::Result<Interrupts> {
    tokio::signal::windows::ctrl_c()
}

/// The first ctrl-c cancels `cancel` so the current line can finish and
/// history stays intact. A second one exits immediately.
///
/// Returns once the handler is in place; `false` if it could not be set up.
pub fn install(cancel: CancelToken) -> bool {
    let (ready, registered) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("signal".to_owned())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    debug!(%err, "signal runtime not available");
                    let _ = ready.send(false);
                    return;
                }
            };
            runtime.block_on(async move {
                let mut interrupts = match interrupts() {
                    Ok(interrupts) => interrupts,
                    Err(err) => {
                        debug!(%err, "interrupt handler not registered");
                        let _ = ready.send(false);
                        return;
                    }
                };
                let _ = ready.send(true);
                if interrupts.recv().await.is_none() {
                    return;
                }
                debug!("interrupt received, cancelling");
                cancel.cancel();
                if interrupts.recv().await.is_some() {
                    std::process::exit(130);
                }
            });
        });
    match spawned {
        Ok(_) => registered.recv().unwrap_or(false),
        Err(err) => {
            debug!(%err, "signal listener not started");
            false
        }
    }
}
