mod cancel;
mod config;
mod error;
mod history;
mod in_memory;
mod manager;
mod poller;
mod runner;
mod shell;
mod stopwatch;

pub mod console;
pub mod scripts;
pub mod token;

pub use cancel::CancelToken;
pub use config::*;
pub use error::KubemanError;
pub use history::HistoryLog;
pub use in_memory::InMemoryShell;
pub use manager::parse_ss_pid;
pub use manager::ClusterManager;
pub use manager::Session;
pub use manager::DEFAULT_POD_STATE;
pub use poller::pod_in_state;
pub use poller::Polled;
pub use poller::Poller;
pub use runner::BatchReport;
pub use runner::CommandRunner;
pub use runner::Driver;
pub use runner::LineOutcome;
pub use shell::Shell;
pub use shell::ShellError;
pub use shell::SystemShell;
pub use stopwatch::StopWatch;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
