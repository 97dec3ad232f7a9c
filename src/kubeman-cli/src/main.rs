mod signal;

use std::path::PathBuf;

use anyhow::Result;
use clap::ArgGroup;
use clap::Parser;
use tracing::info;

use kubeman::ClusterManager;
use kubeman::CancelToken;
use kubeman::KubemanConfig;
use kubeman::KubemanError;
use kubeman::Session;
use kubeman::SystemShell;
use kubeman::DEFAULT_POD_STATE;

/// exit status after an interrupt, as a shell reports it
const EXIT_INTERRUPTED: i32 = 130;

/// license and credits printed by `--about`
const ABOUT: &str = include_str!("../resources/about.txt");

#[derive(Parser, Debug)]
#[command(
    name = "kubeman",
    about = "Set up, inspect and tear down a local minikube cluster with the Kubernetes dashboard",
    version,
    group(
        ArgGroup::new("action")
            .required(true)
            .args(["info", "kill", "token", "about", "setup", "dashboard", "wait_pod"])
    )
)]
struct Cli {
    /// Print cluster IP, pods, services, version and the admin token
    #[arg(long)]
    info: bool,

    /// Stop the proxy and delete the minikube cluster
    #[arg(long)]
    kill: bool,

    /// Keep history.txt when killing the cluster
    #[arg(long = "keep-history", alias = "keep_history", requires = "kill")]
    keep_history: bool,

    /// Print the dashboard admin token
    #[arg(long)]
    token: bool,

    /// Print version and license information
    #[arg(long)]
    about: bool,

    /// Create the cluster, deploy the dashboard and start the proxy
    #[arg(long)]
    setup: bool,

    /// Memory for minikube in megabytes
    #[arg(long, requires = "setup")]
    memory: Option<u32>,

    /// CPUs for minikube
    #[arg(long, requires = "setup")]
    cpus: Option<u32>,

    /// Wait for the dashboard and open it in a browser
    #[arg(long)]
    dashboard: bool,

    /// Wait until a pod whose name contains NAME reaches --state
    #[arg(long = "wait-pod", value_name = "NAME")]
    wait_pod: Option<String>,

    /// Pod state to wait for
    #[arg(long, default_value = DEFAULT_POD_STATE)]
    state: String,

    /// Config file, defaults to $KUBEMAN_CONFIG or ~/.kubeman/config.yaml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    fluvio_future::subscriber::init_tracer(None);
    let cli = Cli::parse();

    let cancel = CancelToken::new();
    if !signal::install(cancel.clone()) {
        info!("ctrl-c is not handled, interrupts stop kubeman immediately");
    }

    let mut session = Session::default();
    let code = match run(cli, cancel, &mut session) {
        Ok(()) => 0,
        Err(err) => match err.downcast_ref::<KubemanError>() {
            Some(err) if err.is_cancelled() => {
                println!("SIGINT or CTRL-C detected. Exiting gracefully");
                EXIT_INTERRUPTED
            }
            _ => {
                eprintln!("error: {:#}", err);
                1
            }
        },
    };

    if !session.stopwatch.is_empty() {
        print!("{}", session.stopwatch.summary());
    }
    std::process::exit(code);
}

fn run(cli: Cli, cancel: CancelToken, session: &mut Session) -> Result<()> {
    if cli.about {
        print_about();
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => KubemanConfig::from_file(path)?,
        None => KubemanConfig::load()?,
    };
    info!(history = %config.history.display(), "loaded config");
    let manager = ClusterManager::new(config, SystemShell::default(), cancel)?;

    if cli.info {
        manager.deploy_info(session)?;
    } else if cli.kill {
        let pid = manager.find_pid(manager.config().dashboard.proxy_port)?;
        manager.kill_services(session, pid.as_deref(), cli.keep_history)?;
    } else if cli.token {
        let token = manager.get_token(session)?;
        println!("{}", token);
    } else if cli.setup {
        manager.setup_minikube(session, cli.memory, cli.cpus)?;
        manager.setup_k8(session)?;
        manager.open_k8_dashboard(session, false)?;
    } else if cli.dashboard {
        manager.open_k8_dashboard(session, true)?;
    } else if let Some(name) = &cli.wait_pod {
        manager.wait_for_pod(name, &cli.state)?;
    }
    Ok(())
}

fn print_about() {
    println!("kubeman {}", kubeman::VERSION);
    println!();
    println!("Manages a single local minikube cluster and its Kubernetes dashboard.");
    println!("Every command it runs is appended to history.txt in the current directory.");
    println!();
    print!("{}", ABOUT);
}
