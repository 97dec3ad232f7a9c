use tracing::debug;
use tracing::info;

use crate::console;
use crate::pod_in_state;
use crate::scripts::cluster_resources;
use crate::scripts::Scripts;
use crate::token;
use crate::CancelToken;
use crate::CommandRunner;
use crate::Driver;
use crate::HistoryLog;
use crate::KubemanConfig;
use crate::KubemanError;
use crate::Poller;
use crate::Shell;
use crate::StopWatch;

pub const DEFAULT_POD_STATE: &str = "Running";

/// Per-process state: memoized lookups and phase timings.
#[derive(Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub ip: Option<String>,
    pub stopwatch: StopWatch,
}

/// Brings the local minikube cluster and its dashboard up and down.
pub struct ClusterManager<S> {
    config: KubemanConfig,
    runner: CommandRunner<S>,
    poller: Poller,
    scripts: Scripts,
}

impl<S: Shell> ClusterManager<S> {
    pub fn new(config: KubemanConfig, shell: S, cancel: CancelToken) -> Result<Self, KubemanError> {
        let runner = CommandRunner::new(shell, HistoryLog::new(&config.history))
            .delay(config.command_delay())
            .cancel_token(cancel.clone());
        let poller =
            Poller::new(config.poll.delay(), config.poll.max_attempts).cancel_token(cancel);
        Ok(Self {
            config,
            runner,
            poller,
            scripts: Scripts::new()?,
        })
    }

    pub fn config(&self) -> &KubemanConfig {
        &self.config
    }

    pub fn runner(&self) -> &CommandRunner<S> {
        &self.runner
    }

    /// print `msg` as a banner and record it in history
    pub fn banner(&self, msg: &str) -> Result<(), KubemanError> {
        console::banner(msg);
        self.runner.history().append(&console::banner_line(msg))
    }

    pub fn setup_minikube(
        &self,
        session: &mut Session,
        memory: Option<u32>,
        cpus: Option<u32>,
    ) -> Result<(), KubemanError> {
        session.stopwatch.start("setup_minikube");
        self.banner("setup_minikube")?;
        let (memory, cpus) = cluster_resources(&self.config.cluster, memory, cpus);
        info!(memory, cpus, "setting up minikube");
        let script = self
            .scripts
            .setup_minikube(memory, cpus, &self.config.cluster.driver)?;
        self.runner.run(&script, Driver::Status)?;
        session.stopwatch.stop("setup_minikube");
        Ok(())
    }

    /// deploy the dashboard, create the admin account and start the proxy
    pub fn setup_k8(&self, session: &mut Session) -> Result<(), KubemanError> {
        session.stopwatch.start("setup_k8");
        self.banner("setup_k8")?;
        let dashboard = &self.config.dashboard;
        let manifests = self
            .scripts
            .install_manifests(dashboard, &self.config.resource_dir())?;
        let script = self.scripts.setup_k8(dashboard, &manifests.dir)?;
        self.runner.run(&script, Driver::Status)?;

        let token = self.get_token(session)?;
        println!("{}", token);

        self.runner
            .run(&self.scripts.start_proxy(dashboard)?, Driver::Status)?;
        session.stopwatch.stop("setup_k8");
        Ok(())
    }

    pub fn kill_services(
        &self,
        session: &mut Session,
        pid: Option<&str>,
        keep_history: bool,
    ) -> Result<(), KubemanError> {
        session.stopwatch.start("kill_services");
        self.banner("kill_services")?;
        if !keep_history {
            if let Err(err) = self.runner.history().remove() {
                debug!(%err, "history not removed");
            }
        }
        self.runner.run(&self.scripts.kill(pid)?, Driver::Status)?;
        session.stopwatch.stop("kill_services");
        Ok(())
    }

    /// pid of the process listening on `port`, if `ss` reports one
    pub fn find_pid(&self, port: u16) -> Result<Option<String>, KubemanError> {
        let command = self.scripts.find_pid(port)?;
        match self.runner.capture(&command) {
            Ok(output) => Ok(parse_ss_pid(&output)),
            Err(KubemanError::Cancelled) => Err(KubemanError::Cancelled),
            Err(err) => {
                debug!(port, %err, "no listener found");
                Ok(None)
            }
        }
    }

    /// admin token for the dashboard, discovered once per session
    pub fn get_token(&self, session: &mut Session) -> Result<String, KubemanError> {
        if let Some(token) = &session.token {
            return Ok(token.clone());
        }
        let dashboard = &self.config.dashboard;

        console::info("TOKEN NAME");
        let query = self.scripts.secret_name(dashboard)?;
        let name = self
            .poller
            .poll("admin secret", || {
                let listing = self.runner.capture(&query)?;
                Ok(token::secret_name(&listing, &dashboard.admin_user))
            })?
            .value;

        console::info("TOKEN");
        let query = self.scripts.describe_secret(dashboard, &name)?;
        let description = self
            .poller
            .poll("admin token", || {
                let description = self.runner.capture(&query)?;
                Ok(Some(description).filter(|d| token::has_token(d)))
            })?
            .value;

        let token = token::extract_token(&description);
        session.token = Some(token.clone());
        Ok(token)
    }

    pub fn get_minikube_ip(&self, session: &mut Session) -> Result<String, KubemanError> {
        if let Some(ip) = &session.ip {
            return Ok(ip.clone());
        }
        let ip = self.runner.capture("minikube ip")?.trim().to_owned();
        session.ip = Some(ip.clone());
        Ok(ip)
    }

    pub fn get_pods(&self) -> Result<String, KubemanError> {
        self.runner.capture("kubectl get pods")
    }

    pub fn get_services(&self) -> Result<String, KubemanError> {
        self.runner.capture("kubectl get services")
    }

    /// print ip, pods, services, version and admin token. changes nothing
    pub fn deploy_info(&self, session: &mut Session) -> Result<(), KubemanError> {
        match self.get_minikube_ip(session) {
            Ok(ip) => println!("IP:               {}", ip),
            Err(KubemanError::Cancelled) => return Err(KubemanError::Cancelled),
            Err(err) => debug!(%err, "minikube ip unavailable"),
        }

        let pods = self.get_pods().unwrap_or_else(|err| err.to_string());
        println!("PODS");
        println!("{}", pods);

        let services = self.get_services().unwrap_or_else(|err| err.to_string());
        println!("SERVICES");
        println!("{}", services);

        console::hline('-');
        println!("VERSION:          {}", crate::VERSION);
        console::hline('-');
        println!("TOKEN");
        self.runner.run(
            &self.scripts.describe_admin(&self.config.dashboard)?,
            Driver::Status,
        )?;
        println!();
        Ok(())
    }

    /// wait until the proxied dashboard serves its login page, then open it
    pub fn open_k8_dashboard(&self, session: &mut Session, display: bool) -> Result<(), KubemanError> {
        self.banner("open_k8_dashboard")?;
        let dashboard = &self.config.dashboard;
        if !(dashboard.enabled || display) {
            return Ok(());
        }
        let token = self.get_token(session)?;
        console::hline('-');
        println!("TOKEN");
        console::hline('-');
        println!("{}", token);
        console::hline('-');

        let reachable = format!("curl {}", dashboard.url());
        let shell = self.runner.shell();
        self.poller.wait_for(
            "dashboard",
            || shell.capture(&reachable),
            |page| page.contains(&dashboard.title),
        )?;
        println!();

        self.runner
            .run(&self.scripts.open_browser(dashboard)?, Driver::Status)?;
        Ok(())
    }

    /// block until the first pod whose name contains `name` is in `state`
    pub fn wait_for_pod(&self, name: &str, state: &str) -> Result<u32, KubemanError> {
        console::inline(&format!("Starting {}: ", name));
        let shell = self.runner.shell();
        let polled = self.poller.wait_for(
            &format!("pod {}", name),
            || shell.capture("kubectl get pods"),
            |listing| pod_in_state(listing, name, state),
        )?;
        println!();
        console::ok(&format!("ok. Pod {} {}", name, state));
        Ok(polled.attempts)
    }
}

/// pid from an `ss -lntupw` line such as
/// `tcp LISTEN 0 4096 127.0.0.1:8001 0.0.0.0:* users:(("kubectl",pid=4242,fd=7))`
pub fn parse_ss_pid(output: &str) -> Option<String> {
    let users = output.split_whitespace().nth(6)?;
    let field = users.split(',').nth(1)?;
    let pid = field.split('=').nth(1)?;
    Some(pid.trim_end_matches(')').to_owned()).filter(|pid| !pid.is_empty())
}
