use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::history::DEFAULT_HISTORY;
use crate::poller::DEFAULT_MAX_ATTEMPTS;
use crate::KubemanError;

pub const CONFIG_ENV: &str = "KUBEMAN_CONFIG";

const DASHBOARD_MANIFEST: &str =
    "https://raw.githubusercontent.com/kubernetes/dashboard/v2.4.0/aio/deploy/recommended.yaml";

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PollConfig {
    pub delay_ms: u64,
    /// unset means poll until the condition holds
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl PollConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterConfig {
    /// megabytes
    pub memory: u32,
    pub cpus: u32,
    pub driver: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            memory: 10000,
            cpus: 8,
            driver: "docker".to_owned(),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DashboardConfig {
    /// open the dashboard even when not asked for explicitly
    pub enabled: bool,
    pub manifest: String,
    pub namespace: String,
    pub admin_user: String,
    pub proxy_port: u16,
    pub title: String,
    pub browser: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let browser = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        Self {
            enabled: false,
            manifest: DASHBOARD_MANIFEST.to_owned(),
            namespace: "kubernetes-dashboard".to_owned(),
            admin_user: "admin-user".to_owned(),
            proxy_port: 8001,
            title: "<title>Kubernetes Dashboard</title>".to_owned(),
            browser: browser.to_owned(),
        }
    }
}

impl DashboardConfig {
    /// login page served through `kubectl proxy`
    pub fn url(&self) -> String {
        format!(
            "http://localhost:{}/api/v1/namespaces/{}/services/https:kubernetes-dashboard:/proxy/#/login",
            self.proxy_port, self.namespace
        )
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct KubemanConfig {
    #[serde(skip)]
    pub path: Option<PathBuf>,
    pub history: PathBuf,
    pub command_delay_ms: u64,
    pub poll: PollConfig,
    pub cluster: ClusterConfig,
    pub dashboard: DashboardConfig,
    /// where the RBAC manifests are written, defaults to `~/.kubeman`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<PathBuf>,
}

impl Default for KubemanConfig {
    fn default() -> Self {
        Self {
            path: None,
            history: PathBuf::from(DEFAULT_HISTORY),
            command_delay_ms: 1000,
            poll: PollConfig::default(),
            cluster: ClusterConfig::default(),
            dashboard: DashboardConfig::default(),
            resource_dir: None,
        }
    }
}

impl KubemanConfig {
    /// `$KUBEMAN_CONFIG`, then `~/.kubeman/config.yaml`, then defaults
    pub fn load() -> Result<Self, KubemanError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            debug!(%path, "config from env");
            return Self::from_file(path);
        }
        match Self::home_file() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn home_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".kubeman"))
    }

    fn home_file() -> Option<PathBuf> {
        Self::home_dir().map(|dir| dir.join("config.yaml"))
    }

    pub fn from_file<T: AsRef<Path>>(path: T) -> Result<Self, KubemanError> {
        let file = File::open(path.as_ref())?;
        let mut config: Self = serde_yaml::from_reader(file)?;
        config.path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    pub fn to_file<T: AsRef<Path>>(&self, path: T) -> Result<(), KubemanError> {
        let file = File::create(path)?;
        Ok(serde_yaml::to_writer(file, self)?)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.resource_dir
            .clone()
            .or_else(Self::home_dir)
            .unwrap_or_else(|| PathBuf::from(".kubeman"))
    }
}
