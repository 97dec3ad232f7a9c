//! Command batches and manifests rendered from tera templates.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use tera::Context;
use tera::Tera;
use tracing::debug;

use crate::config::ClusterConfig;
use crate::config::DashboardConfig;
use crate::KubemanError;

const SETUP_MINIKUBE: &str = r#"
minikube delete
minikube config set memory {{ memory }}
minikube config set cpus {{ cpus }}
minikube start --driver={{ driver }}
"#;

const SETUP_K8: &str = r#"
kubectl apply -f {{ manifest }}

# create user
kubectl create -f {{ resource_dir }}/account.yaml

# create role
kubectl create -f {{ resource_dir }}/role.yaml
"#;

const START_PROXY: &str = r#"
# start dashboard
kubectl proxy --port={{ port }} &
"#;

const KILL: &str = r#"
{% if pid %}kill -9 {{ pid }}{% endif %}
minikube stop
minikube delete
"#;

const SECRET_NAME: &str = "kubectl -n {{ namespace }} get secret | grep {{ admin_user }}";

const DESCRIBE_SECRET: &str = "kubectl -n {{ namespace }} describe secret {{ name }}";

const DESCRIBE_ADMIN: &str = "kubectl -n {{ namespace }} describe secret $(kubectl -n {{ namespace }} get secret | grep {{ admin_user }} | awk '{print $1}')";

const FIND_PID: &str = "ss -lntupw | fgrep {{ port }}";

const OPEN_BROWSER: &str = "{{ browser }} {{ url }}";

const ACCOUNT: &str = include_str!("../resources/account.yaml");

const ROLE: &str = include_str!("../resources/role.yaml");

pub const ACCOUNT_FILE: &str = "account.yaml";
pub const ROLE_FILE: &str = "role.yaml";

/// RBAC manifests written out for `kubectl create -f`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifests {
    pub dir: PathBuf,
    pub account: PathBuf,
    pub role: PathBuf,
}

pub struct Scripts {
    tera: Tera,
}

impl Scripts {
    pub fn new() -> Result<Self, KubemanError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("setup_minikube.sh", SETUP_MINIKUBE),
            ("setup_k8.sh", SETUP_K8),
            ("start_proxy.sh", START_PROXY),
            ("kill.sh", KILL),
            ("secret_name.sh", SECRET_NAME),
            ("describe_secret.sh", DESCRIBE_SECRET),
            ("describe_admin.sh", DESCRIBE_ADMIN),
            ("find_pid.sh", FIND_PID),
            ("open_browser.sh", OPEN_BROWSER),
            (ACCOUNT_FILE, ACCOUNT),
            (ROLE_FILE, ROLE),
        ])?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, KubemanError> {
        let rendered = self.tera.render(name, context)?;
        debug!(name, "rendered {}", rendered.trim());
        Ok(rendered)
    }

    pub fn setup_minikube(&self, memory: u32, cpus: u32, driver: &str) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("memory", &memory);
        context.insert("cpus", &cpus);
        context.insert("driver", driver);
        self.render("setup_minikube.sh", &context)
    }

    pub fn setup_k8(&self, dashboard: &DashboardConfig, resource_dir: &Path) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("manifest", &dashboard.manifest);
        context.insert("resource_dir", &resource_dir.display().to_string());
        self.render("setup_k8.sh", &context)
    }

    pub fn start_proxy(&self, dashboard: &DashboardConfig) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("port", &dashboard.proxy_port);
        self.render("start_proxy.sh", &context)
    }

    pub fn kill(&self, pid: Option<&str>) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("pid", &pid);
        self.render("kill.sh", &context)
    }

    pub fn secret_name(&self, dashboard: &DashboardConfig) -> Result<String, KubemanError> {
        self.render("secret_name.sh", &dashboard_context(dashboard))
    }

    pub fn describe_secret(&self, dashboard: &DashboardConfig, name: &str) -> Result<String, KubemanError> {
        let mut context = dashboard_context(dashboard);
        context.insert("name", name);
        self.render("describe_secret.sh", &context)
    }

    pub fn describe_admin(&self, dashboard: &DashboardConfig) -> Result<String, KubemanError> {
        self.render("describe_admin.sh", &dashboard_context(dashboard))
    }

    pub fn find_pid(&self, port: u16) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("port", &port);
        self.render("find_pid.sh", &context)
    }

    pub fn open_browser(&self, dashboard: &DashboardConfig) -> Result<String, KubemanError> {
        let mut context = Context::new();
        context.insert("browser", &dashboard.browser);
        context.insert("url", &dashboard.url());
        self.render("open_browser.sh", &context)
    }

    /// render the service account and role manifests into `dir`
    pub fn install_manifests(&self, dashboard: &DashboardConfig, dir: &Path) -> Result<Manifests, KubemanError> {
        fs::create_dir_all(dir)?;
        let context = dashboard_context(dashboard);
        let manifests = Manifests {
            dir: dir.to_path_buf(),
            account: dir.join(ACCOUNT_FILE),
            role: dir.join(ROLE_FILE),
        };
        fs::write(&manifests.account, self.render(ACCOUNT_FILE, &context)?)?;
        fs::write(&manifests.role, self.render(ROLE_FILE, &context)?)?;
        Ok(manifests)
    }
}

fn dashboard_context(dashboard: &DashboardConfig) -> Context {
    let mut context = Context::new();
    context.insert("namespace", &dashboard.namespace);
    context.insert("admin_user", &dashboard.admin_user);
    context
}

/// the resources requested from `minikube config`, overridable per call
pub fn cluster_resources(cluster: &ClusterConfig, memory: Option<u32>, cpus: Option<u32>) -> (u32, u32) {
    (memory.unwrap_or(cluster.memory), cpus.unwrap_or(cluster.cpus))
}
