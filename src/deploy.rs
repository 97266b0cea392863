//! Logic behind the deployment layer: which branches ship, how the Cloud
//! Run deploy command is assembled, image tagging and the `.env` template.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::config::DEFAULT_HTTP_PORT;
use crate::plans::Plan;

/// Branches whose builds are deployed to Cloud Run.
pub const DEPLOY_BRANCHES: [&str; 2] = ["main", "production"];

/// Template written by `pnp-setup init-env`; also checked in as `.env.example`.
pub const ENV_TEMPLATE: &str = include_str!("../.env.example");

/// Keys every `.env` is expected to document.
pub const DOCUMENTED_KEYS: [&str; 21] = [
    "BOT_TOKEN",
    "ADMIN_IDS",
    "ADMIN_USER_ID",
    "CHANNEL_ID",
    "CHANNEL_NAME",
    "DATABASE_URL",
    "LOG_LEVEL",
    "LOG_FILE",
    "MAX_RETRIES",
    "RETRY_DELAY",
    "REQUEST_TIMEOUT",
    "ENABLE_SCHEDULER",
    "ENABLE_ADMIN_PANEL",
    "ENABLE_ANALYTICS",
    "DEBUG_MODE",
    "WEEK_PAYMENT_LINK",
    "MONTH_PAYMENT_LINK",
    "3MONTH_PAYMENT_LINK",
    "HALFYEAR_PAYMENT_LINK",
    "YEAR_PAYMENT_LINK",
    "LIFETIME_PAYMENT_LINK",
];

pub fn should_deploy(branch: &str) -> bool {
    DEPLOY_BRANCHES.contains(&branch)
}

/// Cloud Run service shape, read from Cloud Build substitutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRunDeploy {
    pub region: String,
    pub service_name: String,
    pub min_instances: u32,
    pub max_instances: u32,
    pub memory: String,
    pub cpu: String,
}

impl Default for CloudRunDeploy {
    fn default() -> Self {
        Self {
            region: "us-central1".to_string(),
            service_name: "pnp-bot".to_string(),
            min_instances: 1,
            max_instances: 3,
            memory: "512Mi".to_string(),
            cpu: "1".to_string(),
        }
    }
}

impl CloudRunDeploy {
    /// Blank or absent substitutions fall back to the defaults.
    pub fn from_substitutions(subs: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| subs.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let parse_count = |key: &str, default: u32| -> Result<u32> {
            match get(key) {
                Some(raw) => raw.parse().map_err(|_| anyhow!("Invalid {}: {}", key, raw)),
                None => Ok(default),
            }
        };

        let deploy = Self {
            region: get("_DEPLOY_REGION").map_or(defaults.region, str::to_string),
            service_name: get("_SERVICE_NAME").map_or(defaults.service_name, str::to_string),
            min_instances: parse_count("_MIN_INSTANCES", defaults.min_instances)?,
            max_instances: parse_count("_MAX_INSTANCES", defaults.max_instances)?,
            memory: get("_MEMORY").map_or(defaults.memory, str::to_string),
            cpu: get("_CPU").map_or(defaults.cpu, str::to_string),
        };
        deploy.validate()?;
        Ok(deploy)
    }

    fn validate(&self) -> Result<()> {
        if self.max_instances == 0 {
            return Err(anyhow!("_MAX_INSTANCES must be at least 1"));
        }
        if self.min_instances > self.max_instances {
            return Err(anyhow!(
                "_MIN_INSTANCES ({}) cannot exceed _MAX_INSTANCES ({})",
                self.min_instances,
                self.max_instances
            ));
        }

        let memory_amount = self
            .memory
            .strip_suffix("Mi")
            .or_else(|| self.memory.strip_suffix("Gi"));
        if !memory_amount.is_some_and(|n| n.parse::<u32>().is_ok_and(|n| n > 0)) {
            return Err(anyhow!("Invalid _MEMORY: {} (expected e.g. 512Mi or 1Gi)", self.memory));
        }

        let cpu_ok = match self.cpu.strip_suffix('m') {
            Some(milli) => milli.parse::<u32>().is_ok_and(|n| n > 0),
            None => self.cpu.parse::<f64>().is_ok_and(|n| n > 0.0),
        };
        if !cpu_ok {
            return Err(anyhow!("Invalid _CPU: {}", self.cpu));
        }

        if self.service_name.is_empty()
            || !self
                .service_name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(anyhow!("Invalid _SERVICE_NAME: {}", self.service_name));
        }

        Ok(())
    }

    /// Arguments for `gcloud`, starting at `run deploy`.
    pub fn gcloud_args(&self, image: &str) -> Vec<String> {
        let env_vars = [
            "LOG_LEVEL=INFO",
            "ENABLE_SCHEDULER=true",
            "ENABLE_ADMIN_PANEL=true",
            "ENABLE_ANALYTICS=true",
            "DATABASE_URL=sqlite:./data/pnp_bot.db",
        ];

        vec![
            "run".to_string(),
            "deploy".to_string(),
            self.service_name.clone(),
            "--image".to_string(),
            image.to_string(),
            "--region".to_string(),
            self.region.clone(),
            "--platform".to_string(),
            "managed".to_string(),
            "--port".to_string(),
            DEFAULT_HTTP_PORT.to_string(),
            "--min-instances".to_string(),
            self.min_instances.to_string(),
            "--max-instances".to_string(),
            self.max_instances.to_string(),
            "--memory".to_string(),
            self.memory.clone(),
            "--cpu".to_string(),
            self.cpu.clone(),
            "--no-cpu-throttling".to_string(),
            "--no-allow-unauthenticated".to_string(),
            "--set-secrets".to_string(),
            secret_bindings().join(","),
            "--set-env-vars".to_string(),
            env_vars.join(","),
        ]
    }
}

/// Secret Manager name holding an environment variable, e.g.
/// `BOT_TOKEN` lives in `bot-token`.
pub fn secret_name(env_var: &str) -> String {
    env_var.to_lowercase().replace('_', "-")
}

/// `VAR=secret:latest` pairs mounted into the Cloud Run service.
pub fn secret_bindings() -> Vec<String> {
    ["BOT_TOKEN", "ADMIN_IDS", "CHANNEL_ID"]
        .into_iter()
        .chain(Plan::ALL.iter().map(|plan| plan.payment_link_var()))
        .map(|var| format!("{}={}:latest", var, secret_name(var)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTags {
    pub sha: String,
    pub latest: String,
    pub branch: Option<String>,
}

impl ImageTags {
    pub fn for_build(registry: &str, project: &str, service: &str, commit_sha: &str, branch: &str) -> Self {
        let repo = format!("{}/{}/{}", registry.trim_end_matches('/'), project, service);
        Self {
            sha: format!("{repo}:{commit_sha}"),
            latest: format!("{repo}:latest"),
            branch: sanitize_tag(branch).map(|tag| format!("{repo}:{tag}")),
        }
    }

    pub fn all(&self) -> Vec<&str> {
        let mut tags = vec![self.sha.as_str(), self.latest.as_str()];
        if let Some(branch) = &self.branch {
            tags.push(branch);
        }
        tags
    }
}

/// Docker tags allow `[A-Za-z0-9_.-]`, up to 128 chars, not starting with
/// `.` or `-`. Branch names like `feature/x` become `feature-x`.
pub fn sanitize_tag(branch: &str) -> Option<String> {
    let tag: String = branch
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' { c } else { '-' })
        .collect();
    let tag: String = tag.trim_start_matches(&['.', '-'][..]).chars().take(128).collect();

    // `latest` is reserved for the rolling tag
    if tag.is_empty() || tag == "latest" {
        None
    } else {
        Some(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitEnvOutcome {
    Created,
    AlreadyExists,
}

/// Writes the `.env` template unless a file is already there.
pub fn init_env_file(path: &Path) -> io::Result<InitEnvOutcome> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(ENV_TEMPLATE.as_bytes())?;
            Ok(InitEnvOutcome::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(InitEnvOutcome::AlreadyExists),
        Err(e) => Err(e),
    }
}

/// Keys assigned in a dotenv-style text, ignoring comments and blanks.
pub fn env_keys(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('=').map(|(key, _)| key.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deploy_only_release_branches() {
        assert!(should_deploy("main"));
        assert!(should_deploy("production"));
        for branch in ["", "Main", "main ", "develop", "production-hotfix", "feature/main"] {
            assert!(!should_deploy(branch), "{branch:?}");
        }
    }

    #[test]
    fn test_env_template_documents_every_key() {
        let keys = env_keys(ENV_TEMPLATE);
        for key in DOCUMENTED_KEYS {
            assert!(keys.contains(&key), "{key} missing from .env.example");
        }
        for plan in Plan::ALL {
            assert!(keys.contains(&plan.payment_link_var()));
        }
    }

    #[test]
    fn test_sanitize_tag() {
        assert_eq!(sanitize_tag("main"), Some("main".to_string()));
        assert_eq!(sanitize_tag("Feature/New_UI"), Some("feature-new_ui".to_string()));
        assert_eq!(sanitize_tag("-.hotfix"), Some("hotfix".to_string()));
        assert_eq!(sanitize_tag("latest"), None);
        assert_eq!(sanitize_tag(""), None);
        assert_eq!(sanitize_tag(&"a".repeat(200)).map(|t| t.len()), Some(128));
    }

    #[test]
    fn test_secret_bindings() {
        let bindings = secret_bindings();
        assert_eq!(bindings[0], "BOT_TOKEN=bot-token:latest");
        assert!(bindings.contains(&"3MONTH_PAYMENT_LINK=3month-payment-link:latest".to_string()));
        assert_eq!(bindings.len(), 3 + Plan::ALL.len());
    }
}
