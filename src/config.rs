use crate::cli::{CliArgs, DefaultsPolicy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const POLICY_CREATE_PATH: &str = "/multicloud/governance/policies/create";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub source: Option<String>,
    pub context: Option<String>,
    pub admin_namespace: String,
    pub config_map_name: String,
    pub secret_name: String,
    pub threshold_capacity: String,
    pub protection_label: (String, String),
    pub label_cluster: bool,
    pub show_license: bool,
    pub defaults: DefaultsPolicy,
    pub console_url: Option<String>,
    pub open_browser: bool,
    pub browser_command: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            context: None,
            admin_namespace: "default".to_string(),
            config_map_name: "aws-s3-configmap".to_string(),
            secret_name: "aws-s3-secret".to_string(),
            threshold_capacity: "100Gi".to_string(),
            protection_label: ("protected-by".to_string(), "triliovault".to_string()),
            label_cluster: true,
            show_license: false,
            defaults: DefaultsPolicy::Overwrite,
            console_url: None,
            open_browser: false,
            browser_command: "xdg-open".to_string(),
        }
    }
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = args.config.clone().or_else(discover_config_path);
        let file = match &path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings {}", path.display()))?;
                let parsed = parse_settings(&raw)
                    .with_context(|| format!("failed to parse settings {}", path.display()))?;
                Some(parsed)
            }
            None => None,
        };

        let mut settings = Self::resolve(args, file);
        settings.source = path.map(|path| path.display().to_string());
        Ok(settings)
    }

    fn resolve(args: &CliArgs, file: Option<SettingsFile>) -> Self {
        let mut settings = Self::default();

        if let Some(file) = file {
            settings.context = file.context;
            if let Some(value) = file.admin_namespace {
                settings.admin_namespace = value;
            }
            if let Some(value) = file.config_map_name {
                settings.config_map_name = value;
            }
            if let Some(value) = file.secret_name {
                settings.secret_name = value;
            }
            if let Some(value) = file.threshold_capacity {
                settings.threshold_capacity = value;
            }
            if let Some(label) = file.protection_label {
                settings.protection_label = (label.key, label.value);
            }
            if let Some(value) = file.label_cluster {
                settings.label_cluster = value;
            }
            if let Some(value) = file.show_license {
                settings.show_license = value;
            }
            if let Some(value) = file.defaults {
                settings.defaults = value;
            }
            settings.console_url = file.console_url;
            if let Some(value) = file.open_browser {
                settings.open_browser = value;
            }
            if let Some(value) = file.browser_command {
                settings.browser_command = value;
            }
        }

        if args.context.is_some() {
            settings.context = args.context.clone();
        }
        if let Some(namespace) = &args.admin_namespace {
            settings.admin_namespace = namespace.clone();
        }
        if args.skip_cluster_label {
            settings.label_cluster = false;
        }
        if args.show_license {
            settings.show_license = true;
        }
        if let Some(policy) = args.defaults {
            settings.defaults = policy;
        }
        if args.console_url.is_some() {
            settings.console_url = args.console_url.clone();
        }
        if args.open_browser {
            settings.open_browser = true;
        }

        settings
    }

    pub fn policy_page_url(&self) -> String {
        match &self.console_url {
            Some(base) => format!("{}{POLICY_CREATE_PATH}", base.trim_end_matches('/')),
            None => POLICY_CREATE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct SettingsFile {
    #[serde(default)]
    context: Option<String>,
    #[serde(default, alias = "namespace")]
    admin_namespace: Option<String>,
    #[serde(default, alias = "configmap_name")]
    config_map_name: Option<String>,
    #[serde(default)]
    secret_name: Option<String>,
    #[serde(default)]
    threshold_capacity: Option<String>,
    #[serde(default)]
    protection_label: Option<LabelSpec>,
    #[serde(default)]
    label_cluster: Option<bool>,
    #[serde(default)]
    show_license: Option<bool>,
    #[serde(default)]
    defaults: Option<DefaultsPolicy>,
    #[serde(default)]
    console_url: Option<String>,
    #[serde(default)]
    open_browser: Option<bool>,
    #[serde(default)]
    browser_command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelSpec {
    key: String,
    value: String,
}

fn parse_settings(raw: &str) -> Result<SettingsFile> {
    if raw.trim().is_empty() {
        return Ok(SettingsFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("NSBACKUP_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("nsbackup.yaml"),
        PathBuf::from("nsbackup.yml"),
        PathBuf::from(".nsbackup.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/nsbackup/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}
