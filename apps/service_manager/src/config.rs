use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context};
use clap::ValueEnum;
use client_core::{
    BusyPolicy, FolderRemote, FolderSessionController, HttpFolderRemote, IdGenerator,
    SequentialIdGenerator, SimulatedFolderRemote, UuidIdGenerator,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "service_manager.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Simulated,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    Uuid,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BusyPolicySetting {
    Advisory,
    SingleFlight,
}

impl From<BusyPolicySetting> for BusyPolicy {
    fn from(value: BusyPolicySetting) -> Self {
        match value {
            BusyPolicySetting::Advisory => BusyPolicy::Advisory,
            BusyPolicySetting::SingleFlight => BusyPolicy::SingleFlight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: Backend,
    pub server_url: Option<String>,
    pub latency_ms: u64,
    pub simulate_failures: bool,
    pub busy_policy: BusyPolicySetting,
    pub id_strategy: IdStrategy,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Simulated,
            server_url: None,
            latency_ms: 1000,
            simulate_failures: false,
            busy_policy: BusyPolicySetting::Advisory,
            id_strategy: IdStrategy::Uuid,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    backend: Option<Backend>,
    server_url: Option<String>,
    latency_ms: Option<u64>,
    simulate_failures: Option<bool>,
    busy_policy: Option<BusyPolicySetting>,
    id_strategy: Option<IdStrategy>,
    log_filter: Option<String>,
}

/// Defaults, then the config file, then `APP__*` environment variables.
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            apply_file(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.backend {
        settings.backend = v;
    }
    if let Some(v) = file_cfg.server_url {
        settings.server_url = Some(v);
    }
    if let Some(v) = file_cfg.latency_ms {
        settings.latency_ms = v;
    }
    if let Some(v) = file_cfg.simulate_failures {
        settings.simulate_failures = v;
    }
    if let Some(v) = file_cfg.busy_policy {
        settings.busy_policy = v;
    }
    if let Some(v) = file_cfg.id_strategy {
        settings.id_strategy = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("APP__BACKEND") {
        settings.backend = parse_choice("APP__BACKEND", &v)?;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = Some(v);
    }
    if let Some(v) = lookup("APP__LATENCY_MS") {
        settings.latency_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__LATENCY_MS must be milliseconds, got '{v}'"))?;
    }
    if let Some(v) = lookup("APP__SIMULATE_FAILURES") {
        settings.simulate_failures = v
            .trim()
            .parse()
            .with_context(|| format!("APP__SIMULATE_FAILURES must be true or false, got '{v}'"))?;
    }
    if let Some(v) = lookup("APP__BUSY_POLICY") {
        settings.busy_policy = parse_choice("APP__BUSY_POLICY", &v)?;
    }
    if let Some(v) = lookup("APP__ID_STRATEGY") {
        settings.id_strategy = parse_choice("APP__ID_STRATEGY", &v)?;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    Ok(())
}

fn parse_choice<T: ValueEnum>(key: &str, value: &str) -> anyhow::Result<T> {
    T::from_str(value.trim(), true).map_err(|err| anyhow::anyhow!("{key}: {err}"))
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend == Backend::Http
            && self
                .server_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            bail!("the http backend needs a server url (server_url, APP__SERVER_URL or --server-url)");
        }
        Ok(())
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    fn id_generator(&self, prefix: &str) -> Arc<dyn IdGenerator> {
        match self.id_strategy {
            IdStrategy::Uuid => Arc::new(UuidIdGenerator),
            IdStrategy::Sequential => Arc::new(SequentialIdGenerator::new(prefix)),
        }
    }

    pub fn build_remote(&self) -> anyhow::Result<Arc<dyn FolderRemote>> {
        self.validate()?;
        match self.backend {
            Backend::Simulated => {
                let mut remote = SimulatedFolderRemote::with_id_generator(
                    self.latency(),
                    self.id_generator("folder-"),
                );
                if self.simulate_failures {
                    remote = remote.failing("simulated I/O fault");
                }
                Ok(Arc::new(remote))
            }
            Backend::Http => {
                let url = self.server_url.as_deref().unwrap_or_default();
                Ok(Arc::new(HttpFolderRemote::new(url)?))
            }
        }
    }

    pub fn build_controller(&self) -> anyhow::Result<Arc<FolderSessionController>> {
        Ok(FolderSessionController::new_with_dependencies(
            self.build_remote()?,
            self.id_generator("svc-"),
            self.busy_policy.into(),
        ))
    }
}
