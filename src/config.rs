use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
    pub predictions_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            model_path: PathBuf::from("model/demand_model.json"),
            meta_path: PathBuf::from("model/demand_meta.json"),
            predictions_path: PathBuf::from("predictions.csv"),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// Defaults, then the config file if one is found, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match resolve_config_path() {
            Some(p) => {
                tracing::info!("loading config from {}", p.display());
                Self::load(&p)?
            }
            None => Self::default(),
        };
        cfg.apply_overrides(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {}", addr))?;
        }
        if let Some(port) = var("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
            self.bind_addr.set_port(port);
        }
        if let Some(p) = var("MODEL_PATH") {
            self.model_path = PathBuf::from(p);
        }
        if let Some(p) = var("META_PATH") {
            self.meta_path = PathBuf::from(p);
        }
        if let Some(p) = var("PREDICTIONS_CSV") {
            self.predictions_path = PathBuf::from(p);
        }
        Ok(())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DEMAND_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let candidates = [
        PathBuf::from("config/service.json"),
        PathBuf::from("./config/service.json"),
        {
            let mut p = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.push("config/service.json");
            p
        },
    ];
    candidates.into_iter().find(|c| c.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("service.json");
        fs::write(&p, r#"{"predictions_path": "/var/lib/demand/predictions.csv"}"#).unwrap();
        let cfg = ServiceConfig::load(&p).unwrap();
        assert_eq!(cfg.predictions_path, PathBuf::from("/var/lib/demand/predictions.csv"));
        assert_eq!(cfg.bind_addr, ServiceConfig::default().bind_addr);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("service.json");
        fs::write(&p, "{ not json").unwrap();
        assert!(ServiceConfig::load(&p).is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("PORT", "9000"),
            ("MODEL_PATH", "/models/m.pt"),
        ]
        .into_iter()
        .collect();
        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(cfg.model_path, PathBuf::from("/models/m.pt"));
        assert_eq!(cfg.meta_path, ServiceConfig::default().meta_path);

        let mut cfg = ServiceConfig::default();
        assert!(cfg.apply_overrides(|k| (k == "PORT").then(|| "http".to_string())).is_err());
    }
}
