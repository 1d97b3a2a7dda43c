use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path, sync::Arc};

use crate::types::{Column, FeatureVector};

/// Maps one feature row to a demand estimate. Implementations are loaded once
/// and shared read-only across requests.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

const SUPPORTED_VERSION: u32 = 1;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Linear,
    Torchscript,
}

#[derive(Deserialize, Debug)]
struct MetaJson {
    format: ArtifactFormat,
    version: u32,
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

#[derive(Deserialize)]
struct LinearJson {
    intercept: f64,
    weights: Vec<f64>,
}

enum Backend {
    Linear { intercept: f64, weights: Vec<f64> },
    #[cfg(feature = "torch")]
    Torch(torch::TorchModel),
}

pub struct Model {
    backend: Backend,
    feat_list: Vec<String>, // authoritative input order
}

impl Model {
    pub fn load(model_path: &Path, meta_path: &Path) -> Result<Self> {
        // meta.json fixes the artifact format and feature ordering
        let meta_txt = fs::read_to_string(meta_path)
            .with_context(|| format!("failed to read meta at {}", meta_path.display()))?;
        let meta: MetaJson =
            serde_json::from_str(&meta_txt).with_context(|| "failed to parse model meta")?;

        if meta.version != SUPPORTED_VERSION {
            bail!(
                "unsupported artifact version {} (expected {})",
                meta.version,
                SUPPORTED_VERSION
            );
        }
        if meta.feat_list.is_empty() {
            bail!("model meta has an empty feat_list");
        }
        if let Some(in_dim) = meta.in_dim {
            if in_dim != meta.feat_list.len() {
                tracing::warn!(
                    "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                    in_dim,
                    meta.feat_list.len()
                );
            }
        }

        let backend = match meta.format {
            ArtifactFormat::Linear => {
                let txt = fs::read_to_string(model_path).with_context(|| {
                    format!("failed to read linear model {}", model_path.display())
                })?;
                let lin: LinearJson = serde_json::from_str(&txt)
                    .with_context(|| "failed to parse linear model")?;
                if lin.weights.len() != meta.feat_list.len() {
                    bail!(
                        "linear model has {} weights, feat_list has {}",
                        lin.weights.len(),
                        meta.feat_list.len()
                    );
                }
                Backend::Linear {
                    intercept: lin.intercept,
                    weights: lin.weights,
                }
            }
            #[cfg(feature = "torch")]
            ArtifactFormat::Torchscript => {
                Backend::Torch(torch::TorchModel::load(model_path, meta.feat_list.len())?)
            }
            #[cfg(not(feature = "torch"))]
            ArtifactFormat::Torchscript => {
                bail!("torchscript artifacts need the `torch` feature")
            }
        };

        Ok(Self {
            backend,
            feat_list: meta.feat_list,
        })
    }

    pub fn feat_list(&self) -> &[String] {
        &self.feat_list
    }

    fn forward(&self, x: &[f32]) -> Result<f64> {
        match &self.backend {
            Backend::Linear { intercept, weights } => Ok(weights
                .iter()
                .zip(x)
                .fold(*intercept, |acc, (w, v)| acc + w * f64::from(*v))),
            #[cfg(feature = "torch")]
            Backend::Torch(m) => m.forward(x),
        }
    }
}

impl Predictor for Model {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let x = order_from_row(&encode_row(features), &self.feat_list);
        let y = self.forward(&x)?;
        if !y.is_finite() {
            bail!("model produced a non-finite prediction ({})", y);
        }
        Ok(y)
    }
}

/// Load the predictor once at startup. Any failure leaves the service running
/// without a model; there is no retry.
pub fn load_predictor(model_path: &Path, meta_path: &Path) -> Option<Arc<dyn Predictor>> {
    for p in [model_path, meta_path] {
        match fs::metadata(p) {
            Ok(md) => tracing::info!("found {} ({} bytes)", p.display(), md.len()),
            Err(_) => {
                tracing::warn!("model artifact not found at {}", p.display());
                log_directory_listing(p);
            }
        }
    }

    match Model::load(model_path, meta_path) {
        Ok(m) => {
            tracing::info!("loaded model; feat_list[{}]", m.feat_list().len());
            tracing::debug!("feat_list: {:?}", m.feat_list());
            Some(Arc::new(m))
        }
        Err(e) => {
            tracing::error!("model unavailable: {:#}", e);
            None
        }
    }
}

fn log_directory_listing(missing: &Path) {
    let dir = match missing.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    match fs::read_dir(dir) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            tracing::warn!("files in {}: {:?}", dir.display(), names);
        }
        Err(e) => tracing::warn!("cannot list {}: {}", dir.display(), e),
    }
}

/// One-hot/numeric encoding of the row: numeric column `C` becomes feature `C`,
/// text column `C` with value `v` becomes feature `C=v` set to 1.0.
pub fn encode_row(features: &FeatureVector) -> HashMap<String, f32> {
    features
        .columns()
        .into_iter()
        .map(|(name, col)| match col {
            Column::Text(v) => (format!("{}={}", name, v), 1.0),
            Column::Int(v) => (name.to_string(), v as f32),
            Column::Float(v) => (name.to_string(), v as f32),
        })
        .collect()
}

// Features the row doesn't carry (unseen categories included) stay at zero.
pub fn order_from_row(map: &HashMap<String, f32>, feat_list: &[String]) -> Vec<f32> {
    feat_list
        .iter()
        .map(|k| map.get(k).copied().unwrap_or(0.0))
        .collect()
}

#[cfg(feature = "torch")]
mod torch {
    use anyhow::{bail, Context, Result};
    use std::path::Path;
    use tch::{kind::Kind, CModule, Device, Tensor};

    pub struct TorchModel {
        model: CModule,
        device: Device,
        in_dim: usize,
    }

    impl TorchModel {
        pub fn load(path: &Path, in_dim: usize) -> Result<Self> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(path, device)
                .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

            // Probe output shape with a dummy forward, expect a single value
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            if t.numel() != 1 {
                bail!("unexpected model output size: {:?}", t.size());
            }

            Ok(Self { model, device, in_dim })
        }

        pub fn forward(&self, x: &[f32]) -> Result<f64> {
            if x.len() != self.in_dim {
                bail!(
                    "feature length mismatch: got {}, expected {}",
                    x.len(),
                    self.in_dim
                );
            }
            let input = Tensor::from_slice(x)
                .reshape([1, self.in_dim as i64])
                .to_device(self.device);
            let t = self.model.forward_ts(&[input])?;
            Ok(t.reshape([-1]).double_value(&[0]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeOfDay;
    use std::io::Write;

    fn features() -> FeatureVector {
        FeatureVector {
            month_name: "July",
            day: 4,
            day_of_week: "Thursday",
            time_of_day: TimeOfDay::Afternoon,
            temperature: 30.0,
            weather: "Sunny".into(),
            holiday: "Regular Day".into(),
            university_event: "Regular Day".into(),
        }
    }

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        let mut f = fs::File::create(&p).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        p
    }

    #[test]
    fn encodes_one_hot_and_numeric() {
        let row = encode_row(&features());
        assert_eq!(row.get("Month=July"), Some(&1.0));
        assert_eq!(row.get("Day"), Some(&4.0));
        assert_eq!(row.get("Temperature"), Some(&30.0));
        assert_eq!(row.get("Time_of_Day=Afternoon"), Some(&1.0));
        assert_eq!(row.get("Holiday=Regular Day"), Some(&1.0));
        assert_eq!(row.len(), 8);

        let order = vec![
            "Temperature".to_string(),
            "Month=June".to_string(),
            "Month=July".to_string(),
        ];
        assert_eq!(order_from_row(&row, &order), vec![30.0, 0.0, 1.0]);
    }

    #[test]
    fn linear_model_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let meta = write(
            dir.path(),
            "meta.json",
            r#"{"format":"linear","version":1,"feat_list":["Temperature","Weather_Condition=Sunny","Day_of_Week=Sunday"]}"#,
        );
        let model = write(
            dir.path(),
            "model.json",
            r#"{"intercept":10.0,"weights":[2.0,5.5,100.0]}"#,
        );
        let m = Model::load(&model, &meta).unwrap();
        assert_eq!(m.feat_list().len(), 3);
        let y = m.predict(&features()).unwrap();
        assert!((y - 75.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model = write(dir.path(), "model.json", r#"{"intercept":0.0,"weights":[1.0]}"#);

        let v2 = write(
            dir.path(),
            "v2.json",
            r#"{"format":"linear","version":2,"feat_list":["Day"]}"#,
        );
        let err = Model::load(&model, &v2).err().unwrap();
        assert!(err.to_string().contains("unsupported artifact version"));

        let pickle = write(
            dir.path(),
            "pickle.json",
            r#"{"format":"joblib","version":1,"feat_list":["Day"]}"#,
        );
        assert!(Model::load(&model, &pickle).is_err());

        let wide = write(
            dir.path(),
            "wide.json",
            r#"{"format":"linear","version":1,"feat_list":["Day","Temperature"]}"#,
        );
        assert!(Model::load(&model, &wide).is_err());

        let missing = dir.path().join("nope.json");
        assert!(Model::load(&model, &missing).is_err());
    }
}
