//! Temporal AA configuration loaded from data/config/taa.toml with env overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::gpu::BlendPolicy;
use crate::halton::DEFAULT_PERIOD;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaaCfg {
    pub history_weight: Option<f32>,
    pub clamp_gamma: Option<f32>,
    pub sample_period: Option<u32>,
    pub start_active: Option<bool>,
}

impl Default for TaaCfg {
    fn default() -> Self {
        Self {
            history_weight: Some(0.9),
            clamp_gamma: Some(1.25),
            sample_period: Some(DEFAULT_PERIOD),
            start_active: Some(true),
        }
    }
}

impl TaaCfg {
    pub fn blend_policy(&self) -> BlendPolicy {
        let d = BlendPolicy::default();
        BlendPolicy {
            history_weight: self
                .history_weight
                .unwrap_or(d.history_weight)
                .clamp(0.0, 0.99),
            clamp_gamma: self.clamp_gamma.unwrap_or(d.clamp_gamma).max(0.0),
        }
    }

    pub fn sample_period(&self) -> u32 {
        self.sample_period.unwrap_or(DEFAULT_PERIOD).max(1)
    }

    pub fn start_active(&self) -> bool {
        self.start_active.unwrap_or(true)
    }

    /// Apply `TAA_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TAA_HISTORY_WEIGHT").and_then(|v| v.parse().ok()) {
            self.history_weight = Some(v);
        }
        if let Some(v) = lookup("TAA_CLAMP_GAMMA").and_then(|v| v.parse().ok()) {
            self.clamp_gamma = Some(v);
        }
        if let Some(v) = lookup("TAA_SAMPLE_PERIOD").and_then(|v| v.parse().ok()) {
            self.sample_period = Some(v);
        }
        if let Some(v) = lookup("TAA_START_ACTIVE").and_then(|v| v.parse().ok()) {
            self.start_active = Some(v);
        }
    }
}

fn data_root() -> PathBuf {
    let here = Path::new(env!("CARGO_MANIFEST_DIR"));
    let ws = here.join("../../data");
    if ws.is_dir() { ws } else { here.join("data") }
}

pub fn parse(txt: &str) -> Result<TaaCfg> {
    toml::from_str::<TaaCfg>(txt).context("parse taa TOML")
}

/// Load `path` (defaults when missing), then apply env overrides.
pub fn load_from(path: &Path) -> Result<TaaCfg> {
    let mut cfg = if path.is_file() {
        let txt =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        parse(&txt)?
    } else {
        TaaCfg::default()
    };
    cfg.apply_env();
    Ok(cfg)
}

pub fn load_default() -> Result<TaaCfg> {
    load_from(&data_root().join("config/taa.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_missing_fields_none() {
        let cfg = parse("history_weight = 0.8\n").expect("parse");
        assert_eq!(cfg.history_weight, Some(0.8));
        assert_eq!(cfg.clamp_gamma, None);
        // Unset fields fall back to defaults when read through helpers.
        assert_eq!(cfg.sample_period(), DEFAULT_PERIOD);
        assert_eq!(cfg.blend_policy().clamp_gamma, 1.25);
    }

    #[test]
    fn history_weight_is_clamped_below_one() {
        let cfg = TaaCfg {
            history_weight: Some(1.5),
            ..TaaCfg::default()
        };
        assert_eq!(cfg.blend_policy().history_weight, 0.99);
    }

    #[test]
    fn overrides_replace_file_values_and_skip_garbage() {
        let mut cfg = parse("history_weight = 0.8\nsample_period = 8\n").expect("parse");
        cfg.apply_overrides(|key| match key {
            "TAA_HISTORY_WEIGHT" => Some("0.5".into()),
            "TAA_SAMPLE_PERIOD" => Some("not-a-number".into()),
            "TAA_START_ACTIVE" => Some("false".into()),
            _ => None,
        });
        assert_eq!(cfg.blend_policy().history_weight, 0.5);
        assert_eq!(cfg.sample_period(), 8);
        assert!(!cfg.start_active());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse("history_weight = \"lots\"").is_err());
    }
}
