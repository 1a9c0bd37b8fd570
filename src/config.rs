use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::reconcile::ReconcileOptions;

pub const CONFIG_ENV: &str = "TURNOS_CONFIG";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub sala_wire_name: String,
    /// Human-readable module label -> canonical module code.
    pub modules: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let modules = [
            ("HTML & CSS", "HTML-CSS"),
            ("JavaScript", "JAVASCRIPT"),
            ("React", "FRONTEND - REACT"),
            ("Node", "BACKEND - NODE JS"),
            ("Base de datos", "BACKEND - DATABASES"),
        ]
        .into_iter()
        .map(|(label, code)| (label.to_string(), code.to_string()))
        .collect();

        Self {
            sala_wire_name: ReconcileOptions::default().sala_wire_name,
            modules,
        }
    }
}

impl AppConfig {
    /// Reads the JSON config at `path`, or the built-in defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        anyhow::ensure!(
            !config.sala_wire_name.trim().is_empty(),
            "salaWireName must not be empty"
        );
        Ok(config)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            sala_wire_name: self.sala_wire_name.clone(),
        }
    }

    pub fn dictionary(&self) -> ModuleDictionary {
        ModuleDictionary::new(self.modules.clone())
    }
}

/// Maps the module labels people type to the codes the API filters on.
#[derive(Debug, Clone, Default)]
pub struct ModuleDictionary {
    labels: BTreeMap<String, String>,
}

impl ModuleDictionary {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// Canonical code for `label`. Labels and codes match case-insensitively
    /// after trimming; unknown labels come back trimmed but otherwise as given.
    pub fn normalize(&self, label: &str) -> String {
        let trimmed = label.trim();
        if let Some(code) = self.labels.get(trimmed) {
            return code.clone();
        }

        let folded = trimmed.to_lowercase();
        for (known, code) in &self.labels {
            if known.to_lowercase() == folded || code.to_lowercase() == folded {
                return code.clone();
            }
        }

        debug!(label = trimmed, "module label not in dictionary");
        trimmed.to_string()
    }

    pub fn normalize_in_place(&self, modulo: &mut Option<String>) {
        if let Some(label) = modulo.as_mut() {
            *label = self.normalize(label);
        }
    }
}
