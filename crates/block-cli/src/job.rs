use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use block_engine::BuildOptions;
use block_export::ExportOptions;
use block_ops::ParameterOverrides;
use serde::Deserialize;

/// A build job as read from `--config`. Any subset may be given.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub overrides: ParameterOverrides,
    pub options: BuildOptions,
    pub export: ExportOptions,
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse job file {}", path.display()))
    }

    /// Command-line values win over the job file.
    pub fn apply_overrides(&mut self, flags: &ParameterOverrides) {
        let o = &mut self.overrides;
        let pairs = [
            (&mut o.neck_height, flags.neck_height),
            (&mut o.x_len_adj, flags.x_len_adj),
            (&mut o.y_len_adj, flags.y_len_adj),
            (&mut o.x_hollow_percentage, flags.x_hollow_percentage),
            (&mut o.y_hollow_percentage, flags.y_hollow_percentage),
            (&mut o.feet_cut_out_percentage, flags.feet_cut_out_percentage),
            (&mut o.fillet_amount, flags.fillet_amount),
            (&mut o.scale_by, flags.scale_by),
        ];
        for (slot, flag) in pairs {
            if flag.is_some() {
                *slot = flag;
            }
        }
    }
}
