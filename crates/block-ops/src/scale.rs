//! Scale tiers, block parameters and the one-time scaling step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ParameterError;

/// Type height in millimetres at scale 1.
pub const DEFAULT_OVERALL_TYPE_HEIGHT: f64 = 23.31;
pub const DEFAULT_NECK_BUFFER: f64 = 2.0;
pub const DEFAULT_HOLLOW_PERCENTAGE: f64 = 0.8;
/// Construction overlap between neck and body, before scaling.
pub const BODY_OFFSET: f64 = 1e-4;

/// Artwork size class. Larger artwork is modelled at a larger scale and
/// shrunk back on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleTier {
    /// Extent below 100.
    Unit,
    /// Extent in [100, 1000).
    Ten,
    /// Extent in [1000, 10000).
    Hundred,
    /// Extent of 10000 and above.
    Thousand,
}

/// Per-tier defaults. Tuned against real artwork.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierDefaults {
    /// Relief height, already in scaled units.
    pub neck_height: f64,
    pub feet_cut_out_percentage: f64,
    /// Fillet radius before scaling.
    pub fillet_amount: f64,
}

impl ScaleTier {
    pub const ALL: [ScaleTier; 4] = [
        ScaleTier::Unit,
        ScaleTier::Ten,
        ScaleTier::Hundred,
        ScaleTier::Thousand,
    ];

    /// Tier for an artwork's largest dimension. Tiers are half-open.
    pub fn for_extent(max_extent: f64) -> Self {
        if max_extent < 100.0 {
            ScaleTier::Unit
        } else if max_extent < 1_000.0 {
            ScaleTier::Ten
        } else if max_extent < 10_000.0 {
            ScaleTier::Hundred
        } else {
            ScaleTier::Thousand
        }
    }

    /// Tier whose scale factor is exactly `scale_by`, if any.
    pub fn from_scale_by(scale_by: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.scale_by() == scale_by)
    }

    pub fn scale_by(self) -> f64 {
        match self {
            ScaleTier::Unit => 1.0,
            ScaleTier::Ten => 10.0,
            ScaleTier::Hundred => 100.0,
            ScaleTier::Thousand => 1_000.0,
        }
    }

    pub fn defaults(self) -> TierDefaults {
        let neck_height = match self {
            ScaleTier::Unit => 2.0,
            ScaleTier::Ten => 20.0,
            ScaleTier::Hundred => 200.0,
            ScaleTier::Thousand => 2_000.0,
        };
        TierDefaults {
            neck_height,
            feet_cut_out_percentage: 0.04,
            fillet_amount: 1.2,
        }
    }
}

/// Unscaled block parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockParameters {
    /// Relief height in scaled units (not rescaled).
    pub neck_height: f64,
    /// Total height of the block, in millimetres.
    pub overall_type_height: f64,
    /// Solid material kept between the relief and the cavity.
    pub neck_buffer: f64,
    pub scale_by: f64,
    /// Body footprint multiplier on the artwork width, at least 1.
    pub x_len_adj: f64,
    /// Body footprint multiplier on the artwork height, at least 1.
    pub y_len_adj: f64,
    /// Cavity share of the body width, in (0, 1).
    pub x_hollow_percentage: f64,
    /// Cavity share of the body depth, in (0, 1).
    pub y_hollow_percentage: f64,
    /// Foot groove depth as a share of the body's y length, in [0, 1).
    pub feet_cut_out_percentage: f64,
    /// Fillet radius before scaling.
    pub fillet_amount: f64,
}

impl Default for BlockParameters {
    fn default() -> Self {
        Self::for_tier(ScaleTier::Unit)
    }
}

/// Optional per-request adjustments applied over the tier defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverrides {
    pub neck_height: Option<f64>,
    pub x_len_adj: Option<f64>,
    pub y_len_adj: Option<f64>,
    pub x_hollow_percentage: Option<f64>,
    pub y_hollow_percentage: Option<f64>,
    pub feet_cut_out_percentage: Option<f64>,
    pub fillet_amount: Option<f64>,
    pub scale_by: Option<f64>,
}

impl BlockParameters {
    /// Global defaults combined with a tier's table entry.
    pub fn for_tier(tier: ScaleTier) -> Self {
        let d = tier.defaults();
        Self {
            neck_height: d.neck_height,
            overall_type_height: DEFAULT_OVERALL_TYPE_HEIGHT,
            neck_buffer: DEFAULT_NECK_BUFFER,
            scale_by: tier.scale_by(),
            x_len_adj: 1.0,
            y_len_adj: 1.0,
            x_hollow_percentage: DEFAULT_HOLLOW_PERCENTAGE,
            y_hollow_percentage: DEFAULT_HOLLOW_PERCENTAGE,
            feet_cut_out_percentage: d.feet_cut_out_percentage,
            fillet_amount: d.fillet_amount,
        }
    }

    /// Apply the overrides that are set.
    pub fn with_overrides(mut self, overrides: &ParameterOverrides) -> Self {
        let o = overrides;
        if let Some(v) = o.neck_height {
            self.neck_height = v;
        }
        if let Some(v) = o.x_len_adj {
            self.x_len_adj = v;
        }
        if let Some(v) = o.y_len_adj {
            self.y_len_adj = v;
        }
        if let Some(v) = o.x_hollow_percentage {
            self.x_hollow_percentage = v;
        }
        if let Some(v) = o.y_hollow_percentage {
            self.y_hollow_percentage = v;
        }
        if let Some(v) = o.feet_cut_out_percentage {
            self.feet_cut_out_percentage = v;
        }
        if let Some(v) = o.fillet_amount {
            self.fillet_amount = v;
        }
        if let Some(v) = o.scale_by {
            self.scale_by = v;
        }
        self
    }

    /// Scale once and validate, producing the numbers the pipeline consumes.
    pub fn scaled(self) -> Result<ScaledParameters, ParameterError> {
        let fields = [
            ("neck_height", self.neck_height),
            ("overall_type_height", self.overall_type_height),
            ("neck_buffer", self.neck_buffer),
            ("scale_by", self.scale_by),
            ("x_len_adj", self.x_len_adj),
            ("y_len_adj", self.y_len_adj),
            ("x_hollow_percentage", self.x_hollow_percentage),
            ("y_hollow_percentage", self.y_hollow_percentage),
            ("feet_cut_out_percentage", self.feet_cut_out_percentage),
            ("fillet_amount", self.fillet_amount),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ParameterError::invalid(*name, *value, "must be finite"));
        }

        if self.scale_by <= 0.0 {
            return Err(ParameterError::invalid("scale_by", self.scale_by, "must be positive"));
        }
        if self.neck_height <= 0.0 {
            return Err(ParameterError::invalid(
                "neck_height",
                self.neck_height,
                "must be positive",
            ));
        }
        for (name, value) in [("x_len_adj", self.x_len_adj), ("y_len_adj", self.y_len_adj)] {
            if value < 1.0 {
                return Err(ParameterError::invalid(name, value, "must be at least 1"));
            }
        }
        for (name, value) in [
            ("x_hollow_percentage", self.x_hollow_percentage),
            ("y_hollow_percentage", self.y_hollow_percentage),
        ] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ParameterError::invalid(name, value, "must lie in (0, 1)"));
            }
        }
        if !(0.0..1.0).contains(&self.feet_cut_out_percentage) {
            return Err(ParameterError::invalid(
                "feet_cut_out_percentage",
                self.feet_cut_out_percentage,
                "must lie in [0, 1)",
            ));
        }
        if self.fillet_amount < 0.0 {
            return Err(ParameterError::invalid(
                "fillet_amount",
                self.fillet_amount,
                "must not be negative",
            ));
        }

        let s = self.scale_by;
        let overall_type_height = self.overall_type_height * s;
        let neck_buffer = self.neck_buffer * s;
        let body_height = overall_type_height - self.neck_height;
        if body_height <= 0.0 {
            return Err(ParameterError::invalid(
                "neck_height",
                self.neck_height,
                format!("leaves no body below a scaled type height of {overall_type_height}"),
            ));
        }
        let hollow_depth = overall_type_height - self.neck_height - neck_buffer;
        if hollow_depth <= 0.0 {
            return Err(ParameterError::invalid(
                "neck_buffer",
                self.neck_buffer,
                format!("leaves no room for a cavity in a body of height {body_height}"),
            ));
        }

        debug!(scale_by = s, body_height, hollow_depth, "scaled block parameters");
        Ok(ScaledParameters {
            overall_type_height,
            neck_buffer,
            fillet_amount: self.fillet_amount * s,
            body_offset: BODY_OFFSET * s,
            body_height,
            hollow_depth,
            source: self,
        })
    }
}

/// Tier defaults for an artwork extent, before overrides.
pub fn derive_defaults(max_extent: f64) -> BlockParameters {
    BlockParameters::for_tier(ScaleTier::for_extent(max_extent))
}

/// The tier whose defaults a build uses. An overridden scale that matches a
/// tier selects that tier; otherwise the measured extent decides.
pub fn resolve_tier(max_extent: f64, overrides: &ParameterOverrides) -> ScaleTier {
    overrides
        .scale_by
        .and_then(ScaleTier::from_scale_by)
        .unwrap_or_else(|| ScaleTier::for_extent(max_extent))
}

/// Defaults of the resolved tier with overrides applied.
pub fn resolve_parameters(max_extent: f64, overrides: &ParameterOverrides) -> BlockParameters {
    BlockParameters::for_tier(resolve_tier(max_extent, overrides)).with_overrides(overrides)
}

/// Parameters after the one-time scaling step. Only obtainable from
/// [`BlockParameters::scaled`], which consumes its input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledParameters {
    source: BlockParameters,
    overall_type_height: f64,
    neck_buffer: f64,
    fillet_amount: f64,
    body_offset: f64,
    body_height: f64,
    hollow_depth: f64,
}

impl ScaledParameters {
    /// The unscaled values this set was derived from.
    pub fn source(&self) -> &BlockParameters {
        &self.source
    }

    pub fn scale_by(&self) -> f64 {
        self.source.scale_by
    }

    pub fn neck_height(&self) -> f64 {
        self.source.neck_height
    }

    pub fn overall_type_height(&self) -> f64 {
        self.overall_type_height
    }

    pub fn neck_buffer(&self) -> f64 {
        self.neck_buffer
    }

    pub fn fillet_amount(&self) -> f64 {
        self.fillet_amount
    }

    /// Neck/body overlap, scaled.
    pub fn body_offset(&self) -> f64 {
        self.body_offset
    }

    /// Overall height minus the neck.
    pub fn body_height(&self) -> f64 {
        self.body_height
    }

    /// Overall height minus neck and buffer. The cavity takes half of it and
    /// the draft pyramid the other half.
    pub fn hollow_depth(&self) -> f64 {
        self.hollow_depth
    }

    pub fn x_len_adj(&self) -> f64 {
        self.source.x_len_adj
    }

    pub fn y_len_adj(&self) -> f64 {
        self.source.y_len_adj
    }

    pub fn x_hollow_percentage(&self) -> f64 {
        self.source.x_hollow_percentage
    }

    pub fn y_hollow_percentage(&self) -> f64 {
        self.source.y_hollow_percentage
    }

    pub fn feet_cut_out_percentage(&self) -> f64 {
        self.source.feet_cut_out_percentage
    }
}
