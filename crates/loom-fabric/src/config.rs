//! Cooking configuration.
//!
//! Selects the tether distance metric and the default solver settings
//! stamped onto each phase kind. Instances may override phase settings
//! after creation.

use serde::{Deserialize, Serialize};

use crate::fabric::PhaseConfig;

/// Distance metric used to derive tether rest lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TetherMetric {
    /// Straight-line distance to the nearest anchor of the same piece.
    #[default]
    Euclidean,
    /// Shortest path along stretch and shear edges.
    Geodesic,
}

/// Configuration for [`FabricCooker`](crate::FabricCooker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookingConfig {
    pub tether_metric: TetherMetric,
    /// Emit bending constraints across interior edges.
    pub bending: bool,
    pub stretch: PhaseConfig,
    pub shear: PhaseConfig,
    pub bend: PhaseConfig,
}

impl Default for CookingConfig {
    fn default() -> Self {
        Self {
            tether_metric: TetherMetric::Euclidean,
            bending: true,
            stretch: PhaseConfig::default(),
            shear: PhaseConfig {
                stiffness: 0.75,
                ..PhaseConfig::default()
            },
            bend: PhaseConfig {
                stiffness: 0.5,
                ..PhaseConfig::default()
            },
        }
    }
}

impl CookingConfig {
    /// Same defaults with geodesic tethers.
    pub fn geodesic() -> Self {
        Self {
            tether_metric: TetherMetric::Geodesic,
            ..Default::default()
        }
    }

    /// Loose fabric: soft bending, slack before stretch correction kicks in.
    pub fn loose() -> Self {
        Self {
            bend: PhaseConfig {
                stiffness: 0.1,
                ..PhaseConfig::default()
            },
            stretch: PhaseConfig {
                stiffness: 0.8,
                stretch_limit: 1.05,
                ..PhaseConfig::default()
            },
            ..Default::default()
        }
    }
}
