//! Operator-facing reliability status per step.

use std::fmt;

use serde::Serialize;

/// Coarse operating status, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityStatus {
    /// Grid outage in effect.
    IslandMode,
    /// Import above the dependency threshold.
    GridDependent,
    /// State of charge close to the reserve floor.
    LowReserve,
    /// Generator running.
    GeneratorActive,
    Normal,
}

impl ReliabilityStatus {
    pub const ALL: [Self; 5] = [
        Self::IslandMode,
        Self::GridDependent,
        Self::LowReserve,
        Self::GeneratorActive,
        Self::Normal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::IslandMode => "Island Mode",
            Self::GridDependent => "Grid Dependent",
            Self::LowReserve => "Low Reserve",
            Self::GeneratorActive => "Generator Active",
            Self::Normal => "Normal",
        }
    }
}

impl fmt::Display for ReliabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for [`ReliabilityPolicy::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityPolicy {
    /// Grid import above which the site counts as grid dependent (W).
    pub grid_dependency_threshold_w: f64,
    /// Reserve floor (% SOC).
    pub min_soc_pct: f64,
    /// Margin above the floor that still counts as low reserve (%).
    pub reserve_margin_pct: f64,
}

impl ReliabilityPolicy {
    /// Classifies one step; the first matching condition wins.
    pub fn classify(
        &self,
        grid_power_w: f64,
        battery_soc_pct: f64,
        generator_setpoint_w: f64,
        grid_outage: bool,
    ) -> ReliabilityStatus {
        if grid_outage {
            ReliabilityStatus::IslandMode
        } else if grid_power_w > self.grid_dependency_threshold_w {
            ReliabilityStatus::GridDependent
        } else if battery_soc_pct < self.min_soc_pct + self.reserve_margin_pct {
            ReliabilityStatus::LowReserve
        } else if generator_setpoint_w > 0.0 {
            ReliabilityStatus::GeneratorActive
        } else {
            ReliabilityStatus::Normal
        }
    }
}

impl Default for ReliabilityPolicy {
    fn default() -> Self {
        Self {
            grid_dependency_threshold_w: 5000.0,
            min_soc_pct: 20.0,
            reserve_margin_pct: 5.0,
        }
    }
}
