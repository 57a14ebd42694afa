//! Post-hoc run report and health assessment from step records.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::driver::StepRecord;
use super::reliability::ReliabilityStatus;

/// Mean step cost above which recent operation needs attention ($).
pub const HEALTH_COST_LIMIT: f64 = 1.0;
/// Mean step emissions above which recent operation needs attention (kg).
pub const HEALTH_EMISSIONS_LIMIT: f64 = 2.0;

/// Aggregate indicators derived from a sequence of step records.
///
/// The stepper never accumulates cost; this is where run totals come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Number of steps summarized.
    pub steps: usize,
    /// Sum of per-step cost ($).
    pub total_cost: f64,
    /// Sum of per-step emissions (kg CO2).
    pub total_emissions_kg: f64,
    /// Peak grid import (W, positive).
    pub peak_import_w: f64,
    /// Peak grid export (W, positive magnitude).
    pub peak_export_w: f64,
    /// Lowest state of charge seen (%).
    pub min_soc: f64,
    /// Highest state of charge seen (%).
    pub max_soc: f64,
    /// Steps per reliability status, in severity order.
    pub status_counts: Vec<(ReliabilityStatus, usize)>,
}

impl RunReport {
    /// Summarizes `records`.
    ///
    /// # Returns
    ///
    /// A zeroed report for an empty slice.
    pub fn from_records(records: &[StepRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut total_cost = 0.0_f64;
        let mut total_emissions = 0.0_f64;
        let mut peak_import = 0.0_f64;
        let mut peak_export = 0.0_f64;
        let mut min_soc = f64::INFINITY;
        let mut max_soc = f64::NEG_INFINITY;

        for r in records {
            total_cost += r.output.total_cost;
            total_emissions += r.emissions_kg;
            peak_import = peak_import.max(r.output.grid_power);
            peak_export = peak_export.max(-r.output.grid_power);
            min_soc = min_soc.min(r.output.battery_soc);
            max_soc = max_soc.max(r.output.battery_soc);
        }

        let counts = count_statuses(records);
        let status_counts = ReliabilityStatus::ALL
            .iter()
            .filter_map(|s| counts.get(s).map(|&n| (*s, n)))
            .collect();

        Self {
            steps: records.len(),
            total_cost,
            total_emissions_kg: total_emissions,
            peak_import_w: peak_import,
            peak_export_w: peak_export,
            min_soc,
            max_soc,
            status_counts,
        }
    }

    /// Steps that reported `status`.
    pub fn count(&self, status: ReliabilityStatus) -> usize {
        self.status_counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |&(_, n)| n)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        writeln!(f, "Steps:             {}", self.steps)?;
        writeln!(f, "Total cost:        {:.4}", self.total_cost)?;
        writeln!(f, "Total emissions:   {:.3} kg CO2", self.total_emissions_kg)?;
        writeln!(f, "Peak import:       {:.1} W", self.peak_import_w)?;
        writeln!(f, "Peak export:       {:.1} W", self.peak_export_w)?;
        writeln!(f, "SoC range:         {:.1}% .. {:.1}%", self.min_soc, self.max_soc)?;
        write!(f, "Reliability:")?;
        for (status, n) in &self.status_counts {
            write!(f, " {status}={n}")?;
        }
        Ok(())
    }
}

/// Overall verdict on recent operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemHealth {
    NoData,
    Healthy,
    NeedsAttention,
}

impl SystemHealth {
    /// Assesses the last `window` records.
    ///
    /// Needs attention when mean cost or mean emissions exceed their limits,
    /// or the most frequent status is not `Normal`. Ties between statuses go
    /// to the more severe one.
    pub fn assess(records: &[StepRecord], window: usize) -> Self {
        let recent = &records[records.len().saturating_sub(window)..];
        if recent.is_empty() {
            return Self::NoData;
        }

        let n = recent.len() as f64;
        let mean_cost = recent.iter().map(|r| r.output.total_cost).sum::<f64>() / n;
        let mean_emissions = recent.iter().map(|r| r.emissions_kg).sum::<f64>() / n;

        let counts = count_statuses(recent);
        let dominant = ReliabilityStatus::ALL
            .iter()
            .copied()
            .max_by_key(|s| {
                // Earlier in ALL ranks higher.
                let rank = ReliabilityStatus::ALL.len()
                    - ReliabilityStatus::ALL.iter().position(|x| x == s).unwrap_or(0);
                (counts.get(s).copied().unwrap_or(0), rank)
            })
            .unwrap_or(ReliabilityStatus::Normal);

        if mean_cost > HEALTH_COST_LIMIT
            || mean_emissions > HEALTH_EMISSIONS_LIMIT
            || dominant != ReliabilityStatus::Normal
        {
            Self::NeedsAttention
        } else {
            Self::Healthy
        }
    }
}

impl fmt::Display for SystemHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => f.write_str("No data available"),
            Self::Healthy => f.write_str("Healthy"),
            Self::NeedsAttention => f.write_str("Needs Attention"),
        }
    }
}

fn count_statuses(records: &[StepRecord]) -> HashMap<ReliabilityStatus, usize> {
    let mut counts = HashMap::new();
    for r in records {
        *counts.entry(r.reliability).or_insert(0) += 1;
    }
    counts
}
