//! TOML-based microgrid configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::InitializationError;
use crate::profile::exogenous::{reference_load, reference_price, reference_solar};
use crate::profile::{ExogenousSignals, ExtrapolationPolicy, TimeTable};
use crate::sim::cost::{CostModel, DEFAULT_EXPORT_RATE};
use crate::sim::emissions::EmissionsModel;
use crate::sim::reliability::ReliabilityPolicy;

/// Top-level configuration parsed from TOML.
///
/// Every field has a default matching the reference microgrid. Load from
/// TOML with [`MicrogridConfig::from_toml_file`] or use
/// [`MicrogridConfig::reference`] for the built-in default. Configuration is
/// fixed for a run; build a new stepper to change it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicrogridConfig {
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Generator parameters.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Grid tariff and carbon parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Exogenous profile overrides and extrapolation.
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// Reliability status thresholds.
    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

/// Battery storage parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable capacity (Wh).
    pub capacity_wh: f64,
    /// Stored energy at construction and after reset (Wh).
    pub initial_energy_wh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 10_000.0,
            initial_energy_wh: 5_000.0,
        }
    }
}

/// Generator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Fuel-to-electric efficiency (0..1].
    pub efficiency: f64,
    /// Fuel cost ($/kWh).
    pub fuel_cost_per_kwh: f64,
    /// Carbon intensity (kg CO2 / kWh).
    pub carbon_intensity_kg_per_kwh: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            efficiency: 0.35,
            fuel_cost_per_kwh: 0.25,
            carbon_intensity_kg_per_kwh: 0.8,
        }
    }
}

/// Grid tariff and carbon parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Rate applied to exported power.
    pub export_rate: f64,
    /// Carbon intensity of imported power (kg CO2 / kWh).
    pub carbon_intensity_kg_per_kwh: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            export_rate: DEFAULT_EXPORT_RATE,
            carbon_intensity_kg_per_kwh: 0.5,
        }
    }
}

/// Profile overrides. Unset tables fall back to the reference data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    /// Behavior outside the table domain: `"clamp"` or `"periodic"`.
    pub extrapolation: ExtrapolationPolicy,
    /// Solar generation (W) over hours.
    pub solar: Option<TableConfig>,
    /// Household load (W) over hours.
    pub load: Option<TableConfig>,
    /// Import price ($/kWh) over hours.
    pub price: Option<TableConfig>,
}

/// One breakpoint table, inline or from a `hours,value` CSV file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Breakpoint times (h).
    pub hours: Vec<f64>,
    /// Breakpoint values.
    pub values: Vec<f64>,
    /// CSV file; takes priority over the inline arrays.
    pub csv: Option<PathBuf>,
}

impl TableConfig {
    fn build(&self) -> Result<TimeTable, InitializationError> {
        match &self.csv {
            Some(path) => TimeTable::from_csv_path(path),
            None => TimeTable::new(self.hours.clone(), self.values.clone()),
        }
    }
}

/// Reliability status thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReliabilityConfig {
    /// Import above which the site is grid dependent (W).
    pub grid_dependency_threshold_w: f64,
    /// Reserve floor (% SOC).
    pub min_soc_pct: f64,
    /// Margin above the floor reported as low reserve (%).
    pub reserve_margin_pct: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        let p = ReliabilityPolicy::default();
        Self {
            grid_dependency_threshold_w: p.grid_dependency_threshold_w,
            min_soc_pct: p.min_soc_pct,
            reserve_margin_pct: p.reserve_margin_pct,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_wh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl MicrogridConfig {
    /// Returns the reference microgrid: 10 kWh battery at half charge, flat
    /// extrapolation past 24 h.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Returns the multi-day preset: reference parameters with daily
    /// wrap-around of the profiles.
    pub fn multi_day() -> Self {
        Self {
            profiles: ProfilesConfig {
                extrapolation: ExtrapolationPolicy::Periodic,
                ..ProfilesConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "multi_day"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "multi_day" => Ok(Self::multi_day()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all scalar fields and returns every error found.
    ///
    /// Table breakpoints are checked when the signals are built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let bat = &self.battery;
        if !(bat.capacity_wh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_wh", "must be > 0"));
        }
        if !(bat.initial_energy_wh >= 0.0) {
            errors.push(ConfigError::new("battery.initial_energy_wh", "must be >= 0"));
        } else if bat.initial_energy_wh > bat.capacity_wh {
            errors.push(ConfigError::new(
                "battery.initial_energy_wh",
                "must be <= battery.capacity_wh",
            ));
        }

        let generator = &self.generator;
        if !(generator.efficiency > 0.0 && generator.efficiency <= 1.0) {
            errors.push(ConfigError::new("generator.efficiency", "must be in (0, 1]"));
        }
        if !(generator.fuel_cost_per_kwh.is_finite() && generator.fuel_cost_per_kwh >= 0.0) {
            errors.push(ConfigError::new("generator.fuel_cost_per_kwh", "must be >= 0"));
        }
        if !(generator.carbon_intensity_kg_per_kwh.is_finite()
            && generator.carbon_intensity_kg_per_kwh >= 0.0)
        {
            errors.push(ConfigError::new(
                "generator.carbon_intensity_kg_per_kwh",
                "must be >= 0",
            ));
        }

        if !self.grid.export_rate.is_finite() {
            errors.push(ConfigError::new("grid.export_rate", "must be finite"));
        }
        if !(self.grid.carbon_intensity_kg_per_kwh.is_finite()
            && self.grid.carbon_intensity_kg_per_kwh >= 0.0)
        {
            errors.push(ConfigError::new(
                "grid.carbon_intensity_kg_per_kwh",
                "must be >= 0",
            ));
        }

        let rel = &self.reliability;
        if rel.grid_dependency_threshold_w.is_nan() {
            errors.push(ConfigError::new(
                "reliability.grid_dependency_threshold_w",
                "must be a number",
            ));
        }
        if !(0.0..=100.0).contains(&rel.min_soc_pct) {
            errors.push(ConfigError::new(
                "reliability.min_soc_pct",
                "must be in [0, 100]",
            ));
        }
        if !(rel.reserve_margin_pct.is_finite() && rel.reserve_margin_pct >= 0.0) {
            errors.push(ConfigError::new(
                "reliability.reserve_margin_pct",
                "must be >= 0",
            ));
        }

        errors
    }

    /// Builds the exogenous signals, falling back to reference tables.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` for malformed override tables.
    pub fn build_signals(&self) -> Result<ExogenousSignals, InitializationError> {
        let p = &self.profiles;
        let solar = p.solar.as_ref().map_or_else(|| Ok(reference_solar()), TableConfig::build)?;
        let load = p.load.as_ref().map_or_else(|| Ok(reference_load()), TableConfig::build)?;
        let price = p.price.as_ref().map_or_else(|| Ok(reference_price()), TableConfig::build)?;
        Ok(ExogenousSignals::new(solar, load, price, p.extrapolation))
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(
            self.generator.fuel_cost_per_kwh,
            self.generator.efficiency,
            self.grid.export_rate,
        )
    }

    pub fn emissions_model(&self) -> EmissionsModel {
        EmissionsModel::new(
            self.grid.carbon_intensity_kg_per_kwh,
            self.generator.carbon_intensity_kg_per_kwh,
        )
    }

    pub fn reliability_policy(&self) -> ReliabilityPolicy {
        ReliabilityPolicy {
            grid_dependency_threshold_w: self.reliability.grid_dependency_threshold_w,
            min_soc_pct: self.reliability.min_soc_pct,
            reserve_margin_pct: self.reliability.reserve_margin_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_preset_valid() {
        let cfg = MicrogridConfig::reference();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "reference should be valid: {errors:?}");
    }

    #[test]
    fn reference_defaults_match_model() {
        let cfg = MicrogridConfig::reference();
        assert_eq!(cfg.battery.capacity_wh, 10_000.0);
        assert_eq!(cfg.battery.initial_energy_wh, 5_000.0);
        assert_eq!(cfg.generator.efficiency, 0.35);
        assert_eq!(cfg.generator.fuel_cost_per_kwh, 0.25);
        assert_eq!(cfg.grid.export_rate, 0.05);
        assert_eq!(cfg.profiles.extrapolation, ExtrapolationPolicy::Clamp);
    }

    #[test]
    fn from_preset_unknown() {
        let err = MicrogridConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in MicrogridConfig::PRESETS {
            let cfg = MicrogridConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn multi_day_wraps() {
        let cfg = MicrogridConfig::multi_day();
        assert_eq!(cfg.profiles.extrapolation, ExtrapolationPolicy::Periodic);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[battery]
capacity_wh = 13500.0
initial_energy_wh = 4000.0

[generator]
efficiency = 0.30
fuel_cost_per_kwh = 0.30
carbon_intensity_kg_per_kwh = 0.9

[grid]
export_rate = 0.04
carbon_intensity_kg_per_kwh = 0.4

[profiles]
extrapolation = "periodic"

[profiles.price]
hours = [0.0, 12.0, 24.0]
values = [0.10, 0.30, 0.10]

[reliability]
grid_dependency_threshold_w = 4000.0
min_soc_pct = 15.0
reserve_margin_pct = 5.0
"#;
        let cfg = MicrogridConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.battery.capacity_wh, 13_500.0);
        assert_eq!(cfg.profiles.extrapolation, ExtrapolationPolicy::Periodic);
        assert!(cfg.validate().is_empty());

        let signals = cfg.build_signals().unwrap();
        assert!((signals.price_at(6.0 * 3600.0) - 0.20).abs() < 1e-12);
        // Solar not overridden.
        assert!((signals.solar_at(34_200.0) - 2250.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_wh = 10000.0
bogus_field = true
"#;
        assert!(MicrogridConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[generator]
efficiency = 0.4
"#;
        let cfg = MicrogridConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.generator.efficiency, 0.4);
        assert_eq!(cfg.generator.fuel_cost_per_kwh, 0.25);
        assert_eq!(cfg.battery.capacity_wh, 10_000.0);
    }

    #[test]
    fn validation_catches_bad_battery() {
        let mut cfg = MicrogridConfig::reference();
        cfg.battery.capacity_wh = 0.0;
        cfg.battery.initial_energy_wh = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.capacity_wh"));
        assert!(errors.iter().any(|e| e.field == "battery.initial_energy_wh"));
    }

    #[test]
    fn validation_catches_overfull_battery() {
        let mut cfg = MicrogridConfig::reference();
        cfg.battery.initial_energy_wh = 12_000.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.message.contains("capacity")));
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = MicrogridConfig::reference();
        cfg.generator.efficiency = 0.0;
        assert!(cfg.validate().iter().any(|e| e.field == "generator.efficiency"));
        cfg.generator.efficiency = 1.5;
        assert!(cfg.validate().iter().any(|e| e.field == "generator.efficiency"));
    }

    #[test]
    fn non_monotonic_override_fails_to_build() {
        let toml = r#"
[profiles.load]
hours = [0.0, 12.0, 12.0]
values = [1.0, 2.0, 3.0]
"#;
        let cfg = MicrogridConfig::from_toml_str(toml).unwrap();
        assert!(matches!(
            cfg.build_signals(),
            Err(InitializationError::NonMonotonicBreakpoints { .. })
        ));
    }

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "microgrid-twin-{}-{name}.csv",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_table_override_parses() {
        let toml = r#"
[profiles.price]
csv = "profiles/price.csv"
"#;
        let cfg = MicrogridConfig::from_toml_str(toml).unwrap();
        let price = cfg.profiles.price.unwrap();
        assert_eq!(price.csv, Some(PathBuf::from("profiles/price.csv")));
        assert!(price.hours.is_empty());
    }

    #[test]
    fn csv_table_override_builds_signals() {
        let path = write_temp_csv("solar", "hour,watts\n0,0\n12,6000\n24,0\n");
        let mut cfg = MicrogridConfig::reference();
        cfg.profiles.solar = Some(TableConfig {
            // Ignored when a CSV file is given.
            hours: vec![0.0, 24.0],
            values: vec![1.0, 1.0],
            csv: Some(path.clone()),
        });

        let signals = cfg.build_signals().unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(signals.solar_at(12.0 * 3600.0), 6000.0);
        assert_eq!(signals.solar_at(6.0 * 3600.0), 3000.0);
        // Other tables keep the reference data.
        assert_eq!(signals.load_at(0.0), 800.0);
    }

    #[test]
    fn missing_csv_file_fails_to_build() {
        let mut cfg = MicrogridConfig::reference();
        cfg.profiles.load = Some(TableConfig {
            csv: Some(PathBuf::from("/nonexistent/microgrid-twin/load.csv")),
            ..TableConfig::default()
        });
        assert!(matches!(
            cfg.build_signals(),
            Err(InitializationError::ProfileCsv(_))
        ));
    }
}
