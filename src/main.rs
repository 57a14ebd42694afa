//! Microgrid twin entry point: offline lockstep run or HTTP server.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use microgrid_twin::config::MicrogridConfig;
use microgrid_twin::sim::clock::Clock;
use microgrid_twin::sim::driver::{Controller, Observation, Setpoints, run_lockstep};
use microgrid_twin::sim::report::{RunReport, SystemHealth};
use microgrid_twin::sim::stepper::SimulationStepper;

/// Steps considered by the closing health assessment.
const HEALTH_WINDOW: usize = 10;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    days: usize,
    dt_s: f64,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("microgrid-twin - microgrid digital-twin stepping kernel");
    eprintln!();
    eprintln!("Usage: microgrid-twin [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load microgrid from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        MicrogridConfig::PRESETS.join(", ")
    );
    eprintln!("  --days <n>               Days to simulate offline (default: 1)");
    eprintln!("  --dt <seconds>           Controller cadence (default: 900)");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Serve the lockstep HTTP API instead");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the reference preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        days: 1,
        dt_s: 900.0,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                let path = args
                    .get(i)
                    .unwrap_or_else(|| fail("--config requires a path argument"));
                cli.config_path = Some(path.clone());
            }
            "--preset" => {
                i += 1;
                let name = args
                    .get(i)
                    .unwrap_or_else(|| fail("--preset requires a name argument"));
                cli.preset = Some(name.clone());
            }
            "--days" => {
                i += 1;
                let value = args
                    .get(i)
                    .unwrap_or_else(|| fail("--days requires a count argument"));
                cli.days = value.parse().unwrap_or_else(|_| {
                    fail(&format!("--days value \"{value}\" is not a valid count"))
                });
            }
            "--dt" => {
                i += 1;
                let value = args
                    .get(i)
                    .unwrap_or_else(|| fail("--dt requires a seconds argument"));
                match value.parse::<f64>() {
                    Ok(dt) if dt > 0.0 && dt.is_finite() => cli.dt_s = dt,
                    _ => fail(&format!("--dt value \"{value}\" must be a positive number")),
                }
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let value = args
                    .get(i)
                    .unwrap_or_else(|| fail("--port requires a u16 argument"));
                cli.port = value.parse().unwrap_or_else(|_| {
                    fail(&format!("--port value \"{value}\" is not a valid u16"))
                });
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.config_path.is_some() && cli.preset.is_some() {
        fail("--config and --preset are mutually exclusive; choose one source");
    }

    cli
}

/// Cheap-hours charge, expensive-hours discharge.
///
/// Stays inside a state-of-charge band so a run never faults on the
/// battery bounds.
struct TariffController {
    capacity_wh: f64,
    rate_w: f64,
    cheap_below: f64,
    dear_above: f64,
    soc_floor: f64,
    soc_ceiling: f64,
}

impl TariffController {
    fn new(capacity_wh: f64) -> Self {
        Self {
            capacity_wh,
            rate_w: capacity_wh / 4.0,
            cheap_below: 0.14,
            dear_above: 0.18,
            soc_floor: 20.0,
            soc_ceiling: 90.0,
        }
    }
}

impl Controller for TariffController {
    fn setpoints(&mut self, obs: &Observation) -> Setpoints {
        let wh_per_pct = self.capacity_wh / 100.0;
        let max_w = |pct: f64| (pct * wh_per_pct * 3600.0 / obs.dt_s).max(0.0);

        let battery_w = if obs.sample.price_per_kwh < self.cheap_below {
            self.rate_w.min(max_w(self.soc_ceiling - obs.battery_soc))
        } else if obs.sample.price_per_kwh > self.dear_above {
            -self.rate_w.min(max_w(obs.battery_soc - self.soc_floor))
        } else {
            0.0
        };

        Setpoints {
            battery_w,
            generator_w: 0.0,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then reference default
    let loaded = if let Some(ref path) = cli.config_path {
        MicrogridConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        MicrogridConfig::from_preset(name)
    } else {
        Ok(MicrogridConfig::reference())
    };
    let config = loaded.unwrap_or_else(|e| fail(&e.to_string()));

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let capacity_wh = config.battery.capacity_wh;
    let mut stepper =
        SimulationStepper::from_config(config).unwrap_or_else(|e| fail(&e.to_string()));

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(microgrid_twin::api::AppState::new(stepper));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(&format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(microgrid_twin::api::serve(state, addr)) {
            fail(&format!("server error: {e}"));
        }
        return;
    }

    let mut controller = TariffController::new(capacity_wh);
    let clock = Clock::try_days(cli.days, cli.dt_s).unwrap_or_else(|| {
        fail(&format!(
            "--days {} at --dt {} needs more than {} steps",
            cli.days,
            cli.dt_s,
            microgrid_twin::sim::clock::MAX_TICKS
        ))
    });
    let outcome = run_lockstep(&mut stepper, &mut controller, clock);

    for r in &outcome.records {
        println!(
            "t={:>8.0}s {}  co2={:.3}kg  {}",
            r.input.time_s, r.output, r.emissions_kg, r.reliability
        );
    }

    println!("\n{}", RunReport::from_records(&outcome.records));
    println!(
        "System health: {}",
        SystemHealth::assess(&outcome.records, HEALTH_WINDOW)
    );

    if let Some(e) = outcome.error {
        fail(&format!("run ended early: {e}"));
    }
}
