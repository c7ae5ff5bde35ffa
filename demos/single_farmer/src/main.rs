//! single_farmer: one farmer, one field, one well over a toy aquifer.
//!
//! The physical models below are deliberately crude: a linear water-response
//! field, a well whose lift follows the aquifer, and a fixed-price finance
//! model.  They exist to show how a driver plugs collaborators into
//! `FarmerBuilder` and runs the yearly loop.
//!
//! ```text
//! RUST_LOG=info cargo run -p single_farmer [-- path/to/model.toml]
//! ```

mod toy;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gw_agent::{AgentError, AgentYear, AquiferRegistry, FarmerBuilder, FarmerProfile};
use gw_core::{AgentId, ModelConfig, SimConfig, Year};
use gw_model::SolverEnv;
use gw_output::{CsvWriter, OutputWriter, SimOutputObserver};
use gw_sim::{SimBuilder, SimObserver, YearSummary};

use toy::{LinearAquifer, ToyField, ToyFinance, ToyWell};

// ── Constants ─────────────────────────────────────────────────────────────────

const START_YEAR:  i32 = 2010;
const TOTAL_YEARS: u32 = 8;
const SEED:        u64 = 42;
const OUTPUT_DIR:  &str = "output/single_farmer";

const MODEL_TOML: &str = r#"
[field]
field_area = 50.0
area_split = 1

[field.crops.corn]
max_yield = 15.0
max_water = 45.0
a = -0.5
b = 1.5
c = 0.0

[field.crops.sorghum]
max_yield = 9.0
max_water = 35.0
a = -0.5
b = 1.5
c = 0.0

[field.techs."center pivot"]
slope = 0.0047
intercept = 0.003
pressure_head = 20.0

[field.techs.LEPA]
slope = 0.0037
intercept = 0.002
pressure_head = 10.0

[finance]
energy_price = 2777.78
crop_profit = { corn = 1.2, sorghum = 0.9 }

[consumat]
alpha = { profit = 1.0, yield_pct = 1.0 }
scale = { profit = 20.0, yield_pct = 1.0 }
satisfaction_threshold = 0.6
uncertainty_threshold = 0.15
"#;

const PROFILE_JSON: &str = r#"{
    "id": 0,
    "crop_options": ["corn", "sorghum"],
    "tech_options": ["center pivot", "LEPA"],
    "fields": [{
        "id": "f1",
        "rain_fed_allowed": true,
        "initial": { "crops": ["corn"], "rainfed": [false], "tech": "center pivot" },
        "rain_distribution": {
            "corn":    { "a": -1.5, "b": 2.5, "loc": 20.0, "scale": 6.0 },
            "sorghum": { "a": -1.5, "b": 2.5, "loc": 20.0, "scale": 6.0 }
        }
    }],
    "wells": [{
        "id": "w1",
        "aquifer": "ogallala",
        "radius": 0.4,
        "conductivity": 50.0,
        "specific_yield": 0.05,
        "pump_eff": 0.77,
        "well_eff": 0.5
    }],
    "decision": {
        "horizon": 1,
        "eval_metric": "profit",
        "drawdown_window": 3,
        "perceived_risk": 0.3,
        "forecast_trust": 0.5
    }
}"#;

// Observed growing-season precipitation [cm], one per year from START_YEAR.
const RAIN: [f64; 9] = [24.0, 11.0, 8.5, 19.0, 27.0, 15.0, 9.0, 21.0, 18.0];

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model = match std::env::args().nth(1) {
        Some(path) => ModelConfig::from_path(Path::new(&path))
            .with_context(|| format!("loading model config from {path}"))?,
        None => ModelConfig::from_toml_str(MODEL_TOML)?,
    };
    let model = Arc::new(model);
    let profile: FarmerProfile = serde_json::from_str(PROFILE_JSON).context("parsing farmer profile")?;

    let config = SimConfig {
        start_year:  Year(START_YEAR),
        total_years: TOTAL_YEARS,
        seed:        SEED,
        num_threads: None,
    };

    let mut aquifers = AquiferRegistry::new();
    aquifers.insert("ogallala", LinearAquifer::new(vec![-0.3, -0.4, -0.2], 0.02));

    let env = Arc::new(SolverEnv::with_search(model.solver.clone()));
    let farmer = FarmerBuilder::new(profile, model.clone(), env.clone())
        .field(ToyField::new(Year(START_YEAR), RAIN.to_vec(), model.field.clone()))
        .well(ToyWell::new(45.0, 60.0))
        .finance(ToyFinance::new(model.finance.clone()));

    let mut sim = SimBuilder::new(config, aquifers).farmer(farmer).build()?;

    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = PrintingObserver { inner: SimOutputObserver::new(writer) };

    println!("{:<6} {:<18} {:<10} {:<14} {:>8} {:>8} {:>6}", "Year", "Mode", "Adopted", "Crop / tech", "Profit", "Volume", "Sat");
    println!("{}", "-".repeat(76));

    let t0 = Instant::now();
    sim.run(&mut obs)?;
    info!(elapsed_s = t0.elapsed().as_secs_f64(), output = OUTPUT_DIR, "simulation complete");

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }

    let drawdown = sim.aquifers().get("ogallala")?.drawdown_history();
    println!();
    println!("aquifer drawdown history [m]: {drawdown:.3?}");

    env.dispose();
    Ok(())
}

// ── Observer wrapper printing one line per year ──────────────────────────────

struct PrintingObserver<W: OutputWriter> {
    inner: SimOutputObserver<W>,
}

impl<W: OutputWriter> SimObserver for PrintingObserver<W> {
    fn on_agent_year(&mut self, r: &AgentYear) {
        let choice = r
            .choices
            .first()
            .map(|d| format!("{} / {}", d.crops.join("|"), d.tech))
            .unwrap_or_default();
        println!(
            "{:<6} {:<18} {:<10} {:<14} {:>8.2} {:>8.2} {:>6.2}",
            r.year.0,
            r.mode.map(|m| m.as_str()).unwrap_or("(initial)"),
            format!("{:?}", r.adopted),
            choice,
            r.realized.profit,
            r.realized.volume,
            r.satisfaction,
        );
        self.inner.on_agent_year(r);
    }

    fn on_agent_failed(&mut self, agent: AgentId, year: Year, error: &AgentError) {
        println!("{:<6} farmer {agent} skipped: {error}", year.0);
        self.inner.on_agent_failed(agent, year, error);
    }

    fn on_year_end(&mut self, summary: &YearSummary) {
        self.inner.on_year_end(summary);
    }

    fn on_sim_end(&mut self, final_year: Year) {
        self.inner.on_sim_end(final_year);
    }
}
