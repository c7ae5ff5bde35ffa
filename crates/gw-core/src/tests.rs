//! Unit tests for gw-core primitives.

#[cfg(test)]
mod ids {
    use crate::AgentId;

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Year};

    #[test]
    fn year_arithmetic() {
        assert_eq!(Year(2010).offset(3), Year(2013));
        assert_eq!(Year(2010).next(), Year(2011));
        assert_eq!(Year(2015) - Year(2010), 5);
    }

    #[test]
    fn clock_starts_after_bootstrap_year() {
        let mut clock = SimClock::new(Year(2010));
        assert_eq!(clock.current_year, Year(2011));
        assert_eq!(clock.elapsed_years(), 0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_year, Year(2013));
        assert_eq!(clock.elapsed_years(), 2);
    }

    #[test]
    fn end_year_is_exclusive() {
        let cfg = SimConfig { start_year: Year(2010), total_years: 5, seed: 1, num_threads: None };
        assert_eq!(cfg.end_year(), Year(2016));
        assert_eq!(cfg.make_clock().current_year, Year(2011));
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng};

    fn picks(rng: &mut AgentRng) -> Vec<u32> {
        let peers: Vec<u32> = (0..1000).collect();
        (0..8).map(|_| *rng.choose(&peers).unwrap()).collect()
    }

    #[test]
    fn agent_rng_is_deterministic() {
        let mut a = AgentRng::new(99, AgentId(3));
        let mut b = AgentRng::new(99, AgentId(3));
        assert_eq!(picks(&mut a), picks(&mut b));
    }

    #[test]
    fn different_agents_diverge() {
        let mut a = AgentRng::new(99, AgentId(1));
        let mut b = AgentRng::new(99, AgentId(2));
        assert_ne!(picks(&mut a), picks(&mut b));
    }

    #[test]
    fn choose_empty_is_none() {
        let mut r = AgentRng::new(0, AgentId(0));
        let empty: [u8; 0] = [];
        assert!(r.choose(&empty).is_none());
        assert_eq!(r.choose(&[5u8]), Some(&5));
    }
}

#[cfg(test)]
mod metric {
    use crate::{Metric, MetricWeights, saturating_need};

    #[test]
    fn parse_and_display() {
        assert_eq!("profit".parse::<Metric>().unwrap(), Metric::Profit);
        assert_eq!(" yield_pct ".parse::<Metric>().unwrap(), Metric::YieldPct);
        assert!("revenue".parse::<Metric>().is_err());
        assert_eq!(Metric::YieldPct.to_string(), "yield_pct");
    }

    #[test]
    fn weighted_skips_unset() {
        let w = MetricWeights { profit: Some(1.0), yield_pct: None };
        let tracked: Vec<_> = w.weighted().collect();
        assert_eq!(tracked, vec![(Metric::Profit, 1.0)]);
        assert!(!w.is_weighted(Metric::YieldPct));
    }

    #[test]
    fn merged_prefers_overrides() {
        let base = MetricWeights { profit: Some(1.0), yield_pct: Some(2.0) };
        let over = MetricWeights { profit: Some(5.0), yield_pct: None };
        let m = base.merged(&over);
        assert_eq!(m.profit, Some(5.0));
        assert_eq!(m.yield_pct, Some(2.0));
    }

    #[test]
    fn need_saturates() {
        assert_eq!(saturating_need(1.0, 0.0), 0.0);
        assert!((saturating_need(1.0, 1.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert!(saturating_need(1.0, 50.0) > 0.999_999);
        assert!(saturating_need(1.0, -1.0) < 0.0);
    }
}

#[cfg(test)]
mod config {
    use crate::{CoreError, Metric, ModelConfig, OptionValue, SolverOptions};

    const TOML: &str = r#"
        [field]
        field_area = 50.0
        area_split = 1

        [field.crops.corn]
        max_yield = 15.0
        max_water = 30.0
        a = -1.0
        b = 2.0
        c = 0.0

        [field.crops.sorghum]
        max_yield = 10.0
        max_water = 20.0
        a = -1.0
        b = 2.0
        c = 0.0

        [field.techs."center pivot"]
        slope = 0.0047
        intercept = 0.003
        pressure_head = 20.0

        [finance]
        energy_price = 2777.78
        crop_profit = { corn = 1.0, sorghum = 0.8 }

        [consumat]
        alpha = { profit = 1.0, yield_pct = 1.0 }
        scale = { profit = 100.0, yield_pct = 1.0 }
        satisfaction_threshold = 0.5
        uncertainty_threshold = 0.2

        [solver]
        MaxSweeps = 50
        Tolerance = 1e-6
    "#;

    #[test]
    fn parses_full_document() {
        let cfg = ModelConfig::from_toml_str(TOML).unwrap();
        assert_eq!(cfg.field.crops.len(), 2);
        assert_eq!(cfg.field.unit_area(), 50.0);
        assert_eq!(cfg.well.rho, 1000.0);
        assert_eq!(cfg.well.g, 9.8016);
        assert_eq!(*cfg.consumat.scale.get(Metric::Profit), 100.0);
        assert_eq!(cfg.solver.get_usize("MaxSweeps"), Some(50));
        assert_eq!(cfg.solver.get_f64("Tolerance"), Some(1e-6));
    }

    #[test]
    fn crop_response_is_quadratic() {
        let cfg = ModelConfig::from_toml_str(TOML).unwrap();
        let corn = cfg.field.crops["corn"];
        assert_eq!(corn.response(1.0), 1.0);
        assert_eq!(corn.response(0.5), 0.75);
    }

    #[test]
    fn missing_crop_profit_rejected() {
        let bad = TOML.replace("crop_profit = { corn = 1.0, sorghum = 0.8 }", "crop_profit = { corn = 1.0 }");
        let err = ModelConfig::from_toml_str(&bad).unwrap_err();
        assert!(matches!(err, CoreError::Config(ref m) if m.contains("sorghum")));
    }

    #[test]
    fn zero_area_split_rejected() {
        let bad = TOML.replace("area_split = 1", "area_split = 0");
        assert!(matches!(ModelConfig::from_toml_str(&bad), Err(CoreError::Config(_))));
    }

    #[test]
    fn weighted_metric_needs_positive_scale() {
        let bad = TOML.replace("scale = { profit = 100.0, yield_pct = 1.0 }", "scale = { profit = 100.0 }");
        assert!(matches!(ModelConfig::from_toml_str(&bad), Err(CoreError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(ModelConfig::from_toml_str("[field"), Err(CoreError::Parse(_))));
    }

    #[test]
    fn solver_options_merge() {
        let mut base = SolverOptions::default();
        base.set("MaxSweeps", OptionValue::Int(10)).set("TimeLimit", OptionValue::Float(2.0));
        let mut over = SolverOptions::default();
        over.set("MaxSweeps", OptionValue::Int(99));
        let m = base.merged(&over);
        assert_eq!(m.get_usize("MaxSweeps"), Some(99));
        assert_eq!(m.get_f64("TimeLimit"), Some(2.0));
        assert_eq!(m.get_usize("TimeLimit"), None);
    }
}
