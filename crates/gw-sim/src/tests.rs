//! Unit tests for gw-sim.

#[cfg(test)]
mod fixture {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use gw_agent::{
        AgentError, AgentResult, AgentYear, Aquifer, AquiferRegistry, DecisionParams,
        FarmerBuilder, FarmerProfile, Field, FieldInput, FieldOutcome, FieldProfile, Finance,
        Well, WellInput, WellOutcome, WellProfile, WellState,
    };
    use gw_behavior::{DecisionMode, FieldDecision};
    use gw_core::{AgentId, Metric, MetricWeights, ModelConfig, SimConfig, SolverOptions, Year};
    use gw_model::{Precipitation, SolverEnv};

    use crate::{SimObserver, YearSummary};

    const CONFIG: &str = r#"
        [field]
        field_area = 50.0
        area_split = 1

        [field.crops.corn]
        max_yield = 15.0
        max_water = 30.0
        a = -0.5
        b = 2.0
        c = 0.0

        [field.crops.sorghum]
        max_yield = 10.0
        max_water = 25.0
        a = -0.5
        b = 2.0
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
        crop_profit = { corn = 1.0, sorghum = 0.5 }

        [consumat]
        alpha = { profit = 1.0 }
        scale = { profit = 10.0, yield_pct = 1.0 }
        satisfaction_threshold = 0.5
        uncertainty_threshold = 0.2
    "#;

    pub fn sim_config(total_years: u32) -> SimConfig {
        SimConfig { start_year: Year(2010), total_years, seed: 11, num_threads: None }
    }

    pub fn decision(crop: &str, tech: &str) -> FieldDecision {
        FieldDecision { crops: vec![crop.into()], rainfed: vec![false], tech: tech.into() }
    }

    pub fn profile(id: u32, mode: DecisionMode, network: &[u32]) -> FarmerProfile {
        FarmerProfile {
            id:           AgentId(id),
            crop_options: vec!["corn".into(), "sorghum".into()],
            tech_options: vec!["center pivot".into(), "LEPA".into()],
            fields:       vec![FieldProfile {
                id:                "f1".into(),
                rain_fed_allowed:  false,
                initial:           decision("sorghum", "center pivot"),
                rain_distribution: BTreeMap::new(),
            }],
            wells:        vec![WellProfile {
                id:               "w1".into(),
                aquifer:          "aq".into(),
                radius:           0.4,
                conductivity:     50.0,
                specific_yield:   0.05,
                pump_eff:         0.77,
                well_eff:         0.5,
                pumping_capacity: None,
            }],
            water_rights: vec![],
            network:      network.iter().map(|&p| AgentId(p)).collect(),
            decision:     DecisionParams {
                horizon:             1,
                eval_metric:         Metric::Profit,
                alpha:               MetricWeights::default(),
                drawdown_window:     2,
                drawdown_weight:     1.0,
                perceived_risk:      0.5,
                forecast_trust:      1.0,
                fixed_mode:          Some(mode),
                diagnose_infeasible: false,
                solver:              SolverOptions::default(),
            },
        }
    }

    /// Fails its step in `fail_in`, if set.
    pub struct ToyField {
        pub fail_in: Option<Year>,
    }

    impl Field for ToyField {
        fn precipitation(&self, _year: Year) -> AgentResult<Precipitation> {
            Ok(Precipitation::Uniform(10.0))
        }

        fn step(&mut self, input: &FieldInput<'_>) -> AgentResult<FieldOutcome> {
            if self.fail_in == Some(input.year) {
                return Err(AgentError::collaborator("field", "sensor outage"));
            }
            let depth = input.irrigation.sum();
            Ok(FieldOutcome {
                volume:        depth * 50.0 * 0.01,
                yield_pct:     0.8,
                crop_yield:    BTreeMap::new(),
                pumping_rate:  depth * 0.01,
                pressure_head: 20.0,
            })
        }
    }

    pub struct ToyWell;

    impl Well for ToyWell {
        fn state(&self) -> WellState {
            WellState { lift: 50.0, thickness: 50.0 }
        }

        fn step(&mut self, input: &WellInput) -> AgentResult<WellOutcome> {
            Ok(WellOutcome { withdrawal: input.withdrawal, lift: 50.0, energy: input.withdrawal * 1e-3 })
        }
    }

    pub struct FlatFinance(pub f64);

    impl Finance for FlatFinance {
        fn step(&mut self, _fields: &[FieldOutcome], _wells: &[WellOutcome]) -> AgentResult<f64> {
            Ok(self.0)
        }
    }

    /// Records every withdrawal it is stepped with.
    pub struct History {
        pub drawdown:    Vec<f64>,
        pub withdrawals: Vec<f64>,
    }

    impl Aquifer for History {
        fn drawdown_history(&self) -> &[f64] {
            &self.drawdown
        }

        fn step(&mut self, withdrawal: f64) -> AgentResult<f64> {
            let d = -1e-3 * withdrawal;
            self.drawdown.push(d);
            self.withdrawals.push(withdrawal);
            Ok(d)
        }
    }

    pub fn aquifers() -> AquiferRegistry {
        let mut r = AquiferRegistry::new();
        r.insert("aq", History { drawdown: vec![-0.2], withdrawals: vec![] });
        r
    }

    pub fn farmer(p: FarmerProfile, fail_in: Option<Year>) -> FarmerBuilder {
        let config = Arc::new(ModelConfig::from_toml_str(CONFIG).unwrap());
        let env = Arc::new(SolverEnv::with_search(SolverOptions::default()));
        FarmerBuilder::new(p, config, env)
            .field(ToyField { fail_in })
            .well(ToyWell)
            .finance(FlatFinance(5.0))
    }

    /// Collects everything the simulation reports.
    #[derive(Default)]
    pub struct Recorder {
        pub started:   Vec<Year>,
        pub records:   Vec<AgentYear>,
        pub failures:  Vec<(AgentId, Year)>,
        pub summaries: Vec<YearSummary>,
        pub ended:     Option<Year>,
    }

    impl SimObserver for Recorder {
        fn on_year_start(&mut self, year: Year) {
            self.started.push(year);
        }

        fn on_agent_year(&mut self, record: &AgentYear) {
            self.records.push(record.clone());
        }

        fn on_agent_failed(&mut self, agent: AgentId, year: Year, _error: &AgentError) {
            self.failures.push((agent, year));
        }

        fn on_year_end(&mut self, summary: &YearSummary) {
            self.summaries.push(summary.clone());
        }

        fn on_sim_end(&mut self, final_year: Year) {
            self.ended = Some(final_year);
        }
    }
}

#[cfg(test)]
mod builder {
    use gw_behavior::DecisionMode;
    use gw_core::{AgentId, Year};

    use super::fixture::{aquifers, farmer, profile, sim_config};
    use crate::{SimBuilder, SimError};

    #[test]
    fn ids_must_be_dense_and_ordered() {
        let err = SimBuilder::new(sim_config(2), aquifers())
            .farmer(farmer(profile(1, DecisionMode::Repetition, &[]), None))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::AgentOrder { position: 0, got: AgentId(1) }));
    }

    #[test]
    fn network_must_name_known_farmers() {
        let err = SimBuilder::new(sim_config(2), aquifers())
            .farmer(farmer(profile(0, DecisionMode::Imitation, &[4]), None))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::UnknownPeer { agent: AgentId(0), peer: AgentId(4) }));
    }

    #[test]
    fn zero_years_rejected() {
        let err = SimBuilder::new(sim_config(0), aquifers()).build().err().unwrap();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn bootstrap_failure_names_the_farmer() {
        let err = SimBuilder::new(sim_config(2), aquifers())
            .farmer(farmer(profile(0, DecisionMode::Repetition, &[]), Some(Year(2010))))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::Bootstrap { agent: AgentId(0), .. }));
    }
}

#[cfg(test)]
mod run {
    use gw_behavior::{Adopted, DecisionMode};
    use gw_core::{AgentId, Year};

    use super::fixture::{aquifers, decision, farmer, profile, sim_config, History, Recorder};
    use crate::{NoopObserver, Sim, SimBuilder};

    fn two_farmers(total_years: u32) -> Sim {
        SimBuilder::new(sim_config(total_years), aquifers())
            .farmer(farmer(profile(0, DecisionMode::Imitation, &[1]), None))
            .farmer(farmer(profile(1, DecisionMode::Deliberation, &[]), None))
            .build()
            .unwrap()
    }

    #[test]
    fn reports_bootstrap_then_each_year() {
        let mut sim = two_farmers(3);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.started, vec![Year(2010), Year(2011), Year(2012), Year(2013)]);
        assert_eq!(rec.records.len(), 8);
        assert_eq!(rec.summaries.len(), 4);
        assert!(rec.summaries[0].modes.is_empty());
        assert_eq!(rec.ended, Some(Year(2014)));
        assert_eq!(sim.clock.current_year, Year(2014));

        let agents: Vec<AgentId> = rec.records[2..4].iter().map(|r| r.agent).collect();
        assert_eq!(agents, vec![AgentId(0), AgentId(1)]);
    }

    #[test]
    fn mode_counts_follow_mode_order() {
        let mut sim = two_farmers(1);
        let summary = sim.step_year(&mut NoopObserver).unwrap();
        let counts: Vec<usize> = summary.modes.iter().map(|&(_, n)| n).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 0]);
        assert_eq!(summary.modes[0].0, DecisionMode::Imitation);
    }

    #[test]
    fn aquifers_step_once_per_simulated_year() {
        let mut sim = two_farmers(2);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let history = sim.aquifers().get("aq").unwrap().drawdown_history().to_vec();
        assert_eq!(history.len(), 3);

        let withdrawn: f64 = rec.records[2..4]
            .iter()
            .flat_map(|r| &r.realized.wells)
            .map(|w| w.withdrawal)
            .sum();
        assert!((history[1] - (-1e-3 * withdrawn)).abs() < 1e-12);
        assert!((rec.summaries[1].withdrawals["aq"] - withdrawn).abs() < 1e-12);
    }

    #[test]
    fn unused_aquifer_still_steps() {
        let mut registry = aquifers();
        registry.insert("idle", History { drawdown: vec![], withdrawals: vec![] });
        let mut sim = SimBuilder::new(sim_config(1), registry)
            .farmer(farmer(profile(0, DecisionMode::Repetition, &[]), None))
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.aquifers().get("idle").unwrap().drawdown_history(), &[0.0]);
    }

    #[test]
    fn peers_see_last_years_choices() {
        let mut sim = two_farmers(2);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let imitator: Vec<_> = rec.records.iter().filter(|r| r.agent == AgentId(0)).collect();
        assert_eq!(imitator[1].adopted, Adopted::Peer(AgentId(1)));
        assert_eq!(imitator[1].choices, vec![decision("sorghum", "center pivot")]);
        assert_eq!(imitator[2].choices, vec![decision("corn", "LEPA")]);
    }

    #[test]
    fn failed_farmer_is_isolated() {
        let mut sim = SimBuilder::new(sim_config(2), aquifers())
            .farmer(farmer(profile(0, DecisionMode::Deliberation, &[]), Some(Year(2011))))
            .farmer(farmer(profile(1, DecisionMode::Deliberation, &[]), None))
            .build()
            .unwrap();
        let before = sim.farmer(AgentId(0)).unwrap().snapshot();

        let mut rec = Recorder::default();
        let summary = sim.step_year(&mut rec).unwrap();
        assert_eq!(rec.failures, vec![(AgentId(0), Year(2011))]);
        assert_eq!((summary.completed, summary.failed), (1, 1));
        assert_eq!(sim.farmer(AgentId(0)).unwrap().snapshot(), before);

        sim.step_year(&mut rec).unwrap();
        assert_eq!(rec.failures.len(), 1);
        assert_eq!(rec.records.last().unwrap().agent, AgentId(1));
    }

    #[test]
    fn same_seed_same_history() {
        let run = || {
            let mut sim = two_farmers(3);
            let mut rec = Recorder::default();
            sim.run(&mut rec).unwrap();
            rec.records
                .iter()
                .map(|r| (r.agent, r.year, r.choices.clone(), r.objective))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn snapshots_restore_by_id() {
        let mut sim = two_farmers(2);
        let saved = sim.snapshots();
        sim.step_year(&mut NoopObserver).unwrap();
        assert_ne!(sim.snapshots(), saved);
        sim.restore(saved.clone()).unwrap();
        assert_eq!(sim.snapshots(), saved);
    }
}
