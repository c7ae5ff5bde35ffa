//! Unit tests for gw-behavior.

#[cfg(test)]
mod fixture {
    use std::collections::HashMap;

    use gw_core::{AgentId, MetricTable};
    use gw_model::{AggregateSolution, Grid, ModelError, Solution, SolveStatus};

    use crate::{BehaviorResult, ChoiceSolver, FieldDecision, PinSet, PrecipitationBasis, SolveRequest};

    pub fn decision(crop: &str) -> FieldDecision {
        FieldDecision { crops: vec![crop.into()], rainfed: vec![false], tech: "LEPA".into() }
    }

    pub fn solution(objective: f64) -> Solution {
        Solution {
            name:         "test".into(),
            status:       SolveStatus::Optimal,
            objective,
            gap:          Some(0.0),
            horizon:      1,
            crop_options: vec!["corn".into()],
            tech_options: vec!["LEPA".into()],
            fields:       vec![],
            wells:        vec![],
            allocation:   Grid::zeros([0, 0, 1]),
            totals:       AggregateSolution {
                volume:    vec![0.0],
                energy:    vec![0.0],
                revenue:   vec![0.0],
                cost:      vec![0.0],
                profit:    vec![0.0],
                yield_pct: vec![0.0],
            },
            sa:           MetricTable { profit: Some(objective), yield_pct: None },
            water_rights: vec![],
        }
    }

    /// Returns a fixed objective per source; `None` means infeasible.
    #[derive(Default)]
    pub struct Scripted {
        pub own:      Option<f64>,
        pub peers:    HashMap<AgentId, Option<f64>>,
        pub requests: Vec<(Option<AgentId>, PinSet, PrecipitationBasis, String)>,
    }

    impl ChoiceSolver for Scripted {
        fn solve(&mut self, r: &SolveRequest<'_>) -> BehaviorResult<Solution> {
            self.requests.push((r.source, r.pins, r.precipitation, r.choices[0].crops[0].clone()));
            let obj = match r.source {
                None    => self.own,
                Some(p) => self.peers.get(&p).copied().flatten(),
            };
            obj.map(solution).ok_or(ModelError::Infeasible { conflict: None }.into())
        }
    }
}

#[cfg(test)]
mod mode {
    use crate::{DecisionMode, Thresholds, transition};

    const T: Thresholds = Thresholds { satisfaction: 0.5, uncertainty: 0.2 };

    #[test]
    fn four_regions() {
        assert_eq!(transition(0.9, 0.9, T), DecisionMode::Imitation);
        assert_eq!(transition(0.1, 0.9, T), DecisionMode::SocialComparison);
        assert_eq!(transition(0.9, 0.0, T), DecisionMode::Repetition);
        assert_eq!(transition(0.1, 0.0, T), DecisionMode::Deliberation);
    }

    #[test]
    fn equality_goes_high() {
        assert_eq!(transition(0.5, 0.2, T), DecisionMode::Imitation);
        assert_eq!(transition(0.5, 0.1, T), DecisionMode::Repetition);
        assert_eq!(transition(0.4, 0.2, T), DecisionMode::SocialComparison);
    }

    #[test]
    fn legacy_names_deserialize() {
        let m: DecisionMode = parse("FixCrop");
        assert_eq!(m, DecisionMode::Fixed);
        let m: DecisionMode = parse("Social comparison");
        assert_eq!(m, DecisionMode::SocialComparison);
    }

    fn parse(name: &str) -> DecisionMode {
        use serde::Deserialize;
        use serde::de::IntoDeserializer;
        use serde::de::value::{Error, StrDeserializer};
        let de: StrDeserializer<'_, Error> = name.into_deserializer();
        DecisionMode::deserialize(de).unwrap()
    }
}

#[cfg(test)]
mod board {
    use gw_core::AgentId;

    use super::fixture::decision;
    use crate::{BehaviorError, PeerBoard, PeerRecord};

    #[test]
    fn lookup_known_and_unknown() {
        let board: PeerBoard = [(AgentId(1), PeerRecord { choices: vec![decision("corn")] })]
            .into_iter()
            .collect();
        assert_eq!(board.len(), 1);
        assert_eq!(board.lookup(AgentId(1)).unwrap().choices[0].crops[0], "corn");
        assert!(matches!(board.lookup(AgentId(9)), Err(BehaviorError::UnknownPeer(AgentId(9)))));
    }
}

#[cfg(test)]
mod policy {
    use gw_core::{AgentId, AgentRng};

    use super::fixture::{Scripted, decision};
    use crate::{
        Adopted, BehaviorError, ConsumatPolicy, DecisionContext, DecisionMode, PeerBoard,
        PeerRecord, PinSet, PrecipitationBasis, Thresholds,
    };

    const T: Thresholds = Thresholds { satisfaction: 0.5, uncertainty: 0.2 };

    fn board() -> PeerBoard {
        [
            (AgentId(1), PeerRecord { choices: vec![decision("sorghum")] }),
            (AgentId(2), PeerRecord { choices: vec![decision("soybean")] }),
        ]
        .into_iter()
        .collect()
    }

    fn ctx<'a>(own: &'a [crate::FieldDecision], network: &'a [AgentId], board: &'a PeerBoard, selected: Option<AgentId>) -> DecisionContext<'a> {
        DecisionContext { agent: AgentId(0), own, network, board, selected_peer: selected }
    }

    #[test]
    fn override_wins() {
        let p = ConsumatPolicy::new(T, Some(DecisionMode::Fixed));
        assert_eq!(p.next_mode(0.9, 0.9), DecisionMode::Fixed);
        let p = ConsumatPolicy::new(T, None);
        assert_eq!(p.next_mode(0.9, 0.9), DecisionMode::Imitation);
    }

    #[test]
    fn initialization_pins_everything_with_observed_rain() {
        let p = ConsumatPolicy::new(T, None);
        let mut s = Scripted { own: Some(0.3), ..Default::default() };
        let sol = p.initialize(&[decision("corn")], &mut s).unwrap();
        assert_eq!(sol.objective, 0.3);
        assert_eq!(s.requests[0].1, PinSet::All);
        assert_eq!(s.requests[0].2, PrecipitationBasis::Observed);
    }

    #[test]
    fn own_modes_pin_as_expected() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let mut rng = AgentRng::new(0, AgentId(0));
        for (mode, pins) in [
            (DecisionMode::Repetition, PinSet::All),
            (DecisionMode::Deliberation, PinSet::None),
            (DecisionMode::Fixed, PinSet::CropAndTech),
        ] {
            let mut s = Scripted { own: Some(0.4), ..Default::default() };
            let d = p.decide(mode, ctx(&own, &[], &b, None), &mut rng, &mut s).unwrap();
            assert_eq!(d.adopted, Adopted::Own);
            assert_eq!(d.mode, mode);
            assert_eq!(s.requests.len(), 1);
            assert_eq!(s.requests[0].1, pins);
            assert_eq!(s.requests[0].2, PrecipitationBasis::Perceived);
        }
    }

    #[test]
    fn social_comparison_adopts_better_peer() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(1)];
        let mut s = Scripted { own: Some(0.62), ..Default::default() };
        s.peers.insert(AgentId(1), Some(0.70));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::SocialComparison, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Peer(AgentId(1)));
        assert_eq!(d.solution.objective, 0.70);
        assert_eq!(d.selected_peer, Some(AgentId(1)));
        // Peer solves run with the peer's choices.
        assert_eq!(s.requests[0].3, "sorghum");
    }

    #[test]
    fn social_comparison_tie_keeps_own() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(1)];
        let mut s = Scripted { own: Some(0.65), ..Default::default() };
        s.peers.insert(AgentId(1), Some(0.65));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::SocialComparison, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Own);
        // The best peer is still remembered.
        assert_eq!(d.selected_peer, Some(AgentId(1)));
    }

    #[test]
    fn social_comparison_skips_infeasible_peers() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(1), AgentId(2)];
        let mut s = Scripted { own: Some(0.1), ..Default::default() };
        s.peers.insert(AgentId(1), None);
        s.peers.insert(AgentId(2), Some(0.2));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::SocialComparison, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Peer(AgentId(2)));
        assert_eq!(s.requests.len(), 3);
    }

    #[test]
    fn social_comparison_first_max_wins() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(2), AgentId(1)];
        let mut s = Scripted { own: Some(0.1), ..Default::default() };
        s.peers.insert(AgentId(1), Some(0.5));
        s.peers.insert(AgentId(2), Some(0.5));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::SocialComparison, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Peer(AgentId(2)));
    }

    #[test]
    fn imitation_uses_cached_peer() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(1), AgentId(2)];
        let mut s = Scripted::default();
        s.peers.insert(AgentId(2), Some(0.3));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::Imitation, ctx(&own, &network, &b, Some(AgentId(2))), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Peer(AgentId(2)));
        assert_eq!(s.requests[0].3, "soybean");
        assert_eq!(s.requests[0].1, PinSet::All);
    }

    #[test]
    fn imitation_random_pick_is_not_cached() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(1)];
        let mut s = Scripted::default();
        s.peers.insert(AgentId(1), Some(0.3));
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::Imitation, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Peer(AgentId(1)));
        assert_eq!(d.selected_peer, None);
    }

    #[test]
    fn imitation_without_peers_repeats() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = PeerBoard::new();
        let mut s = Scripted { own: Some(0.4), ..Default::default() };
        let mut rng = AgentRng::new(0, AgentId(0));
        let d = p
            .decide(DecisionMode::Imitation, ctx(&own, &[], &b, None), &mut rng, &mut s)
            .unwrap();
        assert_eq!(d.adopted, Adopted::Own);
        assert_eq!(d.mode, DecisionMode::Imitation);
        assert_eq!(s.requests[0].0, None);
    }

    #[test]
    fn unknown_peer_is_an_error() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let network = [AgentId(7)];
        let mut s = Scripted { own: Some(0.4), ..Default::default() };
        let mut rng = AgentRng::new(0, AgentId(0));
        let err = p
            .decide(DecisionMode::SocialComparison, ctx(&own, &network, &b, None), &mut rng, &mut s)
            .unwrap_err();
        assert!(matches!(err, BehaviorError::UnknownPeer(AgentId(7))));
    }

    #[test]
    fn own_infeasible_propagates_without_peers() {
        let p = ConsumatPolicy::new(T, None);
        let own = [decision("corn")];
        let b = board();
        let mut s = Scripted::default();
        let mut rng = AgentRng::new(0, AgentId(0));
        let err = p
            .decide(DecisionMode::Repetition, ctx(&own, &[], &b, None), &mut rng, &mut s)
            .unwrap_err();
        assert!(err.is_infeasible());
    }
}
