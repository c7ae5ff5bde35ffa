//! The CONSUMAT policy: one solve pattern per mode.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gw_core::{AgentId, AgentRng};
use gw_model::Solution;

use crate::{
    BehaviorResult, ChoiceSolver, DecisionMode, FieldDecision, PeerBoard, PinSet,
    PrecipitationBasis, SolveRequest, Thresholds, transition,
};

/// Whose choices the adopted solution was built from.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Adopted {
    Own,
    Peer(AgentId),
}

/// The agent-side inputs of one decision.
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    pub agent:         AgentId,
    /// The agent's own previous choices, one per field.
    pub own:           &'a [FieldDecision],
    pub network:       &'a [AgentId],
    pub board:         &'a PeerBoard,
    /// Best peer found by the last social comparison.
    pub selected_peer: Option<AgentId>,
}

#[derive(Clone, Debug)]
pub struct Decision {
    pub mode:          DecisionMode,
    pub solution:      Solution,
    pub adopted:       Adopted,
    /// The selected-peer cache after this decision.
    pub selected_peer: Option<AgentId>,
}

#[derive(Clone, Copy, Debug)]
pub struct ConsumatPolicy {
    thresholds: Thresholds,
    fixed:      Option<DecisionMode>,
}

impl ConsumatPolicy {
    /// `fixed` forces that mode every year regardless of the transition.
    pub fn new(thresholds: Thresholds, fixed: Option<DecisionMode>) -> Self {
        Self { thresholds, fixed }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn fixed(&self) -> Option<DecisionMode> {
        self.fixed
    }

    pub fn next_mode(&self, satisfaction: f64, uncertainty: f64) -> DecisionMode {
        self.fixed.unwrap_or_else(|| transition(satisfaction, uncertainty, self.thresholds))
    }

    /// Bootstrap solve: every indicator pinned to the initial configuration,
    /// observed precipitation.
    pub fn initialize<S: ChoiceSolver>(&self, initial: &[FieldDecision], solver: &mut S) -> BehaviorResult<Solution> {
        solver.solve(&SolveRequest {
            source:        None,
            choices:       initial,
            pins:          PinSet::All,
            precipitation: PrecipitationBasis::Observed,
        })
    }

    pub fn decide<S: ChoiceSolver>(
        &self,
        mode: DecisionMode,
        ctx: DecisionContext<'_>,
        rng: &mut AgentRng,
        solver: &mut S,
    ) -> BehaviorResult<Decision> {
        match mode {
            DecisionMode::Repetition   => self.own(mode, ctx, PinSet::All, solver),
            DecisionMode::Deliberation => self.own(mode, ctx, PinSet::None, solver),
            DecisionMode::Fixed        => self.own(mode, ctx, PinSet::CropAndTech, solver),
            DecisionMode::Imitation        => self.imitate(ctx, rng, solver),
            DecisionMode::SocialComparison => self.compare(ctx, solver),
        }
    }

    fn own<S: ChoiceSolver>(
        &self,
        mode: DecisionMode,
        ctx: DecisionContext<'_>,
        pins: PinSet,
        solver: &mut S,
    ) -> BehaviorResult<Decision> {
        let solution = solver.solve(&perceived(None, ctx.own, pins))?;
        Ok(Decision { mode, solution, adopted: Adopted::Own, selected_peer: ctx.selected_peer })
    }

    fn peer_choices<'b>(&self, ctx: &DecisionContext<'b>, peer: AgentId) -> BehaviorResult<&'b [FieldDecision]> {
        let record = ctx.board.lookup(peer)?;
        if record.choices.len() != ctx.own.len() {
            return Err(crate::BehaviorError::IncompatiblePeer {
                peer,
                expected: ctx.own.len(),
                got:      record.choices.len(),
            });
        }
        Ok(&record.choices)
    }

    /// Repetition-pattern solve with the cached peer's choices, or those of
    /// a random network peer.  A random pick is not cached.
    fn imitate<S: ChoiceSolver>(
        &self,
        ctx: DecisionContext<'_>,
        rng: &mut AgentRng,
        solver: &mut S,
    ) -> BehaviorResult<Decision> {
        let peer = match ctx.selected_peer {
            Some(p) => p,
            None => match rng.choose(ctx.network) {
                Some(&p) => p,
                None => {
                    warn!(agent = %ctx.agent, "imitation without peers; repeating own choices");
                    return self.own(DecisionMode::Imitation, ctx, PinSet::All, solver);
                }
            },
        };
        let choices = self.peer_choices(&ctx, peer)?;
        debug!(agent = %ctx.agent, %peer, "imitating");
        let solution = solver.solve(&perceived(Some(peer), choices, PinSet::All))?;
        Ok(Decision {
            mode:          DecisionMode::Imitation,
            solution,
            adopted:       Adopted::Peer(peer),
            selected_peer: ctx.selected_peer,
        })
    }

    /// Solve once per peer and once with own choices; keep own unless a peer
    /// does strictly better.  The best peer becomes the selected-peer cache.
    fn compare<S: ChoiceSolver>(&self, ctx: DecisionContext<'_>, solver: &mut S) -> BehaviorResult<Decision> {
        let mut best: Option<(AgentId, Solution)> = None;
        for &peer in ctx.network {
            let choices = self.peer_choices(&ctx, peer)?;
            match solver.solve(&perceived(Some(peer), choices, PinSet::All)) {
                Ok(sol) => {
                    debug!(agent = %ctx.agent, %peer, objective = sol.objective, "peer candidate");
                    if best.as_ref().is_none_or(|(_, b)| sol.objective > b.objective) {
                        best = Some((peer, sol));
                    }
                }
                Err(e) if e.is_infeasible() => {
                    debug!(agent = %ctx.agent, %peer, "peer candidate infeasible; skipped");
                }
                Err(e) => return Err(e),
            }
        }

        let selected_peer = best.as_ref().map(|(p, _)| *p).or(ctx.selected_peer);
        let own = solver.solve(&perceived(None, ctx.own, PinSet::All));

        let (solution, adopted) = match (own, best) {
            (Ok(own), Some((peer, sol))) if sol.objective > own.objective => (sol, Adopted::Peer(peer)),
            (Ok(own), _) => (own, Adopted::Own),
            (Err(e), Some((peer, sol))) if e.is_infeasible() => {
                debug!(agent = %ctx.agent, %peer, "own choices infeasible; adopting best peer");
                (sol, Adopted::Peer(peer))
            }
            (Err(e), _) => return Err(e),
        };
        Ok(Decision { mode: DecisionMode::SocialComparison, solution, adopted, selected_peer })
    }
}

fn perceived(source: Option<AgentId>, choices: &[FieldDecision], pins: PinSet) -> SolveRequest<'_> {
    SolveRequest { source, choices, pins, precipitation: PrecipitationBasis::Perceived }
}
