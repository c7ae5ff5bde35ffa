//! Model construction for one farmer-year: the [`ChoiceSolver`] the policy
//! runs its solves through.

use tracing::debug;

use gw_behavior::{
    BehaviorResult, ChoiceSolver, FieldDecision, PinSet, PrecipitationBasis, SolveRequest,
};
use gw_core::{AgentId, MetricWeights, ModelConfig, Year};
use gw_model::{
    FieldSpec, ModelBuilder, ModelError, ModelResult, ModelSetup, OptimizationInstance,
    Precipitation, Solution, SolverEnv, WaterRightSpec, WellSpec,
};

use crate::FarmerProfile;

/// Borrowed inputs shared by every solve an agent runs in one year.
pub(crate) struct ModelRunner<'a> {
    pub agent:        AgentId,
    pub year:         Year,
    pub profile:      &'a FarmerProfile,
    pub config:       &'a ModelConfig,
    pub env:          &'a SolverEnv,
    pub alphas:       MetricWeights,
    /// Per field.
    pub observed:     &'a [Precipitation],
    /// Per field.
    pub perceived:    &'a [Precipitation],
    /// Per well, with this year's lift and projected drawdown.
    pub wells:        Vec<WellSpec>,
    pub water_rights: &'a [WaterRightSpec],
    pub solves:       usize,
}

impl ModelRunner<'_> {
    fn build(&self, request: &SolveRequest<'_>) -> ModelResult<OptimizationInstance> {
        let p = self.profile;
        if request.choices.len() != p.fields.len() {
            return Err(ModelError::InvalidInput(format!(
                "{} field choices for {} fields",
                request.choices.len(),
                p.fields.len()
            )));
        }

        let setup = ModelSetup {
            name:         format!("farmer{}-{}-{}", self.agent.0, self.year, self.solves),
            horizon:      p.decision.horizon,
            eval_metric:  p.decision.eval_metric,
            crop_options: p.crop_options.clone(),
            tech_options: p.tech_options.clone(),
        };
        let mut b = ModelBuilder::initialize(self.env, setup, self.config)?;

        let precipitation = match request.precipitation {
            PrecipitationBasis::Observed  => self.observed,
            PrecipitationBasis::Perceived => self.perceived,
        };
        for ((field, choice), prec) in p.fields.iter().zip(request.choices).zip(precipitation) {
            let spec = FieldSpec::new(field.id.clone(), prec.clone())
                .rain_fed_allowed(field.rain_fed_allowed);
            b = b.add_field(pin(spec, choice, request.pins))?;
        }
        for well in &self.wells {
            b = b.add_well(well.clone())?;
        }
        for wr in self.water_rights {
            b = b.add_water_right(wr.clone())?;
        }
        b.add_finance()?.set_objective(p.decision.eval_metric, Some(&self.alphas))?.finish()
    }
}

fn pin(spec: FieldSpec, choice: &FieldDecision, pins: PinSet) -> FieldSpec {
    match pins {
        PinSet::All => spec
            .fix_crop(choice.crops.clone())
            .fix_rainfed(choice.rainfed.clone())
            .fix_tech(choice.tech.clone()),
        PinSet::CropAndTech => spec.fix_crop(choice.crops.clone()).fix_tech(choice.tech.clone()),
        PinSet::None => spec,
    }
}

impl ChoiceSolver for ModelRunner<'_> {
    fn solve(&mut self, request: &SolveRequest<'_>) -> BehaviorResult<Solution> {
        self.solves += 1;
        let instance = self.build(request)?;
        let outcome = self.env.solve_with(&instance, &self.profile.decision.solver)?;
        match outcome.into_solution() {
            Err(ModelError::Infeasible { conflict: None }) if self.profile.decision.diagnose_infeasible => {
                let conflict = self.env.conflict(&instance)?;
                debug!(agent = %self.agent, source = ?request.source, %conflict, "infeasible solve");
                Err(ModelError::Infeasible { conflict: Some(conflict) }.into())
            }
            result => Ok(result?),
        }
    }
}
