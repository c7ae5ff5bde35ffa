//! Fluent builder for constructing a [`Sim`].

use gw_agent::{AquiferRegistry, FarmerBuilder};
use gw_core::{AgentId, SimConfig};
use tracing::info;

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// Farmers must be added in `AgentId` order starting at 0, so an id is also
/// the farmer's index.  [`build`](Self::build) bootstraps every farmer in the
/// start year; the bootstrap records are reported to the observer by the
/// first call to `step_year` or `run`.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, aquifers)
///     .farmer(FarmerBuilder::new(profile, model_config, env).field(f).well(w).finance(fin))
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:   SimConfig,
    aquifers: AquiferRegistry,
    farmers:  Vec<FarmerBuilder>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, aquifers: AquiferRegistry) -> Self {
        Self { config, aquifers, farmers: Vec::new() }
    }

    pub fn farmer(mut self, farmer: FarmerBuilder) -> Self {
        self.farmers.push(farmer);
        self
    }

    pub fn farmers(mut self, farmers: impl IntoIterator<Item = FarmerBuilder>) -> Self {
        self.farmers.extend(farmers);
        self
    }

    /// Check ids and networks, then bootstrap every farmer.
    pub fn build(self) -> SimResult<Sim> {
        if self.config.total_years == 0 {
            return Err(SimError::Config("total_years must be at least 1".into()));
        }
        if self.config.num_threads == Some(0) {
            return Err(SimError::Config("num_threads must be at least 1".into()));
        }

        let n = self.farmers.len();
        for (i, f) in self.farmers.iter().enumerate() {
            let id = f.profile().id;
            if id.index() != i {
                return Err(SimError::AgentOrder { position: i, got: id });
            }
            if let Some(&peer) = f.profile().network.iter().find(|p| p.index() >= n) {
                return Err(SimError::UnknownPeer { agent: id, peer });
            }
        }

        let start = self.config.start_year;
        let seed = self.config.seed;
        let mut farmers = Vec::with_capacity(n);
        let mut records = Vec::with_capacity(n);
        for (i, builder) in self.farmers.into_iter().enumerate() {
            let agent = AgentId(i as u32);
            let (farmer, record) = builder
                .seed(seed)
                .bootstrap(start, &self.aquifers)
                .map_err(|source| SimError::Bootstrap { agent, source })?;
            farmers.push(farmer);
            records.push(record);
        }
        info!(farmers = n, year = %start, "simulation bootstrapped");

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(t) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(t)
                    .build()
                    .map_err(|e| SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Sim {
            clock: self.config.make_clock(),
            config: self.config,
            farmers,
            aquifers: self.aquifers,
            pending_bootstrap: Some(records),
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}
