//! Splitting a water right into capped windows over the planning horizon.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CarryOver, TailPolicy, WaterRightSpec};

/// Years `[start, end)` of the horizon whose summed irrigation is capped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end:   usize,
    pub cap:   f64,
}

impl Window {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn contains(&self, year: usize) -> bool {
        (self.start..self.end).contains(&year)
    }
}

/// Lay out the windows of `spec` over `horizon` years.
///
/// An active carry-over opens the horizon with its remaining depth.  Full
/// windows follow while at least `time_window` years remain; a shorter tail
/// gets the cap chosen by `spec.tail`.
pub fn plan_windows(spec: &WaterRightSpec, horizon: usize) -> Vec<Window> {
    let window = spec.time_window as usize;
    let mut out = Vec::new();
    let mut start = 0;

    if let Some(CarryOver { remaining_depth, years_left }) = spec.carry_over {
        let mut len = years_left as usize;
        if len > horizon {
            warn!(id = %spec.id, years_left, horizon, "carry-over window exceeds the horizon; clamped");
            len = horizon;
        }
        if len > 0 {
            out.push(Window { start: 0, end: len, cap: remaining_depth });
            start = len;
        }
    }

    if window == 0 {
        return out;
    }
    while horizon - start >= window {
        out.push(Window { start, end: start + window, cap: spec.depth_cap });
        start += window;
    }

    let tail = horizon - start;
    if tail > 0 {
        let cap = match spec.tail {
            TailPolicy::Proportional => spec.depth_cap * tail as f64 / window as f64,
            TailPolicy::Full         => spec.depth_cap,
            TailPolicy::Explicit(v)  => v,
        };
        out.push(Window { start, end: horizon, cap });
    }
    out
}

impl WaterRightSpec {
    /// The water right as it stands after one realized year in which `used`
    /// cm were drawn against it.
    ///
    /// If the window covering that year runs on, the next year inherits what
    /// is left of it; otherwise a fresh window starts.
    pub fn advance(&self, used: f64) -> WaterRightSpec {
        let (cap, years_left) = match self.carry_over {
            Some(c) if c.years_left > 0 => (c.remaining_depth, c.years_left),
            _ => (self.depth_cap, self.time_window),
        };
        let carry_over = (years_left > 1).then(|| CarryOver {
            remaining_depth: (cap - used).max(0.0),
            years_left:      years_left - 1,
        });
        WaterRightSpec { carry_over, ..self.clone() }
    }
}
