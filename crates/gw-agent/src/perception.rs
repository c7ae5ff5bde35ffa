//! Perceived precipitation.
//!
//! A farmer plans around a quantile of each crop's precipitation
//! distribution (its perceived risk), blended with the actual forecast:
//!
//! ```text
//! perceived = risk · (1 − trust) + forecast · trust
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gw_model::Precipitation;

/// A normal distribution truncated to `[a, b]`, with the bounds given in
/// standard units (`(x − loc) / scale`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruncatedNormal {
    pub a:     f64,
    pub b:     f64,
    pub loc:   f64,
    pub scale: f64,
}

impl TruncatedNormal {
    /// Percent-point function: the value below which a fraction `q` of the
    /// distribution lies.
    pub fn ppf(&self, q: f64) -> f64 {
        let lo = std_normal_cdf(self.a);
        let hi = std_normal_cdf(self.b);
        let p = lo + q.clamp(0.0, 1.0) * (hi - lo);
        let z = std_normal_quantile(p).clamp(self.a, self.b);
        self.loc + self.scale * z
    }
}

/// Perceived risk per crop option: the `quantile` of each crop's
/// distribution, 0 for crops without one.
pub fn perceived_risks(
    distributions: &BTreeMap<String, TruncatedNormal>,
    crop_options: &[String],
    quantile: f64,
) -> BTreeMap<String, f64> {
    crop_options
        .iter()
        .map(|crop| {
            let risk = distributions.get(crop).map_or(0.0, |d| d.ppf(quantile));
            (crop.clone(), risk)
        })
        .collect()
}

/// Blend perceived risks with the year's forecast.  Crops the forecast does
/// not cover are left out, which the model builder reports.
pub fn blend(risks: &BTreeMap<String, f64>, forecast: &Precipitation, trust: f64) -> Precipitation {
    let per_crop = risks
        .iter()
        .filter_map(|(crop, &risk)| {
            forecast.for_crop(crop).map(|p| (crop.clone(), risk * (1.0 - trust) + p * trust))
        })
        .collect();
    Precipitation::PerCrop(per_crop)
}

// ── Standard normal ───────────────────────────────────────────────────────────

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Φ(x).
pub fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Complementary error function, fractional error below 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
        + t * (0.374_091_96
        + t * (0.096_784_18
        + t * (-0.186_288_06
        + t * (0.278_868_07
        + t * (-1.135_203_98
        + t * (1.488_515_87
        + t * (-0.822_152_23
        + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 { r } else { 2.0 - r }
}

/// Φ⁻¹(p): rational approximation refined by one Halley step.
pub fn std_normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1, 2.209_460_984_245_205e2, -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2, -3.066_479_806_614_716e1, 2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1, 1.615_858_368_580_409e2, -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1, -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3, -3.223_964_580_411_365e-1, -2.400_758_277_161_838,
        -2.549_732_539_343_734, 4.374_664_141_464_968, 2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3, 3.224_671_290_700_398e-1, 2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };
    let x = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    };

    let e = std_normal_cdf(x) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}
