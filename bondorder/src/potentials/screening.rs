use crate::Error;
use crate::math::{CutoffFunction, cosine_switch, polynomial_switch};

/// Below this value of the Baskes denominator, the third atom is considered
/// to sit on the bond
const BASKES_DEGENERATE: f64 = 1e-12;

/// Geometric measure of how much a third atom `k` sits "between" the two
/// atoms `i` and `j` of a bond. All metrics increase as `k` moves towards the
/// bond axis, so that large values mean strong screening.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type")]
pub enum ScreeningMetric {
    /// Eccentricity of the ellipse with foci `i` and `j` passing through `k`,
    /// `C = r_ij / (r_ik + r_jk)`. This goes to 1 when `k` lies on the bond,
    /// and to 0 when `k` is far away.
    Ellipse,
    /// Inverse of the MEAM ellipse parameter of Baskes,
    /// `C = (1 - (X_ik - X_jk)^2) / (2 (X_ik + X_jk) - (X_ik - X_jk)^2 - 1)`
    /// with `X = (r / r_ij)^2`. Atoms with `|X_ik - X_jk| >= 1` do not
    /// screen the bond at all, and atoms on the bond screen it entirely.
    Baskes,
}

impl Default for ScreeningMetric {
    fn default() -> ScreeningMetric {
        ScreeningMetric::Ellipse
    }
}

/// Value of the screening metric for a triangle, together with the
/// derivatives with respect to the three side lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricValue {
    /// value of the metric
    pub value: f64,
    /// derivative with respect to `r_ij`
    pub d_rij: f64,
    /// derivative with respect to `r_ik`
    pub d_rik: f64,
    /// derivative with respect to `r_jk`
    pub d_rjk: f64,
}

impl MetricValue {
    fn constant(value: f64) -> MetricValue {
        MetricValue { value, d_rij: 0.0, d_rik: 0.0, d_rjk: 0.0 }
    }
}

impl ScreeningMetric {
    /// Evaluate the metric for the triangle with side lengths `r_ij`, `r_ik`
    /// and `r_jk`
    pub fn compute(&self, r_ij: f64, r_ik: f64, r_jk: f64) -> MetricValue {
        match self {
            ScreeningMetric::Ellipse => {
                let sum = r_ik + r_jk;
                let d_sum = -r_ij / (sum * sum);
                return MetricValue {
                    value: r_ij / sum,
                    d_rij: 1.0 / sum,
                    d_rik: d_sum,
                    d_rjk: d_sum,
                };
            }
            ScreeningMetric::Baskes => {
                let x_ik = (r_ik / r_ij) * (r_ik / r_ij);
                let x_jk = (r_jk / r_ij) * (r_jk / r_ij);
                let delta = x_ik - x_jk;
                let sum = x_ik + x_jk;

                let numerator = 1.0 - delta * delta;
                if numerator <= 0.0 {
                    // k is outside of the circle of diameter ij
                    return MetricValue::constant(0.0);
                }

                let denominator = 2.0 * sum - delta * delta - 1.0;
                if denominator <= BASKES_DEGENERATE {
                    return MetricValue::constant(f64::INFINITY);
                }

                let value = numerator / denominator;

                let d_value_d_xik = (-2.0 * delta - value * (2.0 - 2.0 * delta)) / denominator;
                let d_value_d_xjk = (2.0 * delta - value * (2.0 + 2.0 * delta)) / denominator;

                let r_ij2 = r_ij * r_ij;
                return MetricValue {
                    value: value,
                    d_rij: -2.0 / r_ij * (d_value_d_xik * x_ik + d_value_d_xjk * x_jk),
                    d_rik: d_value_d_xik * 2.0 * r_ik / r_ij2,
                    d_rjk: d_value_d_xjk * 2.0 * r_jk / r_ij2,
                };
            }
        }
    }

    /// Factor to apply to a bond length to get the distance within which
    /// third atoms can contribute to the screening. Any atom outside of
    /// `factor * r_ij` from `i` has a metric below `c_min`.
    pub fn search_radius_factor(&self, c_min: f64) -> f64 {
        match self {
            // r_ik + r_jk >= r_ij / c_min and r_jk >= r_ik - r_ij, so
            // r_ik <= r_ij (1 + 1 / c_min) / 2
            ScreeningMetric::Ellipse => 0.5 * (1.0 + 1.0 / c_min),
            // for a given value of C, k lies on the ellipse with half-axis
            // max(1, sqrt(1 / C)) r_ij / 2 along the bond
            ScreeningMetric::Baskes => 0.5 * (1.0 + f64::max(1.0, f64::sqrt(1.0 / c_min))),
        }
    }
}

/// Function mapping the screening metric to a screening factor
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(tag = "type")]
pub enum ScreeningFunction {
    /// `S(x) = 1 - (10 x^3 - 15 x^4 + 6 x^5)`
    Polynomial,
    /// `S(x) = 1/2 (1 + cos(π x))`
    Cosine,
}

impl Default for ScreeningFunction {
    fn default() -> ScreeningFunction {
        ScreeningFunction::Polynomial
    }
}

fn serde_default_screened_cutoff() -> CutoffFunction {
    CutoffFunction::ShiftedCosine { width: 0.5 }
}

/// Parameters for the screening of bonds by third atoms.
///
/// With screening, the pair part of the potential extends up to
/// `outer_cutoff`, and bonds are switched off by their screening factor
/// instead of a short range cutoff. The bond order sums keep using the short
/// range cutoff of the potential.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScreeningParameters {
    /// Below this value of the metric, a third atom does not screen the bond
    pub c_min: f64,
    /// Above this value of the metric, a third atom screens the bond entirely
    pub c_max: f64,
    /// Metric used to measure how much a third atom sits between the two
    /// atoms of a bond
    #[serde(default)]
    pub metric: ScreeningMetric,
    /// Interpolation between `c_min` and `c_max`
    #[serde(default)]
    pub function: ScreeningFunction,
    /// Cutoff radius of the pair terms when screening is enabled
    pub outer_cutoff: f64,
    /// Smoothing function used for `outer_cutoff`
    #[serde(default = "serde_default_screened_cutoff")]
    pub outer_cutoff_function: CutoffFunction,
}

impl ScreeningParameters {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.c_min > 0.0) || !(self.c_max > self.c_min) {
            return Err(Error::InvalidParameter(format!(
                "screening requires 0 < c_min < c_max, got c_min={} and c_max={}",
                self.c_min, self.c_max
            )));
        }

        if self.metric == ScreeningMetric::Ellipse && self.c_max > 1.0 {
            return Err(Error::InvalidParameter(format!(
                "c_max must be at most 1 with the ellipse screening metric, got {}", self.c_max
            )));
        }

        if !(self.outer_cutoff > 0.0) || !self.outer_cutoff.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "screening outer cutoff must be positive, got {}", self.outer_cutoff
            )));
        }

        self.outer_cutoff_function.validate(self.outer_cutoff)?;
        return Ok(());
    }

    /// Maximal distance between `i` and any third atom `k` that can screen
    /// a bond of length `r_ij`
    pub fn search_radius(&self, r_ij: f64) -> f64 {
        r_ij * self.metric.search_radius_factor(self.c_min)
    }

    /// Get the screening factor of a single third atom, from the value of
    /// the metric. Returns the factor and its derivative with respect to the
    /// metric.
    pub fn factor(&self, metric: f64) -> (f64, f64) {
        if metric <= self.c_min {
            return (1.0, 0.0);
        } else if metric >= self.c_max {
            return (0.0, 0.0);
        }

        let width = self.c_max - self.c_min;
        let x = (metric - self.c_min) / width;
        let (value, derivative) = match self.function {
            ScreeningFunction::Polynomial => polynomial_switch(x),
            ScreeningFunction::Cosine => cosine_switch(x),
        };
        return (value, derivative / width);
    }

    /// Pair cutoff function at distance `r` when screening is enabled
    pub fn outer_cutoff(&self, r: f64) -> (f64, f64) {
        self.outer_cutoff_function.compute(r, self.outer_cutoff)
    }
}
