use crate::Error;
use crate::math::CutoffFunction;

use super::{PotentialFunctions, ScreeningParameters};

fn serde_default_one() -> f64 { 1.0 }
fn serde_default_beta() -> u32 { 1 }

/// Parameters for the single-element potential of Kumagai, Izumi, Hara and
/// Sakai (Comput. Mater. Sci. 39, 457 (2007)).
///
/// Compared to Tersoff, the angular term is
/// `g = c1 + g0 (1 + c4 exp(-c5 (h - cos θ)²))` with
/// `g0 = c2 (h - cos θ)² / (c3 + (h - cos θ)²)`, the bond length term is
/// `exp(α (r_ij - r_ik)^β)`, and the bond order is `b = (1 + z^η)^(-δ)`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct KumagaiParameters {
    /// atomic type this potential applies to
    pub atomic_type: i32,
    pub a: f64,
    pub b: f64,
    pub lambda1: f64,
    pub lambda2: f64,
    #[serde(default = "serde_default_one")]
    pub eta: f64,
    pub delta: f64,
    pub alpha: f64,
    /// odd integer exponent of the bond length term
    #[serde(default = "serde_default_beta")]
    pub beta: u32,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub c4: f64,
    pub c5: f64,
    pub h: f64,
    /// distance at which the cutoff function starts to switch off
    pub inner_cutoff: f64,
    /// distance at which the cutoff function reaches zero
    pub outer_cutoff: f64,
    /// screening parameters, if this potential should use screening
    #[serde(default)]
    pub screening: Option<ScreeningParameters>,
}

impl KumagaiParameters {
    /// Parameters for silicon
    pub fn silicon() -> KumagaiParameters {
        KumagaiParameters {
            atomic_type: 14,
            a: 3281.5905,
            b: 121.00047,
            lambda1: 3.2300135,
            lambda2: 1.3457970,
            eta: 1.0,
            delta: 0.53298909,
            alpha: 2.3890327,
            beta: 1,
            c1: 0.20173476,
            c2: 730418.72,
            c3: 1000000.0,
            c4: 1.0,
            c5: 26.0,
            h: -0.365,
            inner_cutoff: 2.7,
            outer_cutoff: 3.3,
            screening: None,
        }
    }

    /// Add screening to these parameters
    pub fn screened(mut self, screening: ScreeningParameters) -> KumagaiParameters {
        self.screening = Some(screening);
        return self;
    }

    fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("a", self.a), ("b", self.b), ("lambda1", self.lambda1), ("lambda2", self.lambda2), ("eta", self.eta), ("delta", self.delta), ("c3", self.c3)] {
            if !(value > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "Kumagai parameter '{}' must be positive, got {}", name, value
                )));
            }
        }

        if self.c1 < 0.0 || self.c2 < 0.0 || self.c4 < 0.0 || self.c5 < 0.0 {
            return Err(Error::InvalidParameter(
                "Kumagai parameters 'c1', 'c2', 'c4' and 'c5' can not be negative".into()
            ));
        }

        if self.beta % 2 != 1 {
            return Err(Error::InvalidParameter(format!(
                "Kumagai parameter 'beta' must be an odd integer, got {}", self.beta
            )));
        }

        if !(self.inner_cutoff > 0.0) || !(self.outer_cutoff > self.inner_cutoff) {
            return Err(Error::InvalidParameter(format!(
                "Kumagai cutoffs must verify 0 < inner_cutoff < outer_cutoff, got {} and {}",
                self.inner_cutoff, self.outer_cutoff
            )));
        }

        if let Some(screening) = &self.screening {
            screening.validate()?;
            if screening.outer_cutoff < self.outer_cutoff {
                return Err(Error::InvalidParameter(format!(
                    "screening outer cutoff ({}) must be larger than the potential cutoff ({})",
                    screening.outer_cutoff, self.outer_cutoff
                )));
            }
        }

        return Ok(());
    }
}

/// Kumagai potential for silicon, optionally screened
#[derive(Debug, Clone)]
pub struct Kumagai {
    parameters: KumagaiParameters,
    types: [i32; 1],
    cutoff_function: CutoffFunction,
}

impl Kumagai {
    pub fn new(parameters: KumagaiParameters) -> Result<Kumagai, Error> {
        parameters.validate()?;
        let cutoff_function = CutoffFunction::SmoothCosine {
            width: parameters.outer_cutoff - parameters.inner_cutoff
        };

        return Ok(Kumagai {
            types: [parameters.atomic_type],
            parameters: parameters,
            cutoff_function: cutoff_function,
        });
    }
}

impl PotentialFunctions for Kumagai {
    fn name(&self) -> String {
        "Kumagai potential".into()
    }

    fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }

    fn elements(&self) -> &[i32] {
        &self.types
    }

    fn max_cutoff(&self, _: usize, _: usize) -> f64 {
        match &self.parameters.screening {
            Some(screening) => screening.outer_cutoff,
            None => self.parameters.outer_cutoff,
        }
    }

    fn cutoff(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        match &self.parameters.screening {
            Some(screening) => screening.outer_cutoff(r),
            None => self.bond_order_cutoff(first, second, r),
        }
    }

    fn bond_order_cutoff(&self, _: usize, _: usize, r: f64) -> (f64, f64) {
        self.cutoff_function.compute(r, self.parameters.outer_cutoff)
    }

    fn repulsive(&self, _: usize, _: usize, r: f64) -> (f64, f64) {
        let value = self.parameters.a * f64::exp(-self.parameters.lambda1 * r);
        return (value, -self.parameters.lambda1 * value);
    }

    fn attractive(&self, _: usize, _: usize, r: f64) -> (f64, f64) {
        let value = -self.parameters.b * f64::exp(-self.parameters.lambda2 * r);
        return (value, -self.parameters.lambda2 * value);
    }

    fn angular(&self, _: usize, _: usize, _: usize, cos_theta: f64) -> (f64, f64) {
        let KumagaiParameters { c1, c2, c3, c4, c5, h, .. } = self.parameters;
        let u = h - cos_theta;
        let u2 = u * u;

        let g0 = c2 * u2 / (c3 + u2);
        let d_g0 = 2.0 * c2 * c3 * u / ((c3 + u2) * (c3 + u2));

        let exp = f64::exp(-c5 * u2);
        let ga = 1.0 + c4 * exp;
        let d_ga = -2.0 * c4 * c5 * u * exp;

        let value = c1 + g0 * ga;
        // d/dcos = -d/du
        let derivative = -(d_g0 * ga + g0 * d_ga);
        return (value, derivative);
    }

    fn length_term(&self, _: usize, _: usize, _: usize, r_ij: f64, r_ik: f64) -> (f64, f64, f64) {
        let alpha = self.parameters.alpha;
        let beta = self.parameters.beta as i32;

        let delta = r_ij - r_ik;
        let value = f64::exp(alpha * delta.powi(beta));
        let derivative = value * alpha * beta as f64 * delta.powi(beta - 1);
        return (value, derivative, -derivative);
    }

    fn bond_order(&self, _: usize, _: usize, z: f64) -> (f64, f64) {
        let eta = self.parameters.eta;
        let delta = self.parameters.delta;

        if z <= 0.0 {
            // the derivative of z^η at 0 only exists for η = 1
            #[allow(clippy::float_cmp)]
            let derivative = if eta == 1.0 { -delta } else { 0.0 };
            return (1.0, derivative);
        }

        let z_eta = f64::powf(z, eta);
        let base = 1.0 + z_eta;
        let value = f64::powf(base, -delta);
        let derivative = -delta * value / base * eta * z_eta / z;
        return (value, derivative);
    }

    fn screening(&self) -> Option<&ScreeningParameters> {
        self.parameters.screening.as_ref()
    }
}
