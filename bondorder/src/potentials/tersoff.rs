use crate::Error;
use crate::math::CutoffFunction;

use super::{PotentialFunctions, ScreeningParameters, PairTable, check_unique_types};

/// Limit for the argument of the exponential in the bond length term, beyond
/// which the exponential is clamped
const MAX_EXPONENT: f64 = 69.0776;

fn serde_default_m() -> u32 { 3 }

/// Parameters of a single element for the Tersoff potential.
///
/// The pair terms are `V_R = A exp(-λ r)` and `V_A = -B exp(-μ r)`; the
/// angular term is `g = 1 + c²/d² - c²/(d² + (h - cos θ)²)` and the bond order
/// is `b = χ (1 + (β z)^n)^(-1/2n)`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TersoffElement {
    /// atomic type this set of parameters applies to
    pub atomic_type: i32,
    /// repulsive energy scale `A`
    pub a: f64,
    /// attractive energy scale `B`
    pub b: f64,
    /// repulsive decay rate `λ`
    pub lambda: f64,
    /// attractive decay rate `μ`
    pub mu: f64,
    pub beta: f64,
    pub n: f64,
    pub c: f64,
    pub d: f64,
    pub h: f64,
    /// decay rate of the bond length term, defaults to 0
    #[serde(default)]
    pub lambda3: f64,
    /// exponent of the bond length term, either 1 or 3
    #[serde(default = "serde_default_m")]
    pub m: u32,
    /// distance at which the cutoff function starts to switch off (`R`)
    pub inner_cutoff: f64,
    /// distance at which the cutoff function reaches zero (`S`)
    pub outer_cutoff: f64,
}

/// Scaling `χ` of the bond order between two different elements
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TersoffMixing {
    pub first: i32,
    pub second: i32,
    pub chi: f64,
}

/// Parameters for the multi-component Tersoff potential. Pair parameters of
/// different elements are obtained with the Tersoff mixing rules (geometric
/// mean of energies and cutoff, arithmetic mean of decay rates).
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TersoffParameters {
    pub elements: Vec<TersoffElement>,
    /// `χ` values for pairs of different elements, defaults to 1 for pairs
    /// not given here
    #[serde(default)]
    pub mixing: Vec<TersoffMixing>,
    /// screening parameters, if this potential should use screening
    #[serde(default)]
    pub screening: Option<ScreeningParameters>,
}

impl TersoffElement {
    /// Tersoff parameters for silicon (Phys. Rev. B 39, 5566 (1989))
    pub fn silicon() -> TersoffElement {
        TersoffElement {
            atomic_type: 14,
            a: 1830.8,
            b: 471.18,
            lambda: 2.4799,
            mu: 1.7322,
            beta: 1.1e-6,
            n: 0.78734,
            c: 1.0039e5,
            d: 16.217,
            h: -0.59825,
            lambda3: 0.0,
            m: 3,
            inner_cutoff: 2.7,
            outer_cutoff: 3.0,
        }
    }

    /// Tersoff parameters for carbon (Phys. Rev. B 39, 5566 (1989))
    pub fn carbon() -> TersoffElement {
        TersoffElement {
            atomic_type: 6,
            a: 1393.6,
            b: 346.74,
            lambda: 3.4879,
            mu: 2.2119,
            beta: 1.5724e-7,
            n: 0.72751,
            c: 38049.0,
            d: 4.3484,
            h: -0.57058,
            lambda3: 0.0,
            m: 3,
            inner_cutoff: 1.8,
            outer_cutoff: 2.1,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("a", self.a), ("b", self.b), ("lambda", self.lambda), ("mu", self.mu), ("n", self.n), ("d", self.d)] {
            if !(value > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "Tersoff parameter '{}' must be positive, got {} for atomic type {}",
                    name, value, self.atomic_type
                )));
            }
        }

        if self.beta < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "Tersoff parameter 'beta' can not be negative, got {} for atomic type {}",
                self.beta, self.atomic_type
            )));
        }

        if self.m != 1 && self.m != 3 {
            return Err(Error::InvalidParameter(format!(
                "Tersoff parameter 'm' must be 1 or 3, got {}", self.m
            )));
        }

        if !(self.inner_cutoff > 0.0) || !(self.outer_cutoff > self.inner_cutoff) {
            return Err(Error::InvalidParameter(format!(
                "Tersoff cutoffs must verify 0 < inner_cutoff < outer_cutoff, got {} and {}",
                self.inner_cutoff, self.outer_cutoff
            )));
        }

        return Ok(());
    }
}

impl TersoffParameters {
    /// Parameters for pure silicon
    pub fn silicon() -> TersoffParameters {
        TersoffParameters {
            elements: vec![TersoffElement::silicon()],
            mixing: Vec::new(),
            screening: None,
        }
    }

    /// Parameters for pure carbon
    pub fn carbon() -> TersoffParameters {
        TersoffParameters {
            elements: vec![TersoffElement::carbon()],
            mixing: Vec::new(),
            screening: None,
        }
    }

    /// Parameters for silicon carbide, with `χ = 0.9776`
    pub fn silicon_carbide() -> TersoffParameters {
        TersoffParameters {
            elements: vec![TersoffElement::silicon(), TersoffElement::carbon()],
            mixing: vec![TersoffMixing { first: 14, second: 6, chi: 0.9776 }],
            screening: None,
        }
    }

    /// Add screening to these parameters, where each bond is screened by the
    /// third atoms close to it, and the pair terms extend up to
    /// `screening.outer_cutoff`
    pub fn screened(mut self, screening: ScreeningParameters) -> TersoffParameters {
        self.screening = Some(screening);
        return self;
    }

    fn chi(&self, first: i32, second: i32) -> f64 {
        for mixing in &self.mixing {
            if (mixing.first == first && mixing.second == second) || (mixing.first == second && mixing.second == first) {
                return mixing.chi;
            }
        }
        return 1.0;
    }
}

/// Pair parameters after mixing
#[derive(Debug, Clone)]
struct TersoffPair {
    a: f64,
    b: f64,
    lambda: f64,
    mu: f64,
    chi: f64,
    cutoff: f64,
    cutoff_function: CutoffFunction,
}

/// Bond order closure of a single element, with the thresholds switching
/// between the asymptotic forms of `(1 + x^n)^(-1/2n)`
#[derive(Debug, Clone)]
struct TersoffClosure {
    beta: f64,
    n: f64,
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
}

impl TersoffClosure {
    fn new(beta: f64, n: f64) -> TersoffClosure {
        let c1 = f64::powf(2.0 * n * 1e-16, -1.0 / n);
        let c2 = f64::powf(2.0 * n * 1e-8, -1.0 / n);
        TersoffClosure {
            beta: beta,
            n: n,
            c1: c1,
            c2: c2,
            c3: 1.0 / c2,
            c4: 1.0 / c1,
        }
    }

    /// Get `(1 + (β z)^n)^(-1/2n)` and its derivative with respect to `z`
    fn compute(&self, z: f64) -> (f64, f64) {
        let n = self.n;
        let x = self.beta * z;

        let (value, derivative) = if x > self.c1 {
            let value = 1.0 / f64::sqrt(x);
            (value, -0.5 * value / x)
        } else if x > self.c2 {
            let x_n = f64::powf(x, -n);
            let sqrt = f64::sqrt(x);
            let value = (1.0 - x_n / (2.0 * n)) / sqrt;
            let derivative = -0.5 / (x * sqrt) + (n + 0.5) / (2.0 * n) * x_n / (x * sqrt);
            (value, derivative)
        } else if x < self.c4 {
            (1.0, 0.0)
        } else if x < self.c3 {
            let x_n1 = f64::powf(x, n - 1.0);
            (1.0 - 0.5 * x_n1 * x / n, -0.5 * x_n1)
        } else {
            let x_n1 = f64::powf(x, n - 1.0);
            let base = 1.0 + x_n1 * x;
            let value = f64::powf(base, -0.5 / n);
            (value, -0.5 * value / base * x_n1)
        };

        return (value, self.beta * derivative);
    }
}

/// Multi-component Tersoff potential, optionally screened
#[derive(Debug, Clone)]
pub struct Tersoff {
    parameters: TersoffParameters,
    types: Vec<i32>,
    pairs: PairTable<TersoffPair>,
    closures: Vec<TersoffClosure>,
}

impl Tersoff {
    pub fn new(parameters: TersoffParameters) -> Result<Tersoff, Error> {
        if parameters.elements.is_empty() {
            return Err(Error::InvalidParameter(
                "Tersoff potential needs at least one element".into()
            ));
        }

        for element in &parameters.elements {
            element.validate()?;
        }

        let types = parameters.elements.iter().map(|e| e.atomic_type).collect::<Vec<_>>();
        check_unique_types(&types)?;

        for mixing in &parameters.mixing {
            for atomic_type in [mixing.first, mixing.second] {
                if !types.contains(&atomic_type) {
                    return Err(Error::InvalidParameter(format!(
                        "atomic type {} in Tersoff mixing is not one of the elements", atomic_type
                    )));
                }
            }
        }

        let elements = &parameters.elements;
        let pairs = PairTable::new(elements.len(), |i, j| {
            let first = &elements[i];
            let second = &elements[j];

            let inner_cutoff = f64::sqrt(first.inner_cutoff * second.inner_cutoff);
            let cutoff = f64::sqrt(first.outer_cutoff * second.outer_cutoff);
            let cutoff_function = CutoffFunction::ShiftedCosine { width: cutoff - inner_cutoff };
            cutoff_function.validate(cutoff)?;

            Ok(TersoffPair {
                a: f64::sqrt(first.a * second.a),
                b: f64::sqrt(first.b * second.b),
                lambda: 0.5 * (first.lambda + second.lambda),
                mu: 0.5 * (first.mu + second.mu),
                chi: if i == j { 1.0 } else { parameters.chi(first.atomic_type, second.atomic_type) },
                cutoff: cutoff,
                cutoff_function: cutoff_function,
            })
        })?;

        if let Some(screening) = &parameters.screening {
            screening.validate()?;
            let max_cutoff = pairs.data.iter().map(|p| p.cutoff).fold(0.0, f64::max);
            if screening.outer_cutoff < max_cutoff {
                return Err(Error::InvalidParameter(format!(
                    "screening outer cutoff ({}) must be larger than the potential cutoff ({})",
                    screening.outer_cutoff, max_cutoff
                )));
            }
        }

        let closures = parameters.elements.iter()
            .map(|e| TersoffClosure::new(e.beta, e.n))
            .collect();

        return Ok(Tersoff {
            parameters: parameters,
            types: types,
            pairs: pairs,
            closures: closures,
        });
    }
}

impl PotentialFunctions for Tersoff {
    fn name(&self) -> String {
        "Tersoff potential".into()
    }

    fn parameters(&self) -> String {
        serde_json::to_string(&self.parameters).expect("failed to serialize to JSON")
    }

    fn elements(&self) -> &[i32] {
        &self.types
    }

    fn max_cutoff(&self, first: usize, second: usize) -> f64 {
        match &self.parameters.screening {
            Some(screening) => screening.outer_cutoff,
            None => self.pairs[(first, second)].cutoff,
        }
    }

    fn cutoff(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        match &self.parameters.screening {
            Some(screening) => screening.outer_cutoff(r),
            None => self.bond_order_cutoff(first, second, r),
        }
    }

    fn bond_order_cutoff(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        let pair = &self.pairs[(first, second)];
        return pair.cutoff_function.compute(r, pair.cutoff);
    }

    fn repulsive(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        let pair = &self.pairs[(first, second)];
        let value = pair.a * f64::exp(-pair.lambda * r);
        return (value, -pair.lambda * value);
    }

    fn attractive(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        let pair = &self.pairs[(first, second)];
        let value = -pair.b * f64::exp(-pair.mu * r);
        return (value, -pair.mu * value);
    }

    fn angular(&self, center: usize, _: usize, _: usize, cos_theta: f64) -> (f64, f64) {
        let element = &self.parameters.elements[center];
        let c2 = element.c * element.c;
        let d2 = element.d * element.d;
        let u = element.h - cos_theta;
        let denominator = d2 + u * u;

        let value = 1.0 + c2 / d2 - c2 / denominator;
        let derivative = -2.0 * c2 * u / (denominator * denominator);
        return (value, derivative);
    }

    fn length_term(&self, center: usize, _: usize, _: usize, r_ij: f64, r_ik: f64) -> (f64, f64, f64) {
        let element = &self.parameters.elements[center];
        if element.lambda3 == 0.0 {
            return (1.0, 0.0, 0.0);
        }

        let delta = element.lambda3 * (r_ij - r_ik);
        let (argument, d_argument) = if element.m == 3 {
            (delta * delta * delta, 3.0 * delta * delta * element.lambda3)
        } else {
            (delta, element.lambda3)
        };

        if argument > MAX_EXPONENT {
            return (1e30, 0.0, 0.0);
        } else if argument < -MAX_EXPONENT {
            return (0.0, 0.0, 0.0);
        }

        let value = f64::exp(argument);
        return (value, value * d_argument, -value * d_argument);
    }

    fn bond_order(&self, center: usize, neighbor: usize, z: f64) -> (f64, f64) {
        let chi = self.pairs[(center, neighbor)].chi;
        let (value, derivative) = self.closures[center].compute(z);
        return (chi * value, chi * derivative);
    }

    fn screening(&self) -> Option<&ScreeningParameters> {
        self.parameters.screening.as_ref()
    }
}
