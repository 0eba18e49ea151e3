use crate::Error;
use crate::math::CutoffFunction;

use super::{PotentialFunctions, ScreeningParameters, PairTable};

/// Parameters of the Brenner potential for one pair of elements, in the
/// parametrization of Albe and Erhart. The pair terms are Morse-like:
///
/// ```text
/// V_R(r) =     D0 / (S - 1) exp(-β sqrt(2 S) (r - r0))
/// V_A(r) = -S D0 / (S - 1) exp(-β sqrt(2 / S) (r - r0))
/// ```
///
/// The angular term is `g = γ (1 + c²/d² - c²/(d² + (h + cos θ)²))` and the
/// bond order is `b = (1 + z)^(-1/2)`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BrennerPair {
    pub first: i32,
    pub second: i32,
    /// dimer binding energy
    pub d0: f64,
    /// dimer bond length
    pub r0: f64,
    /// ratio between the repulsive and attractive decay rates (squared)
    pub s: f64,
    pub beta: f64,
    pub gamma: f64,
    pub c: f64,
    pub d: f64,
    pub h: f64,
    /// decay rate `α = 2μ` of the bond length term, defaults to 0
    #[serde(default)]
    pub alpha: f64,
    /// center of the cutoff region
    pub cutoff: f64,
    /// half width of the cutoff region, the cutoff function goes from 1 at
    /// `cutoff - cutoff_width` to 0 at `cutoff + cutoff_width`
    pub cutoff_width: f64,
}

/// Parameters for the Brenner potential. Every pair of elements appearing
/// in the list must have an entry.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BrennerParameters {
    pub pairs: Vec<BrennerPair>,
    /// screening parameters, if this potential should use screening
    #[serde(default)]
    pub screening: Option<ScreeningParameters>,
}

impl BrennerPair {
    /// Silicon parameters from Erhart and Albe, Phys. Rev. B 71, 035211 (2005)
    pub fn silicon() -> BrennerPair {
        BrennerPair {
            first: 14,
            second: 14,
            d0: 3.24,
            r0: 2.232,
            s: 1.842,
            beta: 1.4761,
            gamma: 0.114354,
            c: 2.00494,
            d: 0.81472,
            h: 0.259,
            alpha: 0.0,
            cutoff: 2.82,
            cutoff_width: 0.14,
        }
    }

    /// Carbon parameters from Erhart and Albe, Phys. Rev. B 71, 035211 (2005)
    pub fn carbon() -> BrennerPair {
        BrennerPair {
            first: 6,
            second: 6,
            d0: 6.0,
            r0: 1.4276,
            s: 2.167,
            beta: 2.0099,
            gamma: 0.11233,
            c: 181.910,
            d: 6.28433,
            h: 0.5556,
            alpha: 0.0,
            cutoff: 2.0,
            cutoff_width: 0.15,
        }
    }

    /// Mixed silicon-carbon parameters from Erhart and Albe, Phys. Rev. B
    /// 71, 035211 (2005)
    pub fn silicon_carbon() -> BrennerPair {
        BrennerPair {
            first: 14,
            second: 6,
            d0: 4.36,
            r0: 1.79,
            s: 1.847,
            beta: 1.6991,
            gamma: 0.011877,
            c: 273987.0,
            d: 180.314,
            h: 0.68,
            alpha: 0.0,
            cutoff: 2.4,
            cutoff_width: 0.2,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if !(self.s > 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Brenner parameter 's' must be larger than 1, got {} for the {}-{} pair",
                self.s, self.first, self.second
            )));
        }

        for (name, value) in [("d0", self.d0), ("r0", self.r0), ("beta", self.beta), ("gamma", self.gamma), ("d", self.d)] {
            if !(value > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "Brenner parameter '{}' must be positive, got {} for the {}-{} pair",
                    name, value, self.first, self.second
                )));
            }
        }

        if !(self.cutoff_width > 0.0) || !(self.cutoff > self.cutoff_width) {
            return Err(Error::InvalidParameter(format!(
                "Brenner cutoff must verify 0 < cutoff_width < cutoff, got {} and {}",
                self.cutoff_width, self.cutoff
            )));
        }

        return Ok(());
    }

    fn matches(&self, first: i32, second: i32) -> bool {
        (self.first == first && self.second == second) || (self.first == second && self.second == first)
    }
}

impl BrennerParameters {
    /// Parameters for pure silicon
    pub fn silicon() -> BrennerParameters {
        BrennerParameters {
            pairs: vec![BrennerPair::silicon()],
            screening: None,
        }
    }

    /// Parameters for pure carbon
    pub fn carbon() -> BrennerParameters {
        BrennerParameters {
            pairs: vec![BrennerPair::carbon()],
            screening: None,
        }
    }

    /// Parameters for silicon carbide
    pub fn silicon_carbide() -> BrennerParameters {
        BrennerParameters {
            pairs: vec![BrennerPair::silicon(), BrennerPair::carbon(), BrennerPair::silicon_carbon()],
            screening: None,
        }
    }

    /// Add screening to these parameters
    pub fn screened(mut self, screening: ScreeningParameters) -> BrennerParameters {
        self.screening = Some(screening);
        return self;
    }
}

/// Pair parameters with pre-computed prefactors and decay rates
#[derive(Debug, Clone)]
struct BrennerTerms {
    parameters: BrennerPair,
    repulsive_prefactor: f64,
    repulsive_decay: f64,
    attractive_prefactor: f64,
    attractive_decay: f64,
    cutoff_function: CutoffFunction,
}

impl BrennerTerms {
    fn new(parameters: &BrennerPair) -> BrennerTerms {
        let BrennerPair { d0, s, beta, .. } = *parameters;
        BrennerTerms {
            parameters: parameters.clone(),
            repulsive_prefactor: d0 / (s - 1.0),
            repulsive_decay: beta * f64::sqrt(2.0 * s),
            attractive_prefactor: -s * d0 / (s - 1.0),
            attractive_decay: beta * f64::sqrt(2.0 / s),
            cutoff_function: CutoffFunction::ShiftedCosine { width: 2.0 * parameters.cutoff_width },
        }
    }

    fn max_cutoff(&self) -> f64 {
        self.parameters.cutoff + self.parameters.cutoff_width
    }
}

/// Brenner potential (Albe-Erhart form), optionally screened
#[derive(Debug, Clone)]
pub struct Brenner {
    parameters: BrennerParameters,
    types: Vec<i32>,
    pairs: PairTable<BrennerTerms>,
}

impl Brenner {
    pub fn new(parameters: BrennerParameters) -> Result<Brenner, Error> {
        let mut types = Vec::new();
        for pair in &parameters.pairs {
            pair.validate()?;
            for atomic_type in [pair.first, pair.second] {
                if !types.contains(&atomic_type) {
                    types.push(atomic_type);
                }
            }
        }

        if types.is_empty() {
            return Err(Error::InvalidParameter(
                "Brenner potential needs at least one pair of elements".into()
            ));
        }

        for (i, pair) in parameters.pairs.iter().enumerate() {
            if parameters.pairs[..i].iter().any(|other| other.matches(pair.first, pair.second)) {
                return Err(Error::InvalidParameter(format!(
                    "the {}-{} pair is defined more than once in Brenner parameters",
                    pair.first, pair.second
                )));
            }
        }

        let pairs = PairTable::new(types.len(), |i, j| {
            let pair = parameters.pairs.iter()
                .find(|pair| pair.matches(types[i], types[j]))
                .ok_or_else(|| Error::InvalidParameter(format!(
                    "missing parameters for the {}-{} pair in Brenner potential",
                    types[i], types[j]
                )))?;
            Ok(BrennerTerms::new(pair))
        })?;

        if let Some(screening) = &parameters.screening {
            screening.validate()?;
            let max_cutoff = pairs.data.iter().map(BrennerTerms::max_cutoff).fold(0.0, f64::max);
            if screening.outer_cutoff < max_cutoff {
                return Err(Error::InvalidParameter(format!(
                    "screening outer cutoff ({}) must be larger than the potential cutoff ({})",
                    screening.outer_cutoff, max_cutoff
                )));
            }
        }

        return Ok(Brenner {
            parameters: parameters,
            types: types,
            pairs: pairs,
        });
    }
}

impl PotentialFunctions for Brenner {
    fn name(&self) -> String {
        "Brenner potential".into()
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
            None => self.pairs[(first, second)].max_cutoff(),
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
        return pair.cutoff_function.compute(r, pair.max_cutoff());
    }

    fn repulsive(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        let pair = &self.pairs[(first, second)];
        let value = pair.repulsive_prefactor * f64::exp(-pair.repulsive_decay * (r - pair.parameters.r0));
        return (value, -pair.repulsive_decay * value);
    }

    fn attractive(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        let pair = &self.pairs[(first, second)];
        let value = pair.attractive_prefactor * f64::exp(-pair.attractive_decay * (r - pair.parameters.r0));
        return (value, -pair.attractive_decay * value);
    }

    fn angular(&self, center: usize, _: usize, second: usize, cos_theta: f64) -> (f64, f64) {
        let BrennerPair { gamma, c, d, h, .. } = self.pairs[(center, second)].parameters;
        let c2 = c * c;
        let d2 = d * d;
        let u = h + cos_theta;
        let denominator = d2 + u * u;

        let value = gamma * (1.0 + c2 / d2 - c2 / denominator);
        let derivative = gamma * 2.0 * c2 * u / (denominator * denominator);
        return (value, derivative);
    }

    fn length_term(&self, center: usize, _: usize, second: usize, r_ij: f64, r_ik: f64) -> (f64, f64, f64) {
        let alpha = self.pairs[(center, second)].parameters.alpha;
        if alpha == 0.0 {
            return (1.0, 0.0, 0.0);
        }

        let value = f64::exp(alpha * (r_ij - r_ik));
        return (value, alpha * value, -alpha * value);
    }

    fn bond_order(&self, _: usize, _: usize, z: f64) -> (f64, f64) {
        let base = 1.0 + z;
        let value = 1.0 / f64::sqrt(base);
        return (value, -0.5 * value / base);
    }

    fn screening(&self) -> Option<&ScreeningParameters> {
        self.parameters.screening.as_ref()
    }
}
