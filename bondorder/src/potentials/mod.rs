//! Functional forms of bond-order potentials.
//!
//! Each potential provides the set of functions used by the generic kernel
//! through the [`PotentialFunctions`] trait. The energy of the system is
//!
//! ```text
//! E = 1/2 Σ_i Σ_j f_c(r_ij) S_ij [V_R(r_ij) + b̄_ij V_A(r_ij)]
//! b̄_ij = (b_ij + b_ji) / 2
//! b_ij = B(z_ij)
//! z_ij = Σ_{k ≠ j} g(cos θ_jik) h(r_ij, r_ik) f_bo(r_ik) S_ik
//! ```
//!
//! where `f_c` is the pair cutoff, `f_bo` the (possibly shorter) cutoff of
//! the bond-order sums, `S` the screening factors (always 1 without
//! screening), `V_R`/`V_A` the repulsive and attractive pair terms, `g` the
//! angular term, `h` the bond length term and `B` the bond-order closure.
//!
//! All functions take dense element indexes, corresponding to the position
//! of the atomic type in [`PotentialFunctions::elements`].

mod screening;
pub use self::screening::{ScreeningParameters, ScreeningMetric, ScreeningFunction, MetricValue};

mod tersoff;
pub use self::tersoff::{Tersoff, TersoffParameters, TersoffElement, TersoffMixing};

mod brenner;
pub use self::brenner::{Brenner, BrennerParameters, BrennerPair};

mod kumagai;
pub use self::kumagai::{Kumagai, KumagaiParameters};

/// Pluggable set of functions defining a bond-order potential.
///
/// All functions returning a tuple return the value and the derivative(s) of
/// the function with respect to its continuous argument(s). The functions must
/// be continuous with continuous first derivatives, and cutoff functions must
/// be in `[0, 1]`.
pub trait PotentialFunctions: Send + Sync {
    /// Get the name of this potential
    fn name(&self) -> String;

    /// Get the parameters used to create this potential as a JSON string
    fn parameters(&self) -> String;

    /// Atomic types this potential knows about. The position of a type in
    /// this slice is the element index used in all other functions.
    fn elements(&self) -> &[i32];

    /// Distance beyond which atoms of the two given elements do not form a
    /// bond
    fn max_cutoff(&self, first: usize, second: usize) -> f64;

    /// Cutoff function applied to the pair energy
    fn cutoff(&self, first: usize, second: usize, r: f64) -> (f64, f64);

    /// Cutoff function applied to bonds in the bond-order sums. This
    /// defaults to the same function as the pair energy cutoff.
    fn bond_order_cutoff(&self, first: usize, second: usize, r: f64) -> (f64, f64) {
        self.cutoff(first, second, r)
    }

    /// Repulsive pair term `V_R(r)`
    fn repulsive(&self, first: usize, second: usize, r: f64) -> (f64, f64);

    /// Attractive pair term `V_A(r)`, which is negative
    fn attractive(&self, first: usize, second: usize, r: f64) -> (f64, f64);

    /// Angular term `g(cos θ_jik)` for the triplet with `center` as central
    /// atom `i`, `first` as atom `j` and `second` as atom `k`
    fn angular(&self, center: usize, first: usize, second: usize, cos_theta: f64) -> (f64, f64);

    /// Bond length term `h(r_ij, r_ik)` for the same triplet as `angular`,
    /// with derivatives with respect to `r_ij` and `r_ik`
    fn length_term(&self, center: usize, first: usize, second: usize, r_ij: f64, r_ik: f64) -> (f64, f64, f64);

    /// Bond-order closure `b_ij = B(z_ij)` for the bond from `center` to
    /// `neighbor`
    fn bond_order(&self, center: usize, neighbor: usize, z: f64) -> (f64, f64);

    /// Screening parameters, if this potential uses screening
    fn screening(&self) -> Option<&ScreeningParameters> {
        None
    }
}

/// Check that a set of atomic types does not contain duplicates
fn check_unique_types(types: &[i32]) -> Result<(), crate::Error> {
    for (i, atomic_type) in types.iter().enumerate() {
        if types[..i].contains(atomic_type) {
            return Err(crate::Error::InvalidParameter(format!(
                "atomic type {} is defined more than once", atomic_type
            )));
        }
    }
    return Ok(());
}

/// Dense symmetric storage of per-pair data, indexed by two element indexes
#[derive(Debug, Clone)]
struct PairTable<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Clone> PairTable<T> {
    /// Create a table for `size` elements, calling `create(i, j)` for each
    /// pair with `i <= j`
    fn new<F: FnMut(usize, usize) -> Result<T, crate::Error>>(size: usize, mut create: F) -> Result<PairTable<T>, crate::Error> {
        let mut data = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                if j < i {
                    let existing: &T = &data[j * size + i];
                    data.push(existing.clone());
                } else {
                    data.push(create(i, j)?);
                }
            }
        }
        return Ok(PairTable { size, data });
    }
}

impl<T> std::ops::Index<(usize, usize)> for PairTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.size + j]
    }
}
