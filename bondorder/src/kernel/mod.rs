//! Generic bond-order kernel, shared by all potentials.
//!
//! A single calculation goes through the following stages:
//!
//! 1. build the list of directed bonds from the candidate pairs of the system
//!    ([`BondList`]);
//! 2. if the potential uses screening, find the third atoms screening each
//!    bond ([`ScreeningList`]);
//! 3. evaluate the bond order of every bond;
//! 4. accumulate energy, forces and virial.
//!
//! The bond and screening storage is kept from one calculation to the next
//! inside a [`BopKernel`], and only grows.
use ndarray::{Array1, Array3};

use crate::{Error, Matrix3, System, Vector3D};
use crate::potentials::PotentialFunctions;

mod arena;
pub use self::arena::{Arena, ArenaFull};

mod bonds;
pub use self::bonds::{Bond, BondList, MIN_BOND_LENGTH};

mod screening;
pub use self::screening::{ScreeningList, ScreeningRecord};

mod bond_order;
pub use self::bond_order::BondOrder;

mod forces;
pub use self::forces::BondEnergy;
use self::forces::{Accumulators, BondData};

/// Split `data` in consecutive sub-slices, the `i`-th slice containing
/// `offsets[i + 1] - offsets[i]` entries.
pub(crate) fn split_by_offsets<'a, T>(mut data: &'a mut [T], offsets: &[usize]) -> Vec<&'a mut [T]> {
    let mut slices = Vec::with_capacity(offsets.len().saturating_sub(1));
    for window in offsets.windows(2) {
        let (slice, rest) = std::mem::take(&mut data).split_at_mut(window[1] - window[0]);
        slices.push(slice);
        data = rest;
    }
    return slices;
}

/// Sizing policy for the bond and screening storage
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct BufferOptions {
    /// Number of bonds per atom to reserve before the first calculation
    pub initial_bonds_per_atom: usize,
    /// Number of screening records per bond to reserve before the first
    /// calculation with screening
    pub initial_screening_per_bond: usize,
    /// Hard limit on the total number of bonds, `None` for no limit
    pub max_bonds: Option<usize>,
    /// Hard limit on the total number of screening records, `None` for no
    /// limit
    pub max_screening_records: Option<usize>,
    /// Maximal number of times each buffer can double its capacity during a
    /// single calculation
    pub max_growth_steps: usize,
}

impl Default for BufferOptions {
    fn default() -> BufferOptions {
        BufferOptions {
            initial_bonds_per_atom: 16,
            initial_screening_per_bond: 4,
            max_bonds: None,
            max_screening_records: None,
            max_growth_steps: 32,
        }
    }
}

impl BufferOptions {
    /// Check that these options can be used to size the buffers
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_growth_steps == 0 && self.initial_bonds_per_atom == 0 {
            return Err(Error::InvalidParameter(
                "initial_bonds_per_atom can not be 0 if growth is disabled".into()
            ));
        }

        if self.max_bonds == Some(0) {
            return Err(Error::InvalidParameter("max_bonds must be at least 1".into()));
        }

        return Ok(());
    }
}

/// What to do with atoms in the exclusion mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusionPolicy {
    /// Masked atoms do not own any energy, but still act as bond partners,
    /// angular neighbors and screening atoms for the other atoms
    #[default]
    SelfEnergy,
    /// Masked atoms are removed from the calculation entirely
    Full,
}

/// Options for a single calculation
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeOptions<'a> {
    /// Compute per-atom energies and virials
    pub per_atom: bool,
    /// Compute the contribution of every directed bond
    pub per_bond: bool,
    /// Atoms for which `mask[i]` is `true` are excluded according to
    /// `exclusion`. The mask must contain one entry per atom.
    pub mask: Option<&'a [bool]>,
    /// How to treat masked atoms
    pub exclusion: ExclusionPolicy,
}

/// Status of a finished calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Everything went fine
    Success,
    /// The calculation finished, but something looked wrong
    Warning(Vec<String>),
}

/// Contribution of a single directed bond to the energy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondContribution {
    pub first: usize,
    pub second: usize,
    pub cell_shift: [i32; 3],
    pub distance: f64,
    /// bond order `b_ij` of this bond
    pub bond_order: f64,
    /// screening factor of this bond, 1 without screening
    pub screening: f64,
    /// share of the energy owned by `first` for this bond
    pub energy: f64,
}

/// Result of a calculation
#[derive(Debug, Clone)]
pub struct BopOutput {
    /// Total energy of the system
    pub energy: f64,
    /// Forces acting on all atoms
    pub forces: Vec<Vector3D>,
    /// Virial tensor, `W = -dE/dε`
    pub virial: Matrix3,
    /// Energy owned by each atom, if requested
    pub atom_energies: Option<Array1<f64>>,
    /// Virial of each atom with shape `[n_atoms, 3, 3]`, if requested
    pub atom_virials: Option<Array3<f64>>,
    /// Contribution of every directed bond, if requested
    pub bonds: Option<Vec<BondContribution>>,
    pub status: Status,
}

/// Distance up to which the neighbor list must contain pairs for a potential
pub fn required_cutoff(functions: &dyn PotentialFunctions) -> f64 {
    let n_elements = functions.elements().len();
    let mut cutoff = 0.0;
    for first in 0..n_elements {
        for second in 0..n_elements {
            cutoff = f64::max(cutoff, functions.max_cutoff(first, second));
        }
    }

    if let Some(screening) = functions.screening() {
        cutoff = f64::max(cutoff, screening.search_radius(cutoff));
    }

    return cutoff;
}

/// Generic bond-order potential kernel, with the storage required for the
/// calculations.
#[derive(Debug, Clone)]
pub struct BopKernel {
    options: BufferOptions,
    bonds: BondList,
    screening: ScreeningList,
    bond_orders: Vec<BondOrder>,
    bond_energies: Vec<BondEnergy>,
}

impl Default for BopKernel {
    fn default() -> BopKernel {
        BopKernel {
            options: BufferOptions::default(),
            bonds: BondList::new(),
            screening: ScreeningList::new(),
            bond_orders: Vec::new(),
            bond_energies: Vec::new(),
        }
    }
}

impl BopKernel {
    /// Create a new kernel using the given buffer sizing policy. No memory is
    /// allocated before the first calculation.
    pub fn new(options: BufferOptions) -> Result<BopKernel, Error> {
        options.validate()?;
        return Ok(BopKernel {
            options: options,
            bonds: BondList::new(),
            screening: ScreeningList::new(),
            bond_orders: Vec::new(),
            bond_energies: Vec::new(),
        });
    }

    /// Get the buffer sizing policy of this kernel
    pub fn buffer_options(&self) -> &BufferOptions {
        &self.options
    }

    /// Get the bonds used in the last calculation
    pub fn bonds(&self) -> &BondList {
        &self.bonds
    }

    /// Get the screening of the bonds in the last calculation. This is
    /// empty if the potential does not use screening.
    pub fn screening(&self) -> &ScreeningList {
        &self.screening
    }

    /// Get the bond orders of all bonds in the last calculation
    pub fn bond_orders(&self) -> &[BondOrder] {
        &self.bond_orders
    }

    /// Compute energy, forces and virial of `system` with the given
    /// potential. `elements` contains the element index (in
    /// `functions.elements()`) of every atom. The neighbor list of the system
    /// must have been computed with a cutoff of at least
    /// [`required_cutoff`].
    ///
    /// On error, no output is produced and the stored bonds and screening are
    /// left in an unspecified state.
    #[time_graph::instrument(name = "BopKernel::compute")]
    pub fn compute(
        &mut self,
        functions: &dyn PotentialFunctions,
        system: &dyn System,
        elements: &[usize],
        options: &ComputeOptions<'_>,
    ) -> Result<BopOutput, Error> {
        let n_atoms = system.size()?;
        if elements.len() != n_atoms {
            return Err(Error::InvalidParameter(format!(
                "expected {} element indexes, got {}", n_atoms, elements.len()
            )));
        }

        let n_elements = functions.elements().len();
        if let Some(&element) = elements.iter().find(|&&element| element >= n_elements) {
            return Err(Error::InvalidParameter(format!(
                "element index {} is out of bounds for a potential with {} elements", element, n_elements
            )));
        }

        if let Some(mask) = options.mask {
            if mask.len() != n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "the exclusion mask contains {} entries, but the system has {} atoms", mask.len(), n_atoms
                )));
            }
        }

        let excluded = match options.exclusion {
            ExclusionPolicy::SelfEnergy => None,
            ExclusionPolicy::Full => options.mask,
        };

        let weights = (0..n_atoms).map(|atom| {
            if options.mask.map_or(false, |mask| mask[atom]) { 0.0 } else { 1.0 }
        }).collect::<Vec<_>>();

        let mut warnings = Vec::new();

        self.bonds.start(
            n_atoms * self.options.initial_bonds_per_atom,
            self.options.max_bonds.unwrap_or(usize::MAX),
            self.options.max_growth_steps,
        );
        let degenerate = self.bonds.build(functions, system, elements, excluded)?;
        if degenerate > 0 {
            let message = format!(
                "ignored {} pairs of atoms closer than {} Å", degenerate, MIN_BOND_LENGTH
            );
            log::warn!("{}", message);
            warnings.push(message);
        }

        let screening = if let Some(parameters) = functions.screening() {
            self.screening.start(
                self.bonds.len() * self.options.initial_screening_per_bond,
                self.options.max_screening_records.unwrap_or(usize::MAX),
                self.options.max_growth_steps,
            );
            self.screening.resolve(parameters, &self.bonds, system, excluded)?;
            Some(&self.screening)
        } else {
            self.screening.start(0, usize::MAX, 0);
            None
        };

        bond_order::evaluate(
            functions,
            &self.bonds,
            screening.map(|screening| screening.factors()),
            &mut self.bond_orders,
        );

        let accumulators = Accumulators::new(n_atoms, options.per_atom);
        let data = BondData {
            functions: functions,
            bonds: &self.bonds,
            bond_orders: &self.bond_orders,
            screening: screening,
            weights: &weights,
        };
        forces::accumulate_bonds(&data, &mut self.bond_energies, &accumulators);
        if let Some(screening) = screening {
            forces::accumulate_screening(&self.bonds, screening, &self.bond_energies, &accumulators);
        }
        let total = accumulators.reduce();

        let is_finite = total.energy.is_finite()
            && total.forces.iter().all(|force| force.iter().all(|f| f.is_finite()))
            && (0..3).all(|i| total.virial[i].iter().all(|v| v.is_finite()));
        if !is_finite {
            let message = String::from("the energy, forces or virial contain non-finite values");
            log::warn!("{}", message);
            warnings.push(message);
        }

        let atom_energies = total.atom_energies.map(Array1::from);
        let atom_virials = total.atom_virials.map(|virials| {
            let mut array = Array3::zeros((n_atoms, 3, 3));
            for (atom, virial) in virials.iter().enumerate() {
                for i in 0..3 {
                    for j in 0..3 {
                        array[[atom, i, j]] = virial[i][j];
                    }
                }
            }
            array
        });

        let bonds = if options.per_bond {
            let contributions = self.bonds.bonds().iter().enumerate().map(|(index, bond)| {
                BondContribution {
                    first: bond.first,
                    second: bond.second,
                    cell_shift: bond.cell_shift,
                    distance: bond.distance,
                    bond_order: self.bond_orders[index].value,
                    screening: screening.map_or(1.0, |screening| screening.factors()[index]),
                    energy: self.bond_energies[index].energy,
                }
            }).collect();
            Some(contributions)
        } else {
            None
        };

        let status = if warnings.is_empty() {
            Status::Success
        } else {
            Status::Warning(warnings)
        };

        return Ok(BopOutput {
            energy: total.energy,
            forces: total.forces,
            virial: total.virial,
            atom_energies: atom_energies,
            atom_virials: atom_virials,
            bonds: bonds,
            status: status,
        });
    }
}
