use std::collections::BTreeMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::{Error, System};
use crate::kernel::{BopKernel, BopOutput, BufferOptions, ComputeOptions};
use crate::potentials::PotentialFunctions;
use crate::potentials::{Tersoff, TersoffParameters};
use crate::potentials::{Brenner, BrennerParameters};
use crate::potentials::{Kumagai, KumagaiParameters};

type PotentialCreator = fn(&str) -> Result<Box<dyn PotentialFunctions>, Error>;

macro_rules! add_potential {
    ($map :expr, $name :literal, $type :ty, $parameters :ty) => (
        $map.insert($name, (|json| {
            let parameters = serde_json::from_str::<$parameters>(json)?;
            Ok(Box::new(<$type>::new(parameters)?))
        }) as PotentialCreator);
    );
}

static REGISTERED_POTENTIALS: Lazy<BTreeMap<&'static str, PotentialCreator>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    add_potential!(map, "tersoff", Tersoff, TersoffParameters);
    add_potential!(map, "brenner", Brenner, BrennerParameters);
    add_potential!(map, "kumagai", Kumagai, KumagaiParameters);
    return map;
});

/// A bond-order potential, ready to compute energy, forces and virial for
/// any system containing only the atomic types it knows about.
pub struct Potential {
    implementation: Box<dyn PotentialFunctions>,
    parameters: String,
    /// atomic type => element index in `implementation`
    elements: IndexMap<i32, usize>,
    kernel: BopKernel,
}

impl std::fmt::Debug for Potential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Potential")
            .field("name", &self.implementation.name())
            .field("parameters", &self.parameters)
            .field("elements", &self.elements)
            .finish_non_exhaustive()
    }
}

impl From<Box<dyn PotentialFunctions>> for Potential {
    fn from(implementation: Box<dyn PotentialFunctions>) -> Potential {
        let parameters = implementation.parameters();
        let elements = implementation.elements().iter()
            .enumerate()
            .map(|(index, &atomic_type)| (atomic_type, index))
            .collect();

        Potential {
            implementation: implementation,
            parameters: parameters,
            elements: elements,
            kernel: BopKernel::default(),
        }
    }
}

impl Potential {
    /// Create a new potential with the given `name` and `parameters`.
    ///
    /// The available potentials are `"tersoff"`, `"brenner"` and
    /// `"kumagai"`. The `parameters` should be formatted as JSON, following
    /// the schema of the corresponding parameters struct.
    ///
    /// # Errors
    ///
    /// This function returns an error if there is no registered potential with
    /// the given `name`, or if the parameters are invalid for this potential.
    pub fn new(name: &str, parameters: String) -> Result<Potential, Error> {
        let creator = match REGISTERED_POTENTIALS.get(name) {
            Some(creator) => creator,
            None => {
                return Err(Error::InvalidParameter(
                    format!("unknown potential with name '{}'", name)
                ));
            }
        };

        let mut potential = Potential::from(creator(&parameters)?);
        potential.parameters = parameters;
        return Ok(potential);
    }

    /// Use the given sizing policy for the internal buffers of this
    /// potential. This resets the buffers.
    pub fn set_buffer_options(&mut self, options: BufferOptions) -> Result<(), Error> {
        self.kernel = BopKernel::new(options)?;
        return Ok(());
    }

    /// Get the name of this potential
    pub fn name(&self) -> String {
        self.implementation.name()
    }

    /// Get the parameters used to create this potential in a string,
    /// formatted as JSON.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Get the atomic types this potential knows about
    pub fn atomic_types(&self) -> Vec<i32> {
        self.elements.keys().copied().collect()
    }

    /// Get the functions defining this potential
    pub fn functions(&self) -> &dyn PotentialFunctions {
        &*self.implementation
    }

    /// Get the kernel used by this potential, with the bonds and screening
    /// from the last calculation
    pub fn kernel(&self) -> &BopKernel {
        &self.kernel
    }

    /// Get the cutoff required in the neighbor list of systems used with
    /// this potential
    pub fn cutoff(&self) -> f64 {
        crate::kernel::required_cutoff(&*self.implementation)
    }

    /// Get the element index of every atom in the system
    fn element_indexes(&self, system: &dyn System) -> Result<Vec<usize>, Error> {
        return system.types()?.iter().map(|atomic_type| {
            self.elements.get(atomic_type)
                .copied()
                .ok_or(Error::UnknownElementType(*atomic_type))
        }).collect();
    }

    /// Check that this potential can be used with the given system, and
    /// compute the corresponding neighbor list.
    ///
    /// # Errors
    ///
    /// This function returns an error if the system contains atomic types
    /// this potential does not know about, or if the neighbor list can not
    /// be computed.
    pub fn bind(&self, system: &mut dyn System) -> Result<(), Error> {
        self.element_indexes(system)?;

        let cutoff = self.cutoff();
        log::debug!("using a neighbor list cutoff of {} Å for {}", cutoff, self.name());
        system.compute_neighbors(cutoff)?;
        return Ok(());
    }

    /// Compute the energy, forces and virial of the given system.
    ///
    /// # Errors
    ///
    /// This function returns an error if the system can not be used with this
    /// potential (see [`Potential::bind`]), if the options are invalid or if
    /// the internal buffers would need to grow past their limits.
    #[time_graph::instrument(name = "Potential::compute")]
    pub fn compute(&mut self, system: &mut dyn System, options: ComputeOptions<'_>) -> Result<BopOutput, Error> {
        let elements = self.element_indexes(system)?;
        system.compute_neighbors(self.cutoff())?;

        return self.kernel.compute(&*self.implementation, system, &elements, &options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::test_utils::test_system;

    #[test]
    fn registry() {
        let potential = Potential::new("tersoff", "{\"elements\": []}".into());
        assert_eq!(
            potential.unwrap_err().to_string(),
            "invalid parameter: Tersoff potential needs at least one element"
        );

        let error = Potential::new("stillinger-weber", "{}".into()).unwrap_err();
        assert_eq!(error.to_string(), "invalid parameter: unknown potential with name 'stillinger-weber'");

        let json = serde_json::to_string(&TersoffParameters::silicon()).unwrap();
        let potential = Potential::new("tersoff", json.clone()).unwrap();
        assert_eq!(potential.name(), "Tersoff potential");
        assert_eq!(potential.parameters(), json);
        assert_eq!(potential.atomic_types(), [14]);
        assert_eq!(potential.cutoff(), 3.0);
    }

    #[test]
    fn unknown_types() {
        let json = serde_json::to_string(&TersoffParameters::silicon()).unwrap();
        let mut potential = Potential::new("tersoff", json).unwrap();

        let mut system = test_system("SiC");
        let error = potential.bind(&mut system).unwrap_err();
        assert!(matches!(error, Error::UnknownElementType(6)));

        let error = potential.compute(&mut system, ComputeOptions::default()).unwrap_err();
        assert_eq!(error.to_string(), "unknown atomic type 6 for this potential");

        let mut system = test_system("Si-diamond");
        potential.bind(&mut system).unwrap();
        assert_eq!(system.pairs().unwrap().len(), 16);
    }

    #[test]
    fn custom_functions() {
        let tersoff = crate::potentials::Tersoff::new(TersoffParameters::silicon_carbide()).unwrap();
        let mut potential = Potential::from(Box::new(tersoff) as Box<dyn PotentialFunctions>);
        assert_eq!(potential.atomic_types(), [14, 6]);

        let mut system = test_system("SiC");
        let output = potential.compute(&mut system, ComputeOptions::default()).unwrap();
        assert!(output.energy < 0.0);
        assert_eq!(potential.kernel().bonds().len(), 32);
    }
}
