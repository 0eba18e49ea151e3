//! Shared helpers for the integration tests: test systems, potentials with
//! reference parameters and finite differences checks of forces and virial.
#![allow(dead_code)]

use approx::assert_relative_eq;

use bondorder::{ComputeOptions, Matrix3, Potential, SimpleSystem};
use bondorder::math::CutoffFunction;
use bondorder::potentials::{ScreeningFunction, ScreeningMetric, ScreeningParameters};

mod systems;
pub use self::systems::{test_system, diamond, dimer, trimer};

/// Parameters of the finite differences checks
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifferenceOptions {
    /// displacement of the atoms (in Å), also used as the strain amplitude
    /// when checking the virial
    pub displacement: f64,
    pub max_relative: f64,
    pub epsilon: f64,
}

/// Finite differences options with a displacement of 1e-6, and the same
/// absolute and relative tolerance
pub fn tolerance(epsilon: f64) -> FiniteDifferenceOptions {
    FiniteDifferenceOptions {
        displacement: 1e-6,
        max_relative: epsilon,
        epsilon: epsilon,
    }
}

/// Create a potential through the registry, from its parameters
pub fn potential<P: serde::Serialize>(name: &str, parameters: &P) -> Potential {
    let json = serde_json::to_string(parameters).unwrap();
    return Potential::new(name, json).unwrap();
}

/// Screening parameters for which the second neighbors in diamond silicon
/// are fully screened by the first neighbors, and the first neighbors are
/// not screened at all
pub fn screening(metric: ScreeningMetric) -> ScreeningParameters {
    let (c_min, c_max) = match metric {
        ScreeningMetric::Ellipse => (0.5, 0.8),
        ScreeningMetric::Baskes => (0.4, 1.9),
    };

    ScreeningParameters {
        c_min: c_min,
        c_max: c_max,
        metric: metric,
        function: ScreeningFunction::Polynomial,
        outer_cutoff: 4.2,
        outer_cutoff_function: CutoffFunction::ShiftedCosine { width: 0.3 },
    }
}

pub fn energy(potential: &mut Potential, system: &SimpleSystem, options: ComputeOptions<'_>) -> f64 {
    let mut system = system.clone();
    return potential.compute(&mut system, options).unwrap().energy;
}

/// Check that the forces are the negative gradient of the energy with
/// respect to the atomic positions, using finite differences
pub fn check_forces(
    potential: &mut Potential,
    system: &SimpleSystem,
    options: ComputeOptions<'_>,
    finite_differences: FiniteDifferenceOptions,
) {
    let displacement = finite_differences.displacement;
    let output = potential.compute(&mut system.clone(), options).unwrap();

    for atom in 0..output.forces.len() {
        for xyz in 0..3 {
            let mut plus = system.clone();
            plus.positions_mut()[atom][xyz] += displacement;
            let energy_plus = energy(potential, &plus, options);

            let mut minus = system.clone();
            minus.positions_mut()[atom][xyz] -= displacement;
            let energy_minus = energy(potential, &minus, options);

            let finite_difference = -(energy_plus - energy_minus) / (2.0 * displacement);
            assert_relative_eq!(
                output.forces[atom][xyz], finite_difference,
                epsilon = finite_differences.epsilon,
                max_relative = finite_differences.max_relative,
            );
        }
    }
}

/// Check that the virial is the negative derivative of the energy with
/// respect to a homogeneous strain, using finite differences
pub fn check_virial(
    potential: &mut Potential,
    system: &SimpleSystem,
    options: ComputeOptions<'_>,
    finite_differences: FiniteDifferenceOptions,
) {
    let strain_amplitude = finite_differences.displacement;
    let output = potential.compute(&mut system.clone(), options).unwrap();

    for i in 0..3 {
        for j in 0..3 {
            let mut strain = Matrix3::zero();
            strain[i][j] = strain_amplitude;
            let mut plus = system.clone();
            plus.deform(&strain);
            let energy_plus = energy(potential, &plus, options);

            strain[i][j] = -strain_amplitude;
            let mut minus = system.clone();
            minus.deform(&strain);
            let energy_minus = energy(potential, &minus, options);

            let finite_difference = -(energy_plus - energy_minus) / (2.0 * strain_amplitude);
            assert_relative_eq!(
                output.virial[i][j], finite_difference,
                epsilon = finite_differences.epsilon,
                max_relative = finite_differences.max_relative,
            );
        }
    }
}

/// Check that the forces sum to zero and that the virial is symmetric
pub fn check_invariants(potential: &mut Potential, system: &SimpleSystem, options: ComputeOptions<'_>) {
    let output = potential.compute(&mut system.clone(), options).unwrap();

    let total = output.forces.iter().copied().sum::<bondorder::Vector3D>();
    assert_relative_eq!(total, bondorder::Vector3D::zero(), epsilon = 1e-10);
    assert_relative_eq!(output.virial, output.virial.transposed(), epsilon = 1e-10);
}
