//! Tests of the Tersoff potential through the full kernel: reference
//! energies, finite differences and symmetry properties.
use approx::assert_relative_eq;

use bondorder::ComputeOptions;
use bondorder::potentials::TersoffParameters;
use self::utils::{test_system, diamond};

mod utils;

#[test]
fn silicon_cohesive_energy() {
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon());
    let system = test_system("Si-diamond");

    let energy = utils::energy(&mut potential, &system, ComputeOptions::default());
    assert_relative_eq!(energy / 8.0, -4.6296, epsilon = 1e-4);

    // all forces vanish by symmetry in the perfect crystal
    let output = potential.compute(&mut system.clone(), ComputeOptions::default()).unwrap();
    for force in &output.forces {
        assert_relative_eq!(force.norm(), 0.0, epsilon = 1e-10);
    }
}

#[test]
fn equation_of_state() {
    // the energy is minimal close to the experimental lattice parameter
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon());

    let mut previous = f64::INFINITY;
    let mut minimum = 0.0;
    for step in 0..21 {
        let a = 5.2 + 0.025 * step as f64;
        let energy = utils::energy(&mut potential, &diamond(14, 14, a), ComputeOptions::default());
        if energy < previous {
            minimum = a;
        }
        previous = f64::min(previous, energy);
    }

    assert_relative_eq!(minimum, 5.43, epsilon = 0.03);
}

#[test]
fn finite_differences() {
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon());
    for name in ["Si-distorted", "Si-cluster"] {
        let system = test_system(name);
        utils::check_forces(&mut potential, &system, ComputeOptions::default(), utils::tolerance(1e-6));
        utils::check_invariants(&mut potential, &system, ComputeOptions::default());
    }

    let system = test_system("Si-distorted");
    utils::check_virial(&mut potential, &system, ComputeOptions::default(), utils::tolerance(1e-6));
}

#[test]
fn silicon_carbide() {
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon_carbide());
    let system = test_system("SiC-distorted");
    utils::check_forces(&mut potential, &system, ComputeOptions::default(), utils::tolerance(1e-6));
    utils::check_virial(&mut potential, &system, ComputeOptions::default(), utils::tolerance(1e-6));
    utils::check_invariants(&mut potential, &system, ComputeOptions::default());
}

#[test]
fn periodic_tiling() {
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon());
    let options = ComputeOptions { per_atom: true, ..Default::default() };

    let mut system = test_system("Si-distorted");
    let small = potential.compute(&mut system, options).unwrap();
    let small_energies = small.atom_energies.unwrap();

    let mut supercell = system.supercell([2, 2, 2]).unwrap();
    let large = potential.compute(&mut supercell, options).unwrap();
    let large_energies = large.atom_energies.unwrap();

    assert_eq!(large_energies.len(), 64);
    for image in 0..8 {
        for atom in 0..8 {
            assert_relative_eq!(large_energies[8 * image + atom], small_energies[atom], epsilon = 1e-10);
            assert_relative_eq!(large.forces[8 * image + atom], small.forces[atom], epsilon = 1e-10);
        }
    }

    assert_relative_eq!(large.energy, 8.0 * small.energy, max_relative = 1e-12);
    assert_relative_eq!(large.virial, small.virial * 8.0, epsilon = 1e-8);
}

#[test]
fn per_atom_virial() {
    let mut potential = utils::potential("tersoff", &TersoffParameters::silicon());
    let options = ComputeOptions { per_atom: true, ..Default::default() };

    let mut system = test_system("Si-cluster");
    let output = potential.compute(&mut system, options).unwrap();
    let atom_virials = output.atom_virials.unwrap();

    for i in 0..3 {
        for j in 0..3 {
            let sum = atom_virials.slice(ndarray::s![.., i, j]).sum();
            assert_relative_eq!(sum, output.virial[i][j], epsilon = 1e-10);
        }
    }
}
