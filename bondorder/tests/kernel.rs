//! Tests of the kernel behavior which do not depend on a specific potential:
//! buffer management, exclusion masks and input validation.
use approx::assert_relative_eq;

use bondorder::{BufferOptions, ComputeOptions, Error, ExclusionPolicy, Potential};
use bondorder::{SimpleSystem, Status, System, Vector3D};
use bondorder::potentials::{ScreeningMetric, TersoffParameters};
use self::utils::{dimer, test_system, trimer};

mod utils;

fn tersoff() -> Potential {
    utils::potential("tersoff", &TersoffParameters::silicon())
}

fn screened_tersoff() -> Potential {
    let parameters = TersoffParameters::silicon().screened(utils::screening(ScreeningMetric::Ellipse));
    utils::potential("tersoff", &parameters)
}

#[test]
fn buffer_growth() {
    for create in [tersoff, screened_tersoff] {
        let system = test_system("Si-distorted");
        let options = ComputeOptions { per_atom: true, ..Default::default() };

        let mut reference = create();
        let expected = reference.compute(&mut system.clone(), options).unwrap();

        let mut potential = create();
        potential.set_buffer_options(BufferOptions {
            initial_bonds_per_atom: 1,
            initial_screening_per_bond: 0,
            ..Default::default()
        }).unwrap();

        // buffers keep their size from one calculation to the next
        for _ in 0..2 {
            let output = potential.compute(&mut system.clone(), options).unwrap();
            assert_relative_eq!(output.energy, expected.energy, max_relative = 1e-12);
            for (actual, expected) in output.forces.iter().zip(&expected.forces) {
                assert_relative_eq!(actual, expected, epsilon = 1e-10);
            }
            assert_relative_eq!(output.virial, expected.virial, epsilon = 1e-10);
            assert_eq!(output.atom_energies.unwrap().len(), 8);
        }
    }
}

#[test]
fn capacity_exceeded() {
    let system = test_system("Si-diamond");

    let mut potential = tersoff();
    potential.set_buffer_options(BufferOptions {
        max_bonds: Some(10),
        ..Default::default()
    }).unwrap();
    let error = potential.compute(&mut system.clone(), ComputeOptions::default()).unwrap_err();
    assert!(matches!(error, Error::CapacityExceeded { buffer: "bonds", requested: 11, maximum: 10, growth_steps: None }));

    let mut potential = tersoff();
    potential.set_buffer_options(BufferOptions {
        initial_bonds_per_atom: 1,
        max_growth_steps: 1,
        ..Default::default()
    }).unwrap();
    let error = potential.compute(&mut system.clone(), ComputeOptions::default()).unwrap_err();
    assert!(matches!(error, Error::CapacityExceeded { buffer: "bonds", growth_steps: Some(1), .. }));
    assert!(error.to_string().ends_with("after 1 growth steps"));

    let mut potential = screened_tersoff();
    potential.set_buffer_options(BufferOptions {
        max_screening_records: Some(1),
        ..Default::default()
    }).unwrap();
    // a third atom partially screening the bond in both directions
    let mut system = dimer(14, 2.35);
    system.add_atom(14, Vector3D::new(1.4, 0.0, 1.175));
    let error = potential.compute(&mut system.clone(), ComputeOptions::default()).unwrap_err();
    assert!(matches!(error, Error::CapacityExceeded { buffer: "screening", .. }));

    // the potential can still be used after an error
    potential.set_buffer_options(BufferOptions::default()).unwrap();
    assert!(potential.compute(&mut system, ComputeOptions::default()).is_ok());
    assert!(potential.kernel().screening().records().len() >= 2);
}

#[test]
fn self_energy_mask() {
    let mut potential = tersoff();
    let system = test_system("Si-distorted");

    let options = ComputeOptions { per_atom: true, ..Default::default() };
    let full = potential.compute(&mut system.clone(), options).unwrap();
    let full_energies = full.atom_energies.unwrap();

    let mut mask = vec![false; 8];
    mask[0] = true;
    mask[5] = true;
    let options = ComputeOptions {
        per_atom: true,
        mask: Some(&mask),
        exclusion: ExclusionPolicy::SelfEnergy,
        ..Default::default()
    };
    let masked = potential.compute(&mut system.clone(), options).unwrap();
    let masked_energies = masked.atom_energies.unwrap();

    // masked atoms own no energy, the other atoms are unchanged
    for atom in 0..8 {
        if mask[atom] {
            assert_eq!(masked_energies[atom], 0.0);
        } else {
            assert_relative_eq!(masked_energies[atom], full_energies[atom], max_relative = 1e-12);
        }
    }
    assert_relative_eq!(masked.energy, masked_energies.sum(), max_relative = 1e-12);

    utils::check_forces(&mut potential, &system, options, utils::tolerance(1e-6));
    utils::check_virial(&mut potential, &system, options, utils::tolerance(1e-6));
    utils::check_invariants(&mut potential, &system, options);
}

#[test]
fn full_exclusion_mask() {
    for create in [tersoff, screened_tersoff] {
        let mut potential = create();
        let system = test_system("Si-distorted");

        let mut mask = vec![false; 8];
        mask[3] = true;
        let options = ComputeOptions {
            mask: Some(&mask),
            exclusion: ExclusionPolicy::Full,
            ..Default::default()
        };
        let masked = potential.compute(&mut system.clone(), options).unwrap();
        assert_eq!(masked.forces[3], Vector3D::zero());

        // same as removing the atom from the system
        let mut removed = SimpleSystem::new(system.cell().unwrap());
        let types = system.types().unwrap();
        let positions = system.positions().unwrap();
        for atom in (0..8).filter(|&atom| atom != 3) {
            removed.add_atom(types[atom], positions[atom]);
        }
        let expected = utils::energy(&mut potential, &removed, ComputeOptions::default());
        assert_relative_eq!(masked.energy, expected, max_relative = 1e-12);

        utils::check_forces(&mut potential, &system, options, utils::tolerance(1e-5));
        utils::check_invariants(&mut potential, &system, options);
    }
}

#[test]
fn cutoff_region() {
    // both bonds are inside the smoothing region of the cutoff
    let mut potential = tersoff();
    let system = trimer(14, 2.75, 2.9, 1.2);
    utils::check_forces(&mut potential, &system, ComputeOptions::default(), utils::tolerance(1e-6));
    utils::check_invariants(&mut potential, &system, ComputeOptions::default());
}

#[test]
fn input_validation() {
    let mut potential = tersoff();

    let mut system = test_system("SiC");
    let error = potential.compute(&mut system, ComputeOptions::default()).unwrap_err();
    assert!(matches!(error, Error::UnknownElementType(6)));

    let mut system = test_system("Si-diamond");
    let mask = vec![true; 7];
    let options = ComputeOptions { mask: Some(&mask), ..Default::default() };
    assert!(potential.compute(&mut system, options).is_err());

    let error = Potential::new("kumagai", r#"{"atomic_type": 14, "not_a_parameter": 1}"#.into()).unwrap_err();
    assert!(matches!(error, Error::Json(_)));

    let error = potential.set_buffer_options(BufferOptions { max_bonds: Some(0), ..Default::default() });
    assert!(error.is_err());
}

#[test]
fn empty_system() {
    let mut potential = tersoff();
    let mut system = SimpleSystem::new(bondorder::UnitCell::infinite());
    let output = potential.compute(&mut system, ComputeOptions::default()).unwrap();
    assert_eq!(output.energy, 0.0);
    assert!(output.forces.is_empty());
    assert_eq!(output.status, Status::Success);
}
