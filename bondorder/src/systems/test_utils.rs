use crate::Vector3D;
use super::{UnitCell, SimpleSystem};

/// Lattice parameter of silicon in the diamond structure
pub const SILICON_LATTICE: f64 = 5.431;
/// Lattice parameter of cubic silicon carbide in the zincblende structure
pub const SILICON_CARBIDE_LATTICE: f64 = 4.36;

pub fn test_system(name: &str) -> SimpleSystem {
    match name {
        "Si2" => get_silicon_dimer(),
        "Si-diamond" => diamond(14, 14, SILICON_LATTICE),
        "Si-distorted" => get_distorted_silicon(),
        "SiC" => diamond(14, 6, SILICON_CARBIDE_LATTICE),
        _ => panic!("unknown test system {}", name)
    }
}

/// Conventional 8 atoms cubic cell of the diamond (`first == second`) or
/// zincblende structure, with lattice parameter `a`
pub fn diamond(first: i32, second: i32, a: f64) -> SimpleSystem {
    let fcc = [
        [0.0, 0.0, 0.0],
        [0.0, 0.5, 0.5],
        [0.5, 0.0, 0.5],
        [0.5, 0.5, 0.0],
    ];

    let mut system = SimpleSystem::new(UnitCell::cubic(a));
    for site in &fcc {
        system.add_atom(first, a * Vector3D::from(*site));
    }
    for site in &fcc {
        let position = Vector3D::new(site[0] + 0.25, site[1] + 0.25, site[2] + 0.25);
        system.add_atom(second, a * position);
    }
    return system;
}

/// Three atoms of type `atomic_type`, with the center atom at the origin,
/// the first neighbor at distance `r_1` along x and the second neighbor at
/// distance `r_2` in the xy plane, making an angle `theta` (in radians) with
/// the first one.
pub fn trimer(atomic_type: i32, r_1: f64, r_2: f64, theta: f64) -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::infinite());
    system.add_atom(atomic_type, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(atomic_type, Vector3D::new(r_1, 0.0, 0.0));
    system.add_atom(atomic_type, Vector3D::new(r_2 * f64::cos(theta), r_2 * f64::sin(theta), 0.0));
    return system;
}

/// Two atoms along z at the distance `r`, without periodic boundary
/// conditions
pub fn dimer(atomic_type: i32, r: f64) -> SimpleSystem {
    let mut system = SimpleSystem::new(UnitCell::infinite());
    system.add_atom(atomic_type, Vector3D::new(0.0, 0.0, 0.0));
    system.add_atom(atomic_type, Vector3D::new(0.0, 0.0, r));
    return system;
}

fn get_silicon_dimer() -> SimpleSystem {
    dimer(14, 2.35)
}

/// Deterministic pseudo-random displacement, up to `amplitude` in each
/// direction
fn displacement(atom: usize, amplitude: f64) -> Vector3D {
    let x = atom as f64;
    return amplitude * Vector3D::new(
        f64::sin(1.7 * x + 0.3),
        f64::sin(2.9 * x + 1.1),
        f64::cos(0.7 * x + 2.3),
    );
}

/// Silicon diamond with atoms displaced from their equilibrium positions and
/// a slightly strained triclinic cell
fn get_distorted_silicon() -> SimpleSystem {
    let mut system = diamond(14, 14, SILICON_LATTICE);
    system.deform(&crate::Matrix3::new([
        [0.011, 0.004, -0.006],
        [0.0, -0.008, 0.007],
        [0.003, 0.0, 0.005],
    ]));

    for (atom, position) in system.positions_mut().iter_mut().enumerate() {
        *position += displacement(atom, 0.12);
    }
    return system;
}
