use bondorder::{ComputeOptions, Potential, SimpleSystem, System, UnitCell, Vector3D};
use bondorder::potentials::TersoffParameters;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let size = match std::env::args().nth(1) {
        Some(size) => size.parse()?,
        None => 4,
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    // run the calculation
    let energy = compute_silicon(size)?;
    println!("energy = {} eV", energy);

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

/// Compute energy, forces and virial of a distorted silicon supercell with
/// the Tersoff potential
fn compute_silicon(size: usize) -> Result<f64, Box<dyn std::error::Error>> {
    let a = 5.431;
    let sites = [
        [0.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.5, 0.0, 0.5], [0.5, 0.5, 0.0],
        [0.25, 0.25, 0.25], [0.25, 0.75, 0.75], [0.75, 0.25, 0.75], [0.75, 0.75, 0.25],
    ];

    let mut cell = SimpleSystem::new(UnitCell::cubic(a));
    for (i, site) in sites.iter().enumerate() {
        let x = i as f64;
        let noise = Vector3D::new(f64::sin(1.7 * x), f64::sin(2.9 * x), f64::cos(0.7 * x));
        cell.add_atom(14, a * Vector3D::from(*site) + 0.1 * noise);
    }
    let mut system = cell.supercell([size, size, size])?;

    let parameters = serde_json::to_string(&TersoffParameters::silicon())?;
    let output = time_graph::spanned!("Full calculation", {
        let mut potential = Potential::new("tersoff", parameters)?;

        let options = ComputeOptions {
            per_atom: true,
            ..Default::default()
        };
        potential.compute(&mut system, options)?
    });

    println!("computed {} atoms", system.size()?);
    Ok(output.energy)
}
