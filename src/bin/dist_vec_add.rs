/// ------------Vecadd: distributed accelerator assignment---------------
/// Forms a world of cooperating processes, discovers the accelerators
/// visible on this host, assigns exactly one to each pe by the modulo rule
/// and reports the assignment. After a collective barrier every pe then
/// performs the offloaded addition redundantly and prints the normalized
/// sum. Launch a multi process job with:
///     ./vecadd_run.sh -N=4 ./target/release/dist_vec_add
/// ---------------------------------------------------------------------
use vecadd::accelerator::{assignment_report, AcceleratorCatalog};
use vecadd::offload::{fill_trig_inputs, normalized_sum, Offload};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let world = vecadd::WorldBuilder::new().build()?;

    let catalog = AcceleratorCatalog::discover();
    print!("{}", assignment_report(&world, &catalog)?);

    // the numeric phase never starts before every pe has reported
    world.barrier();

    let n = vecadd::VEC_SIZE;
    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut c = vec![0.0; n];
    fill_trig_inputs(&mut a, &mut b);

    // every pe computes the full addition redundantly, the accelerator
    // assignment above is observational
    Offload::default().vec_add(&a, &b, &mut c)?;

    println!("final result: {:.6}", normalized_sum(&c));
    Ok(())
}
