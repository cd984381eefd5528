/// ------------Vecadd: offloaded elementwise addition-------------------
/// Adds two vectors filled with the sin^2/cos^2 pattern through the
/// configured offload backend and prints the normalized sum (which should
/// equal 1 within error) along with the duration of the addition call.
/// The backend is selected via the VECADD_OFFLOAD environment variable.
/// ---------------------------------------------------------------------
use std::time::Instant;

use vecadd::offload::{fill_trig_inputs, normalized_sum, Offload};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let offload = Offload::default();
    println!("Running the {} version", offload.name());

    let n = vecadd::VEC_SIZE;
    println!("Adding vectors of size {}", n);

    let mut a = vec![0.0; n];
    let mut b = vec![0.0; n];
    let mut c = vec![0.0; n];
    fill_trig_inputs(&mut a, &mut b);

    let start = Instant::now();
    offload.vec_add(&a, &b, &mut c)?;
    let elapsed = start.elapsed().as_secs_f64();

    println!("final result: {:.6}", normalized_sum(&c));
    println!("Time taken T[secs] = {:.6}", elapsed);
    Ok(())
}
