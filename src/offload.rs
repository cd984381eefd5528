use crate::env_var::config;

use anyhow::{ensure, Result};
use rayon::prelude::*;
use std::sync::OnceLock;
use tracing::*;

#[cfg(feature = "enable-ocl")]
pub(crate) mod ocl_offload;

/// The list of available offload backends, used to specify where the
/// iterations of the elementwise addition execute
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Offload {
    /// OpenCL device offload -- intended for hosts with an accelerator runtime
    #[cfg(feature = "enable-ocl")]
    Ocl,
    /// Host thread pool sized by the VECADD_THREADS environment variable
    Threads,
    /// Plain loop on the calling thread
    Sequential,
}

impl Default for Offload {
    fn default() -> Self {
        match config().offload.as_str() {
            "ocl" => {
                #[cfg(feature = "enable-ocl")]
                return Offload::Ocl;
                #[cfg(not(feature = "enable-ocl"))]
                panic!("unable to select the ocl offload backend, recompile with 'enable-ocl' feature")
            }
            "threads" => {
                return Offload::Threads;
            }
            _ => {
                return Offload::Sequential;
            }
        }
    }
}

impl Offload {
    /// Short name of this backend, suitable for the startup report
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "enable-ocl")]
            Offload::Ocl => "ocl",
            Offload::Threads => "threads",
            Offload::Sequential => "sequential",
        }
    }

    /// Elementwise addition: writes `c[i] = a[i] + b[i]` for every i.
    ///
    /// The iterations are independent and may execute in any order across
    /// the backend's execution units; every index is written exactly once
    /// and the result is fully visible when the call returns. All backends
    /// produce identical results for the same inputs.
    #[tracing::instrument(skip_all)]
    pub fn vec_add(&self, a: &[f64], b: &[f64], c: &mut [f64]) -> Result<()> {
        ensure!(
            a.len() == b.len() && b.len() == c.len(),
            "vec_add requires equally sized input and output slices (got {}, {} and {})",
            a.len(),
            b.len(),
            c.len()
        );
        match self {
            #[cfg(feature = "enable-ocl")]
            Offload::Ocl => {
                if !c.is_empty() {
                    ocl_offload::vec_add(a, b, c)?;
                }
            }
            Offload::Threads => {
                thread_pool().install(|| {
                    c.par_iter_mut()
                        .enumerate()
                        .for_each(|(i, ci)| *ci = a[i] + b[i]);
                });
            }
            Offload::Sequential => {
                for i in 0..c.len() {
                    c[i] = a[i] + b[i];
                }
            }
        }
        trace!("vec_add of {} elements on the {} backend", c.len(), self.name());
        Ok(())
    }
}

fn thread_pool() -> &'static rayon::ThreadPool {
    static POOL: OnceLock<rayon::ThreadPool> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config().threads)
            .build()
            .expect("unable to build the offload thread pool")
    })
}

/// Fill the two input slices with the deterministic trigonometric pattern
/// `a[i] = sin(i)^2`, `b[i] = cos(i)^2`, so that `a[i] + b[i] == 1` for all
/// i within floating point tolerance.
pub fn fill_trig_inputs(a: &mut [f64], b: &mut [f64]) {
    debug_assert_eq!(a.len(), b.len());
    for (i, (ai, bi)) in a.iter_mut().zip(b.iter_mut()).enumerate() {
        let x = i as f64;
        *ai = x.sin() * x.sin();
        *bi = x.cos() * x.cos();
    }
}

/// Mean of the output vector. The empty reduction is defined as 0.0, so the
/// n = 0 boundary never divides by zero.
pub fn normalized_sum(c: &[f64]) -> f64 {
    if c.is_empty() {
        return 0.0;
    }
    c.iter().sum::<f64>() / c.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(n: usize) -> (Vec<f64>, Vec<f64>) {
        let a: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        let b: Vec<f64> = (0..n).map(|i| 1.0 / (i + 1) as f64).collect();
        (a, b)
    }

    #[test]
    fn elementwise_sum_is_exact() {
        let (a, b) = inputs(1000);
        for offload in [Offload::Sequential, Offload::Threads] {
            let mut c = vec![0.0; a.len()];
            offload.vec_add(&a, &b, &mut c).unwrap();
            for i in 0..a.len() {
                assert_eq!(c[i], a[i] + b[i]);
            }
        }
    }

    #[test]
    fn backends_produce_identical_results() {
        let (a, b) = inputs(4096);
        let mut sequential = vec![0.0; a.len()];
        let mut threads = vec![0.0; a.len()];
        Offload::Sequential.vec_add(&a, &b, &mut sequential).unwrap();
        Offload::Threads.vec_add(&a, &b, &mut threads).unwrap();
        assert_eq!(sequential, threads);
    }

    #[test]
    fn addition_is_idempotent() {
        let (a, b) = inputs(257);
        let mut first = vec![0.0; a.len()];
        let mut second = vec![0.0; a.len()];
        Offload::Sequential.vec_add(&a, &b, &mut first).unwrap();
        Offload::Sequential.vec_add(&a, &b, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_vectors_are_a_no_op() {
        let mut c: Vec<f64> = vec![];
        Offload::Sequential.vec_add(&[], &[], &mut c).unwrap();
        Offload::Threads.vec_add(&[], &[], &mut c).unwrap();
        assert_eq!(normalized_sum(&c), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut c = vec![0.0; 2];
        assert!(Offload::Sequential.vec_add(&[1.0], &[2.0, 3.0], &mut c).is_err());
        assert!(Offload::Sequential.vec_add(&[1.0, 2.0], &[2.0, 3.0], &mut c[..1]).is_err());
    }

    #[test]
    fn trig_identity_sums_to_one() {
        let n = crate::VEC_SIZE;
        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        fill_trig_inputs(&mut a, &mut b);
        let mut c = vec![0.0; n];
        Offload::Sequential.vec_add(&a, &b, &mut c).unwrap();
        assert!((normalized_sum(&c) - 1.0).abs() <= 1e-9);
        let mut c_threads = vec![0.0; n];
        Offload::Threads.vec_add(&a, &b, &mut c_threads).unwrap();
        assert_eq!(c, c_threads);
    }

    #[cfg(feature = "enable-ocl")]
    #[test]
    fn ocl_backend_matches_sequential() {
        if ocl::Platform::list().is_empty() {
            return; // no OpenCL runtime on this host
        }
        let n = 10_000;
        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        fill_trig_inputs(&mut a, &mut b);
        let mut sequential = vec![0.0; n];
        let mut device = vec![0.0; n];
        Offload::Sequential.vec_add(&a, &b, &mut sequential).unwrap();
        Offload::Ocl.vec_add(&a, &b, &mut device).unwrap();
        assert_eq!(sequential, device);
    }
}
