//! Vecadd is a pair of pedagogical programs demonstrating elementwise vector
//! addition accelerated by (a) GPU discovery plus accelerator assignment
//! under a multi-process job and (b) a parallel loop offload with
//! interchangeable backends.
//!
//! The library provides three pieces:
//!
//! First, a [World] abstraction over the processes of one job. A world is
//! constructed through the [WorldBuilder] and captures this PE's rank, the
//! job size, and the hostname, along with a collective [barrier][World::barrier].
//! Two communication backends exist, one for single process development
//! ("local") and one for multi process single node execution ("shmem"),
//! selected via the VECADD_BACKEND environment variable or the builder.
//!
//! Second, an [accelerator catalog][accelerator::AcceleratorCatalog] produced
//! once at startup, holding the accelerators visible on the local host, and
//! the modulo rule assigning exactly one of them to each PE.
//!
//! Third, the [offloaded addition][offload::Offload]: `c[i] = a[i] + b[i]`
//! with the iterations declared independent, executed on an OpenCL device
//! (with the "enable-ocl" feature), a host thread pool, or sequentially.
//!
//! EXAMPLES
//! --------
//!
//! # Selecting a backend and constructing a world instance
//! ```
//! use vecadd::Backend;
//!
//! fn main() -> anyhow::Result<()> {
//!     let world = vecadd::WorldBuilder::new()
//!         .with_backend(Backend::Local) //or Backend::Shmem for a multi process job
//!         .build()?;
//!     println!("pe {} of {}", world.my_pe(), world.num_pes());
//!     world.barrier();
//!     Ok(())
//! }
//! ```
//!
//! # Assigning accelerators and offloading the addition
//! ```
//! use vecadd::accelerator::AcceleratorCatalog;
//! use vecadd::offload::{fill_trig_inputs, normalized_sum, Offload};
//!
//! fn main() -> anyhow::Result<()> {
//!     let world = vecadd::WorldBuilder::new().build()?;
//!     let catalog = AcceleratorCatalog::discover();
//!     let my_gpu = catalog.assign(world.my_pe())?;
//!     println!("pe {} uses {}", world.my_pe(), my_gpu.id());
//!
//!     let mut a = vec![0.0; vecadd::VEC_SIZE];
//!     let mut b = vec![0.0; vecadd::VEC_SIZE];
//!     let mut c = vec![0.0; vecadd::VEC_SIZE];
//!     fill_trig_inputs(&mut a, &mut b);
//!     Offload::default().vec_add(&a, &b, &mut c)?;
//!     println!("final result: {:.6}", normalized_sum(&c));
//!     Ok(())
//! }
//! ```

pub mod accelerator;
mod comm;
pub mod env_var;
pub mod offload;
mod world;

pub use crate::comm::Backend;
pub use crate::env_var::config;
pub use crate::world::{World, WorldBuilder};

/// Length of the vector triple, fixed at build time
pub const VEC_SIZE: usize = 100_000;
