use crate::comm::{create_comm, Backend, Comm, CommOps};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::*;

/// An abstraction representing all the PE's (processing elements) within a
/// given distributed execution.
///
/// A World captures the immutable job topology established at process group
/// formation: this PE's rank, the total number of PEs, and the hostname the
/// PE runs on. It also provides the collective [barrier][World::barrier]
/// every PE must reach before any may proceed past it.
#[derive(Debug)]
pub struct World {
    comm: Arc<Comm>,
    my_pe: usize,
    num_pes: usize,
    hostname: String,
}

impl World {
    /// Returns the id of this PE (roughly equivalent to MPI Rank)
    #[tracing::instrument(skip_all)]
    pub fn my_pe(&self) -> usize {
        self.my_pe
    }

    /// Returns the number of PE's in this execution
    #[tracing::instrument(skip_all)]
    pub fn num_pes(&self) -> usize {
        self.num_pes
    }

    /// Returns the hostname this PE runs on
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Collective barrier: blocks until every PE of the job has entered the
    /// barrier call. A PE that never arrives blocks the job indefinitely.
    #[tracing::instrument(skip_all)]
    pub fn barrier(&self) {
        self.comm.barrier();
    }

    /// The communication backend this world was built with
    pub fn backend(&self) -> Backend {
        self.comm.backend()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        // final collective synchronization so that no pe tears down shared
        // state while a peer still needs it
        self.comm.barrier();
    }
}

/// An implementation of the Builder design pattern, used to construct an
/// instance of a [World].
///
/// Allows for customizing the way the world is built, currently by selecting
/// the communication [Backend].
#[derive(Debug)]
pub struct WorldBuilder {
    backend: Backend,
}

impl WorldBuilder {
    /// Construct a new world builder, with the backend taken from the
    /// VECADD_BACKEND environment variable (default: local)
    #[tracing::instrument(skip_all)]
    pub fn new() -> WorldBuilder {
        WorldBuilder {
            backend: Default::default(),
        }
    }

    /// Specify the communication backend to use for this execution
    #[tracing::instrument(skip_all)]
    pub fn with_backend(mut self, backend: Backend) -> WorldBuilder {
        self.backend = backend;
        self
    }

    /// Instantiate a [World] object.
    ///
    /// Fails if the process group cannot be formed; a formation failure
    /// aborts this process before it enters any collective call.
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<World> {
        let comm = Arc::new(create_comm(self.backend)?);
        let hostname = hostname::get()
            .context("unable to resolve the local hostname")?
            .to_string_lossy()
            .into_owned();
        let world = World {
            my_pe: comm.my_pe(),
            num_pes: comm.num_pes(),
            hostname,
            comm,
        };
        trace!(
            "world formed: pe {} of {} on {}",
            world.my_pe,
            world.num_pes,
            world.hostname
        );
        world.barrier();
        Ok(world)
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        WorldBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_world() {
        let world = WorldBuilder::new()
            .with_backend(Backend::Local)
            .build()
            .unwrap();
        assert_eq!(world.my_pe(), 0);
        assert_eq!(world.num_pes(), 1);
        assert!(!world.hostname().is_empty());
        assert_eq!(world.backend(), Backend::Local);
        world.barrier();
    }
}
