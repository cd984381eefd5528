use crate::env_var::config;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

pub(crate) mod local_comm;
use local_comm::LocalComm;

pub(crate) mod shmem_comm;
use shmem_comm::ShmemComm;

/// The list of available communication backends, used to specify how the
/// processes of a job find each other and synchronize
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
pub enum Backend {
    /// The Local backend -- intended for single process environments
    Local,
    /// The Shmem backend -- intended for multi process single node environments
    Shmem,
}

impl Default for Backend {
    fn default() -> Self {
        match config().backend.as_str() {
            "shmem" => {
                return Backend::Shmem;
            }
            _ => {
                return Backend::Local;
            }
        }
    }
}

#[enum_dispatch]
pub(crate) trait CommOps {
    fn my_pe(&self) -> usize;
    fn num_pes(&self) -> usize;
    // this is a collective barrier across every pe of the job
    fn barrier(&self);
    fn backend(&self) -> Backend;
}

#[enum_dispatch(CommOps)]
#[derive(Debug)]
pub(crate) enum Comm {
    LocalComm,
    ShmemComm,
}

pub(crate) fn create_comm(backend: Backend) -> Result<Comm> {
    match backend {
        Backend::Local => Ok(LocalComm::new().into()),
        Backend::Shmem => Ok(ShmemComm::new()?.into()),
    }
}
