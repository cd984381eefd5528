use super::{Backend, CommOps};

pub(crate) struct LocalComm {
    my_pe: usize,
    num_pes: usize,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Local")
    }
}

impl LocalComm {
    pub(crate) fn new() -> LocalComm {
        LocalComm {
            my_pe: 0,
            num_pes: 1,
        }
    }
}

impl CommOps for LocalComm {
    fn my_pe(&self) -> usize {
        self.my_pe
    }
    fn num_pes(&self) -> usize {
        self.num_pes
    }
    fn barrier(&self) {
        // a single pe is always at the barrier with itself
    }
    fn backend(&self) -> Backend {
        Backend::Local
    }
}
