use super::{Backend, CommOps};
use crate::env_var::config;

use anyhow::{bail, Context, Result};
use shared_memory::{Shmem, ShmemConf, ShmemError};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::trace;

// value stored in the segment header once pe 0 has zeroed the slots
const SEGMENT_READY: usize = 1;

struct Segment {
    data: *mut u8,
    _shmem: Shmem,
}
unsafe impl Sync for Segment {}
unsafe impl Send for Segment {}

impl Segment {
    fn as_ptr(&self) -> *mut u8 {
        self.data
    }
}

fn attach_to_shmem(size: usize, id: &str, job_id: usize, create: bool) -> Result<Segment> {
    let header_len = std::mem::size_of::<AtomicUsize>();
    let size = size + header_len;
    let shmem_id = format!("vecadd_{}_{}_{}", job_id, size, id);
    let m = match ShmemConf::new().size(size).os_id(&shmem_id).create() {
        Ok(m) => {
            trace!("created {:?}", shmem_id);
            m
        }
        Err(ShmemError::LinkExists) | Err(ShmemError::MappingIdExists) => {
            let m = ShmemConf::new()
                .os_id(&shmem_id)
                .open()
                .with_context(|| format!("unable to attach to shared memory {:?}", shmem_id))?;
            trace!("attached {:?}", shmem_id);
            m
        }
        Err(e) => bail!("unable to create shared memory {:?} {:?}", shmem_id, e),
    };
    let header = unsafe { &*(m.as_ptr() as *const AtomicUsize) };
    if create {
        unsafe {
            std::ptr::write_bytes(m.as_ptr().add(header_len), 0u8, size - header_len);
        }
        header.store(SEGMENT_READY, Ordering::SeqCst);
    }
    while header.load(Ordering::SeqCst) != SEGMENT_READY {
        std::thread::yield_now();
    }
    unsafe {
        Ok(Segment {
            data: m.as_ptr().add(header_len),
            _shmem: m,
        })
    }
}

pub(crate) struct ShmemComm {
    _segment: Segment,
    slots: *const AtomicUsize, // one barrier generation slot per pe
    barrier_cnt: AtomicUsize,
    pub(crate) my_pe: usize,
    pub(crate) num_pes: usize,
}

unsafe impl Sync for ShmemComm {}
unsafe impl Send for ShmemComm {}

impl std::fmt::Debug for ShmemComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Shmem {{ my_pe: {}, num_pes: {} }}",
            self.my_pe, self.num_pes
        )
    }
}

impl ShmemComm {
    pub(crate) fn new() -> Result<ShmemComm> {
        let num_pes = match env::var("VECADD_NUM_PES") {
            Ok(val) => val
                .parse::<usize>()
                .context("VECADD_NUM_PES must be a positive integer")?,
            Err(_e) => 1,
        };
        let my_pe = match env::var("VECADD_PE_ID") {
            Ok(val) => val
                .parse::<usize>()
                .context("VECADD_PE_ID must be a non negative integer")?,
            Err(_e) => 0,
        };
        let job_id = match env::var("VECADD_JOB_ID") {
            Ok(val) => val
                .parse::<usize>()
                .context("VECADD_JOB_ID must be a non negative integer")?,
            Err(_e) => 0,
        };
        ShmemComm::attach(num_pes, my_pe, job_id)
    }

    pub(crate) fn attach(num_pes: usize, my_pe: usize, job_id: usize) -> Result<ShmemComm> {
        if num_pes == 0 {
            bail!("a shmem job requires at least one pe");
        }
        if my_pe >= num_pes {
            bail!("invalid pe id {} for a job of {} pes", my_pe, num_pes);
        }
        let size = num_pes * std::mem::size_of::<AtomicUsize>();
        let segment = attach_to_shmem(size, "barrier", job_id, my_pe == 0)?;
        let slots = segment.as_ptr() as *const AtomicUsize;
        Ok(ShmemComm {
            _segment: segment,
            slots,
            barrier_cnt: AtomicUsize::new(0),
            my_pe,
            num_pes,
        })
    }

    fn slots(&self) -> &[AtomicUsize] {
        unsafe { std::slice::from_raw_parts(self.slots, self.num_pes) }
    }
}

impl CommOps for ShmemComm {
    fn my_pe(&self) -> usize {
        self.my_pe
    }
    fn num_pes(&self) -> usize {
        self.num_pes
    }
    fn barrier(&self) {
        let barrier_id = self.barrier_cnt.fetch_add(1, Ordering::SeqCst) + 1;
        let slots = self.slots();
        slots[self.my_pe].store(barrier_id, Ordering::SeqCst);
        for pe in 0..self.num_pes {
            let mut s = Instant::now();
            // a peer may already have advanced past barrier_id, hence `<`
            while slots[pe].load(Ordering::SeqCst) < barrier_id {
                std::thread::yield_now();
                if s.elapsed().as_secs_f64() > config().deadlock_timeout {
                    println!("[WARNING] Potential deadlock detected.\n\
                    Barrier is a collective operation requiring every pe of the job to enter the barrier call.\n\
                    You may be seeing this message if a pe exited prematurely or was never launched.\n\
                    The deadlock timeout can be set via the VECADD_DEADLOCK_TIMEOUT environment variable (current timeout {} seconds)", config().deadlock_timeout);
                    s = Instant::now();
                }
            }
        }
    }
    fn backend(&self) -> Backend {
        Backend::Shmem
    }
}
