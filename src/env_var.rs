use std::sync::OnceLock;

use serde::Deserialize;

fn default_deadlock_timeout() -> f64 {
    600.0
}

fn default_backend() -> String {
    "local".to_owned()
}

fn default_offload() -> String {
    #[cfg(feature = "enable-ocl")]
    return "ocl".to_owned();
    #[cfg(not(feature = "enable-ocl"))]
    return "sequential".to_owned();
}

fn default_threads() -> usize {
    match std::thread::available_parallelism() {
        Ok(n) => n.into(),
        Err(_) => 4,
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    /// A timeout in seconds after which a stalled collective barrier prints a warning, default: 600.0 seconds
    #[serde(default = "default_deadlock_timeout")]
    pub deadlock_timeout: f64,

    /// The communication backend to use
    /// local -- single process execution, the default
    /// shmem -- multi process single node execution
    #[serde(default = "default_backend")]
    pub backend: String, //shmem,local

    /// The offload backend used for the elementwise addition
    /// ocl -- OpenCL device offload, default if the enable-ocl feature is turned on
    /// threads -- host thread pool
    /// sequential -- plain loop on the calling thread, default otherwise
    #[serde(default = "default_offload")]
    pub offload: String, //ocl,threads,sequential

    /// Number of worker threads used by the threads offload backend
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Comma separated accelerator identifiers overriding discovery,
    /// following the CUDA_VISIBLE_DEVICES convention. An empty value means
    /// no accelerators are visible.
    pub visible_devices: Option<String>,
}

/// Get the current Environment Variable configuration
pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| match envy::prefixed("VECADD_").from_env::<Config>() {
        Ok(config) => config,
        Err(error) => panic!("{}", error),
    })
}
