use assert_cmd::Command;
use serial_test::serial;

const DEVICES: &str = "0000:03:00.0,0000:82:00.0";

#[test]
#[serial]
fn sequential_version_reports_unit_result() {
    let output = Command::cargo_bin("vec_add")
        .unwrap()
        .env("VECADD_OFFLOAD", "sequential")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Running the sequential version"));
    assert!(stdout.contains("Adding vectors of size 100000"));
    assert!(stdout.contains("final result: 1.000000"));
    assert!(stdout.contains("Time taken T[secs] = "));
}

#[test]
#[serial]
fn threads_version_reports_unit_result() {
    let output = Command::cargo_bin("vec_add")
        .unwrap()
        .env("VECADD_OFFLOAD", "threads")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Running the threads version"));
    assert!(stdout.contains("final result: 1.000000"));
}

#[test]
#[serial]
fn dist_reports_assignment_then_result() {
    let output = Command::cargo_bin("dist_vec_add")
        .unwrap()
        .env("VECADD_BACKEND", "local")
        .env("VECADD_OFFLOAD", "sequential")
        .env("VECADD_VISIBLE_DEVICES", DEVICES)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Rank 0/1 from "));
    assert!(stdout.contains("sees 2 GPUs, assigned GPU is 0000:03:00.0"));
    assert!(stdout.contains("Other 1 GPUs are:"));
    assert!(stdout.contains("** gpu 1: 0000:82:00.0 **"));
    assert!(stdout.contains("final result: 1.000000"));
}

#[test]
#[serial]
fn dist_fails_fast_without_accelerators() {
    let output = Command::cargo_bin("dist_vec_add")
        .unwrap()
        .env("VECADD_BACKEND", "local")
        .env("VECADD_OFFLOAD", "sequential")
        .env("VECADD_VISIBLE_DEVICES", "")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no accelerators"));
}

// a real two process shmem job: both pes must form the world, pass the
// collective barrier and report their own rank
#[test]
#[serial]
fn shmem_job_runs_every_pe() {
    let job_id = std::process::id().to_string();
    let children: Vec<_> = (0..2)
        .map(|pe| {
            std::process::Command::new(env!("CARGO_BIN_EXE_dist_vec_add"))
                .env("VECADD_BACKEND", "shmem")
                .env("VECADD_OFFLOAD", "sequential")
                .env("VECADD_NUM_PES", "2")
                .env("VECADD_PE_ID", pe.to_string())
                .env("VECADD_JOB_ID", &job_id)
                .env("VECADD_VISIBLE_DEVICES", DEVICES)
                .stdout(std::process::Stdio::piped())
                .spawn()
                .unwrap()
        })
        .collect();
    for (pe, child) in children.into_iter().enumerate() {
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains(&format!("Rank {}/2 from ", pe)));
        assert!(stdout.contains(&format!(
            "assigned GPU is 0000:{}:00.0",
            if pe == 0 { "03" } else { "82" }
        )));
        assert!(stdout.contains("final result: 1.000000"));
    }
}
