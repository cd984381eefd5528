use anyhow::{anyhow, Result};
use ocl::{Buffer, ProQue};

// double precision requires the fp64 extension, advertised by every device
// this backend is intended for
const VEC_ADD_SRC: &str = r#"
    #pragma OPENCL EXTENSION cl_khr_fp64 : enable
    __kernel void vec_add(__global const double* a,
                          __global const double* b,
                          __global double* c,
                          int n) {
        int i = get_global_id(0);
        if (i < n) {
            c[i] = a[i] + b[i];
        }
    }
"#;

pub(crate) fn vec_add(a: &[f64], b: &[f64], c: &mut [f64]) -> Result<()> {
    enq_vec_add(a, b, c).map_err(|e| anyhow!("OpenCL vec_add failed: {}", e))
}

fn enq_vec_add(a: &[f64], b: &[f64], c: &mut [f64]) -> ocl::Result<()> {
    let n = c.len();
    let pro_que = ProQue::builder().src(VEC_ADD_SRC).dims(n).build()?;
    let a_buf = Buffer::<f64>::builder()
        .queue(pro_que.queue().clone())
        .len(n)
        .copy_host_slice(a)
        .build()?;
    let b_buf = Buffer::<f64>::builder()
        .queue(pro_que.queue().clone())
        .len(n)
        .copy_host_slice(b)
        .build()?;
    let c_buf: Buffer<f64> = pro_que.create_buffer()?;
    let kernel = pro_que
        .kernel_builder("vec_add")
        .arg(&a_buf)
        .arg(&b_buf)
        .arg(&c_buf)
        .arg(n as i32)
        .build()?;
    unsafe {
        kernel.enq()?;
    }
    c_buf.read(&mut *c).enq()?;
    pro_que.queue().finish()?;
    Ok(())
}
