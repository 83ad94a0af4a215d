use candle_core::{DType, Device, Result, Tensor, D};

/// Rotary frequencies as `[seq_len, head_dim / 2, 2]` (cos, sin) pairs.
pub fn precompute_freqs_cis(head_dim: usize, seq_len: usize) -> Result<Tensor> {
    let theta: f32 = 10000.0;
    let freqs: Vec<f32> = (0..head_dim / 2)
        .map(|i| 1.0 / theta.powf((2 * i) as f32 / head_dim as f32))
        .collect();
    let freqs = Tensor::new(freqs.as_slice(), &Device::Cpu)?;
    let t = Tensor::arange(0u32, seq_len as u32, &Device::Cpu)?.to_dtype(DType::F32)?;
    let angles = t.unsqueeze(1)?.matmul(&freqs.unsqueeze(0)?)?;
    Tensor::stack(&[angles.cos()?, angles.sin()?], D::Minus1)
}

/// Rotate query and key, `[batch, seq, heads, head_dim]`, treating adjacent
/// channel pairs as complex numbers.
pub fn apply_rotary_emb(xq: &Tensor, xk: &Tensor, freqs_cis: &Tensor) -> Result<(Tensor, Tensor)> {
    let (b_sz, seq_len, h, head_dim) = xq.dims4()?;
    let half = head_dim / 2;
    let freqs_cis = freqs_cis.narrow(0, 0, seq_len)?;
    // [1, seq, 1, half]
    let cos = freqs_cis.narrow(2, 0, 1)?.squeeze(2)?.unsqueeze(0)?.unsqueeze(2)?;
    let sin = freqs_cis.narrow(2, 1, 1)?.squeeze(2)?.unsqueeze(0)?.unsqueeze(2)?;

    let rotate = |x: &Tensor| -> Result<Tensor> {
        let x = x.reshape((b_sz, seq_len, h, half, 2))?;
        let re = x.narrow(4, 0, 1)?.squeeze(4)?;
        let im = x.narrow(4, 1, 1)?.squeeze(4)?;
        let out_re = (re.broadcast_mul(&cos)? - im.broadcast_mul(&sin)?)?;
        let out_im = (re.broadcast_mul(&sin)? + im.broadcast_mul(&cos)?)?;
        Tensor::stack(&[out_re, out_im], 4)?.reshape((b_sz, seq_len, h, head_dim))
    };
    Ok((rotate(xq)?, rotate(xk)?))
}
