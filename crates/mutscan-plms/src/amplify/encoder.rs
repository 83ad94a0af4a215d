use super::config::AMPLIFYConfig;
use super::rotary::apply_rotary_emb;
use candle_core::{Module, Result, Tensor, D};
use candle_nn::{linear_b, ops::softmax_last_dim, rms_norm, Linear, RmsNorm, VarBuilder};

/// One pre-norm transformer layer: rotary self-attention then a SwiGLU
/// feed-forward block, each with a residual connection.
///
/// - [SwiGLU](https://github.com/facebookresearch/xformers/blob/main/xformers/ops/swiglu_op.py#L462)
#[derive(Debug)]
pub struct EncoderBlock {
    q: Linear,
    k: Linear,
    v: Linear,
    wo: Linear,
    w12: Linear,
    w3: Linear,
    attention_norm: RmsNorm,
    ffn_norm: RmsNorm,
    num_heads: usize,
    d_head: usize,
}

impl EncoderBlock {
    pub fn load(vb: VarBuilder, config: &AMPLIFYConfig, layer: usize) -> Result<Self> {
        let vb = vb.pp(layer);
        let hidden = config.hidden_size;
        let swiglu = config.swiglu_size();
        let att = |name: &str| linear_b(hidden, hidden, config.att_bias, vb.pp(name));
        Ok(Self {
            q: att("q")?,
            k: att("k")?,
            v: att("v")?,
            wo: att("wo")?,
            w12: linear_b(hidden, swiglu * 2, config.ffn_bias, vb.pp("ffn.w12"))?,
            w3: linear_b(swiglu, hidden, config.ffn_bias, vb.pp("ffn.w3"))?,
            attention_norm: rms_norm(hidden, config.norm_eps, vb.pp("attention_norm"))?,
            ffn_norm: rms_norm(hidden, config.norm_eps, vb.pp("ffn_norm"))?,
            num_heads: config.num_attention_heads,
            d_head: config.head_dim(),
        })
    }

    pub fn forward(&self, x: &Tensor, freqs_cis: &Tensor) -> Result<Tensor> {
        let attn = self.attention(&self.attention_norm.forward(x)?, freqs_cis)?;
        let x = (x + attn)?;
        let ffn = self.ffn(&self.ffn_norm.forward(&x)?)?;
        x + ffn
    }

    fn ffn(&self, x: &Tensor) -> Result<Tensor> {
        let w12 = self.w12.forward(x)?;
        let chunks = w12.chunk(2, D::Minus1)?;
        let hidden = (chunks[0].silu()? * &chunks[1])?;
        self.w3.forward(&hidden)
    }

    fn attention(&self, x: &Tensor, freqs_cis: &Tensor) -> Result<Tensor> {
        let (b_sz, seq_len, _) = x.dims3()?;
        let heads = |t: Tensor| t.reshape((b_sz, seq_len, self.num_heads, self.d_head));
        let xq = heads(self.q.forward(x)?)?;
        let xk = heads(self.k.forward(x)?)?;
        let xv = heads(self.v.forward(x)?)?;
        let (xq, xk) = apply_rotary_emb(&xq, &xk, freqs_cis)?;

        // [batch, heads, seq, d_head]
        let xq = xq.permute((0, 2, 1, 3))?.contiguous()?;
        let xk = xk.permute((0, 2, 1, 3))?.contiguous()?;
        let xv = xv.permute((0, 2, 1, 3))?.contiguous()?;
        let scale = 1.0 / (self.d_head as f64).sqrt();
        let scores = (xq.matmul(&xk.t()?)? * scale)?;
        let attn = softmax_last_dim(&scores)?.matmul(&xv)?;

        let attn = attn
            .permute((0, 2, 1, 3))?
            .reshape((b_sz, seq_len, self.num_heads * self.d_head))?;
        self.wo.forward(&attn)
    }
}
