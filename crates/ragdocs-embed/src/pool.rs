use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean of the token vectors selected by `attention_mask`, L2-normalised.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` with 1 for real
/// tokens and 0 for padding. Returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, time, hidden_dim) = hidden.dims3()?;
    ensure!(attention_mask.dims() == [batch, time], "attention mask must be [{batch}, {time}], got {:?}", attention_mask.dims());

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_broadcast)?.sum(1)?;
    // all-padding rows would divide by zero
    let lengths = mask.sum_keepdim(1)?.maximum(1f64)?;
    let mean = sum.broadcast_div(&lengths)?;

    let eps_val = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6f64, _ => 1e-12f64 };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps_val)?;
    let normalised = mean.broadcast_div(&norm)?;
    ensure!(normalised.dims() == [batch, hidden_dim], "pooled shape {:?}", normalised.dims());
    Ok(normalised)
}
