use candle_core::{Result, Tensor};

/// Mean binary cross-entropy computed from logits.
///
/// Uses `max(x, 0) - x * y + ln(1 + exp(-|x|))`, which stays finite for
/// saturated logits.
pub fn binary_cross_entropy_with_logits(logits: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    logits
        .relu()?
        .sub(&logits.mul(targets)?)?
        .add(&softplus)?
        .mean_all()
}
