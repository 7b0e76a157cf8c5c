//! Weighted and uniform random choice.
//!
//! Every random decision in the simulation goes through this module so a
//! seeded generator reproduces a settlement exactly.

use rand::Rng;

/// Errors raised for malformed choice inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChoiceError {
    /// The weights or items cannot be drawn from.
    #[error("invalid weighted choice: {reason}")]
    InvalidArgument {
        /// What was wrong with the input.
        reason: String,
    },
}

fn invalid(reason: impl Into<String>) -> ChoiceError {
    ChoiceError::InvalidArgument {
        reason: reason.into(),
    }
}

/// Pick one item with probability proportional to its weight.
///
/// Weights need not sum to one. Zero weights are allowed and are never
/// selected unless floating-point drift forces the fallback to the last
/// item.
///
/// # Errors
///
/// Returns [`ChoiceError::InvalidArgument`] if the slices differ in length,
/// are empty, contain a negative or non-finite weight, or sum to zero.
pub fn choose_weighted<'a, T>(
    weights: &[f64],
    items: &'a [T],
    rng: &mut impl Rng,
) -> Result<&'a T, ChoiceError> {
    if weights.len() != items.len() {
        return Err(invalid(format!(
            "{} weights for {} items",
            weights.len(),
            items.len()
        )));
    }
    // Validate before consuming randomness.
    total_weight(weights)?;
    let sample: f64 = rng.random();
    let index = pick_index(weights, sample)?;
    items
        .get(index)
        .ok_or_else(|| invalid("selected index out of range"))
}

/// Pick one item uniformly.
///
/// # Errors
///
/// Returns [`ChoiceError::InvalidArgument`] if `items` is empty.
pub fn choose_uniform<'a, T>(items: &'a [T], rng: &mut impl Rng) -> Result<&'a T, ChoiceError> {
    if items.is_empty() {
        return Err(invalid("no items to choose from"));
    }
    let index = rng.random_range(0..items.len());
    items
        .get(index)
        .ok_or_else(|| invalid("selected index out of range"))
}

/// Bernoulli trial succeeding with probability `p`.
///
/// # Errors
///
/// Returns [`ChoiceError::InvalidArgument`] if `p` lies outside `[0, 1]`.
pub fn trial(p: f64, rng: &mut impl Rng) -> Result<bool, ChoiceError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(format!("probability {p} outside [0, 1]")));
    }
    choose_weighted(&[p, 1.0 - p], &[true, false], rng).copied()
}

/// Turn an expected count into a realised one.
///
/// The whole part is guaranteed. The fractional remainder is realised as
/// one extra with probability equal to the remainder; no randomness is
/// consumed when the expectation is a whole number.
///
/// # Errors
///
/// Returns [`ChoiceError::InvalidArgument`] if `expected` is negative or
/// not finite.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn realise_expected(expected: f64, rng: &mut impl Rng) -> Result<u32, ChoiceError> {
    if !expected.is_finite() || expected < 0.0 {
        return Err(invalid(format!("expected count {expected} is not usable")));
    }
    let whole = expected.floor();
    let remainder = expected - whole;
    let guaranteed = whole.min(f64::from(u32::MAX)) as u32;
    if remainder > 0.0 && trial(remainder, rng)? {
        return Ok(guaranteed.saturating_add(1));
    }
    Ok(guaranteed)
}

fn total_weight(weights: &[f64]) -> Result<f64, ChoiceError> {
    if weights.is_empty() {
        return Err(invalid("no items to choose from"));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(invalid(format!("weight {bad} is negative or not finite")));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(invalid("weights sum to zero"));
    }
    Ok(total)
}

/// Map a uniform sample in `[0, 1)` onto an index via the normalised
/// cumulative distribution.
///
/// The first index whose cumulative probability exceeds `sample` wins. If
/// rounding leaves the final cumulative value at or below `sample`, the
/// last index is returned.
pub(crate) fn pick_index(weights: &[f64], sample: f64) -> Result<usize, ChoiceError> {
    let total = total_weight(weights)?;
    let mut cumulative = 0.0_f64;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight / total;
        if cumulative > sample {
            return Ok(index);
        }
    }
    Ok(weights.len().saturating_sub(1))
}
