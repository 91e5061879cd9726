//! Elementwise helpers over sample vectors.
//!
//! The binary operations broadcast cyclically: the result is as long as the
//! longer operand and the shorter operand starts over from its beginning.

/// Elementwise sum with cyclic broadcasting.
pub fn sum_cyclic(a: &[f32], b: &[f32]) -> Vec<f32> {
    zip_cyclic(a, b, |x, y| x + y)
}

/// Elementwise product with cyclic broadcasting.
pub fn multiply_cyclic(a: &[f32], b: &[f32]) -> Vec<f32> {
    zip_cyclic(a, b, |x, y| x * y)
}

/// Contiguous concatenation, `a` then `b`.
pub fn append(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

// An empty operand has nothing to repeat, so the result is empty.
fn zip_cyclic(a: &[f32], b: &[f32], f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let n = a.len().max(b.len());
    (0..n).map(|i| f(a[i % a.len()], b[i % b.len()])).collect()
}
