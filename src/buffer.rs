//! Fallible allocation of flat `f32` buffers.
//!
//! Construction and cloning reserve their storage up front so an out-of-memory
//! condition surfaces as [`Error::AllocationFailure`] instead of an abort.

use crate::{Error, Result};

/// `rows * cols`, or `AllocationFailure` on overflow.
pub(crate) fn checked_len(rows: usize, cols: usize, what: &str) -> Result<usize> {
    rows.checked_mul(cols).ok_or_else(|| {
        Error::AllocationFailure(format!("{what} shape {rows}x{cols} overflows usize"))
    })
}

/// A zero-filled buffer of `len` elements.
pub(crate) fn zeroed(len: usize, what: &str) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        Error::AllocationFailure(format!("cannot reserve {len} values for {what}: {e}"))
    })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

/// An owned copy of `src`.
pub(crate) fn copied(src: &[f32], what: &str) -> Result<Vec<f32>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(src.len()).map_err(|e| {
        Error::AllocationFailure(format!(
            "cannot reserve {} values for {what}: {e}",
            src.len()
        ))
    })?;
    buf.extend_from_slice(src);
    Ok(buf)
}

/// Collect exactly `len` values from `values` into a new buffer.
#[cfg_attr(not(feature = "ndarray"), allow(dead_code))]
pub(crate) fn collected<I>(values: I, len: usize, what: &str) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = f32>,
{
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        Error::AllocationFailure(format!("cannot reserve {len} values for {what}: {e}"))
    })?;
    buf.extend(values.into_iter().take(len));
    Ok(buf)
}
