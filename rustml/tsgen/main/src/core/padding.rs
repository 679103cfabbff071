//! Lookahead alignment between input windows and targets.
//!
//! A sliding window of length `L` over rows `r - L .. r` is paired with
//! target row `r`, i.e. one step after the window's last input. Padding and
//! truncating the two arrays moves that pairing to any other non-negative
//! offset without changing the window generator itself.

use crate::api::error::{TsgenError, TsgenResult};
use ndarray::{s, Array2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Pre,
    Post,
}

/// Align `x` and `y` so that windowing pairs each window with the target
/// `lookahead` steps after its last input row.
///
/// - `lookahead == 1`: returned unchanged.
/// - `lookahead == 0`: both grow to `n + 1` rows, `x` with a trailing zero
///   row and `y` with a leading one, so a window's last row and its target
///   share a timestamp.
/// - `lookahead > 1`: both shrink to `n + 1 - lookahead` rows, `x` keeping
///   its head and `y` keeping its tail.
///
/// `x` and `y` must have the same number of rows.
pub fn pad_x_and_y(
    x: Array2<f32>,
    y: Array2<f32>,
    lookahead: i64,
) -> TsgenResult<(Array2<f32>, Array2<f32>)> {
    if lookahead < 0 {
        return Err(TsgenError::InvalidConfig(format!(
            "Value of `lookahead` can not be negative, is {}",
            lookahead
        )));
    }
    if x.nrows() != y.nrows() {
        return Err(TsgenError::LengthMismatch {
            data: x.nrows(),
            targets: y.nrows(),
        });
    }
    if lookahead == 1 {
        return Ok((x, y));
    }

    let new_length = (x.nrows() as i64 + 1 - lookahead).max(0) as usize;
    if lookahead == 0 {
        Ok((
            fit_rows(x, new_length, Side::Post, Side::Pre),
            fit_rows(y, new_length, Side::Pre, Side::Pre),
        ))
    } else {
        Ok((
            fit_rows(x, new_length, Side::Post, Side::Post),
            fit_rows(y, new_length, Side::Pre, Side::Pre),
        ))
    }
}

/// Zero-pad or truncate `a` to exactly `length` rows.
fn fit_rows(a: Array2<f32>, length: usize, padding: Side, truncating: Side) -> Array2<f32> {
    let n = a.nrows();
    if n == length {
        return a;
    }
    if n > length {
        return match truncating {
            Side::Post => a.slice(s![..length, ..]).to_owned(),
            Side::Pre => a.slice(s![n - length.., ..]).to_owned(),
        };
    }

    let mut out = Array2::<f32>::zeros((length, a.ncols()));
    match padding {
        Side::Post => out.slice_mut(s![..n, ..]).assign(&a),
        Side::Pre => out.slice_mut(s![length - n.., ..]).assign(&a),
    }
    out
}
