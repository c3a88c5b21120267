//! Degrees/minutes/seconds to signed decimal degrees.

use crate::rational::{self, Scalar};

/// Combines a `[degrees, minutes, seconds]` triple and a hemisphere reference
/// into signed decimal degrees.
///
/// Only `S` and `W` negate. A triple of the wrong length or with an
/// unconvertible component yields `None`.
pub fn to_decimal(dms: &[Scalar], reference: Option<&str>) -> Option<f64> {
    let [d, m, s] = dms else {
        return None;
    };
    let deg = rational::to_f64(d)? + rational::to_f64(m)? / 60.0 + rational::to_f64(s)? / 3600.0;
    match reference {
        Some("S") | Some("W") => Some(-deg),
        _ => Some(deg),
    }
}
