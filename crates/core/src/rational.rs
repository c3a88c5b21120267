//! Rational values as they appear in EXIF GPS fields, and their conversion to floats.

use serde::{Deserialize, Serialize};

/// A single numeric component of an EXIF value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Ratio { num: i64, den: i64 },
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn ratio(num: i64, den: i64) -> Self {
        Scalar::Ratio { num, den }
    }
}

impl From<(i64, i64)> for Scalar {
    fn from((num, den): (i64, i64)) -> Self {
        Scalar::Ratio { num, den }
    }
}

/// Converts a rational-ish value to `f64`.
///
/// A zero denominator yields the numerator itself. Text is accepted when it
/// parses as a decimal number. Anything non-numeric or non-finite is `None`.
pub fn to_f64(value: &Scalar) -> Option<f64> {
    let v = match value {
        Scalar::Ratio { num, den } if *den == 0 => *num as f64,
        Scalar::Ratio { num, den } => *num as f64 / *den as f64,
        Scalar::Int(i) => *i as f64,
        Scalar::Float(f) => *f,
        Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divides_numerator_by_denominator() {
        assert_eq!(to_f64(&Scalar::ratio(3, 2)), Some(1.5));
        assert_eq!(to_f64(&Scalar::ratio(-7, 2)), Some(-3.5));
    }

    #[test]
    fn zero_denominator_falls_back_to_numerator() {
        assert_eq!(to_f64(&Scalar::ratio(42, 0)), Some(42.0));
        assert_eq!(to_f64(&Scalar::ratio(0, 0)), Some(0.0));
    }

    #[test]
    fn plain_numbers_pass_through() {
        assert_eq!(to_f64(&Scalar::Int(5)), Some(5.0));
        assert_eq!(to_f64(&Scalar::Float(2.25)), Some(2.25));
        assert_eq!(to_f64(&Scalar::Text(" 12.5 ".into())), Some(12.5));
    }

    #[test]
    fn non_numeric_input_is_absent() {
        assert_eq!(to_f64(&Scalar::Text("north".into())), None);
        assert_eq!(to_f64(&Scalar::Float(f64::NAN)), None);
        assert_eq!(to_f64(&Scalar::Float(f64::INFINITY)), None);
    }
}
