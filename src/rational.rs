//! Rational / plain number parsing for raw EXIF values

/// Parse `"a/b"` or a plain number into an `f64`.
///
/// A zero denominator yields the numerator alone. Components that do not
/// parse become `NaN`, so this never fails; callers check `is_finite()`.
pub fn parse_rational(value: &str) -> f64 {
    match value.split_once('/') {
        Some((num, den)) => {
            let num = parse_component(num);
            let den = parse_component(den);
            if den == 0.0 {
                num
            } else {
                num / den
            }
        }
        None => parse_component(value),
    }
}

fn parse_component(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational() {
        assert_eq!(parse_rational("1/250"), 0.004);
        assert_eq!(parse_rational("350/10"), 35.0);
        assert_eq!(parse_rational("-2/3"), -2.0 / 3.0);
        assert_eq!(parse_rational(" 10 / 4 "), 2.5);
    }

    #[test]
    fn test_zero_denominator_returns_numerator() {
        assert_eq!(parse_rational("7/0"), 7.0);
        assert_eq!(parse_rational("0/0"), 0.0);
        assert_eq!(parse_rational("-3/0.0"), -3.0);
    }

    #[test]
    fn test_plain_number() {
        assert_eq!(parse_rational("2"), 2.0);
        assert_eq!(parse_rational("5.643856"), 5.643856);
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(parse_rational("abc").is_nan());
        assert!(parse_rational("").is_nan());
        assert!(parse_rational("x/2").is_nan());
        assert!(parse_rational("4/y").is_nan());
    }
}
