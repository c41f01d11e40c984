//! Tools for treating fractions as musical lengths and positions.

use fraction::Fraction;

use super::LIMIT_DENOMINATOR;

/// Shorthand for a signed exact fraction.
///
/// ```
/// # use score_engrave::primitives::frac;
/// # use fraction::Fraction;
/// assert_eq!(frac(3, 2), Fraction::new(3u64, 2u64));
/// assert_eq!(frac(-1, 4), Fraction::new_neg(1u64, 4u64));
/// ```
pub fn frac(numer: i64, denom: u64) -> Fraction {
    match numer < 0 {
        true => Fraction::new_neg(numer.unsigned_abs(), denom),
        false => Fraction::new(numer as u64, denom),
    }
}

pub fn zero() -> Fraction {
    Fraction::new(0u64, 1u64)
}

fn parts(frac: &Fraction) -> Result<(u64, u64), String> {
    Ok((
        *frac
            .numer()
            .ok_or("Can not get numerator from fraction".to_string())?,
        *frac
            .denom()
            .ok_or("Can not get denominator from fraction".to_string())?,
    ))
}

/// Find the closest fraction with denominator not greater than `limit`.
///
/// Walks the continued fraction expansion and picks the closer of the two
/// last convergents.
pub fn limit_denominator(
    frac: Fraction,
    limit: u64,
) -> Result<Fraction, String> {
    if limit < 1 {
        return Err(format!(
            "denominator shouldn't be less that one. input:{}",
            limit
        ));
    }
    let (numer, denom) = parts(&frac)?;
    if denom <= limit {
        return Ok(frac);
    }
    let negative = frac.is_sign_negative();
    let abs = frac.abs();
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut n, mut d) = (numer, denom);
    let mut count: u16 = 0;
    loop {
        if count > 1000 {
            return Err(String::from("Probably, infinite loop."));
        }
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > limit {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (n, d) = (d, n - a * d);
        if d == 0 {
            break;
        }
        count += 1;
    }
    let k = (limit - q0) / q1;
    let bound1 = Fraction::new(p0 + k * p1, q0 + k * q1);
    let bound2 = Fraction::new(p1, q1);
    let best = match (bound2 - abs).abs() <= (bound1 - abs).abs() {
        true => bound2,
        false => bound1,
    };
    Ok(match negative {
        true => -best,
        false => best,
    })
}

/// Convert float beat value to exact fraction, limited by
/// [LIMIT_DENOMINATOR].
pub fn from_f64(value: f64) -> Result<Fraction, String> {
    if !value.is_finite() {
        return Err(format!("Can not use {} as a beat value", value));
    }
    limit_denominator(Fraction::from(value), LIMIT_DENOMINATOR)
}

/// Parse "3/16", "-1/2", "2" or "0.75".
pub fn parse_fraction(s: &str) -> Result<Fraction, String> {
    let s = s.trim();
    match s.split_once('/') {
        Some((numer, denom)) => {
            let numer: i64 = numer
                .trim()
                .parse()
                .map_err(|_| format!("Bad numerator in `{}`", s))?;
            let denom: u64 = denom
                .trim()
                .parse()
                .map_err(|_| format!("Bad denominator in `{}`", s))?;
            if denom == 0 {
                return Err(format!("Zero denominator in `{}`", s));
            }
            Ok(frac(numer, denom))
        }
        None => from_f64(
            s.parse::<f64>()
                .map_err(|_| format!("Can not parse `{}` as a number", s))?,
        ),
    }
}

pub fn to_f64(frac: &Fraction) -> f64 {
    match parts(frac) {
        Ok((numer, denom)) => {
            let value = numer as f64 / denom as f64;
            match frac.is_sign_negative() {
                true => -value,
                false => value,
            }
        }
        Err(_) => f64::NAN,
    }
}

/// Round to the nearest integer, halves going up.
pub fn round(frac: &Fraction) -> i64 {
    let floor = (*frac + frac_half()).floor();
    let value = parts(&floor).map(|(n, _)| n as i64).unwrap_or(0);
    match floor.is_sign_negative() {
        true => -value,
        false => value,
    }
}

fn frac_half() -> Fraction {
    Fraction::new(1u64, 2u64)
}

/// `beat` rounded down to the multiple of `grain`.
pub fn floor_to(beat: Fraction, grain: Fraction) -> Fraction {
    (beat / grain).floor() * grain
}

/// `beat` rounded up to the multiple of `grain`.
pub fn ceil_to(beat: Fraction, grain: Fraction) -> Fraction {
    let floor = floor_to(beat, grain);
    match floor == beat {
        true => floor,
        false => floor + grain,
    }
}

pub fn is_integer(frac: &Fraction) -> bool {
    frac.denom() == Some(&1u64)
}

pub(crate) fn is_power_of_two_u64(num: u64) -> bool {
    num != 0 && num & (num - 1) == 0
}

/// Whole, half, quarter, 1/8 etc. Positive only.
pub fn is_power_of_two(frac: &Fraction) -> bool {
    match parts(frac) {
        Ok((numer, denom)) => {
            !frac.is_sign_negative()
                && is_power_of_two_u64(numer)
                && is_power_of_two_u64(denom)
        }
        Err(_) => false,
    }
}

/// Power of two, extended by its half.
pub fn is_dotted(frac: &Fraction) -> bool {
    is_power_of_two(&(*frac * Fraction::new(2u64, 3u64)))
}

/// The largest power of two, that fits into `frac` a whole number of times.
///
/// `None` for zero, negative values and fractions whose denominator is not a
/// power of two (there is no such grain for 1/3).
pub fn largest_power_of_two_dividing(frac: &Fraction) -> Option<Fraction> {
    let (numer, denom) = parts(frac).ok()?;
    if numer == 0 || frac.is_sign_negative() || !is_power_of_two_u64(denom)
    {
        return None;
    }
    let twos = 1u64 << numer.trailing_zeros();
    Some(Fraction::new(twos, denom))
}

pub fn gcd(a: u64, b: u64) -> u64 {
    match b {
        0 => a,
        _ => gcd(b, a % b),
    }
}

/// Least common multiple, `None` on overflow.
pub fn checked_lcm(a: u64, b: u64) -> Option<u64> {
    match a == 0 || b == 0 {
        true => Some(a.max(b)),
        false => (a / gcd(a, b)).checked_mul(b),
    }
}

/// Denominator of the reduced fraction, 1 for broken values.
pub fn denominator(frac: &Fraction) -> u64 {
    parts(frac).map(|(_, d)| d).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::*;

    #[test]
    fn test_limit_denominator() {
        assert_eq!(
            limit_denominator(Fraction::new(1u64, 129u64), 128).unwrap(),
            Fraction::new(1u64, 128u64)
        );
        assert_eq!(
            limit_denominator(Fraction::from(3.141592653589793), 10).unwrap(),
            Fraction::new(22u64, 7u64)
        );
        assert_eq!(
            limit_denominator(Fraction::from(3.141592653589793), 100).unwrap(),
            Fraction::new(311u64, 99u64)
        );
        assert_eq!(
            limit_denominator(Fraction::from(-0.75), 8).unwrap(),
            frac(-3, 4)
        );
        assert!(limit_denominator(Fraction::new(1u64, 3u64), 0).is_err());
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(from_f64(1.0 / 3.0).unwrap(), frac(1, 3));
        assert_eq!(from_f64(0.1875).unwrap(), frac(3, 16));
        assert_eq!(from_f64(2.0 / 3.0).unwrap(), frac(2, 3));
        assert!(from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("1/3").unwrap(), frac(1, 3));
        assert_eq!(parse_fraction(" -3/2 ").unwrap(), frac(-3, 2));
        assert_eq!(parse_fraction("1.5").unwrap(), frac(3, 2));
        assert!(parse_fraction("1/0").is_err());
        assert!(parse_fraction("beat").is_err());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round(&frac(5, 2)), 3);
        assert_eq!(round(&frac(7, 3)), 2);
        assert_eq!(round(&frac(-1, 3)), 0);
        assert_eq!(floor_to(frac(7, 4), frac(1, 2)), frac(3, 2));
        assert_eq!(ceil_to(frac(7, 4), frac(1, 2)), frac(2, 1));
        assert_eq!(ceil_to(frac(2, 1), frac(1, 2)), frac(2, 1));
    }

    #[test]
    fn test_powers_of_two() {
        assert!(is_power_of_two(&frac(1, 8)));
        assert!(is_power_of_two(&frac(4, 1)));
        assert!(!is_power_of_two(&frac(3, 8)));
        assert!(is_dotted(&frac(3, 8)));
        assert!(is_dotted(&frac(3, 1)));
        assert!(!is_dotted(&frac(1, 3)));
        assert_eq!(
            largest_power_of_two_dividing(&frac(3, 2)),
            Some(frac(1, 2))
        );
        assert_eq!(
            largest_power_of_two_dividing(&frac(6, 1)),
            Some(frac(2, 1))
        );
        assert_eq!(largest_power_of_two_dividing(&frac(1, 3)), None);
        assert_eq!(largest_power_of_two_dividing(&zero()), None);
    }

    #[test]
    fn test_lcm() {
        assert_eq!(checked_lcm(4, 3), Some(12));
        assert_eq!(checked_lcm(4, 8), Some(8));
        assert_eq!(checked_lcm(0, 5), Some(5));
        assert_eq!(checked_lcm(u64::MAX, 2), None);
    }
}
