use std::{fmt, str::FromStr};

use serde::de::{self, Deserialize, Deserializer, Visitor};

use crate::ConvertError;

/// Fixed-point resolution: one eighth-beat is split into this many units.
pub const UNITS_PER_EIGHTH: u64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Offset from the chart origin, in eighth-beats.
///
/// Stored as fixed-point so that `"12"` and `"12.000"` compare equal and
/// ordering is numeric rather than lexical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BeatPos(u64);

impl BeatPos {
    pub const ZERO: BeatPos = BeatPos(0);

    pub fn from_eighths(eighths: u64) -> Self {
        Self(eighths.saturating_mul(UNITS_PER_EIGHTH))
    }

    pub fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub fn units(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / UNITS_PER_EIGHTH as f64
    }

    pub fn parse(raw: &str) -> Result<Self, ConvertError> {
        let invalid = |why: &str| {
            ConvertError::new("E1006", format!("invalid beat position '{raw}': {why}"))
                .with_context(raw.to_string())
        };

        let s = raw.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("empty"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a non-negative decimal"));
        }
        if frac_part.len() > FRACTION_DIGITS {
            return Err(invalid("more than 6 fractional digits"));
        }

        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("out of range"))?
        };
        let mut frac: u64 = 0;
        for (i, b) in frac_part.bytes().enumerate() {
            frac += u64::from(b - b'0') * 10u64.pow((FRACTION_DIGITS - 1 - i) as u32);
        }

        whole
            .checked_mul(UNITS_PER_EIGHTH)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| invalid("out of range"))
    }
}

impl FromStr for BeatPos {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BeatPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_EIGHTH;
        let frac = self.0 % UNITS_PER_EIGHTH;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:06}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

// Config files write positions either as numbers or as strings.
impl<'de> Deserialize<'de> for BeatPos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BeatPosVisitor;

        impl Visitor<'_> for BeatPosVisitor {
            type Value = BeatPos;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative beat position as number or string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BeatPos, E> {
                BeatPos::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BeatPos, E> {
                v.checked_mul(UNITS_PER_EIGHTH)
                    .map(BeatPos)
                    .ok_or_else(|| E::custom(format!("beat position out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BeatPos, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("negative beat position: {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<BeatPos, E> {
                BeatPos::parse(&v.to_string()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(BeatPosVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_numerically_not_lexically() {
        let a = BeatPos::parse("9").unwrap();
        let b = BeatPos::parse("10").unwrap();
        assert!(a < b);
        assert_eq!(BeatPos::parse("12").unwrap(), BeatPos::parse("12.000").unwrap());
    }

    #[test]
    fn parses_fractional_positions() {
        let p = BeatPos::parse("3.25").unwrap();
        assert_eq!(p.units(), 3_250_000);
        assert_eq!(p.as_f64(), 3.25);
        assert_eq!(BeatPos::parse(".5").unwrap().units(), 500_000);
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(BeatPos::parse("12.500").unwrap().to_string(), "12.5");
        assert_eq!(BeatPos::parse("7").unwrap().to_string(), "7");
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "-1", "abc", "1.2.3", "0.1234567", "."] {
            let err = BeatPos::parse(raw).unwrap_err();
            assert_eq!(err.code, "E1006", "raw={raw}");
        }
    }

    #[test]
    fn deserializes_from_number_or_string() {
        let v: Vec<BeatPos> = serde_json::from_str(r#"[16, "16.5", 17.25]"#).unwrap();
        assert_eq!(v[0], BeatPos::from_eighths(16));
        assert_eq!(v[1].units(), 16_500_000);
        assert_eq!(v[2].units(), 17_250_000);

        assert!(serde_json::from_str::<BeatPos>("-4").is_err());
    }
}
