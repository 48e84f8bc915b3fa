//! Fixed-point token amounts.
//!
//! Salaries and bonuses travel through the API as decimal strings. They are
//! parsed into [`TokenAmount`], an 18-decimal fixed-point value stored as
//! `u128` base units (the same scale as wei), so arithmetic never touches
//! floating point.

use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by every amount
pub const DECIMALS: u32 = 18;

const SCALE: u128 = 10u128.pow(DECIMALS);

/// Token amount in base units (1.0 == 10^18 units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

/// Reasons a decimal string cannot become a [`TokenAmount`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("amount has more than 18 fractional digits")]
    TooPrecise,
    #[error("amount is too large")]
    Overflow,
}

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    #[must_use]
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Whole tokens, e.g. `TokenAmount::from_whole(5)` is `5.0`
    #[must_use]
    pub const fn from_whole(tokens: u64) -> Self {
        Self(tokens as u128 * SCALE)
    }

    #[must_use]
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiply by `num / den`, rounding down.
    #[must_use]
    pub fn scale(self, num: u128, den: u128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        self.0.checked_mul(num).map(|v| Self(v / den))
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountParseError::Negative);
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if let Some(c) = whole.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
            return Err(AmountParseError::InvalidCharacter(c));
        }
        if frac.len() > DECIMALS as usize {
            return Err(AmountParseError::TooPrecise);
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| AmountParseError::Overflow)?
                .checked_mul(SCALE)
                .ok_or(AmountParseError::Overflow)?
        };
        let frac_units = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded
                .parse::<u128>()
                .map_err(|_| AmountParseError::Overflow)?
        };

        whole_units
            .checked_add(frac_units)
            .map(Self)
            .ok_or(AmountParseError::Overflow)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0>width$}", frac, width = DECIMALS as usize);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl std::iter::Sum for TokenAmount {
    /// Saturates at `u128::MAX`.
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0u128, |acc, a| acc.saturating_add(a.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!("1500".parse::<TokenAmount>().unwrap(), TokenAmount::from_whole(1500));
        assert_eq!(
            "0.25".parse::<TokenAmount>().unwrap().base_units(),
            250_000_000_000_000_000
        );
        assert_eq!(".5".parse::<TokenAmount>().unwrap().to_string(), "0.5");
        assert_eq!("7.".parse::<TokenAmount>().unwrap().to_string(), "7");
        assert_eq!(" 42 ".parse::<TokenAmount>().unwrap().to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<TokenAmount>(), Err(AmountParseError::Empty));
        assert_eq!(".".parse::<TokenAmount>(), Err(AmountParseError::Empty));
        assert_eq!("-1".parse::<TokenAmount>(), Err(AmountParseError::Negative));
        assert_eq!(
            "12a".parse::<TokenAmount>(),
            Err(AmountParseError::InvalidCharacter('a'))
        );
        assert_eq!(
            "1.2.3".parse::<TokenAmount>(),
            Err(AmountParseError::InvalidCharacter('.'))
        );
        assert_eq!(
            "0.0000000000000000001".parse::<TokenAmount>(),
            Err(AmountParseError::TooPrecise)
        );
        assert_eq!(
            "999999999999999999999999999".parse::<TokenAmount>(),
            Err(AmountParseError::Overflow)
        );
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(TokenAmount::from_base_units(1).to_string(), "0.000000000000000001");
        assert_eq!("3.1400".parse::<TokenAmount>().unwrap().to_string(), "3.14");
        assert_eq!(TokenAmount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_arithmetic() {
        let a = TokenAmount::from_whole(10);
        let b: TokenAmount = "2.5".parse().unwrap();
        assert_eq!(a.checked_sub(b).unwrap().to_string(), "7.5");
        assert!(b.checked_sub(a).is_none());
        assert_eq!(a.checked_add(b).unwrap().to_string(), "12.5");
        assert_eq!(a.scale(52, 12).unwrap().to_string(), "43.333333333333333333");
        assert!(a.scale(1, 0).is_none());
        assert_eq!(vec![a, b].into_iter().sum::<TokenAmount>().to_string(), "12.5");
    }
}
