//! Payment schedule calculations.
//!
//! Every "is this employee due?" question in the service goes through
//! [`is_payment_due`], so the ledger, the payroll preview and the analytics
//! summary always agree.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::amount::TokenAmount;

/// How often an employee is paid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Weekly,
    BiWeekly,
    #[default]
    Monthly,
}

impl PaymentFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi_weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Length of one pay period
    #[must_use]
    pub fn interval(&self) -> Duration {
        match self {
            Self::Weekly => Duration::days(7),
            Self::BiWeekly => Duration::days(14),
            Self::Monthly => Duration::days(30),
        }
    }

    /// Pay periods per year, used to normalize salaries to a monthly figure
    fn periods_per_year(&self) -> u128 {
        match self {
            Self::Weekly => 52,
            Self::BiWeekly => 26,
            Self::Monthly => 12,
        }
    }
}

impl std::str::FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "bi_weekly" | "biweekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Invalid payment frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An employee that has never been paid is always due.
#[must_use]
pub fn is_payment_due(
    last_payment_at: Option<DateTime<Utc>>,
    frequency: PaymentFrequency,
    now: DateTime<Utc>,
) -> bool {
    match last_payment_at {
        None => true,
        Some(last) => now - last >= frequency.interval(),
    }
}

/// When the next payment becomes due (`now` if never paid)
#[must_use]
pub fn next_payment_at(
    last_payment_at: Option<DateTime<Utc>>,
    frequency: PaymentFrequency,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match last_payment_at {
        None => now,
        Some(last) => last + frequency.interval(),
    }
}

/// Salary per period expressed as a monthly amount
#[must_use]
pub fn monthly_equivalent(amount: TokenAmount, frequency: PaymentFrequency) -> TokenAmount {
    amount
        .scale(frequency.periods_per_year(), 12)
        .unwrap_or(TokenAmount::from_base_units(u128::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_frequency_display_and_parsing() {
        let frequencies = vec![
            (PaymentFrequency::Weekly, "weekly"),
            (PaymentFrequency::BiWeekly, "bi_weekly"),
            (PaymentFrequency::Monthly, "monthly"),
        ];

        for (frequency, string) in frequencies {
            assert_eq!(frequency.as_str(), string);
            assert_eq!(frequency.to_string(), string);
            assert_eq!(PaymentFrequency::from_str(string).unwrap(), frequency);
        }

        assert_eq!(
            PaymentFrequency::from_str("biweekly").unwrap(),
            PaymentFrequency::BiWeekly
        );
        assert!(PaymentFrequency::from_str("daily").is_err());
    }

    #[test]
    fn test_never_paid_is_due() {
        assert!(is_payment_due(None, PaymentFrequency::Monthly, Utc::now()));
    }

    #[test]
    fn test_due_exactly_at_interval_boundary() {
        let now = Utc::now();
        let week = PaymentFrequency::Weekly;

        assert!(is_payment_due(Some(now - Duration::days(7)), week, now));
        assert!(!is_payment_due(
            Some(now - Duration::days(7) + Duration::seconds(1)),
            week,
            now
        ));
        assert!(!is_payment_due(
            Some(now - Duration::days(13)),
            PaymentFrequency::BiWeekly,
            now
        ));
        assert!(is_payment_due(
            Some(now - Duration::days(31)),
            PaymentFrequency::Monthly,
            now
        ));
    }

    #[test]
    fn test_next_payment_at() {
        let now = Utc::now();
        let last = now - Duration::days(3);
        assert_eq!(next_payment_at(None, PaymentFrequency::Weekly, now), now);
        assert_eq!(
            next_payment_at(Some(last), PaymentFrequency::Weekly, now),
            last + Duration::days(7)
        );
    }

    #[test]
    fn test_monthly_equivalent() {
        let salary = TokenAmount::from_whole(1200);
        assert_eq!(
            monthly_equivalent(salary, PaymentFrequency::Monthly),
            TokenAmount::from_whole(1200)
        );
        assert_eq!(
            monthly_equivalent(salary, PaymentFrequency::Weekly),
            TokenAmount::from_whole(5200)
        );
        assert_eq!(
            monthly_equivalent(salary, PaymentFrequency::BiWeekly),
            TokenAmount::from_whole(2600)
        );
    }
}
