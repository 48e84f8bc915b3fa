//! Payroll analytics aggregated from employee, payment and bonus records.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::instrument;
use validator::Validate;

use crate::domain::{
    AppError, Bonus, BonusStatus, BonusStore, BonusSummary, DatabaseClient, DepartmentSummary,
    Employee, EmployeeFilter, FrequencyBreakdown, ListBonusesParams, PaymentFrequency,
    PaymentRecord, PaymentTrendParams, PaymentTrendPoint, PayrollSummary, TokenAmount, TokenTotal,
    is_payment_due, monthly_equivalent,
};

use super::payroll::totals_by_token;

pub struct AnalyticsService {
    db_client: Arc<dyn DatabaseClient>,
    bonuses: Arc<dyn BonusStore>,
}

fn monthly_totals<'a>(employees: impl Iterator<Item = &'a Employee>) -> Vec<TokenTotal> {
    totals_by_token(employees.filter_map(|e| {
        e.salary_amount()
            .ok()
            .map(|s| (e.preferred_token.as_str(), monthly_equivalent(s, e.payment_frequency)))
    }))
}

fn bonus_totals<'a>(bonuses: impl Iterator<Item = &'a Bonus>) -> Vec<TokenTotal> {
    totals_by_token(bonuses.filter_map(|b| {
        b.amount
            .parse::<TokenAmount>()
            .ok()
            .map(|a| (b.token.as_str(), a))
    }))
}

/// Build the summary from already-loaded records
pub fn summarize(employees: &[Employee], bonuses: &[Bonus], now: DateTime<Utc>) -> PayrollSummary {
    let active: Vec<&Employee> = employees.iter().filter(|e| e.is_active).collect();

    let mut departments: BTreeMap<&str, Vec<&Employee>> = BTreeMap::new();
    for employee in employees {
        departments
            .entry(employee.department.as_str())
            .or_default()
            .push(employee);
    }
    let by_department = departments
        .into_iter()
        .map(|(department, members)| DepartmentSummary {
            department: department.to_string(),
            employees: members.len(),
            active_employees: members.iter().filter(|e| e.is_active).count(),
            monthly_payroll: monthly_totals(members.iter().copied().filter(|e| e.is_active)),
        })
        .collect();

    let by_frequency = [
        PaymentFrequency::Weekly,
        PaymentFrequency::BiWeekly,
        PaymentFrequency::Monthly,
    ]
    .into_iter()
    .map(|frequency| FrequencyBreakdown {
        frequency,
        employees: active
            .iter()
            .filter(|e| e.payment_frequency == frequency)
            .count(),
    })
    .collect();

    let (pending, distributed): (Vec<&Bonus>, Vec<&Bonus>) = bonuses
        .iter()
        .partition(|b| b.status == BonusStatus::Pending);

    PayrollSummary {
        total_employees: employees.len(),
        active_employees: active.len(),
        inactive_employees: employees.len() - active.len(),
        payments_due: active
            .iter()
            .filter(|e| is_payment_due(e.last_payment_at, e.payment_frequency, now))
            .count(),
        monthly_payroll: monthly_totals(active.iter().copied()),
        by_department,
        by_frequency,
        bonuses: BonusSummary {
            pending_count: pending.len(),
            distributed_count: distributed.len(),
            pending_total: bonus_totals(pending.into_iter()),
            distributed_total: bonus_totals(distributed.into_iter()),
        },
        generated_at: now,
    }
}

/// First instant of the month `months_back` months before `now`'s month
fn month_start(now: DateTime<Utc>, months_back: u32) -> DateTime<Utc> {
    let index = now.year() * 12 + now.month0() as i32 - months_back as i32;
    let (year, month0) = (index.div_euclid(12), index.rem_euclid(12) as u32);
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(now)
}

/// Bucket payments by calendar month, oldest first, including empty months
pub fn payment_trend(payments: &[PaymentRecord], months: u32, now: DateTime<Utc>) -> Vec<PaymentTrendPoint> {
    (0..months)
        .rev()
        .map(|back| {
            let key = month_start(now, back).format("%Y-%m").to_string();
            let in_month: Vec<&PaymentRecord> = payments
                .iter()
                .filter(|p| p.paid_at.format("%Y-%m").to_string() == key)
                .collect();
            PaymentTrendPoint {
                payments: in_month.len(),
                totals: totals_by_token(in_month.iter().filter_map(|p| {
                    p.amount
                        .parse::<TokenAmount>()
                        .ok()
                        .map(|a| (p.token.as_str(), a))
                })),
                month: key,
            }
        })
        .collect()
}

impl AnalyticsService {
    #[must_use]
    pub fn new(db_client: Arc<dyn DatabaseClient>, bonuses: Arc<dyn BonusStore>) -> Self {
        Self { db_client, bonuses }
    }

    #[instrument(skip(self))]
    pub async fn payroll_summary(&self, now: DateTime<Utc>) -> Result<PayrollSummary, AppError> {
        let employees = self
            .db_client
            .list_all_employees(&EmployeeFilter::default())
            .await?;
        let bonuses = self.bonuses.list(&ListBonusesParams::default()).await?;
        Ok(summarize(&employees, &bonuses, now))
    }

    #[instrument(skip(self))]
    pub async fn payment_trend(
        &self,
        params: &PaymentTrendParams,
        now: DateTime<Utc>,
    ) -> Result<Vec<PaymentTrendPoint>, AppError> {
        params.validate()?;
        let since = month_start(now, params.months - 1);
        let payments = self.db_client.list_payments_since(since).await?;
        Ok(payment_trend(&payments, params.months, now))
    }
}
