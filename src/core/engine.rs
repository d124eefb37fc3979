use super::types::{PaymentConfig, PayoffResult, ScheduleEntry};

const MONTHS_PER_YEAR: u32 = 12;

/// Lazily walks a loan balance forward one month at a time.
///
/// Interest for a month is charged on the balance before that month's payment
/// and is added to the running total before principal is subtracted. The
/// iterator stops after the month in which the balance reaches zero, or once
/// `max_duration` months have been produced.
#[derive(Debug, Clone)]
pub struct PayoffSchedule {
    config: PaymentConfig,
    monthly_rate: f64,
    balance: f64,
    month: u32,
    total_interest: f64,
    lump_sum_months: u64,
}

impl PayoffSchedule {
    pub fn new(principal: f64, apr: f64, config: PaymentConfig) -> Self {
        Self {
            config,
            monthly_rate: apr / 100.0 / 12.0,
            balance: principal,
            month: 0,
            total_interest: 0.0,
            lump_sum_months: u64::from(config.lump_sum_years) * u64::from(MONTHS_PER_YEAR),
        }
    }

    /// Balance after the most recently produced month. Not clamped, so a
    /// diverging loan reports its true (growing) balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn total_interest(&self) -> f64 {
        self.total_interest
    }

    /// Months produced so far.
    pub fn months_elapsed(&self) -> u32 {
        self.month
    }

    pub fn is_paid_off(&self) -> bool {
        self.balance <= 0.0
    }

    fn lump_sum_for(&self, month: u32) -> f64 {
        let year_end = (month + 1) % MONTHS_PER_YEAR == 0;
        let within_window = u64::from(month) < self.lump_sum_months;
        if year_end && within_window && self.config.annual_lump_sum > 0.0 {
            self.config.annual_lump_sum
        } else {
            0.0
        }
    }
}

impl Iterator for PayoffSchedule {
    type Item = ScheduleEntry;

    fn next(&mut self) -> Option<ScheduleEntry> {
        if !(self.balance > 0.0) || self.month >= self.config.max_duration {
            return None;
        }

        let month = self.month;
        let interest_charge = self.balance * self.monthly_rate;
        self.total_interest += interest_charge;

        // Left unclamped when the payment does not cover interest; the balance grows.
        let mut principal_payment = self.config.monthly_payment - interest_charge;

        let lump_sum = self.lump_sum_for(month);
        if lump_sum > 0.0 {
            principal_payment += lump_sum;
        }

        if principal_payment > self.balance {
            principal_payment = self.balance;
        }

        self.balance -= principal_payment;
        self.month += 1;

        Some(ScheduleEntry {
            month,
            balance: self.balance.max(0.0),
            principal: principal_payment,
            interest: interest_charge,
            payment: principal_payment + interest_charge,
            lump_sum,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if !(self.balance > 0.0) {
            return (0, Some(0));
        }
        let remaining = self.config.max_duration.saturating_sub(self.month) as usize;
        (remaining.min(1), Some(remaining))
    }
}

pub fn calculate_payoff_schedule(
    principal: f64,
    apr: f64,
    config: &PaymentConfig,
) -> PayoffResult {
    let mut months = PayoffSchedule::new(principal, apr, *config);
    let schedule = months.by_ref().collect::<Vec<_>>();
    let total_interest = months.total_interest();

    PayoffResult {
        total_months: months.months_elapsed(),
        total_interest,
        total_paid: principal + total_interest,
        paid_off: months.is_paid_off(),
        schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::minimum_payment;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn config(monthly_payment: f64, max_duration: u32) -> PaymentConfig {
        PaymentConfig {
            monthly_payment,
            annual_lump_sum: 0.0,
            lump_sum_years: 0,
            max_duration,
        }
    }

    #[test]
    fn basic_loan_pays_off_before_ceiling() {
        let result = calculate_payoff_schedule(100_000.0, 5.0, &config(2_000.0, 120));

        assert!(result.paid_off);
        assert!(result.total_months < 120);
        assert!(result.total_interest > 0.0);
        assert_eq!(result.total_paid, 100_000.0 + result.total_interest);
        assert_eq!(result.schedule.len(), result.total_months as usize);
    }

    #[test]
    fn zero_apr_is_linear() {
        let result = calculate_payoff_schedule(10_000.0, 0.0, &config(1_000.0, 120));

        assert!(result.paid_off);
        assert_eq!(result.total_months, 10);
        assert_eq!(result.total_interest, 0.0);
        assert_eq!(result.total_paid, 10_000.0);
        assert!(result.schedule.iter().all(|e| e.interest == 0.0));
    }

    #[test]
    fn annual_lump_sum_shortens_payoff() {
        let without = calculate_payoff_schedule(100_000.0, 7.0, &config(1_500.0, 120));
        let with = calculate_payoff_schedule(
            100_000.0,
            7.0,
            &PaymentConfig {
                annual_lump_sum: 5_000.0,
                lump_sum_years: 5,
                ..config(1_500.0, 120)
            },
        );

        assert!(with.total_months < without.total_months);
        assert!(with.total_interest < without.total_interest);
    }

    #[test]
    fn exceeding_max_duration_is_not_paid_off() {
        let result = calculate_payoff_schedule(500_000.0, 10.0, &config(1_000.0, 60));

        assert!(!result.paid_off);
        assert_eq!(result.total_months, 60);
        assert_eq!(result.schedule.len(), 60);
    }

    #[test]
    fn undercovering_payment_lets_balance_grow() {
        let result = calculate_payoff_schedule(500_000.0, 10.0, &config(1_000.0, 24));

        for pair in result.schedule.windows(2) {
            assert!(pair[1].balance > pair[0].balance);
        }
        assert!(result.schedule.iter().all(|e| e.principal < 0.0));
        assert!(
            result
                .schedule
                .iter()
                .all(|e| (e.payment - 1_000.0).abs() < 1e-6)
        );
    }

    #[test]
    fn final_payment_never_overpays() {
        let result = calculate_payoff_schedule(10_000.0, 5.0, &config(5_000.0, 120));

        let last = result.schedule.last().expect("schedule should not be empty");
        assert_eq!(last.balance, 0.0);
        assert!(last.payment < 5_000.0);
        assert_close(
            result.schedule.iter().map(|e| e.principal).sum::<f64>(),
            10_000.0,
            1e-9,
        );
    }

    #[test]
    fn schedule_entries_are_well_formed() {
        let result = calculate_payoff_schedule(10_000.0, 5.0, &config(1_000.0, 120));

        for (index, entry) in result.schedule.iter().enumerate() {
            assert_eq!(entry.month as usize, index);
            assert!(entry.balance >= 0.0);
            assert!(entry.principal >= 0.0);
            assert!(entry.interest >= 0.0);
            assert!(entry.payment > 0.0);
            assert_eq!(entry.payment, entry.principal + entry.interest);
        }
    }

    #[test]
    fn lump_sum_lands_on_year_end_months_within_window() {
        let result = calculate_payoff_schedule(
            12_000.0,
            0.0,
            &PaymentConfig {
                monthly_payment: 100.0,
                annual_lump_sum: 1_000.0,
                lump_sum_years: 1,
                max_duration: 600,
            },
        );

        assert_eq!(result.schedule[11].lump_sum, 1_000.0);
        assert_eq!(result.schedule[11].principal, 1_100.0);
        assert_eq!(result.schedule[23].lump_sum, 0.0);
        assert!(
            result
                .schedule
                .iter()
                .filter(|e| e.month != 11)
                .all(|e| e.lump_sum == 0.0)
        );
        assert_eq!(result.total_months, 110);
    }

    #[test]
    fn negative_lump_sum_adds_nothing() {
        let plain = calculate_payoff_schedule(12_000.0, 0.0, &config(100.0, 600));
        let result = calculate_payoff_schedule(
            12_000.0,
            0.0,
            &PaymentConfig {
                monthly_payment: 100.0,
                annual_lump_sum: -500.0,
                lump_sum_years: 1,
                max_duration: 600,
            },
        );

        assert_eq!(result.total_months, 120);
        assert!(result.schedule.iter().all(|e| e.lump_sum == 0.0));
        assert_eq!(result, plain);
    }

    #[test]
    fn lump_sum_with_zero_years_adds_nothing() {
        let result = calculate_payoff_schedule(
            12_000.0,
            0.0,
            &PaymentConfig {
                monthly_payment: 100.0,
                annual_lump_sum: 1_000.0,
                lump_sum_years: 0,
                max_duration: 600,
            },
        );

        assert_eq!(result.total_months, 120);
        assert!(result.schedule.iter().all(|e| e.lump_sum == 0.0));
        assert_eq!(result.schedule[11].principal, 100.0);
    }

    #[test]
    fn lump_sum_on_final_month_is_clamped() {
        let result = calculate_payoff_schedule(
            1_150.0,
            0.0,
            &PaymentConfig {
                monthly_payment: 100.0,
                annual_lump_sum: 500.0,
                lump_sum_years: 1,
                max_duration: 120,
            },
        );

        let last = result.schedule.last().expect("schedule should not be empty");
        assert_eq!(result.total_months, 12);
        assert_eq!(last.lump_sum, 500.0);
        assert_eq!(last.principal, 50.0);
        assert_eq!(last.balance, 0.0);
        assert!(result.paid_off);
    }

    #[test]
    fn zero_max_duration_yields_empty_schedule() {
        let result = calculate_payoff_schedule(10_000.0, 5.0, &config(1_000.0, 0));
        assert!(result.schedule.is_empty());
        assert_eq!(result.total_months, 0);
        assert!(!result.paid_off);

        let empty_loan = calculate_payoff_schedule(0.0, 5.0, &config(1_000.0, 0));
        assert!(empty_loan.schedule.is_empty());
        assert!(empty_loan.paid_off);
    }

    #[test]
    fn non_positive_principal_is_already_paid_off() {
        let result = calculate_payoff_schedule(-500.0, 5.0, &config(1_000.0, 120));
        assert!(result.schedule.is_empty());
        assert!(result.paid_off);
        assert_eq!(result.total_paid, -500.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let payments = PaymentConfig {
            monthly_payment: 5_000.0,
            annual_lump_sum: 5_000.0,
            lump_sum_years: 5,
            max_duration: 120,
        };
        let first = calculate_payoff_schedule(450_000.0, 7.0, &payments);
        let second = calculate_payoff_schedule(450_000.0, 7.0, &payments);
        assert_eq!(first, second);
    }

    #[test]
    fn iterator_can_be_truncated_by_caller() {
        let mut months = PayoffSchedule::new(100_000.0, 6.0, config(1_000.0, 600));
        let first_year = months.by_ref().take(12).collect::<Vec<_>>();

        assert_eq!(first_year.len(), 12);
        assert_eq!(months.months_elapsed(), 12);
        assert_eq!(months.balance(), first_year[11].balance);
        assert_close(
            months.total_interest(),
            first_year.iter().map(|e| e.interest).sum::<f64>(),
            1e-9,
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_sufficient_payment_pays_off_exactly(
            principal in 1_000u32..500_000,
            apr_bp in 0u32..1_500,
            term in 12u32..360,
        ) {
            let principal = principal as f64;
            let apr = apr_bp as f64 / 100.0;
            let payment = minimum_payment(principal, apr, term) * 1.05;
            let result = calculate_payoff_schedule(principal, apr, &config(payment, term + 12));

            prop_assert!(result.paid_off);
            prop_assert_eq!(result.schedule.len(), result.total_months as usize);
            prop_assert!(result.total_months <= term);
            prop_assert_eq!(result.schedule.last().map(|e| e.balance), Some(0.0));
            prop_assert_eq!(result.total_paid, principal + result.total_interest);
            for (index, entry) in result.schedule.iter().enumerate() {
                prop_assert_eq!(entry.month as usize, index);
                prop_assert!(entry.balance >= 0.0);
            }
        }

        #[test]
        fn prop_zero_apr_months_is_ceiling_division(
            principal in 1_000u32..500_000,
            payment in 50u32..10_000,
        ) {
            let result = calculate_payoff_schedule(
                principal as f64,
                0.0,
                &config(payment as f64, 20_000),
            );

            prop_assert!(result.paid_off);
            prop_assert_eq!(result.total_interest, 0.0);
            prop_assert_eq!(result.total_months, principal.div_ceil(payment));
        }

        #[test]
        fn prop_lump_sum_never_lengthens_payoff(
            principal in 1_000u32..500_000,
            apr_bp in 0u32..1_500,
            lump_sum in 1u32..50_000,
            lump_sum_years in 1u32..11,
        ) {
            let principal = principal as f64;
            let apr = apr_bp as f64 / 100.0;
            let base = config(minimum_payment(principal, apr, 240) * 1.01, 600);
            let without = calculate_payoff_schedule(principal, apr, &base);
            let with = calculate_payoff_schedule(
                principal,
                apr,
                &PaymentConfig {
                    annual_lump_sum: lump_sum as f64,
                    lump_sum_years,
                    ..base
                },
            );

            prop_assert!(with.total_months <= without.total_months);
            prop_assert!(with.total_interest <= without.total_interest + 1e-6);
        }
    }
}
