/// Level monthly payment that retires `principal` in exactly `term_months`
/// under the standard annuity formula.
///
/// A zero rate falls back to straight-line repayment. No guarding is done for
/// extreme terms; overflow surfaces as a non-finite result.
pub fn minimum_payment(principal: f64, apr: f64, term_months: u32) -> f64 {
    let monthly_rate = apr / 100.0 / 12.0;
    let term = f64::from(term_months);
    if monthly_rate == 0.0 {
        return principal / term;
    }

    let growth = (1.0 + monthly_rate).powf(term);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PaymentConfig, calculate_payoff_schedule};
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn standard_ten_year_loan() {
        let payment = minimum_payment(100_000.0, 6.0, 120);
        assert!(payment > 1_100.0);
        assert!(payment < 1_120.0);
    }

    #[test]
    fn zero_apr_divides_evenly() {
        assert_eq!(minimum_payment(12_000.0, 0.0, 12), 1_000.0);
    }

    #[test]
    fn shorter_term_costs_more_per_month() {
        let short_term = minimum_payment(100_000.0, 6.0, 60);
        let long_term = minimum_payment(100_000.0, 6.0, 120);
        assert!(short_term > long_term);
    }

    #[test]
    fn higher_apr_costs_more_per_month() {
        let low_apr = minimum_payment(100_000.0, 4.0, 120);
        let high_apr = minimum_payment(100_000.0, 8.0, 120);
        assert!(high_apr > low_apr);
    }

    #[test]
    fn payment_retires_loan_at_term_end() {
        let payment = minimum_payment(250_000.0, 6.5, 360);
        let result = calculate_payoff_schedule(
            250_000.0,
            6.5,
            &PaymentConfig {
                // Nudged up so rounding residue cannot spill into month 361.
                monthly_payment: payment + 1e-6,
                annual_lump_sum: 0.0,
                lump_sum_years: 0,
                max_duration: 400,
            },
        );
        assert!(result.paid_off);
        assert_eq!(result.total_months, 360);
    }

    #[test]
    fn zero_term_is_non_finite() {
        assert!(!minimum_payment(1_000.0, 0.0, 0).is_finite());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_payment_increases_with_apr(
            principal in 1_000u32..500_000,
            apr_bp in 0u32..1_499,
            step_bp in 1u32..200,
            term in 12u32..600,
        ) {
            let principal = principal as f64;
            let lower = minimum_payment(principal, apr_bp as f64 / 100.0, term);
            let higher = minimum_payment(principal, (apr_bp + step_bp) as f64 / 100.0, term);
            prop_assert!(higher > lower);
        }

        #[test]
        fn prop_payment_decreases_with_term(
            principal in 1_000u32..500_000,
            apr_bp in 0u32..1_500,
            term in 12u32..599,
            extra in 1u32..60,
        ) {
            let principal = principal as f64;
            let apr = apr_bp as f64 / 100.0;
            prop_assert!(minimum_payment(principal, apr, term) > minimum_payment(principal, apr, term + extra));
        }
    }
}
