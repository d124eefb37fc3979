//! Advisory range checks for user-supplied loan inputs.
//!
//! Nothing here blocks a calculation: the simulator accepts any numbers and the
//! caller decides how to present these messages.

use serde::Serialize;

use super::format::format_currency;

const MAX_LOAN_AMOUNT: f64 = 10_000_000.0;
const MAX_APR: f64 = 30.0;
const MIN_DURATION_MONTHS: f64 = 12.0;
const MAX_DURATION_MONTHS: f64 = 600.0;
const MIN_LUMP_SUM_YEARS: f64 = 1.0;
const MAX_LUMP_SUM_YEARS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanInputs {
    pub loan_amount: f64,
    pub apr: f64,
    pub monthly_payment: f64,
    pub max_duration: f64,
    pub annual_lump_sum: f64,
    pub lump_sum_years: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate(inputs: &LoanInputs) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if inputs.loan_amount <= 0.0 {
        errors.push(FieldError::new(
            "loanAmount",
            "Loan amount must be greater than 0",
        ));
    } else if inputs.loan_amount > MAX_LOAN_AMOUNT {
        errors.push(FieldError::new("loanAmount", "Loan amount seems too high"));
    }

    if inputs.apr < 0.0 {
        errors.push(FieldError::new("apr", "APR cannot be negative"));
    } else if inputs.apr > MAX_APR {
        errors.push(FieldError::new("apr", "APR above 30% is unusually high"));
    }

    if inputs.monthly_payment <= 0.0 {
        errors.push(FieldError::new(
            "monthlyPayment",
            "Monthly payment must be greater than 0",
        ));
    } else {
        // Only the opening balance is checked; lump sums can change coverage later.
        let monthly_interest = inputs.loan_amount * inputs.apr / 100.0 / 12.0;
        if inputs.monthly_payment < monthly_interest {
            errors.push(FieldError::new(
                "monthlyPayment",
                format!(
                    "Payment must be at least {} to cover monthly interest",
                    format_currency(monthly_interest.ceil(), 0)
                ),
            ));
        }
    }

    if inputs.max_duration < MIN_DURATION_MONTHS {
        errors.push(FieldError::new(
            "maxDuration",
            "Duration must be at least 12 months",
        ));
    } else if inputs.max_duration > MAX_DURATION_MONTHS {
        errors.push(FieldError::new(
            "maxDuration",
            "Duration cannot exceed 600 months (50 years)",
        ));
    }

    if inputs.annual_lump_sum < 0.0 {
        errors.push(FieldError::new(
            "annualLumpSum",
            "Annual lump sum cannot be negative",
        ));
    }

    if inputs.lump_sum_years < MIN_LUMP_SUM_YEARS || inputs.lump_sum_years > MAX_LUMP_SUM_YEARS {
        errors.push(FieldError::new(
            "lumpSumYears",
            "Lump sum years must be between 1 and 10",
        ));
    }

    errors
}

/// First message reported for `field`, if any.
pub fn field_error<'a>(errors: &'a [FieldError], field: &str) -> Option<&'a str> {
    errors
        .iter()
        .find(|e| e.field == field)
        .map(|e| e.message.as_str())
}
