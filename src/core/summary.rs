use serde::Serialize;

use super::format::{format_currency, format_percent, months_to_years};
use super::types::{PaymentConfig, PayoffResult};

/// Headline figures for a computed schedule, numeric and pre-formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffSummary {
    pub payoff_time: String,
    pub payoff_subtext: String,
    pub total_interest: String,
    pub total_paid: String,
    /// Total interest as a percentage of the original principal.
    pub interest_ratio: f64,
    pub interest_ratio_label: String,
    /// Interest as a percentage of everything paid (principal + interest).
    pub interest_share: f64,
    pub warning: Option<String>,
}

impl PayoffSummary {
    pub fn from_result(principal: f64, payments: &PaymentConfig, result: &PayoffResult) -> Self {
        let max_duration = payments.max_duration;
        let (payoff_time, payoff_subtext, warning) = if result.paid_off {
            (
                format!("{} years", months_to_years(result.total_months)),
                format!("({} months)", result.total_months),
                None,
            )
        } else {
            (
                format!(">{} years", months_to_years(max_duration)),
                format!("(exceeds {max_duration} months)"),
                Some(format!(
                    "With current payment settings, the loan will not be fully paid off within \
                     {max_duration} months. Consider increasing your monthly payment or adding \
                     larger annual lump sum payments."
                )),
            )
        };

        let interest_ratio = result.total_interest / principal * 100.0;
        let interest_share = result.total_interest / (principal + result.total_interest) * 100.0;

        Self {
            payoff_time,
            payoff_subtext,
            total_interest: format_currency(result.total_interest, 0),
            total_paid: format_currency(result.total_paid, 0),
            interest_ratio,
            interest_ratio_label: format_percent(interest_ratio, 1),
            interest_share,
            warning,
        }
    }
}
