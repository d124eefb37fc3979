use serde::{Deserialize, Serialize};

/// Fixed monthly payment plus an optional recurring year-end lump sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    pub monthly_payment: f64,
    pub annual_lump_sum: f64,
    /// Number of years (from the start of the loan) during which the lump sum is paid.
    pub lump_sum_years: u32,
    /// Ceiling on the simulated schedule, in months.
    pub max_duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// Zero-indexed month.
    pub month: u32,
    /// Outstanding balance after this month's payment.
    pub balance: f64,
    /// Principal repaid this month, lump sum included.
    pub principal: f64,
    pub interest: f64,
    /// `principal + interest`.
    pub payment: f64,
    /// Portion of `principal` that came from the annual lump sum.
    pub lump_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffResult {
    pub schedule: Vec<ScheduleEntry>,
    pub total_months: u32,
    pub total_interest: f64,
    /// Original principal plus accumulated interest.
    pub total_paid: f64,
    pub paid_off: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub name: String,
    pub principal: f64,
    /// Annual percentage rate, `7.0` meaning 7%.
    pub apr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub loan: Loan,
    pub payments: PaymentConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PayoffResult>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}
