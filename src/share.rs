//! Query-string form of a loan and its payment plan, used for shareable links.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Loan, PaymentConfig};

pub const SHARED_LOAN_ID: &str = "url-imported";
pub const SHARED_LOAN_NAME: &str = "Shared Scenario";

const DEFAULT_DURATION: u32 = 120;
const DEFAULT_LUMP_SUM: f64 = 0.0;
const DEFAULT_LUMP_SUM_YEARS: u32 = 5;

#[derive(Debug, Error)]
#[error("failed to encode share query: {0}")]
pub struct ShareError(#[from] serde_urlencoded::ser::Error);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedScenario {
    pub loan: Loan,
    pub payments: PaymentConfig,
}

pub fn encode_share_query(loan: &Loan, payments: &PaymentConfig) -> Result<String, ShareError> {
    let mut pairs = vec![
        ("principal", loan.principal.to_string()),
        ("apr", loan.apr.to_string()),
        ("payment", payments.monthly_payment.to_string()),
        ("duration", payments.max_duration.to_string()),
        ("lumpsum", payments.annual_lump_sum.to_string()),
        ("lumpyears", payments.lump_sum_years.to_string()),
    ];
    if !loan.name.is_empty() {
        pairs.push(("name", loan.name.clone()));
    }
    Ok(serde_urlencoded::to_string(pairs)?)
}

/// Returns `None` when a required key is missing or any number fails to parse.
pub fn decode_share_query(query: &str) -> Option<SharedScenario> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok()?;
    let get = |key: &str| first_value(&pairs, key);

    let principal = parse_number(get("principal")?)?;
    let apr = parse_number(get("apr")?)?;
    let monthly_payment = parse_number(get("payment")?)?;

    let max_duration = match get("duration") {
        Some(raw) => parse_count(raw)?,
        None => DEFAULT_DURATION,
    };
    let annual_lump_sum = match get("lumpsum") {
        Some(raw) => parse_number(raw)?,
        None => DEFAULT_LUMP_SUM,
    };
    let lump_sum_years = match get("lumpyears") {
        Some(raw) => parse_count(raw)?,
        None => DEFAULT_LUMP_SUM_YEARS,
    };

    Some(SharedScenario {
        loan: Loan {
            id: SHARED_LOAN_ID.to_string(),
            name: get("name").unwrap_or(SHARED_LOAN_NAME).to_string(),
            principal,
            apr,
        },
        payments: PaymentConfig {
            monthly_payment,
            annual_lump_sum,
            lump_sum_years,
            max_duration,
        },
    })
}

/// First non-empty value for `key`; later duplicates are ignored.
fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Leading run of digits, so `120.5` reads as 120 the way hand-edited links expect.
fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}
