mod engine;
pub mod format;
mod solver;
mod summary;
mod types;
pub mod validation;

pub use engine::{PayoffSchedule, calculate_payoff_schedule};
pub use solver::minimum_payment;
pub use summary::PayoffSummary;
pub use types::{Loan, PaymentConfig, PayoffResult, Scenario, ScheduleEntry};
