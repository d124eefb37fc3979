use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::{
    ScheduleArgs, ScheduleResponse, ServeConfig, build_request, build_schedule_response,
    run_http_server,
};
use crate::core::format::{format_currency, months_to_years};
use crate::core::minimum_payment;
use crate::error::AppError;
use crate::export::write_schedule_csv;

#[derive(Parser, Debug)]
#[command(
    name = "loan-payoff",
    about = "Loan amortization calculator: monthly schedule, payoff time and interest cost",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "LOAN_PAYOFF_LOG",
        default_value = "info",
        global = true,
        help = "Log filter used when RUST_LOG is not set"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve(ServeArgs),
    /// Print the month-by-month amortization schedule
    Schedule(ScheduleCommand),
    /// Payment that retires a loan in exactly the given number of months
    MinimumPayment(MinimumPaymentArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "LOAN_PAYOFF_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "LOAN_PAYOFF_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        env = "LOAN_PAYOFF_SCENARIOS",
        help = "JSON file for saved scenarios; kept in memory when omitted"
    )]
    pub scenarios_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub struct ScheduleCommand {
    #[command(flatten)]
    pub loan: ScheduleArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct MinimumPaymentArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(long)]
    pub apr: f64,
    #[arg(long)]
    pub term_months: u32,
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve(args) => {
            run_http_server(ServeConfig {
                host: args.host,
                port: args.port,
                scenarios_file: args.scenarios_file,
            })
            .await
        }
        Command::Schedule(cmd) => {
            let request = build_request(cmd.loan).map_err(AppError::InvalidInput)?;
            let response = build_schedule_response(request);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match cmd.format {
                OutputFormat::Table => write_table(&response, &mut out)?,
                OutputFormat::Csv => write_schedule_csv(&response.result.schedule, &mut out)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &response)?;
                    writeln!(out)?;
                }
            }
            Ok(())
        }
        Command::MinimumPayment(args) => {
            if args.term_months == 0 {
                return Err(AppError::InvalidInput(
                    "--term-months must be > 0".to_string(),
                ));
            }
            let payment = minimum_payment(args.principal, args.apr, args.term_months);
            println!(
                "{} per month over {} months ({} years)",
                format_currency(payment, 2),
                args.term_months,
                months_to_years(args.term_months)
            );
            Ok(())
        }
    }
}

fn write_table<W: Write>(response: &ScheduleResponse, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {:>14}  {:>12}  {:>12}  {:>12}  {:>10}",
        "Month", "Balance", "Principal", "Interest", "Payment", "Lump Sum"
    )?;
    for entry in &response.result.schedule {
        writeln!(
            out,
            "{:>5}  {:>14}  {:>12}  {:>12}  {:>12}  {:>10}",
            u64::from(entry.month) + 1,
            format_currency(entry.balance, 2),
            format_currency(entry.principal, 2),
            format_currency(entry.interest, 2),
            format_currency(entry.payment, 2),
            format_currency(entry.lump_sum, 2),
        )?;
    }

    let summary = &response.summary;
    writeln!(out)?;
    writeln!(
        out,
        "Payoff time:    {} {}",
        summary.payoff_time, summary.payoff_subtext
    )?;
    writeln!(out, "Total interest: {}", summary.total_interest)?;
    writeln!(out, "Total paid:     {}", summary.total_paid)?;
    writeln!(
        out,
        "Interest cost:  {} of original loan",
        summary.interest_ratio_label
    )?;
    if let Some(warning) = &summary.warning {
        writeln!(out, "Warning: {warning}")?;
    }
    for field_error in &response.warnings {
        writeln!(out, "Check {}: {}", field_error.field, field_error.message)?;
    }
    Ok(())
}
