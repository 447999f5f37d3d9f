mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::investment::{FdArgs, PpfArgs, RentVsBuyArgs, SipArgs, SwpArgs};
use commands::loan::{
    AdvancedLoanArgs, EmiArgs, LoanArgs, MoratoriumLoanArgs, StepupLoanArgs, TopupLoanArgs,
};
use commands::tax::{CagrArgs, LtcgArgs};

/// Loan, deposit, investment and tax schedule calculations
#[derive(Parser)]
#[command(
    name = "fincalc",
    version,
    about = "Loan, deposit, investment and tax schedule calculations",
    long_about = "A CLI for building loan amortisation, deposit, SIP, PPF, SWP and \
                  rent-vs-buy schedules with decimal precision, plus LTCG tax and \
                  rate primitives. Inputs come from flags, a JSON file, or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the EMI for a principal, rate and tenure
    Emi(EmiArgs),
    /// Build a full amortisation schedule
    Loan(LoanArgs),
    /// Amortisation with prepayments, rate changes and EMI step-ups
    AdvancedLoan(AdvancedLoanArgs),
    /// Base loan plus a later top-up disbursal
    TopupLoan(TopupLoanArgs),
    /// Loan with an initial payment holiday
    MoratoriumLoan(MoratoriumLoanArgs),
    /// Loan whose EMI rises on each anniversary
    StepupLoan(StepupLoanArgs),
    /// Project a systematic investment plan
    Sip(SipArgs),
    /// Build a fixed-deposit schedule
    Fd(FdArgs),
    /// Project a Public Provident Fund account
    Ppf(PpfArgs),
    /// Build a systematic withdrawal plan with depletion detection
    Swp(SwpArgs),
    /// Compare buying a home against renting and investing
    RentVsBuy(RentVsBuyArgs),
    /// Apply the long-term capital gains overlay to a realised gain
    Ltcg(LtcgArgs),
    /// Compound annual growth rate between two values
    Cagr(CagrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loan::run_emi(args),
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::AdvancedLoan(args) => commands::loan::run_advanced_loan(args),
        Commands::TopupLoan(args) => commands::loan::run_topup_loan(args),
        Commands::MoratoriumLoan(args) => commands::loan::run_moratorium_loan(args),
        Commands::StepupLoan(args) => commands::loan::run_stepup_loan(args),
        Commands::Sip(args) => commands::investment::run_sip(args),
        Commands::Fd(args) => commands::investment::run_fd(args),
        Commands::Ppf(args) => commands::investment::run_ppf(args),
        Commands::Swp(args) => commands::investment::run_swp(args),
        Commands::RentVsBuy(args) => commands::investment::run_rent_vs_buy(args),
        Commands::Ltcg(args) => commands::tax::run_ltcg(args),
        Commands::Cagr(args) => commands::tax::run_cagr(args),
        Commands::Version => {
            println!("fincalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
