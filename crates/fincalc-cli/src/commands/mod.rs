pub mod investment;
pub mod loan;
pub mod tax;

use chrono::Datelike;
use fincalc_core::calendar::Period;

/// Default schedule start: the current calendar month.
pub fn current_period() -> Result<Period, Box<dyn std::error::Error>> {
    let today = chrono::Local::now().date_naive();
    Ok(Period::new(today.year(), today.month())?)
}
