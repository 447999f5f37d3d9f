pub mod advanced;
pub mod basic;
pub mod moratorium;
pub mod schedule;
pub mod stepup;
pub mod topup;
