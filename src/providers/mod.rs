pub mod fred;
pub mod yahoo_finance;
