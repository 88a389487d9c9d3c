// Market data domain
pub mod bar;
pub mod lookback;
