// Market data processing modules
pub mod feature_assembler;
pub mod indicators;
