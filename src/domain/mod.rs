// Market data domain
pub mod market;

// Feature catalog and prediction records
pub mod ml;

// Port interfaces
pub mod ports;

// Input validation
pub mod validation;

// Domain-specific error types
pub mod errors;
