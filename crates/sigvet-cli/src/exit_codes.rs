//! Exit codes for the `sigvet` binary.
//! Scripts gate package ingestion on these; treat them as a public contract.

pub const SUCCESS: i32 = 0;
pub const REJECTED: i32 = 1; // Validation failed, or a command could not complete
pub const INFRASTRUCTURE_ERROR: i32 = 2; // A collaborator failed; no decision was made
