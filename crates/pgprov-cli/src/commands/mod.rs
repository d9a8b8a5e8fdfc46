//! CLI command implementations for pgprov.

pub mod check;
pub mod expand;
pub mod reconcile;
