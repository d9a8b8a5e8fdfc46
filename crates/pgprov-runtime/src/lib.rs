//! Reconciliation runtime: reads what is granted through a [`catalog::GrantCatalog`],
//! compares it with the declared grants and issues corrective statements.

pub mod catalog;
pub mod reconciler;

pub use catalog::GrantCatalog;
pub use reconciler::{GrantPlan, Mode, Reconciler, RunReport};
