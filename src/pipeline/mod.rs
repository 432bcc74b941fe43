//! Reconciliation, resampling, smoothing and annualisation stages.

pub mod annualise;
pub mod audit;
pub mod reconcile;
pub mod smooth;
pub mod unify;

pub use annualise::annualise;
pub use audit::{day_range, IntegrityAuditor};
pub use reconcile::{BackfillReconciler, ReconcileResult};
pub use smooth::smooth;
pub use unify::{combine, resample, unify};
