//! # impasse-debug
//!
//! Diagnostics for contact anomalies.
//!
//! When exact CCD reports an impact at time zero, the bodies were
//! already touching at the start of the step. The narrow phase captures
//! the offending primitive pair as an [`ImpactSnapshot`] and hands it to
//! an [`ImpactHook`], which may dump it to disk for offline replay.

pub mod hooks;
pub mod snapshot;

pub use hooks::{CollectingHook, ImpactHook, JsonDumpHook};
pub use snapshot::{ImpactSnapshot, PrimitiveSnapshot};
