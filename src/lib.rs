//! Label and pallet calculation for production batches.
//!
//! The calculator turns a piece count into the number of container labels to
//! print, the pieces left over and the pallets needed. The surrounding modules
//! expose it as a small HTTP service with autocomplete and CSV export.

pub mod api;
pub mod calculator;
pub mod config;
pub mod export;
pub mod model;
pub mod suggestions;
pub mod trace;

pub use calculator::compute;
pub use model::{CalcError, PackingInput, PackingResult};
