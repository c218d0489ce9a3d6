//! # Domain Layer
//!
//! Mask template language, mask context, transform errors and reports.

pub mod context;
pub mod errors;
pub mod mask;
pub mod report;

pub use context::{DisplayZone, MaskContext, ZoneParseError, DEFAULT_CURRENCY_SYMBOL};
pub use errors::{MaskError, TransformError};
pub use mask::{apply_mask, MaskTemplate, MaskToken};
pub use report::{FieldFailure, Operation, TransformReport};
