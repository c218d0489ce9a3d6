//! # Field Transform Engine (tb-03)
//!
//! Rewrites protocol documents for a channel: prunes them to the configured
//! fields, masks values with templates and encrypts what must not travel in
//! clear.
//!
//! ## Pipeline
//!
//! ```text
//! document ──extract──→ pruned ──mask──→ masked ──encrypt──→ delivered
//!              ↑                   ↑                  ↑
//!      overrides + mandatory   bean templates   override flag, else schema flag
//! ```
//!
//! ## Mask templates
//!
//! | Template | Value | Output |
//! |----------|-------|--------|
//! | `Y{0}#{4}` | `4111111111111111` | `YYYYYYYYYYYY1111` |
//! | `A{2}#{2}X{0}#{2}Y{1}` | `0124456789` | `AA24XXX78Y` |
//! | `{date,dd MMM yyyy}` | `20020806 10:10:10` | `06 Aug 2002` |
//! | `{number,¤#,##0.00}` | `1234.5` | `$1,234.50` |
//! | `Paid from {0}` | `ACME` | `Paid from ACME` |
//!
//! ## Crate Structure
//!
//! - `domain/` - mask language, `MaskContext`, errors, `TransformReport`
//! - `ports/` - `FieldEncryptor`
//! - `adapters/` - `FieldCipher` encryption, `MaskTemplateValidator`
//! - `service.rs` - `FieldTransformer`

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::MaskTemplateValidator;
pub use domain::{
    apply_mask, DisplayZone, FieldFailure, MaskContext, MaskError, MaskTemplate, Operation,
    TransformError, TransformReport, ZoneParseError, DEFAULT_CURRENCY_SYMBOL,
};
pub use ports::FieldEncryptor;
pub use service::FieldTransformer;
