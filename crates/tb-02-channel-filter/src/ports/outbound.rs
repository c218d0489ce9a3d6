//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by channel validation.

/// Syntax check for mask templates.
///
/// Production: `MaskTemplateValidator` (tb-03-field-transform)
pub trait TemplateValidator: Send + Sync {
    /// Check that a template parses.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the template is malformed.
    fn check(&self, template: &str) -> Result<(), String>;
}
