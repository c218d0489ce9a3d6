//! Mask syntax check used when channel configs are validated.

use crate::domain::mask::MaskTemplate;
use tb_02_channel_filter::TemplateValidator;

/// Accepts exactly the templates the transform engine can parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskTemplateValidator;

impl TemplateValidator for MaskTemplateValidator {
    fn check(&self, template: &str) -> Result<(), String> {
        MaskTemplate::parse(template)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
