//! # Adapters
//!
//! Terminal detection backed by the message schema registry.

use crate::ports::TerminalDetector;
use shared_types::{Element, MessageUid};
use tb_01_message_schema::SchemaRegistry;

/// Each message type's schema policy, or the built-in 3-D Secure rule for
/// types the schema does not define.
impl TerminalDetector for SchemaRegistry {
    fn closes_transaction(&self, uid: &MessageUid, message: &Element) -> bool {
        self.is_terminal(uid, message)
    }
}
