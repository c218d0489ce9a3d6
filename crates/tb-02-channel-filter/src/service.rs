//! # Channel Filter Service
//!
//! Holds a channel's live configuration and compiled selector.
//!
//! ## Atomic replacement
//!
//! The config is an `Arc<ChannelConfig>` stored together with the selector
//! compiled from it behind one `parking_lot::RwLock`. Workers clone the `Arc`
//! once per message and keep using that snapshot, so a replacement is a
//! pointer swap that no worker can observe half-applied. `replace` holds an
//! upgradable read guard from the check to the swap, so concurrent
//! replacements are serialized and never pair one config with another's
//! selector. A rejected replacement leaves the previous config in force.

use crate::domain::{ChannelConfig, ChannelConfigError, SelectorCompiler};
use crate::ports::TemplateValidator;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;
use tb_01_message_schema::SchemaRegistry;
use tracing::{info, warn};

/// Outcome of a configuration replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconfiguration {
    /// Merchant and field sets equal the config in force; nothing was
    /// swapped.
    Unchanged,
    /// The config was swapped and the transport must be rebound with the
    /// new selector.
    Resubscribe { selector: String },
}

struct ChannelState {
    config: Arc<ChannelConfig>,
    selector: String,
}

/// Live state of one channel.
pub struct ChannelFilterService {
    registry: Arc<SchemaRegistry>,
    compiler: SelectorCompiler,
    templates: Arc<dyn TemplateValidator>,
    state: RwLock<ChannelState>,
}

impl ChannelFilterService {
    /// Validate and install the initial configuration.
    ///
    /// # Errors
    ///
    /// Returns `ChannelConfigError` if the config fails validation.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        templates: Arc<dyn TemplateValidator>,
        config: ChannelConfig,
    ) -> Result<Self, ChannelConfigError> {
        config.validate(&registry, templates.as_ref())?;

        let compiler = SelectorCompiler::new(registry.clone());
        let selector = compiler.compile(&config);
        info!(channel = %config.id(), selector = %selector, "Channel configured");

        Ok(Self {
            registry,
            compiler,
            templates,
            state: RwLock::new(ChannelState {
                config: Arc::new(config),
                selector,
            }),
        })
    }

    /// Snapshot of the config in force.
    pub fn current(&self) -> Arc<ChannelConfig> {
        Arc::clone(&self.state.read().config)
    }

    /// Selector the channel is subscribed with.
    pub fn selector(&self) -> String {
        self.state.read().selector.clone()
    }

    /// Config in force and the selector compiled from it, read together.
    pub fn subscribed(&self) -> (Arc<ChannelConfig>, String) {
        let state = self.state.read();
        (Arc::clone(&state.config), state.selector.clone())
    }

    /// Channel id.
    pub fn id(&self) -> String {
        self.state.read().config.id().to_string()
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// - `ChannelConfigError::IdMismatch` - the replacement is for another channel
    /// - `ChannelConfigError::PurchaseReconfiguration` - purchase channels are fixed
    /// - any validation error from [`ChannelConfig::validate`]
    ///
    /// On error the previous config stays in force.
    pub fn replace(&self, next: ChannelConfig) -> Result<Reconfiguration, ChannelConfigError> {
        let state = self.state.upgradable_read();
        let previous = Arc::clone(&state.config);

        let result = self.check_replacement(&previous, &next);
        if let Err(e) = &result {
            warn!(channel = %previous.id(), error = %e, "Channel reconfiguration rejected");
        }
        result?;

        if !next.requires_resubscription(&previous) {
            info!(channel = %previous.id(), "Channel reconfiguration is a no-op");
            return Ok(Reconfiguration::Unchanged);
        }

        let selector = self.compiler.compile(&next);
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        *state = ChannelState {
            config: Arc::new(next),
            selector: selector.clone(),
        };
        drop(state);

        info!(channel = %previous.id(), selector = %selector, "Channel resubscribing");
        Ok(Reconfiguration::Resubscribe { selector })
    }

    fn check_replacement(
        &self,
        previous: &ChannelConfig,
        next: &ChannelConfig,
    ) -> Result<(), ChannelConfigError> {
        if next.id() != previous.id() {
            return Err(ChannelConfigError::IdMismatch {
                expected: previous.id().to_string(),
                found: next.id().to_string(),
            });
        }
        if previous.is_purchase() || next.is_purchase() {
            return Err(ChannelConfigError::PurchaseReconfiguration {
                channel: previous.id().to_string(),
            });
        }
        next.validate(&self.registry, self.templates.as_ref())
    }
}
