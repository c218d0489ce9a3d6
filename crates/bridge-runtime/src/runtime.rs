//! # Bridge Runtime
//!
//! Owns the schema registry, the field transformer and the channel table,
//! and runs one worker task per channel plus the shared sweep timer.
//!
//! ## Startup Sequence
//!
//! 1. Load the schema (bundled or `TB_SCHEMA_PATH`)
//! 2. Build the field cipher and transformer
//! 3. Register channels (each subscribes and spawns its worker)
//! 4. Start the sweep timer for purchase channels

use crate::config::BridgeConfig;
use crate::delivery::DeliveryTargets;
use crate::errors::RuntimeError;
use crate::worker::{ChannelSink, ChannelWorker};
use parking_lot::{Mutex, RwLock};
use shared_bus::{InMemoryMessageBus, Selector};
use shared_crypto::{FieldCipher, SecretKey};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tb_01_message_schema::{SchemaRegistry, SchemaSource};
use tb_02_channel_filter::{ChannelConfig, ChannelFilterService, Reconfiguration, TemplateValidator};
use tb_03_field_transform::{FieldEncryptor, FieldTransformer, MaskTemplateValidator};
use tb_04_purchase_aggregator::PurchaseChannel;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pending rebinds per channel worker.
const REBIND_BUFFER: usize = 4;

/// How long shutdown waits for tasks to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct ChannelHandle {
    filter: Arc<ChannelFilterService>,
    rebind: mpsc::Sender<oneshot::Sender<()>>,
    purchase: Option<Arc<PurchaseChannel>>,
}

type ChannelTable = Arc<RwLock<BTreeMap<String, ChannelHandle>>>;

pub struct BridgeRuntime {
    config: BridgeConfig,
    registry: Arc<SchemaRegistry>,
    transformer: Arc<FieldTransformer>,
    templates: Arc<dyn TemplateValidator>,
    bus: Arc<InMemoryMessageBus>,
    channels: ChannelTable,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BridgeRuntime {
    /// Load the schema and build the shared transform pipeline.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Schema` if the schema source cannot be read or
    /// is invalid.
    pub fn new(config: BridgeConfig, bus: Arc<InMemoryMessageBus>) -> Result<Self, RuntimeError> {
        let registry = match &config.schema_path {
            Some(path) => SchemaRegistry::from_source(&SchemaSource::load(path)?)?,
            None => SchemaRegistry::three_d_secure()?,
        };
        let registry = Arc::new(registry);
        info!(
            definitions = registry.len(),
            source = ?config.schema_path,
            "Message schema loaded"
        );

        let key = match &config.cipher_key {
            Some(key) => key.clone(),
            None => {
                warn!("TB_CIPHER_KEY is not set, encrypting with a random per-process key");
                SecretKey::generate()
            }
        };
        let encryptor: Arc<dyn FieldEncryptor> = Arc::new(FieldCipher::new(key));
        let transformer = Arc::new(FieldTransformer::new(
            Arc::clone(&registry),
            encryptor,
            config.mask.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            registry,
            transformer,
            templates: Arc::new(MaskTemplateValidator),
            bus,
            channels: Arc::new(RwLock::new(BTreeMap::new())),
            tasks: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn registry(&self) -> Arc<SchemaRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn bus(&self) -> Arc<InMemoryMessageBus> {
        Arc::clone(&self.bus)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Validate a channel, subscribe it and spawn its worker. Returns the
    /// selector it subscribed with. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::DuplicateChannel` - the id is already registered
    /// - `RuntimeError::Channel` - the config failed validation
    /// - `RuntimeError::Selector` - the transport rejected the selector
    pub fn add_channel(
        &self,
        config: ChannelConfig,
        targets: &DeliveryTargets,
    ) -> Result<String, RuntimeError> {
        let mut channels = self.channels.write();
        let id = config.id().to_string();
        if channels.contains_key(&id) {
            return Err(RuntimeError::DuplicateChannel(id));
        }

        let is_purchase = config.is_purchase();
        let filter = Arc::new(ChannelFilterService::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.templates),
            config,
        )?);
        let selector = filter.selector();
        let subscription = self.bus.subscribe(&selector)?;

        let purchase = if is_purchase {
            Some(Arc::new(PurchaseChannel::new(
                id.clone(),
                self.config.aggregator.clone(),
                self.registry.clone(),
                Arc::clone(&targets.purchases),
            )?))
        } else {
            None
        };
        let sink = match &purchase {
            Some(channel) => ChannelSink::Purchase(Arc::clone(channel)),
            None => ChannelSink::Messages(Arc::clone(&targets.messages)),
        };

        let (rebind_tx, rebind_rx) = mpsc::channel(REBIND_BUFFER);
        let worker = ChannelWorker::new(
            Arc::clone(&self.bus),
            Arc::clone(&filter),
            Arc::clone(&self.transformer),
            sink,
        );
        let task = tokio::spawn(worker.run(subscription, rebind_rx, self.shutdown_rx.clone()));
        self.tasks.lock().push(task);

        info!(channel = %id, purchase = is_purchase, selector = %selector, "Channel registered");
        channels.insert(
            id,
            ChannelHandle {
                filter,
                rebind: rebind_tx,
                purchase,
            },
        );
        Ok(selector)
    }

    /// Replace a channel's configuration, resubscribing when its merchant
    /// set or any message's field set changed. On error the previous config
    /// stays in force. Returns once the worker is subscribed with the new
    /// selector and has handled everything queued on the old one.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::UnknownChannel` - no channel with this id
    /// - `RuntimeError::Channel` - rejected (invalid, or a purchase channel)
    /// - `RuntimeError::Selector` - the transport rejected the new selector
    pub async fn reconfigure(&self, config: ChannelConfig) -> Result<Reconfiguration, RuntimeError> {
        let id = config.id().to_string();
        let (filter, rebind) = {
            let channels = self.channels.read();
            let handle = channels
                .get(&id)
                .ok_or_else(|| RuntimeError::UnknownChannel(id.clone()))?;
            (Arc::clone(&handle.filter), handle.rebind.clone())
        };

        let outcome = filter.replace(config)?;
        if let Reconfiguration::Resubscribe { selector } = &outcome {
            Selector::parse(selector)?;
            let (done_tx, done_rx) = oneshot::channel();
            if rebind.send(done_tx).await.is_err() || done_rx.await.is_err() {
                warn!(channel = %id, "Channel worker is gone, rebind dropped");
            }
        }
        Ok(outcome)
    }

    /// Register every `*.json` channel config in `dir`, in file name order.
    /// Configs that fail to load or register are logged and skipped.
    /// Returns the number registered.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Io` if the directory cannot be listed.
    pub fn load_channels_dir(
        &self,
        dir: &Path,
        targets: &DeliveryTargets,
    ) -> Result<usize, RuntimeError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut registered = 0;
        for path in paths {
            let result = ChannelConfig::load(&path)
                .map_err(RuntimeError::from)
                .and_then(|config| self.add_channel(config, targets));
            match result {
                Ok(_) => registered += 1,
                Err(e) => error!(path = %path.display(), error = %e, "Channel config rejected"),
            }
        }

        info!(dir = %dir.display(), registered, "Channel configs loaded");
        Ok(registered)
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.read().keys().cloned().collect()
    }

    /// Selector a channel is currently subscribed with.
    pub fn selector(&self, id: &str) -> Option<String> {
        self.channels.read().get(id).map(|h| h.filter.selector())
    }

    /// Config currently in force for a channel.
    pub fn channel_config(&self, id: &str) -> Option<Arc<ChannelConfig>> {
        self.channels.read().get(id).map(|h| h.filter.current())
    }

    /// Open transactions of a purchase channel.
    pub fn open_transactions(&self, id: &str) -> Option<usize> {
        self.channels
            .read()
            .get(id)
            .and_then(|h| h.purchase.as_ref())
            .map(|p| p.open_transactions())
    }

    // =========================================================================
    // Sweep
    // =========================================================================

    /// Sweep every purchase channel once. Returns the number of
    /// transactions flushed.
    pub async fn sweep_now(&self) -> usize {
        sweep_all(&self.channels).await
    }

    /// Start the shared sweep timer. Its first sweep runs one full period
    /// after the call.
    pub fn start_sweeper(&self) {
        let channels = Arc::clone(&self.channels);
        let period = self.config.aggregator.sweep_interval;
        let mut shutdown = self.shutdown_rx.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            info!(period_secs = period.as_secs(), "Purchase sweep timer started");

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("Purchase sweep timer stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        sweep_all(&channels).await;
                    }
                }
            }
        });
        self.tasks.lock().push(task);
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Signal every task to stop and wait briefly for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("Task did not stop within the shutdown grace period");
            }
        }

        info!("Shutdown complete");
    }
}

async fn sweep_all(channels: &ChannelTable) -> usize {
    let purchases: Vec<Arc<PurchaseChannel>> = channels
        .read()
        .values()
        .filter_map(|h| h.purchase.clone())
        .collect();

    let mut flushed = 0;
    for channel in purchases {
        flushed += channel.sweep().await;
    }
    flushed
}
