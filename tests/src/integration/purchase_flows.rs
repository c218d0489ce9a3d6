//! # Purchase Channel Flows
//!
//! Messages sharing a correlation id are merged into one purchase
//! transaction, flushed complete on the terminal message or partial when the
//! sweep finds it idle.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use bridge_runtime::BridgeRuntime;
    use shared_bus::MessagePublisher;
    use shared_crypto::FieldCipher;
    use shared_types::{Element, MessageUid};
    use std::time::Duration;
    use tb_02_channel_filter::ChannelConfig;
    use tb_04_purchase_aggregator::{TRANSACTION_ID_ATTRIBUTE, TRANSACTION_ROOT};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::{sleep, timeout, Instant};

    const CHANNEL: &str = "purchases";

    fn purchase_channel() -> ChannelConfig {
        ChannelConfig::purchase(CHANNEL)
            .with_merchant("Merchant1")
            .with_message(MessageUid::any_version("VEReq"), vec![])
            .with_message(MessageUid::any_version("VERes"), vec![])
            .with_message(MessageUid::any_version("PAReq"), vec![])
            .with_message(MessageUid::any_version("PARes"), vec![])
    }

    async fn next(rx: &mut UnboundedReceiver<Flushed>) -> Flushed {
        match timeout(DELIVERY_TIMEOUT, rx.recv()).await {
            Ok(Some(flushed)) => flushed,
            Ok(None) => panic!("transaction sink closed"),
            Err(_) => panic!("no transaction within {DELIVERY_TIMEOUT:?}"),
        }
    }

    async fn assert_quiet(rx: &mut UnboundedReceiver<Flushed>) {
        if let Ok(Some(flushed)) = timeout(QUIET_PERIOD, rx.recv()).await {
            panic!("unexpected flush: {flushed:?}");
        }
    }

    /// Wait for the worker to catch up with what was published.
    async fn wait_for_open(runtime: &BridgeRuntime, expected: usize) {
        let deadline = Instant::now() + DELIVERY_TIMEOUT;
        while runtime.open_transactions(CHANNEL) != Some(expected) {
            assert!(
                Instant::now() < deadline,
                "open transactions stuck at {:?}, expected {expected}",
                runtime.open_transactions(CHANNEL)
            );
            sleep(Duration::from_millis(5)).await;
        }
    }

    fn tags(document: &Element) -> Vec<&str> {
        document.children.iter().map(|c| c.name.as_str()).collect()
    }

    // =========================================================================
    // Terminal flush
    // =========================================================================

    #[tokio::test]
    async fn test_full_flow_flushes_complete_on_pares() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(vereq("Merchant1", "1.0.2", "tx-1", "4000000000000002")).await;
        bus.publish(veres("Merchant1", "1.0.2", "tx-1", "Y")).await;
        bus.publish(pareq("Merchant1", "1.0.2", "tx-1")).await;
        bus.publish(pares("Merchant1", "1.0.2", "tx-1")).await;

        let Flushed::Complete(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(id, "tx-1");
        assert_eq!(document.name, TRANSACTION_ROOT);
        assert_eq!(document.attribute(TRANSACTION_ID_ATTRIBUTE), Some("tx-1"));
        assert_eq!(tags(&document), vec!["VEReq", "VERes", "PAReq", "PARes"]);

        // Schema encryption ran before aggregation.
        let cipher = FieldCipher::new(test_key());
        let pan = document
            .child("VEReq")
            .and_then(|r| r.child("pan"))
            .and_then(Element::text)
            .unwrap();
        assert_eq!(cipher.decrypt_text(pan).unwrap(), "4000000000000002");

        assert_eq!(runtime.open_transactions(CHANNEL), Some(0));
        assert_quiet(&mut collected.transactions).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_unenrolled_veres_closes_transaction() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(vereq("Merchant1", "1.0.1", "tx-1", "4000000000000002")).await;
        bus.publish(veres("Merchant1", "1.0.1", "tx-1", "N")).await;

        let Flushed::Complete(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(id, "tx-1");
        assert_eq!(tags(&document), vec!["VEReq", "VERes"]);
        assert_eq!(runtime.open_transactions(CHANNEL), Some(0));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_interleaved_transactions_flush_independently() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(veres("Merchant1", "1.0.2", "tx-a", "Y")).await;
        bus.publish(veres("Merchant1", "1.0.2", "tx-b", "Y")).await;
        bus.publish(pareq("Merchant1", "1.0.2", "tx-a")).await;
        bus.publish(pares("Merchant1", "1.0.2", "tx-b")).await;

        let Flushed::Complete(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(id, "tx-b");
        assert_eq!(tags(&document), vec!["VERes", "PARes"]);
        assert_eq!(runtime.open_transactions(CHANNEL), Some(1));

        bus.publish(pares("Merchant1", "1.0.2", "tx-a")).await;
        let Flushed::Complete(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(id, "tx-a");
        assert_eq!(tags(&document), vec!["VERes", "PAReq", "PARes"]);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_repeated_message_type_keeps_latest() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(vereq("Merchant1", "1.0.2", "tx-1", "4000000000000002")).await;
        bus.publish(vereq("Merchant1", "1.0.2", "tx-1", "4111111111111111")).await;
        bus.publish(pares("Merchant1", "1.0.2", "tx-1")).await;

        let Flushed::Complete(_, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(tags(&document), vec!["VEReq", "PARes"]);

        let cipher = FieldCipher::new(test_key());
        let pan = document
            .child("VEReq")
            .and_then(|r| r.child("pan"))
            .and_then(Element::text)
            .unwrap();
        assert_eq!(cipher.decrypt_text(pan).unwrap(), "4111111111111111");

        runtime.shutdown().await;
    }

    // =========================================================================
    // Dropped messages
    // =========================================================================

    #[tokio::test]
    async fn test_message_without_correlation_id_is_dropped() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(without_correlation(veres("Merchant1", "1.0.2", "ignored", "N"))).await;
        bus.publish(pares("Merchant1", "1.0.2", "tx-2")).await;

        let Flushed::Complete(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a complete transaction");
        };
        assert_eq!(id, "tx-2");
        assert_eq!(tags(&document), vec!["PARes"]);
        assert_quiet(&mut collected.transactions).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_other_merchants_never_open_transactions() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        runtime.bus().publish(pares("Merchant2", "1.0.2", "tx-1")).await;

        assert_quiet(&mut collected.transactions).await;
        assert_eq!(runtime.open_transactions(CHANNEL), Some(0));

        runtime.shutdown().await;
    }

    // =========================================================================
    // Sweep
    // =========================================================================

    #[tokio::test]
    async fn test_sweep_flushes_idle_transaction_as_partial() {
        let runtime = runtime_with(Duration::from_millis(1), Duration::from_secs(86_400));
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(vereq("Merchant1", "1.0.2", "tx-1", "4000000000000002")).await;
        bus.publish(veres("Merchant1", "1.0.2", "tx-1", "Y")).await;
        wait_for_open(&runtime, 1).await;

        sleep(Duration::from_millis(20)).await;
        assert_eq!(runtime.sweep_now().await, 1);

        let Flushed::Partial(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a partial transaction");
        };
        assert_eq!(id, "tx-1");
        assert_eq!(tags(&document), vec!["VEReq", "VERes"]);
        assert_eq!(runtime.open_transactions(CHANNEL), Some(0));

        // Nothing left for a second sweep.
        assert_eq!(runtime.sweep_now().await, 0);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_transactions() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();

        runtime
            .bus()
            .publish(vereq("Merchant1", "1.0.2", "tx-1", "4000000000000002"))
            .await;
        wait_for_open(&runtime, 1).await;

        assert_eq!(runtime.sweep_now().await, 0);
        assert_eq!(runtime.open_transactions(CHANNEL), Some(1));
        assert_quiet(&mut collected.transactions).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweep_timer_flushes_without_manual_sweep() {
        let runtime = runtime_with(Duration::from_millis(1), Duration::from_millis(50));
        let (targets, mut collected) = collecting_targets();
        runtime.add_channel(purchase_channel(), &targets).unwrap();
        runtime.start_sweeper();

        runtime
            .bus()
            .publish(pareq("Merchant1", "1.0.2", "tx-1"))
            .await;

        let Flushed::Partial(id, document) = next(&mut collected.transactions).await else {
            panic!("expected a partial transaction");
        };
        assert_eq!(id, "tx-1");
        assert_eq!(tags(&document), vec!["PAReq"]);

        runtime.shutdown().await;
    }
}
