//! # Per-Message Channel Flows
//!
//! Messages published on the transport reach the channels whose selector
//! matches, transformed with each channel's field overrides.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use shared_bus::MessagePublisher;
    use shared_crypto::FieldCipher;
    use shared_types::{ElementPath, MessageUid};
    use std::collections::BTreeSet;
    use std::io::Write;
    use tb_02_channel_filter::{ChannelConfig, MessageFieldBean, Reconfiguration};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    async fn next(rx: &mut UnboundedReceiver<Delivered>) -> Delivered {
        match timeout(DELIVERY_TIMEOUT, rx.recv()).await {
            Ok(Some(delivered)) => delivered,
            Ok(None) => panic!("delivery sink closed"),
            Err(_) => panic!("no delivery within {DELIVERY_TIMEOUT:?}"),
        }
    }

    async fn assert_quiet(rx: &mut UnboundedReceiver<Delivered>) {
        if let Ok(Some(delivered)) = timeout(QUIET_PERIOD, rx.recv()).await {
            panic!(
                "unexpected delivery to '{}': {}",
                delivered.channel, delivered.message.uid
            );
        }
    }

    fn bean(path: &str) -> MessageFieldBean {
        MessageFieldBean::new(ElementPath::parse(path).unwrap())
    }

    fn value(delivered: &Delivered, path: &str) -> Option<String> {
        let path = ElementPath::parse(path).unwrap();
        root(&delivered.message)
            .and_then(|r| r.value_at(&path))
            .map(str::to_string)
    }

    // =========================================================================
    // Routing
    // =========================================================================

    #[tokio::test]
    async fn test_routes_by_merchant_and_message() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        let config = ChannelConfig::new("acquirer-feed")
            .with_merchant("Merchant1")
            .with_message(MessageUid::new("VERes", "1.0.2"), vec![]);
        runtime.add_channel(config, &targets).unwrap();

        let bus = runtime.bus();
        bus.publish(veres("Merchant2", "1.0.2", "tx-1", "Y")).await;
        bus.publish(veres("Merchant1", "1.0.1", "tx-2", "Y")).await;
        bus.publish(pares("Merchant1", "1.0.2", "tx-3")).await;
        bus.publish(veres("Merchant1", "1.0.2", "tx-4", "Y")).await;

        let delivered = next(&mut collected.messages).await;
        assert_eq!(delivered.channel, "acquirer-feed");
        assert_eq!(delivered.message.merchant_id, "Merchant1");
        assert_eq!(delivered.message.correlation_id.as_deref(), Some("tx-4"));
        assert_quiet(&mut collected.messages).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_every_matching_channel_gets_its_own_copy() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime
            .add_channel(
                ChannelConfig::new("masked")
                    .with_message(MessageUid::any_version("PARes"), vec![bean("pan").masked("Y{0}#{4}")]),
                &targets,
            )
            .unwrap();
        runtime
            .add_channel(
                ChannelConfig::new("raw").with_message(MessageUid::any_version("PARes"), vec![]),
                &targets,
            )
            .unwrap();

        runtime.bus().publish(pares("Merchant1", "1.0.2", "tx-1")).await;

        let mut first = next(&mut collected.messages).await;
        let mut second = next(&mut collected.messages).await;
        if first.channel != "masked" {
            std::mem::swap(&mut first, &mut second);
        }
        assert_eq!(first.channel, "masked");
        assert_eq!(second.channel, "raw");
        assert_eq!(value(&first, "pan").as_deref(), Some("YYYYYYYYYYYY0000"));
        assert_ne!(value(&second, "pan").as_deref(), Some("YYYYYYYYYYYY0000"));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_channel_rejected() {
        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        runtime.add_channel(ChannelConfig::new("feed"), &targets).unwrap();

        let result = runtime.add_channel(ChannelConfig::new("feed"), &targets);
        assert!(matches!(
            result,
            Err(bridge_runtime::RuntimeError::DuplicateChannel(id)) if id == "feed"
        ));
        assert_eq!(runtime.channel_ids(), vec!["feed".to_string()]);

        runtime.shutdown().await;
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    #[tokio::test]
    async fn test_overrides_extract_and_mask() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        let config = ChannelConfig::new("masked-feed")
            .with_merchant("Merchant1")
            .with_message(
                MessageUid::any_version("PARes"),
                vec![bean("pan").masked("Y{0}#{4}").encrypted(false)],
            );
        runtime.add_channel(config, &targets).unwrap();

        runtime.bus().publish(pares("Merchant1", "1.0.2", "tx-1")).await;
        let delivered = next(&mut collected.messages).await;

        assert_eq!(value(&delivered, "pan").as_deref(), Some("YYYYYYYYYYYY0000"));
        // Mandatory fields survive extraction.
        assert_eq!(value(&delivered, "TX/status").as_deref(), Some("Y"));
        assert_eq!(value(&delivered, "Merchant/merID").as_deref(), Some("Merchant1"));
        // Optional fields that were not configured are pruned.
        assert!(value(&delivered, "TX/cavv").is_none());

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_schema_encryption_without_overrides() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        let config = ChannelConfig::new("enrollment")
            .with_message(MessageUid::any_version("VEReq"), vec![]);
        runtime.add_channel(config, &targets).unwrap();

        runtime
            .bus()
            .publish(vereq("Merchant1", "1.0.2", "tx-1", "4000000000000002"))
            .await;
        let delivered = next(&mut collected.messages).await;

        let cipher = FieldCipher::new(test_key());
        let pan = value(&delivered, "pan").unwrap();
        assert_ne!(pan, "4000000000000002");
        assert_eq!(cipher.decrypt_text(&pan).unwrap(), "4000000000000002");

        let password = value(&delivered, "Merchant/password").unwrap();
        assert_eq!(cipher.decrypt_text(&password).unwrap(), "s3cret");

        // Non-sensitive fields pass through untouched.
        assert_eq!(value(&delivered, "Browser/userAgent").as_deref(), Some("Mozilla/5.0"));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_date_mask_uses_display_zone() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        let config = ChannelConfig::new("purchase-dates").with_message(
            MessageUid::new("PAReq", "1.0.2"),
            vec![bean("Purchase/date").masked("{date,yyyy.MM.dd 'at' HH:mm z}")],
        );
        runtime.add_channel(config, &targets).unwrap();

        runtime.bus().publish(pareq("Merchant1", "1.0.2", "tx-1")).await;
        let delivered = next(&mut collected.messages).await;

        assert_eq!(
            value(&delivered, "Purchase/date").as_deref(),
            Some("2002.08.06 at 10:10 EDT")
        );

        runtime.shutdown().await;
    }

    // =========================================================================
    // Reconfiguration
    // =========================================================================

    #[tokio::test]
    async fn test_reconfigure_same_content_is_unchanged() {
        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        let config = ChannelConfig::new("feed")
            .with_merchant("Merchant1")
            .with_message(MessageUid::any_version("PARes"), vec![bean("pan")]);
        runtime.add_channel(config.clone(), &targets).unwrap();
        let before = runtime.selector("feed");

        let outcome = runtime.reconfigure(config).await.unwrap();
        assert_eq!(outcome, Reconfiguration::Unchanged);
        assert_eq!(runtime.selector("feed"), before);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconfigure_merchants_resubscribes() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        let original = ChannelConfig::new("feed")
            .with_merchant("Merchant1")
            .with_message(MessageUid::any_version("VERes"), vec![]);
        runtime.add_channel(original, &targets).unwrap();

        let moved = ChannelConfig::new("feed")
            .with_merchant("Merchant2")
            .with_message(MessageUid::any_version("VERes"), vec![]);
        let outcome = runtime.reconfigure(moved).await.unwrap();
        let Reconfiguration::Resubscribe { selector } = outcome else {
            panic!("expected a resubscription, got {outcome:?}");
        };
        assert!(selector.contains("'Merchant2'"));
        assert_eq!(runtime.selector("feed"), Some(selector));

        runtime.bus().publish(veres("Merchant2", "1.0.2", "tx-1", "N")).await;
        let delivered = next(&mut collected.messages).await;
        assert_eq!(delivered.message.merchant_id, "Merchant2");
        assert_quiet(&mut collected.messages).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconfigure_delivers_messages_queued_before_rebind() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime
            .add_channel(
                ChannelConfig::new("feed")
                    .with_merchant("Merchant1")
                    .with_message(MessageUid::any_version("VERes"), vec![]),
                &targets,
            )
            .unwrap();

        let bus = runtime.bus();
        for n in 0..5 {
            bus.publish(veres("Merchant1", "1.0.2", &format!("tx-{n}"), "Y")).await;
        }

        let widened = ChannelConfig::new("feed")
            .with_merchant("Merchant1")
            .with_merchant("Merchant2")
            .with_message(MessageUid::any_version("VERes"), vec![]);
        let outcome = runtime.reconfigure(widened).await.unwrap();
        assert!(matches!(outcome, Reconfiguration::Resubscribe { .. }));
        bus.publish(veres("Merchant2", "1.0.2", "tx-5", "Y")).await;

        let mut seen = BTreeSet::new();
        for _ in 0..6 {
            let delivered = next(&mut collected.messages).await;
            let id = delivered.message.correlation_id.unwrap_or_default();
            assert!(seen.insert(id.clone()), "{id} delivered twice");
        }
        let expected: BTreeSet<String> = (0..6).map(|n| format!("tx-{n}")).collect();
        assert_eq!(seen, expected);
        assert_quiet(&mut collected.messages).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconfigure_mask_change_resubscribes_with_same_selector() {
        let runtime = runtime();
        let (targets, mut collected) = collecting_targets();
        runtime
            .add_channel(
                ChannelConfig::new("feed")
                    .with_message(MessageUid::any_version("PARes"), vec![bean("pan")]),
                &targets,
            )
            .unwrap();
        let selector = runtime.selector("feed").unwrap();

        let outcome = runtime
            .reconfigure(
                ChannelConfig::new("feed").with_message(
                    MessageUid::any_version("PARes"),
                    vec![bean("pan").masked("X{0}#{4}")],
                ),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Reconfiguration::Resubscribe { selector });

        runtime.bus().publish(pares("Merchant1", "1.0.2", "tx-1")).await;
        let delivered = next(&mut collected.messages).await;
        assert_eq!(value(&delivered, "pan").as_deref(), Some("XXXXXXXXXXXX0000"));
        assert_quiet(&mut collected.messages).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejected_reconfiguration_keeps_previous_config() {
        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        let original = ChannelConfig::new("feed")
            .with_message(MessageUid::any_version("PARes"), vec![bean("pan").masked("Y{0}#{4}")]);
        runtime.add_channel(original, &targets).unwrap();

        let invalid = ChannelConfig::new("feed").with_message(
            MessageUid::any_version("PARes"),
            vec![bean("pan").masked("Y{0}#{4}").encrypted(true)],
        );
        assert!(runtime.reconfigure(invalid).await.is_err());

        let current = runtime.channel_config("feed").unwrap();
        let fields = current.fields_for(&MessageUid::new("PARes", "1.0.2")).unwrap();
        assert!(!fields[0].encrypt);

        assert!(matches!(
            runtime.reconfigure(ChannelConfig::new("missing")).await,
            Err(bridge_runtime::RuntimeError::UnknownChannel(_))
        ));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_purchase_channel_cannot_be_reconfigured() {
        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        let purchase = ChannelConfig::purchase("purchases")
            .with_message(MessageUid::any_version("VERes"), vec![]);
        runtime.add_channel(purchase, &targets).unwrap();

        let result = runtime
            .reconfigure(
                ChannelConfig::purchase("purchases")
                    .with_message(MessageUid::any_version("PARes"), vec![]),
            )
            .await;
        assert!(matches!(result, Err(bridge_runtime::RuntimeError::Channel(_))));

        runtime.shutdown().await;
    }

    // =========================================================================
    // Channel directory
    // =========================================================================

    #[tokio::test]
    async fn test_load_channels_dir_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(body.as_bytes()).unwrap();
        };
        write(
            "01-acquirer.json",
            r#"{"id": "acquirer", "merchants": ["Merchant1"],
                "messages": [{"type": "PARes", "version": "", "fields": [
                    {"path": "pan", "encrypt": "false", "mask": "Y{0}#{4}"}
                ]}]}"#,
        );
        write(
            "02-purchases.json",
            r#"{"id": "purchases", "kind": "purchase",
                "messages": [{"type": "VERes", "version": ""}, {"type": "PARes", "version": ""}]}"#,
        );
        write("03-broken.json", "{ not json");
        write("README.txt", "ignored");

        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        let registered = runtime.load_channels_dir(dir.path(), &targets).unwrap();

        assert_eq!(registered, 2);
        assert_eq!(
            runtime.channel_ids(),
            vec!["acquirer".to_string(), "purchases".to_string()]
        );
        assert_eq!(runtime.open_transactions("purchases"), Some(0));
        assert_eq!(runtime.open_transactions("acquirer"), None);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_load_channels_dir_missing_directory() {
        let runtime = runtime();
        let (targets, _collected) = collecting_targets();
        let missing = std::path::Path::new("/nonexistent/channels");

        assert!(matches!(
            runtime.load_channels_dir(missing, &targets),
            Err(bridge_runtime::RuntimeError::Io(_))
        ));
    }
}
