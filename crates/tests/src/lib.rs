//! # Integration Tests
//!
//! End-to-end relay scenarios, run against the in-memory recording transport.
//!
//! Covers:
//! - config contract smoke tests
//! - album reassembly timing under a paused clock
//! - routing reloads racing lookups
//! - JSONL replay through the whole relay

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ChannelId, ConfigVersion};

    #[test]
    fn test_config_version_round_trip() {
        let config = contracts::RelayConfig::default();

        let toml = ConfigLoader::to_toml(&config).unwrap();
        assert!(toml.contains(r#"version = "V1""#));
        let json = ConfigLoader::to_json(&config).unwrap();
        assert!(json.contains(r#""version": "V1""#));

        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_toml.version, ConfigVersion::V1);
        assert_eq!(from_json.version, ConfigVersion::V1);
    }

    #[test]
    fn test_unknown_config_version_rejected() {
        let err = ConfigLoader::load_from_str(r#"version = "V9""#, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_toml_and_json_agree() {
        let toml = r#"
            [relay]
            quiescence_window_ms = 800

            [[routes]]
            source = -100
            destination = -200
        "#;
        let json = r#"{
            "relay": { "quiescence_window_ms": 800 },
            "routes": [{ "source": -100, "destination": -200 }]
        }"#;

        let from_toml = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let from_json = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();

        assert_eq!(from_toml.relay.quiescence_window_ms, 800);
        assert_eq!(from_toml.routes, from_json.routes);
        assert_eq!(from_json.routes[0].source, ChannelId::new(-100));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ChannelId, DeliveryError, InboundEvent, MediaType, Payload};
    use dispatcher::{CallKind, RecordingTransport};
    use ingestion::JsonlReplaySource;
    use relay_core::{Disposition, Relay};
    use routing::{MappingStore, RoutingTable};
    use tokio::time::{sleep, Instant};

    const SOURCE: ChannelId = ChannelId::new(-100);
    const DEST: ChannelId = ChannelId::new(-200);
    const UNMAPPED: ChannelId = ChannelId::new(-999);
    const WINDOW: Duration = Duration::from_millis(1500);

    fn routing_in(dir: &Path) -> Arc<RoutingTable> {
        let store = MappingStore::new(dir.join("mappings.json"));
        store.add_mapping(SOURCE, DEST).unwrap();
        Arc::new(RoutingTable::open(store).unwrap())
    }

    fn relay_in(dir: &Path, transport: RecordingTransport) -> Relay<RecordingTransport> {
        Relay::new(routing_in(dir), transport, WINDOW).unwrap()
    }

    fn photo(id: u64, group: &str) -> InboundEvent {
        InboundEvent::grouped(
            SOURCE,
            id,
            group,
            Payload::media(MediaType::Photo, format!("file-{id}"), None),
        )
    }

    /// Four album items within 0.5s become exactly one album forward, issued
    /// once the window after the first item has elapsed.
    #[tokio::test(start_paused = true)]
    async fn test_album_forwarded_once_after_window() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path(), RecordingTransport::default());
        let start = Instant::now();

        for id in 10..14 {
            relay.handle_event(photo(id, "album-1"));
            sleep(Duration::from_millis(150)).await;
        }
        assert_eq!(relay.pending_groups(), 1);
        relay.drain().await;

        let calls = relay.dispatcher().transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].kind,
            CallKind::Group {
                destination: DEST,
                source: SOURCE,
                representative: 10,
            }
        );
        let elapsed = calls[0].at - start;
        assert!(elapsed >= WINDOW, "forwarded early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "forwarded late: {elapsed:?}");

        let summary = relay.summary();
        assert_eq!(summary.groups_delivered, 1);
        assert_eq!(summary.singles_delivered, 0);
        assert_eq!(relay.pending_groups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_forwarded_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path(), RecordingTransport::default());
        let start = Instant::now();

        let disposition =
            relay.handle_event(InboundEvent::single(SOURCE, 7, Payload::text("hello")));
        assert_eq!(disposition, Disposition::Single);
        relay.drain().await;

        let calls = relay.dispatcher().transport().calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0].kind, CallKind::Single { event_id: 7, .. }));
        assert!(calls[0].at - start < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmapped_source_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path(), RecordingTransport::default());

        let single = InboundEvent::single(UNMAPPED, 1, Payload::text("x"));
        let album_item = InboundEvent::grouped(UNMAPPED, 2, "g", Payload::text("y"));
        assert_eq!(relay.handle_event(single), Disposition::Unrouted);
        assert_eq!(relay.handle_event(album_item), Disposition::Unrouted);
        relay.drain().await;

        assert!(relay.dispatcher().transport().calls().is_empty());
        assert_eq!(relay.pending_groups(), 0);
        let summary = relay.summary();
        assert_eq!(summary.events_received, 2);
        assert_eq!(summary.routing_misses, 2);
    }

    /// Interleaved albums from one source are reassembled independently.
    #[tokio::test(start_paused = true)]
    async fn test_interleaved_albums_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path(), RecordingTransport::default());

        for (id, group) in [(1, "a"), (2, "b"), (3, "a"), (4, "b"), (5, "a")] {
            relay.handle_event(photo(id, group));
        }
        relay.handle_event(InboundEvent::single(SOURCE, 6, Payload::text("between")));
        relay.drain().await;

        let transport = relay.dispatcher().transport();
        assert_eq!(transport.group_calls(), 2);
        assert_eq!(transport.single_calls(), 1);

        let mut representatives: Vec<_> = transport
            .calls()
            .into_iter()
            .filter_map(|call| match call.kind {
                CallKind::Group { representative, .. } => Some(representative),
                CallKind::Single { .. } => None,
            })
            .collect();
        representatives.sort_unstable();
        assert_eq!(representatives, vec![1, 2]);

        let summary = relay.summary();
        assert_eq!(summary.group_size.count, 2);
        assert!((summary.group_size.mean - 2.5).abs() < 1e-10);
    }

    /// An item arriving after its album was forwarded starts a new cycle.
    #[tokio::test(start_paused = true)]
    async fn test_late_album_item_forwarded_separately() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path(), RecordingTransport::default());

        relay.handle_event(photo(1, "album"));
        relay.handle_event(photo(2, "album"));
        sleep(WINDOW + Duration::from_millis(500)).await;

        let late = relay.handle_event(photo(3, "album"));
        assert_eq!(late, Disposition::Grouped { scheduled: true });
        relay.drain().await;

        let calls = relay.dispatcher().transport().calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0].kind, CallKind::Group { representative: 1, .. }));
        assert!(matches!(calls[1].kind, CallKind::Group { representative: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_album_retried_after_wait() {
        let dir = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::default();
        transport.fail_next_group(DeliveryError::rate_limited(3));
        let relay = relay_in(dir.path(), transport);

        relay.handle_event(photo(1, "album"));
        relay.handle_event(photo(2, "album"));
        relay.drain().await;

        let calls = relay.dispatcher().transport().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(3));

        let snapshot = relay.dispatcher().metrics();
        assert_eq!(snapshot.rate_limited, 1);
        assert_eq!(snapshot.groups_delivered, 1);
        assert_eq!(snapshot.groups_failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_does_not_block_later_events() {
        let dir = tempfile::tempdir().unwrap();
        let transport = RecordingTransport::default();
        transport.fail_next_single(DeliveryError::PermissionDenied(DEST));
        let relay = relay_in(dir.path(), transport);

        relay.handle_event(InboundEvent::single(SOURCE, 1, Payload::text("a")));
        relay.drain().await;
        relay.handle_event(InboundEvent::single(SOURCE, 2, Payload::text("b")));
        relay.drain().await;

        let summary = relay.summary();
        assert_eq!(summary.singles_failed, 1);
        assert_eq!(summary.singles_delivered, 1);
    }

    /// A reload racing lookups exposes either the old or the new mapping.
    #[test]
    fn test_reload_never_exposes_partial_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));
        let generation = |g: i64| -> routing::Mapping {
            (1..=8)
                .map(|src| (ChannelId::new(src), ChannelId::new(g * 100 + src)))
                .collect()
        };
        store.save(&generation(1)).unwrap();
        let table = Arc::new(RoutingTable::open(store.clone()).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = table.snapshot();
                        let generations: Vec<_> = snapshot
                            .iter()
                            .map(|(src, dst)| (dst.get() - src.get()) / 100)
                            .collect();
                        assert_eq!(generations.len(), 8);
                        assert!(generations.windows(2).all(|w| w[0] == w[1]));
                    }
                })
            })
            .collect();

        for round in 0..50 {
            store.save(&generation(1 + round % 2)).unwrap();
            table.reload().unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[tokio::test]
    async fn test_periodic_reload_picks_up_new_route() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));
        let routing = Arc::new(RoutingTable::open(store.clone()).unwrap());
        let relay = Relay::new(routing, RecordingTransport::default(), WINDOW).unwrap();
        let reload = relay.spawn_reload(Duration::from_millis(20));

        let before = relay.handle_event(InboundEvent::single(SOURCE, 1, Payload::text("a")));
        assert_eq!(before, Disposition::Unrouted);

        store.add_mapping(SOURCE, DEST).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while relay.routing().resolve(SOURCE).is_none() {
            assert!(Instant::now() < deadline, "reload never picked up the route");
            sleep(Duration::from_millis(10)).await;
        }

        let after = relay.handle_event(InboundEvent::single(SOURCE, 2, Payload::text("b")));
        assert_eq!(after, Disposition::Single);
        relay.drain().await;
        reload.abort();

        assert_eq!(relay.dispatcher().transport().single_calls(), 1);
    }

    /// Config file -> seed routes -> replayed feed -> recorded deliveries.
    #[tokio::test(start_paused = true)]
    async fn test_replayed_feed_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mapping_file = dir.path().join("mappings.json");
        let toml = format!(
            r#"
            [relay]
            quiescence_window_ms = 1500

            [routing]
            mapping_file = "{}"
            reload_interval_secs = 0

            [[routes]]
            source = -100
            destination = -200
            "#,
            mapping_file.display()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let relay = Relay::from_config(&config, RecordingTransport::default()).unwrap();
        assert!(mapping_file.exists());

        let feed_path = dir.path().join("feed.jsonl");
        fs::write(
            &feed_path,
            r#"# recorded session
{"source": -100, "id": 1, "payload": {"kind": "text", "text": "intro"}}
{"source": -100, "id": 2, "group_id": "g", "payload": {"kind": "media", "media": {"media_type": "photo", "file_id": "a"}, "caption": "trip"}, "delay_ms": 100}
{"source": -100, "id": 3, "group_id": "g", "payload": {"kind": "media", "media": {"media_type": "photo", "file_id": "b"}}, "delay_ms": 100}
not json
{"source": -999, "id": 4, "payload": {"kind": "text", "text": "elsewhere"}, "delay_ms": 100}
{"source": -100, "id": 5, "group_id": "g", "payload": {"kind": "media", "media": {"media_type": "video", "file_id": "c"}}, "delay_ms": 100}
"#,
        )
        .unwrap();

        let feed = JsonlReplaySource::load(&feed_path, 1.0).unwrap();
        assert_eq!(feed.len(), 5);
        assert_eq!(feed.skipped(), 1);

        let handled = relay.run(feed.start(config.relay.event_queue_capacity)).await;
        relay.drain().await;

        assert_eq!(handled, 5);
        let transport = relay.dispatcher().transport();
        assert_eq!(transport.single_calls(), 1);
        assert_eq!(transport.group_calls(), 1);

        let summary = relay.summary();
        assert_eq!(summary.events_received, 5);
        assert_eq!(summary.routing_misses, 1);
        assert_eq!(summary.groups_delivered, 1);
        assert!((summary.group_size.mean - 3.0).abs() < 1e-10);
    }
}
