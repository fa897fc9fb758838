//! # Integration Test Flows
//!
//! Deltas enter through `DeltaIngest` and reach subscribers through the
//! registry, the context filter and the row policy.
//!
//! ## Flows Tested:
//!
//! 1. **Late key**: a subscription opened before a key exists receives it once
//! 2. **Replay**: a subscription opened after data exists is primed from cache
//! 3. **Self alias**: deltas without context land on the self context
//! 4. **Policies**: debounce and fixed rows of one command, side by side

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use shared_types::{ContextSpecifier, Principal, SubscribeRow, SubscriptionCommand};
    use tokio::time::sleep;

    use crate::integration::support::{Engine, SELF_ID};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    // =============================================================================
    // LATE KEYS AND REPLAY
    // =============================================================================

    #[tokio::test]
    async fn test_new_key_delivered_exactly_once() {
        let engine = Engine::new();
        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(Some(ContextSpecifier::pattern("vessels.*")))
                .with_row(SubscribeRow::new("navigation.*")),
        );

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(3.1));
        assert_eq!(seen.values(), vec![json!(3.1)]);

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(3.2));
        assert_eq!(seen.values(), vec![json!(3.1), json!(3.2)]);
    }

    #[tokio::test]
    async fn test_subscription_before_key_exists() {
        let engine = Engine::new();
        engine.put(SELF_ID, "gps", "navigation.speedOverGround", json!(2.0));
        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(Some(ContextSpecifier::pattern("vessels.self")))
                .with_row(SubscribeRow::new("electrical.battery.voltage")),
        );
        assert!(seen.is_empty());
        assert_eq!(engine.registry.subscriber_count("electrical.battery.voltage"), 0);

        engine.ingest_json(
            r#"{"updates":[{"$source":"victron.1","values":[{"path":"electrical.battery.voltage","value":12.6}]}]}"#,
        );
        assert_eq!(seen.values(), vec![json!(12.6)]);
        assert_eq!(engine.registry.subscriber_count("electrical.battery.voltage"), 1);
    }

    #[tokio::test]
    async fn test_replay_then_live() {
        let engine = Engine::new();
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        engine.put("vessels.a", "ais", "navigation.speedOverGround", json!(2));
        engine.put("vessels.b", "gps", "navigation.speedOverGround", json!(3));

        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(Some(ContextSpecifier::pattern("vessels.a")))
                .with_row(SubscribeRow::new("navigation.speedOverGround")),
        );
        // Cache order: context, then source.
        assert_eq!(seen.values(), vec![json!(2), json!(1)]);

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(4));
        assert_eq!(seen.values(), vec![json!(2), json!(1), json!(4)]);
        assert_eq!(engine.registrar.metrics().snapshot().records_replayed, 2);
    }

    #[tokio::test]
    async fn test_replay_is_limited_by_principal() {
        let engine = Engine::new();
        engine.put(SELF_ID, "gps", "navigation.headingTrue", json!(1.0));
        engine.put("vessels.other", "ais", "navigation.headingTrue", json!(2.0));

        let (_handle, seen) = engine.subscribe_as(
            SubscriptionCommand::new(None).with_row(SubscribeRow::new("navigation.headingTrue")),
            Principal::anonymous(SELF_ID),
        );
        assert_eq!(seen.contexts(), vec![SELF_ID.to_string()]);
    }

    #[tokio::test]
    async fn test_replay_per_matching_row() {
        let engine = Engine::new();
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));

        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(None)
                .with_row(SubscribeRow::new("navigation.*"))
                .with_row(SubscribeRow::new("*.speedOverGround")),
        );
        assert_eq!(seen.len(), 2);
    }

    // =============================================================================
    // SELF CONTEXT
    // =============================================================================

    #[tokio::test]
    async fn test_contextless_delta_matches_self_alias() {
        let engine = Engine::new();
        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(Some(ContextSpecifier::pattern("self")))
                .with_row(SubscribeRow::new("environment.*")),
        );

        engine.ingest_json(
            r#"{"updates":[{"source":{"label":"n2k","src":"115"},"values":[
                {"path":"environment.depth.belowKeel","value":4.2},
                {"path":"environment.water.temperature","value":289.1}
            ]}]}"#,
        );
        engine.ingest_json(
            r#"{"context":"vessels.other","updates":[{"values":[
                {"path":"environment.depth.belowKeel","value":9.9}
            ]}]}"#,
        );

        let records = seen.records.lock();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.context == SELF_ID));
        assert!(records.iter().all(|r| r.source == "n2k.115"));
    }

    // =============================================================================
    // POLICIES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_debounce_and_fixed_rows_side_by_side() {
        let engine = Engine::new();
        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(None)
                .with_row(SubscribeRow::new("navigation.speedOverGround").with_min_period(500))
                .with_row(SubscribeRow::new("navigation.headingTrue").with_period(1000)),
        );

        for step in 0..10u64 {
            engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(step));
            engine.put("vessels.a", "gps", "navigation.headingTrue", json!(step * 10));
            sleep(ms(100)).await;
        }
        // t=1000: speed delivered at t=0 and t=500; heading flushed once.
        sleep(ms(10)).await;

        let records = seen.records.lock();
        let speeds: Vec<_> = records
            .iter()
            .filter(|r| r.path == "navigation.speedOverGround")
            .map(|r| r.value.clone())
            .collect();
        let headings: Vec<_> = records
            .iter()
            .filter(|r| r.path == "navigation.headingTrue")
            .map(|r| r.value.clone())
            .collect();
        assert_eq!(speeds, vec![json!(0), json!(5)]);
        assert_eq!(headings, vec![json!(90)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_window_collapses_by_identity() {
        let engine = Engine::new();
        let (_handle, seen) = engine.subscribe(
            SubscriptionCommand::new(None)
                .with_row(SubscribeRow::new("navigation.speedOverGround").with_policy("fixed")),
        );

        sleep(ms(100)).await;
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        sleep(ms(200)).await;
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(2));
        engine.put("vessels.b", "gps", "navigation.speedOverGround", json!(20));
        sleep(ms(400)).await;
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(3));

        // Attached at t=100, so the first window closes at t=1100.
        sleep(ms(450)).await;
        let mut values = seen.values();
        values.sort_by_key(|v| v.as_i64());
        assert_eq!(values, vec![json!(3), json!(20)]);
    }
}
