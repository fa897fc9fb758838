//! # Subscription Lifecycle
//!
//! Detach semantics under sharing, re-entrancy and threads.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use delta_subscriptions::{ClientSession, RecordSink};
    use parking_lot::Mutex;
    use serde_json::json;
    use shared_bus::DetachHandle;
    use shared_types::{ConfigWarning, NormalizedRecord, Principal, SubscribeRow, SubscriptionCommand};

    use crate::integration::support::{Collector, Engine};

    fn all_navigation() -> SubscriptionCommand {
        SubscriptionCommand::new(None).with_row(SubscribeRow::new("navigation.*"))
    }

    #[tokio::test]
    async fn test_detach_one_of_many_sharing_a_stream() {
        let engine = Engine::new();
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(0));

        let subscriptions: Vec<_> = (0..5).map(|_| engine.subscribe(all_navigation())).collect();
        assert_eq!(engine.registry.subscriber_count("navigation.speedOverGround"), 5);

        subscriptions[2].0.release();
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));

        for (index, (_, seen)) in subscriptions.iter().enumerate() {
            let expected = if index == 2 { 1 } else { 2 };
            assert_eq!(seen.len(), expected, "subscription {index}");
        }
        assert_eq!(engine.registry.subscriber_count("navigation.speedOverGround"), 4);

        drop(subscriptions);
        assert_eq!(engine.registry.subscriber_count("navigation.speedOverGround"), 0);
        let metrics = engine.registrar.metrics().snapshot();
        assert_eq!(metrics.subscriptions_active, 0);
        assert_eq!(metrics.subscriptions_opened, 5);
    }

    #[tokio::test]
    async fn test_release_from_inside_record_callback() {
        let engine = Engine::new();
        let slot: Arc<Mutex<Option<DetachHandle>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(Mutex::new(0usize));

        let (s, c) = (Arc::clone(&slot), Arc::clone(&count));
        let on_record: RecordSink = Arc::new(move |_: &NormalizedRecord| {
            *c.lock() += 1;
            let handle = s.lock().take();
            if let Some(handle) = handle {
                handle.release();
            }
        });
        let handle = engine.registrar.subscribe(
            all_navigation(),
            Arc::new(|_: &ConfigWarning| {}),
            on_record,
            Principal::unrestricted("once"),
        );
        *slot.lock() = Some(handle);

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(2));
        engine.put("vessels.a", "gps", "navigation.headingTrue", json!(3));

        assert_eq!(*count.lock(), 1);
        assert_eq!(engine.registry.subscriber_count("navigation.speedOverGround"), 0);
        assert_eq!(engine.registry.subscriber_count("navigation.headingTrue"), 0);
    }

    #[tokio::test]
    async fn test_session_close_releases_every_subscription() {
        let engine = Engine::new();
        let collector = Collector::default();
        let session = ClientSession::new(
            engine.registrar.clone(),
            Principal::unrestricted("client"),
            collector.warn_sink(),
            collector.record_sink(),
        );

        session.handle_message(r#"{"context":"vessels.*","subscribe":[{"path":"navigation.*"}]}"#);
        session.handle_message(r#"{"context":"vessels.*","subscribe":[{"path":"environment.*"}]}"#);
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        engine.put("vessels.a", "gps", "environment.depth.belowKeel", json!(2));
        assert_eq!(collector.len(), 2);

        session.close();
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(3));
        engine.put("vessels.a", "gps", "environment.depth.belowKeel", json!(4));
        assert_eq!(collector.len(), 2);
        assert_eq!(engine.registrar.metrics().snapshot().subscriptions_active, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_ingest_and_subscribe() {
        let engine = Arc::new(Engine::new());

        let producers: Vec<_> = (0..4)
            .map(|worker| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for n in 0..200 {
                        let path = format!("navigation.sensor{}", n % 16);
                        engine.put(&format!("vessels.w{worker}"), "gps", &path, json!(n));
                    }
                })
            })
            .collect();

        let subscribers: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let (handle, _seen) = engine.subscribe(all_navigation());
                        handle.release();
                    }
                })
            })
            .collect();

        for worker in producers.into_iter().chain(subscribers) {
            worker.join().unwrap();
        }

        for n in 0..16 {
            let key = format!("navigation.sensor{n}");
            assert_eq!(engine.registry.subscriber_count(&key), 0, "{key}");
        }
        assert_eq!(engine.registrar.metrics().snapshot().subscriptions_active, 0);
        assert_eq!(engine.registry.key_count(), 16);
    }
}
