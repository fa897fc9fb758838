//! # Geofence Flows
//!
//! Radius contexts read positions that arrive on the same ingest path as the
//! data they filter.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared_types::{
        ConfigWarning, ContextSpecifier, Position, SubscribeRow, SubscriptionCommand,
    };

    use crate::integration::support::Engine;

    const CENTER: Position = Position {
        latitude: 60.0,
        longitude: 25.0,
    };

    fn move_to(engine: &Engine, context: &str, latitude: f64, longitude: f64) {
        engine.put(
            context,
            "gps",
            "navigation.position",
            json!({"latitude": latitude, "longitude": longitude}),
        );
    }

    fn radius_command(radius: f64, path: &str) -> SubscriptionCommand {
        SubscriptionCommand::new(Some(ContextSpecifier::radius(radius, CENTER)))
            .with_row(SubscribeRow::new(path))
    }

    #[tokio::test]
    async fn test_vessels_inside_radius_only() {
        let engine = Engine::new();
        move_to(&engine, "vessels.near", 60.001, 25.0);
        move_to(&engine, "vessels.far", 60.1, 25.0);

        let (_handle, seen) = engine.subscribe(radius_command(1000.0, "navigation.speedOverGround"));

        engine.put("vessels.near", "gps", "navigation.speedOverGround", json!(1));
        engine.put("vessels.far", "gps", "navigation.speedOverGround", json!(2));
        engine.put("vessels.lost", "gps", "navigation.speedOverGround", json!(3));

        assert_eq!(seen.contexts(), vec!["vessels.near".to_string()]);
    }

    #[tokio::test]
    async fn test_membership_follows_latest_position() {
        let engine = Engine::new();
        move_to(&engine, "vessels.a", 60.1, 25.0);
        let (_handle, seen) = engine.subscribe(radius_command(1000.0, "navigation.speedOverGround"));

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        move_to(&engine, "vessels.a", 60.0005, 25.0);
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(2));
        move_to(&engine, "vessels.a", 60.2, 25.0);
        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(3));

        assert_eq!(seen.values(), vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_entering_position_is_delivered() {
        let engine = Engine::new();
        move_to(&engine, "vessels.a", 60.5, 25.0);
        let (_handle, seen) = engine.subscribe(radius_command(1000.0, "navigation.position"));
        assert!(seen.is_empty(), "outside at subscribe time, nothing replayed");

        move_to(&engine, "vessels.a", 60.0, 25.001);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.values()[0]["longitude"], json!(25.001));
    }

    #[tokio::test]
    async fn test_replay_uses_current_positions() {
        let engine = Engine::new();
        move_to(&engine, "vessels.near", 60.0, 25.0);
        move_to(&engine, "vessels.far", 61.0, 25.0);
        engine.put("vessels.near", "gps", "design.draft", json!(2.1));
        engine.put("vessels.far", "gps", "design.draft", json!(3.4));

        let (_handle, seen) = engine.subscribe(radius_command(500.0, "design.*"));
        assert_eq!(seen.values(), vec![json!(2.1)]);
    }

    #[tokio::test]
    async fn test_incomplete_radius_warns_and_matches_nothing() {
        let engine = Engine::new();
        move_to(&engine, "vessels.a", 60.0, 25.0);

        let command: SubscriptionCommand = serde_json::from_value(json!({
            "context": {"radius": 500},
            "subscribe": [{"path": "*"}]
        }))
        .unwrap();
        let (_handle, seen) = engine.subscribe(command);

        engine.put("vessels.a", "gps", "navigation.speedOverGround", json!(1));
        assert!(seen.is_empty());
        assert_eq!(*seen.warnings.lock(), vec![ConfigWarning::IncompleteRadius]);
    }
}
