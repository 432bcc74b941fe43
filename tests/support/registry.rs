use gridflux::domain::{
    Cadence, EntityId, EntityRegistry, EntitySpec, SourceId, TelemetryKind,
};

/// Registry with one 5-minute generation entity fed by `scada`.
pub fn single_entity(entity: &str) -> EntityRegistry {
    EntityRegistry::new([EntitySpec {
        entity_id: EntityId::new(entity),
        source: SourceId::new("scada"),
        kind: TelemetryKind::Generation,
        cadence: Cadence::FIVE_MINUTE,
    }])
}

/// Registry with two generation entities on the same source.
pub fn two_entities(a: &str, b: &str) -> EntityRegistry {
    EntityRegistry::new([
        EntitySpec {
            entity_id: EntityId::new(a),
            source: SourceId::new("scada"),
            kind: TelemetryKind::Generation,
            cadence: Cadence::FIVE_MINUTE,
        },
        EntitySpec {
            entity_id: EntityId::new(b),
            source: SourceId::new("scada"),
            kind: TelemetryKind::Generation,
            cadence: Cadence::FIVE_MINUTE,
        },
    ])
}
