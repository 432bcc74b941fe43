//! Declared telemetry entities and their native cadences.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cadence, EntityId, SourceId};
use crate::error::ValidationError;

/// Broad grouping used to partition raw storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    Generation,
    Demand,
    Price,
    Interconnector,
}

/// Declaration of one observed entity: where its records come from and
/// how often they arrive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub entity_id: EntityId,
    pub source: SourceId,
    pub kind: TelemetryKind,
    pub cadence: Cadence,
}

/// Lookup table of declared entities.
///
/// Audit, reconciliation and queries resolve entity references here;
/// an undeclared entity is a validation error, not a silent empty series.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    specs: HashMap<EntityId, EntitySpec>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new(specs: impl IntoIterator<Item = EntitySpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.entity_id.clone(), spec))
                .collect(),
        }
    }

    pub fn resolve(&self, entity: &EntityId) -> Result<&EntitySpec, ValidationError> {
        self.specs
            .get(entity)
            .ok_or_else(|| ValidationError::UnknownEntity(entity.to_string()))
    }

    /// Entities fed by the given source, in deterministic order.
    #[must_use]
    pub fn entities_for_source(&self, source: &SourceId) -> Vec<&EntitySpec> {
        let mut specs: Vec<_> = self
            .specs
            .values()
            .filter(|spec| &spec.source == source)
            .collect();
        specs.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        specs
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySpec> {
        self.specs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EntityRegistry {
        EntityRegistry::new([
            EntitySpec {
                entity_id: EntityId::new("nsw1-wind"),
                source: SourceId::new("scada"),
                kind: TelemetryKind::Generation,
                cadence: Cadence::FIVE_MINUTE,
            },
            EntitySpec {
                entity_id: EntityId::new("nsw1-price"),
                source: SourceId::new("settlement"),
                kind: TelemetryKind::Price,
                cadence: Cadence::THIRTY_MINUTE,
            },
        ])
    }

    #[test]
    fn resolves_declared_entity() {
        let registry = registry();
        let spec = registry.resolve(&EntityId::new("nsw1-wind")).unwrap();
        assert_eq!(spec.cadence, Cadence::FIVE_MINUTE);
    }

    #[test]
    fn undeclared_entity_is_rejected() {
        let registry = registry();
        assert!(matches!(
            registry.resolve(&EntityId::new("qld1-coal")),
            Err(ValidationError::UnknownEntity(_))
        ));
    }

    #[test]
    fn source_lookup_is_sorted() {
        let registry = registry();
        let specs = registry.entities_for_source(&SourceId::new("scada"));
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].entity_id.as_str(), "nsw1-wind");
    }
}
