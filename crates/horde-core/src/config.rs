//! Engine configuration.
//!
//! [`HordeConfig`] gathers every tunable of the population engine: grid
//! geometry, capacity, the archetype table, the level curves and the loot
//! drop distance. It is plain serde data, so it can be embedded in a larger
//! game configuration or loaded on its own with [`HordeConfig::from_json`].

use serde::{Deserialize, Serialize};

use crate::entity::ArchetypeTable;
use crate::error::ConfigError;

/// Exponential stat curve: `base * (1 + growth)^(level - 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCurve {
    /// Value at level 1
    pub base: f32,
    /// Fractional growth per level
    pub growth: f32,
}

impl StatCurve {
    /// Evaluates the curve. Level 0 is treated as level 1.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn value(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base * (1.0 + self.growth).powi(steps)
    }

    fn is_valid(&self) -> bool {
        self.base.is_finite() && self.base > 0.0 && self.growth.is_finite() && self.growth > -1.0
    }
}

/// Level curves for derived stats.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCurves {
    /// Health before archetype factor and scale
    pub health: StatCurve,
    /// Contact damage before archetype factor and scale
    pub damage: StatCurve,
    /// Multiplier on archetype base speed
    pub speed: StatCurve,
}

impl Default for LevelCurves {
    fn default() -> Self {
        Self {
            health: StatCurve {
                base: 20.0,
                growth: 0.12,
            },
            damage: StatCurve {
                base: 5.0,
                growth: 0.08,
            },
            speed: StatCurve {
                base: 1.0,
                growth: 0.02,
            },
        }
    }
}

/// Configuration for a [`crate::horde::Horde`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    /// Spatial grid cell edge length in world units
    pub cell_size: f32,
    /// Neighborhood radius in cells for avoidance and overlap queries
    pub neighbor_radius: u32,
    /// Maximum number of tracked spawns (live and dying)
    pub max_spawns: usize,
    /// Per-archetype configuration
    pub archetypes: ArchetypeTable,
    /// Level curves for derived stats
    pub curves: LevelCurves,
    /// Vertical distance an item falls when dropped
    pub loot_drop_distance: f32,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            cell_size: horde_grid::DEFAULT_CELL_SIZE,
            neighbor_radius: 1,
            max_spawns: 2048,
            archetypes: ArchetypeTable::default(),
            curves: LevelCurves::default(),
            loot_drop_distance: 24.0,
        }
    }
}

impl HordeConfig {
    /// Default config with a different capacity.
    #[must_use]
    pub fn with_capacity(max_spawns: usize) -> Self {
        Self {
            max_spawns,
            ..Default::default()
        }
    }

    /// Replaces the archetype table.
    #[must_use]
    pub fn with_archetypes(mut self, archetypes: ArchetypeTable) -> Self {
        self.archetypes = archetypes;
        self
    }

    /// Replaces the grid cell size.
    #[must_use]
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`HordeConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// Archetype extents must fit in one cell so that a 3x3 neighborhood
    /// query finds every possible overlap.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if self.neighbor_radius == 0 {
            return Err(ConfigError::NeighborRadius);
        }
        if self.max_spawns == 0 {
            return Err(ConfigError::Capacity);
        }
        if self.archetypes.is_empty() {
            return Err(ConfigError::EmptyArchetypes);
        }
        for (kind, archetype) in self.archetypes.iter() {
            let reason = if !archetype.extent.is_finite() || archetype.extent.min_element() <= 0.0 {
                Some("extent must be positive")
            } else if archetype.extent.max_element() > self.cell_size {
                Some("extent exceeds the grid cell size")
            } else if !archetype.base_speed.is_finite() || archetype.base_speed < 0.0 {
                Some("base speed must be non-negative")
            } else if !(archetype.health_factor.is_finite() && archetype.health_factor > 0.0) {
                Some("health factor must be positive")
            } else if !(archetype.damage_factor.is_finite() && archetype.damage_factor >= 0.0) {
                Some("damage factor must be non-negative")
            } else if !(archetype.loot_factor.is_finite() && archetype.loot_factor >= 0.0) {
                Some("loot factor must be non-negative")
            } else if !(archetype.hit_reaction_secs.is_finite()
                && archetype.hit_reaction_secs >= 0.0)
            {
                Some("hit reaction length must be non-negative")
            } else if !(archetype.death_secs.is_finite() && archetype.death_secs >= 0.0) {
                Some("death presentation length must be non-negative")
            } else if archetype
                .loot
                .iter()
                .any(|entry| !(0.0..=100.0).contains(&entry.percent))
            {
                Some("loot percent must be within 0..=100")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ConfigError::Archetype { kind, reason });
            }
        }
        for (name, curve) in [
            ("health", self.curves.health),
            ("damage", self.curves.damage),
            ("speed", self.curves.speed),
        ] {
            if !curve.is_valid() {
                return Err(ConfigError::Curve(name));
            }
        }
        if !self.loot_drop_distance.is_finite() {
            return Err(ConfigError::DropDistance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Archetype, SpawnKind};
    use glam::Vec2;

    mod curve_tests {
        use super::*;

        #[test]
        fn level_one_is_base() {
            let curve = StatCurve {
                base: 20.0,
                growth: 0.5,
            };
            assert_eq!(curve.value(1), 20.0);
            assert_eq!(curve.value(0), 20.0);
            assert_eq!(curve.value(3), 45.0);
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn default_config_is_valid() {
            HordeConfig::default().validate().unwrap();
        }

        #[test]
        fn rejects_bad_cell_size() {
            let config = HordeConfig::default().with_cell_size(0.0);
            assert!(matches!(config.validate(), Err(ConfigError::CellSize(_))));
        }

        #[test]
        fn rejects_extent_larger_than_cell() {
            let config = HordeConfig::default().with_cell_size(100.0);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Archetype {
                    kind: SpawnKind::Boss,
                    ..
                })
            ));
        }

        #[test]
        fn rejects_empty_table() {
            let config =
                HordeConfig::default().with_archetypes(crate::entity::ArchetypeTable::empty());
            assert!(matches!(config.validate(), Err(ConfigError::EmptyArchetypes)));
        }

        #[test]
        fn rejects_loot_percent_out_of_range() {
            let mut bat = Archetype::default_for(SpawnKind::Bat);
            bat.loot[0].percent = 150.0;
            let config = HordeConfig::default().with_archetypes(
                crate::entity::ArchetypeTable::empty().with(SpawnKind::Bat, bat),
            );
            assert!(matches!(
                config.validate(),
                Err(ConfigError::Archetype {
                    kind: SpawnKind::Bat,
                    ..
                })
            ));
        }

        #[test]
        fn rejects_zero_capacity() {
            assert!(matches!(
                HordeConfig::with_capacity(0).validate(),
                Err(ConfigError::Capacity)
            ));
        }

        #[test]
        fn rejects_negative_extent() {
            let mut skeleton = Archetype::default_for(SpawnKind::Skeleton);
            skeleton.extent = Vec2::new(-1.0, 10.0);
            let config = HordeConfig::default().with_archetypes(
                crate::entity::ArchetypeTable::empty().with(SpawnKind::Skeleton, skeleton),
            );
            assert!(config.validate().is_err());
        }
    }

    mod json_tests {
        use super::*;

        #[test]
        fn partial_json_uses_defaults() {
            let config = HordeConfig::from_json(r#"{ "max_spawns": 16 }"#).unwrap();
            assert_eq!(config.max_spawns, 16);
            assert_eq!(config.cell_size, horde_grid::DEFAULT_CELL_SIZE);
            assert_eq!(config.archetypes.len(), SpawnKind::ALL.len());
        }

        #[test]
        fn invalid_json_values_are_rejected() {
            let err = HordeConfig::from_json(r#"{ "cell_size": -3.0 }"#).unwrap_err();
            assert!(matches!(err, ConfigError::CellSize(_)));
        }

        #[test]
        fn malformed_json_is_parse_error() {
            let err = HordeConfig::from_json("{ max_spawns: }").unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
        }

        #[test]
        fn serialization_roundtrip() {
            let config = HordeConfig::with_capacity(64);
            let json = serde_json::to_string(&config).unwrap();
            let back = HordeConfig::from_json(&json).unwrap();
            assert_eq!(back, config);
        }
    }
}
