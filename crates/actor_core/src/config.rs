//! Конфигурация симуляции + tuning constants kernel'а
//!
//! Файловый I/O остаётся во внешнем asset layer: сюда приходит уже текст.

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logger::LogLevel;
use crate::rng::RngStreamKind;
use crate::timing::TICK_HZ;

/// Параметры запуска симуляции (все поля имеют default)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Частота FixedUpdate (Hz)
    pub tick_hz: f64,
    pub seed: u64,
    pub rng: RngStreamKind,
    pub log_level: LogLevel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: TICK_HZ,
            seed: 42,
            rng: RngStreamKind::Chacha8,
            log_level: LogLevel::Debug,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Загрузка per-class "values" struct (damage, speed, counts: данные, не подклассы)
pub fn load_values<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

/// Пороги collision response
pub struct KernelTuning;

impl KernelTuning {
    /// n·up выше порога → контакт считается полом
    pub const GROUNDED_NORMAL_Y: f32 = 0.5;
    /// |n·up| ниже порога → боковая стена (bounce mode)
    pub const WALL_NORMAL_BAND: f32 = 0.1;
    /// Максимум контактов за один sphere query
    pub const MAX_CONTACTS: usize = 30;
    /// Допуск при проверке "точка внутри полигона" по рёбрам
    pub const EDGE_MARGIN: f32 = 1.0 / 32.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TurretValues {
        damage: u16,
        turn_steps: u16,
        #[serde(default)]
        range: f32,
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.tick_hz, 60.0);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_partial_override() {
        let config =
            SimulationConfig::from_json(r#"{ "seed": 7, "rng": "legacy_lcg", "log_level": "error" }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.rng, RngStreamKind::LegacyLcg);
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.tick_hz, 60.0);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = SimulationConfig::from_json("{ seed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_values() {
        let values: TurretValues = load_values(r#"{ "damage": 12, "turn_steps": 8 }"#).unwrap();
        assert_eq!(
            values,
            TurretValues {
                damage: 12,
                turn_steps: 8,
                range: 0.0
            }
        );
    }
}
