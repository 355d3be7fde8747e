//! Детерминистичный RNG stream
//!
//! Один process-wide stream на симуляцию. Тот же seed + тот же порядок
//! вызовов = идентичное поведение акторов (golden traces опираются на это).

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// RNG boundary contract для actor scripts.
pub trait RngStream {
    /// Uniform `[0, bound)`. `bound == 0` → 0.
    fn next_uint(&mut self, bound: u32) -> u32;
}

/// Какой backend использовать
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngStreamKind {
    #[default]
    Chacha8,
    /// Линейный конгруэнтный генератор исходной симуляции
    LegacyLcg,
}

/// LCG исходной симуляции (32-bit, wrapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyLcg {
    state: u32,
}

impl LegacyLcg {
    const MULTIPLIER: u32 = 0x7FF8_A3ED;
    const INCREMENT: u32 = 0x2AA0_1D31;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

impl RngStream for LegacyLcg {
    fn next_uint(&mut self, bound: u32) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        // (state >> 16) * bound / 0x10000, в 64 битах чтобы не переполниться
        (((self.state >> 16) as u64 * bound as u64) >> 16) as u32
    }
}

#[derive(Debug, Clone)]
pub enum RngBackend {
    ChaCha(ChaCha8Rng),
    Legacy(LegacyLcg),
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource, Debug, Clone)]
pub struct DeterministicRng {
    pub backend: RngBackend,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self::with_kind(seed, RngStreamKind::Chacha8)
    }

    pub fn with_kind(seed: u64, kind: RngStreamKind) -> Self {
        let backend = match kind {
            RngStreamKind::Chacha8 => RngBackend::ChaCha(ChaCha8Rng::seed_from_u64(seed)),
            // LCG state 32-bit: берём младшие биты seed
            RngStreamKind::LegacyLcg => RngBackend::Legacy(LegacyLcg::new(seed as u32)),
        };
        Self { backend, seed }
    }

    pub fn kind(&self) -> RngStreamKind {
        match self.backend {
            RngBackend::ChaCha(_) => RngStreamKind::Chacha8,
            RngBackend::Legacy(_) => RngStreamKind::LegacyLcg,
        }
    }
}

impl RngStream for DeterministicRng {
    fn next_uint(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        match &mut self.backend {
            RngBackend::ChaCha(rng) => rng.gen_range(0..bound),
            RngBackend::Legacy(lcg) => lcg.next_uint(bound),
        }
    }
}
