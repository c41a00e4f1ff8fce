//! Coin formations
//!
//! A formation is a grid of 0/1 cells; every set cell becomes one coin.
//! The shipped pool is compiled in from `assets/coins/`. A formation that
//! fails to parse stays in the pool as a failed slot so the random pick stays
//! uniform over the whole pool; picking it yields [`GameError::DataLoad`].

use std::path::Path;

use serde::Deserialize;

use crate::error::GameError;

/// Number of formations in the shipped pool
pub const LAYOUT_POOL_SIZE: usize = 10;

const BUILTIN: [&str; LAYOUT_POOL_SIZE] = [
    include_str!("../assets/coins/coin0.json"),
    include_str!("../assets/coins/coin1.json"),
    include_str!("../assets/coins/coin2.json"),
    include_str!("../assets/coins/coin3.json"),
    include_str!("../assets/coins/coin4.json"),
    include_str!("../assets/coins/coin5.json"),
    include_str!("../assets/coins/coin6.json"),
    include_str!("../assets/coins/coin7.json"),
    include_str!("../assets/coins/coin8.json"),
    include_str!("../assets/coins/coin9.json"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoinLayout {
    pub structure: Vec<Vec<u8>>,
}

impl CoinLayout {
    pub fn from_json(layout: usize, json: &str) -> Result<Self, GameError> {
        let parsed: CoinLayout = serde_json::from_str(json).map_err(|e| GameError::DataLoad {
            layout,
            reason: e.to_string(),
        })?;
        parsed.validate(layout)?;
        Ok(parsed)
    }

    fn validate(&self, layout: usize) -> Result<(), GameError> {
        let fail = |reason: &str| GameError::DataLoad {
            layout,
            reason: reason.to_string(),
        };
        if self.structure.is_empty() {
            return Err(fail("empty structure"));
        }
        if self.structure.iter().flatten().any(|&c| c > 1) {
            return Err(fail("cells must be 0 or 1"));
        }
        if self.cells().next().is_none() {
            return Err(fail("no coins set"));
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.structure.len()
    }

    /// `(row, column)` of every set cell, top row first
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.structure.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c != 0)
                .map(move |(col, _)| (row, col))
        })
    }
}

/// Pool of formations to pick from
#[derive(Debug, Clone)]
pub struct CoinLayouts {
    slots: Vec<Result<CoinLayout, String>>,
}

impl Default for CoinLayouts {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CoinLayouts {
    /// The formations shipped with the game
    pub fn builtin() -> Self {
        Self::from_sources(BUILTIN.iter().map(|json| Ok(json.to_string())))
    }

    /// Load `coin0.json` .. `coin9.json` from a directory. Missing or broken
    /// files become failed slots rather than an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::from_sources((0..LAYOUT_POOL_SIZE).map(|i| {
            let path = dir.join(format!("coin{i}.json"));
            std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))
        }))
    }

    fn from_sources(sources: impl Iterator<Item = Result<String, String>>) -> Self {
        let slots = sources
            .enumerate()
            .map(|(i, source)| {
                let slot = source.and_then(|json| {
                    CoinLayout::from_json(i, &json).map_err(|e| e.to_string())
                });
                if let Err(reason) = &slot {
                    log::warn!("Coin layout {i} unusable: {reason}");
                }
                slot
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&CoinLayout, GameError> {
        match self.slots.get(index) {
            Some(Ok(layout)) => Ok(layout),
            Some(Err(reason)) => Err(GameError::DataLoad {
                layout: index,
                reason: reason.clone(),
            }),
            None => Err(GameError::DataLoad {
                layout: index,
                reason: "no such layout".into(),
            }),
        }
    }
}
