//! Wallet persistence
//!
//! The simulation never owns storage. It talks to a [`Persistence`]
//! collaborator handed to it at construction, reads the wallet once per
//! session and writes it back at checkpoints (game over, retry, quit).
//!
//! All stored values are non-negative; spending more than is available
//! clamps to zero instead of failing.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::PowerupKind;

/// Coins needed to buy one powerup in the shop
pub const PURCHASE_PRICE: u32 = 500;
/// Coins needed to revive after death
pub const REVIVE_PRICE: u32 = 500;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored wallet is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persisted progress: best distance, coin balance, purchased powerups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub high_score: u32,
    pub coins: u32,
    pub immortality: u32,
    pub lightspeed: u32,
    pub magnet: u32,
}

impl Wallet {
    /// Purchased units of a powerup
    pub fn count(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Immortality => self.immortality,
            PowerupKind::Lightspeed => self.lightspeed,
            PowerupKind::Magnet => self.magnet,
        }
    }

    fn count_mut(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Immortality => &mut self.immortality,
            PowerupKind::Lightspeed => &mut self.lightspeed,
            PowerupKind::Magnet => &mut self.magnet,
        }
    }

    /// Buy one unit for [`PURCHASE_PRICE`] coins. Returns false if the
    /// balance is too low.
    pub fn purchase(&mut self, kind: PowerupKind) -> bool {
        if self.coins < PURCHASE_PRICE {
            return false;
        }
        self.coins -= PURCHASE_PRICE;
        *self.count_mut(kind) += 1;
        true
    }

    /// Consume one purchased unit (clamps at zero)
    pub fn spend(&mut self, kind: PowerupKind) {
        let count = self.count_mut(kind);
        *count = count.saturating_sub(1);
    }

    /// Pay for a revive (clamps at zero)
    pub fn spend_revive(&mut self) {
        self.coins = self.coins.saturating_sub(REVIVE_PRICE);
    }

    pub fn can_revive(&self) -> bool {
        self.coins >= REVIVE_PRICE
    }
}

/// Storage collaborator for the wallet
pub trait Persistence {
    fn load(&mut self) -> Result<Wallet, PersistenceError>;

    fn save(&mut self, high_score: u32, coins: u32) -> Result<(), PersistenceError>;

    /// Buy a powerup. `Ok(false)` means the balance was too low.
    fn purchase(&mut self, kind: PowerupKind) -> Result<bool, PersistenceError>;

    fn spend(&mut self, kind: PowerupKind) -> Result<(), PersistenceError>;

    fn spend_revive(&mut self) -> Result<(), PersistenceError>;
}
