//! JSON wallet file
//!
//! Writes go to a sibling `.tmp` file first and are renamed over the real
//! one, so a crash mid-write leaves the previous wallet intact.

use std::path::{Path, PathBuf};

use super::{Persistence, PersistenceError, Wallet};
use crate::sim::PowerupKind;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Wallet, PersistenceError> {
        if !self.path.exists() {
            log::info!("No wallet at {}, starting fresh", self.path.display());
            return Ok(Wallet::default());
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, wallet: &Wallet) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(wallet)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::debug!("Wallet saved to {}", self.path.display());
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Wallet)) -> Result<Wallet, PersistenceError> {
        let mut wallet = self.read()?;
        f(&mut wallet);
        self.write(&wallet)?;
        Ok(wallet)
    }
}

impl Persistence for JsonFileStore {
    fn load(&mut self) -> Result<Wallet, PersistenceError> {
        self.read()
    }

    fn save(&mut self, high_score: u32, coins: u32) -> Result<(), PersistenceError> {
        self.update(|w| {
            w.high_score = high_score;
            w.coins = coins;
        })
        .map(|_| ())
    }

    fn purchase(&mut self, kind: PowerupKind) -> Result<bool, PersistenceError> {
        let mut bought = false;
        self.update(|w| bought = w.purchase(kind))?;
        Ok(bought)
    }

    fn spend(&mut self, kind: PowerupKind) -> Result<(), PersistenceError> {
        self.update(|w| w.spend(kind)).map(|_| ())
    }

    fn spend_revive(&mut self) -> Result<(), PersistenceError> {
        self.update(Wallet::spend_revive).map(|_| ())
    }
}
