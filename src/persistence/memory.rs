use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Persistence, PersistenceError, Wallet};
use crate::sim::PowerupKind;

/// In-process wallet store. Clones share the same wallet, so a test can
/// hand one clone to the world and read the other back.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    wallet: Rc<RefCell<Wallet>>,
    /// Simulate a broken backend: every call fails
    failing: bool,
    saves: Rc<Cell<u32>>,
}

impl MemoryStore {
    pub fn new(wallet: Wallet) -> Self {
        Self {
            wallet: Rc::new(RefCell::new(wallet)),
            ..Default::default()
        }
    }

    /// A store whose every operation fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn wallet(&self) -> Wallet {
        *self.wallet.borrow()
    }

    /// Number of successful saves
    pub fn saves(&self) -> u32 {
        self.saves.get()
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing {
            Err(PersistenceError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl Persistence for MemoryStore {
    fn load(&mut self) -> Result<Wallet, PersistenceError> {
        self.check()?;
        Ok(self.wallet())
    }

    fn save(&mut self, high_score: u32, coins: u32) -> Result<(), PersistenceError> {
        self.check()?;
        let mut wallet = self.wallet.borrow_mut();
        wallet.high_score = high_score;
        wallet.coins = coins;
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn purchase(&mut self, kind: PowerupKind) -> Result<bool, PersistenceError> {
        self.check()?;
        Ok(self.wallet.borrow_mut().purchase(kind))
    }

    fn spend(&mut self, kind: PowerupKind) -> Result<(), PersistenceError> {
        self.check()?;
        self.wallet.borrow_mut().spend(kind);
        Ok(())
    }

    fn spend_revive(&mut self) -> Result<(), PersistenceError> {
        self.check()?;
        self.wallet.borrow_mut().spend_revive();
        Ok(())
    }
}
