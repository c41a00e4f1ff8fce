//! Session event callbacks (core → UI)
//!
//! The world queues [`GameEvent`]s while it runs and drains them into a
//! [`SessionEvents`] sink at tick boundaries, never mid-tick.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::{GameEvent, PowerupKind};

/// UI-side receiver. Every callback defaults to doing nothing.
pub trait SessionEvents {
    fn on_distance_changed(&mut self, _meters: f64) {}
    fn on_coin_count_changed(&mut self, _count: u32) {}
    fn on_game_started(&mut self) {}
    fn on_game_over(&mut self) {}
    fn on_powerup_alert(&mut self, _kind: PowerupKind) {}
}

/// Route one queued event to its callback
pub fn dispatch(sink: &mut dyn SessionEvents, event: GameEvent) {
    match event {
        GameEvent::DistanceChanged(meters) => sink.on_distance_changed(meters),
        GameEvent::CoinCountChanged(count) => sink.on_coin_count_changed(count),
        GameEvent::GameStarted => sink.on_game_started(),
        GameEvent::GameOver => sink.on_game_over(),
        GameEvent::PowerupAlert(kind) => sink.on_powerup_alert(kind),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl SessionEvents for NullEvents {}

/// Records every delivered event; clones share the log
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn last_distance(&self) -> Option<f64> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            GameEvent::DistanceChanged(m) => Some(*m),
            _ => None,
        })
    }

    fn push(&self, event: GameEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl SessionEvents for EventLog {
    fn on_distance_changed(&mut self, meters: f64) {
        self.push(GameEvent::DistanceChanged(meters));
    }

    fn on_coin_count_changed(&mut self, count: u32) {
        self.push(GameEvent::CoinCountChanged(count));
    }

    fn on_game_started(&mut self) {
        self.push(GameEvent::GameStarted);
    }

    fn on_game_over(&mut self) {
        self.push(GameEvent::GameOver);
    }

    fn on_powerup_alert(&mut self, kind: PowerupKind) {
        self.push(GameEvent::PowerupAlert(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_keeps_order() {
        let log = EventLog::new();
        let mut sink = log.clone();
        for event in [
            GameEvent::GameStarted,
            GameEvent::CoinCountChanged(3),
            GameEvent::PowerupAlert(PowerupKind::Magnet),
            GameEvent::DistanceChanged(12.5),
            GameEvent::GameOver,
        ] {
            dispatch(&mut sink, event);
            dispatch(&mut NullEvents, event);
        }
        assert_eq!(
            log.events(),
            vec![
                GameEvent::GameStarted,
                GameEvent::CoinCountChanged(3),
                GameEvent::PowerupAlert(PowerupKind::Magnet),
                GameEvent::DistanceChanged(12.5),
                GameEvent::GameOver,
            ]
        );
        assert_eq!(log.last_distance(), Some(12.5));
    }
}
