use std::collections::VecDeque;

use super::types::GameEvent;

/// Bounded FIFO of host events. When full, the oldest event is dropped.
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
    max_pending: usize,
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        if self.pending.len() >= self.max_pending {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.push(event);
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let mut queue = EventQueue::new(8);
        queue.push(GameEvent::MatchStarted { players: 2 });
        queue.push(GameEvent::MatchEnded {
            reason: "VICTORY".into(),
        });
        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GameEvent::MatchStarted { players: 2 }));
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut queue = EventQueue::new(2);
        for slot in 0..3 {
            queue.push(GameEvent::PlayerJoined {
                name: format!("p{slot}"),
                slot,
            });
        }
        assert_eq!(queue.len(), 2);
        let first = queue.drain().next();
        assert_eq!(
            first,
            Some(GameEvent::PlayerJoined {
                name: "p1".into(),
                slot: 1
            })
        );
    }

    #[test]
    fn display_is_human_readable() {
        let event = GameEvent::EncounterActivated { id: 0, kind: "boss" };
        assert_eq!(event.to_string(), "encounter 0 (boss) activated");
        assert!(!event.is_milestone());
    }
}
