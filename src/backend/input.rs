use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque identifier handed out by the event source; stable for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PointerId(pub u32);

impl std::fmt::Display for PointerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PointerEvent {
    Down { id: PointerId, pos: Vec2 },
    Move { id: PointerId, pos: Vec2 },
    Enter { id: PointerId, pos: Vec2 },
    Up { id: PointerId },
}

impl PointerEvent {
    pub const fn id(&self) -> PointerId {
        match self {
            Self::Down { id, .. } | Self::Move { id, .. } | Self::Enter { id, .. } | Self::Up { id } => {
                *id
            }
        }
    }
}

/// One tracked contact. `before` is the position the last processed delta ended at.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pointer {
    pub id: PointerId,
    pub now: Vec2,
    pub before: Vec2,
    pub active: bool,
    /// Set once the first movement sample has been absorbed.
    pub primed: bool,
    /// Whether the ray is currently over the image quad.
    pub inside: bool,
}

impl Pointer {
    pub const fn pressed(id: PointerId, pos: Vec2) -> Self {
        Self {
            id,
            now: pos,
            before: pos,
            active: true,
            primed: false,
            inside: true,
        }
    }

    pub const fn matches(&self, id: PointerId) -> bool {
        self.active && self.id.0 == id.0
    }

    /// Shifts `now` into `before` and records the new sample.
    /// The first sample after a press is absorbed so it yields a zero delta.
    pub fn advance(&mut self, pos: Vec2) -> Vec2 {
        if !self.primed {
            self.primed = true;
            self.before = pos;
            self.now = pos;
            return Vec2::ZERO;
        }
        self.before = self.now;
        self.now = pos;
        self.now - self.before
    }

    pub fn settle(&mut self) {
        self.before = self.now;
        self.primed = true;
    }
}

/// Fixed pair of contact slots; a third concurrent contact has nowhere to go.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSlots {
    pub pointers: [Pointer; 2],
}

impl PointerSlots {
    pub fn slot_of(&self, id: PointerId) -> Option<usize> {
        self.pointers.iter().position(|p| p.matches(id))
    }

    pub fn free_slot(&self) -> Option<usize> {
        self.pointers.iter().position(|p| !p.active)
    }

    pub fn active_count(&self) -> usize {
        self.pointers.iter().filter(|p| p.active).count()
    }

    pub fn both_active(&self) -> bool {
        self.pointers[0].active && self.pointers[1].active
    }

    pub fn release(&mut self, idx: usize) {
        self.pointers[idx].active = false;
        self.pointers[idx].primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_is_absorbed() {
        let mut p = Pointer::pressed(PointerId(3), Vec2::ZERO);
        assert_eq!(p.advance(Vec2::new(400.0, 10.0)), Vec2::ZERO);
        assert_eq!(p.before, Vec2::new(400.0, 10.0));
        assert_eq!(p.advance(Vec2::new(410.0, 5.0)), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn slots_fill_in_order_and_refuse_a_third() {
        let mut slots = PointerSlots::default();
        assert_eq!(slots.free_slot(), Some(0));
        slots.pointers[0] = Pointer::pressed(PointerId(7), Vec2::ZERO);
        assert_eq!(slots.free_slot(), Some(1));
        slots.pointers[1] = Pointer::pressed(PointerId(9), Vec2::ONE);
        assert_eq!(slots.free_slot(), None);
        assert!(slots.both_active());
        assert_eq!(slots.slot_of(PointerId(9)), Some(1));

        slots.release(0);
        assert_eq!(slots.slot_of(PointerId(7)), None);
        assert_eq!(slots.free_slot(), Some(0));
        assert_eq!(slots.active_count(), 1);
    }

    #[test]
    fn event_names_are_snake_case() {
        let ev = PointerEvent::Up { id: PointerId(1) };
        assert_eq!(ev.to_string(), "up");
        assert_eq!(ev.id(), PointerId(1));
    }
}
