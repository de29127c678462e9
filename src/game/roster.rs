//! The two fighter slots

use uuid::Uuid;

use crate::net::protocol::RosterEntry;

use super::combat::AttackOutcome;
use super::physics::{Position, GROUND_Y};
use super::player::Player;

/// One of the two fixed roster positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Spawns on the left
    One,
    /// Spawns on the right
    Two,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }

    pub fn spawn(self) -> Position {
        match self {
            Slot::One => Position::new(100, GROUND_Y),
            Slot::Two => Position::new(500, GROUND_Y),
        }
    }
}

/// Slot occupancy. Only connection assignment and promotion fill a slot.
#[derive(Debug, Default)]
pub struct Roster {
    slots: [Option<Player>; 2],
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&Player> {
        self.slots[slot.index()].as_ref()
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Player> {
        self.slots[slot.index()].as_mut()
    }

    /// Lowest-numbered empty slot
    pub fn first_empty(&self) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| self.get(*slot).is_none())
    }

    /// Put a fresh fighter for `id` into an empty slot
    pub fn place(&mut self, slot: Slot, id: Uuid) -> &mut Player {
        debug_assert!(self.get(slot).is_none(), "slot {:?} already occupied", slot);
        self.slots[slot.index()].insert(Player::new(id, slot))
    }

    pub fn vacate(&mut self, slot: Slot) -> Option<Player> {
        self.slots[slot.index()].take()
    }

    pub fn slot_of(&self, id: &Uuid) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| self.get(*slot).map(|p| &p.id) == Some(id))
    }

    pub fn player_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.slot_of(id).and_then(|slot| self.get_mut(slot))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.slots.iter_mut().flatten()
    }

    /// The fighter in `attacker` hits whoever holds the other slot.
    /// Returns the target id and outcome, or None if either slot is empty.
    pub fn attack_from(&mut self, attacker: Slot) -> Option<(Uuid, AttackOutcome)> {
        let [one, two] = &mut self.slots;
        let (attacker, target) = match attacker {
            Slot::One => (one, two),
            Slot::Two => (two, one),
        };
        let attacker = attacker.as_ref()?;
        let target = target.as_mut()?;
        Some((target.id, attacker.attack(target)))
    }

    pub fn reset_all(&mut self) {
        for player in self.players_mut() {
            player.reset();
        }
    }

    pub fn mark_all_broadcast(&mut self) {
        for player in self.players_mut() {
            player.mark_broadcast();
        }
    }

    pub fn entries(&self) -> [Option<RosterEntry>; 2] {
        [
            self.get(Slot::One).map(Player::roster_entry),
            self.get(Slot::Two).map(Player::roster_entry),
        ]
    }
}
