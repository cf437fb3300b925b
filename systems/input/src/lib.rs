#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input system translating held keys into steering commands.
//!
//! Each serpent is bound to one [`Keymap`]. Every frame the host reports the
//! keys currently held and the system emits at most one
//! [`Command::SetIntendedDirection`] per bound serpent. When several keys of
//! the same map are held, down wins over up, up over right, and right over
//! left.

use serde::{Deserialize, Serialize};
use serpents_core::{Command, Direction, Event, SerpentName};

const PRIORITY: [Direction; 4] = [
    Direction::Down,
    Direction::Up,
    Direction::Right,
    Direction::Left,
];

/// Physical keys the input system understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Arrow key pointing up.
    ArrowUp,
    /// Arrow key pointing down.
    ArrowDown,
    /// Arrow key pointing left.
    ArrowLeft,
    /// Arrow key pointing right.
    ArrowRight,
    /// Letter W.
    W,
    /// Letter A.
    A,
    /// Letter S.
    S,
    /// Letter D.
    D,
    /// Numeric keypad 8.
    Numpad8,
    /// Numeric keypad 4.
    Numpad4,
    /// Numeric keypad 2.
    Numpad2,
    /// Numeric keypad 6.
    Numpad6,
}

/// Key layouts a player can steer with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keymap {
    /// Arrow keys.
    #[default]
    #[serde(rename = "arrows")]
    ArrowKeys,
    /// W, A, S and D.
    #[serde(rename = "wasd")]
    Wasd,
    /// Numeric keypad 8, 4, 2 and 6.
    #[serde(rename = "numpad")]
    NumPad8426,
}

impl Keymap {
    /// Every supported layout, in the order players are offered them.
    pub const ALL: [Keymap; 3] = [Keymap::ArrowKeys, Keymap::Wasd, Keymap::NumPad8426];

    /// Key that steers towards the provided direction under this layout.
    #[must_use]
    pub const fn key_for(self, direction: Direction) -> Key {
        match (self, direction) {
            (Keymap::ArrowKeys, Direction::Up) => Key::ArrowUp,
            (Keymap::ArrowKeys, Direction::Down) => Key::ArrowDown,
            (Keymap::ArrowKeys, Direction::Left) => Key::ArrowLeft,
            (Keymap::ArrowKeys, Direction::Right) => Key::ArrowRight,
            (Keymap::Wasd, Direction::Up) => Key::W,
            (Keymap::Wasd, Direction::Down) => Key::S,
            (Keymap::Wasd, Direction::Left) => Key::A,
            (Keymap::Wasd, Direction::Right) => Key::D,
            (Keymap::NumPad8426, Direction::Up) => Key::Numpad8,
            (Keymap::NumPad8426, Direction::Down) => Key::Numpad2,
            (Keymap::NumPad8426, Direction::Left) => Key::Numpad4,
            (Keymap::NumPad8426, Direction::Right) => Key::Numpad6,
        }
    }

    /// Resolves the held keys into a single heading, if any key of this
    /// layout is held.
    #[must_use]
    pub fn resolve(self, pressed: &[Key]) -> Option<Direction> {
        PRIORITY
            .into_iter()
            .find(|direction| pressed.contains(&self.key_for(*direction)))
    }
}

/// Pure system that owns per-serpent key bindings.
#[derive(Debug, Default)]
pub struct Input {
    bindings: Vec<(SerpentName, Keymap)>,
}

impl Input {
    /// Creates an input system with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a serpent to a layout, replacing any previous binding.
    pub fn bind(&mut self, serpent: SerpentName, keymap: Keymap) {
        if let Some(binding) = self.bindings.iter_mut().find(|(name, _)| *name == serpent) {
            tracing::debug!(serpent = %serpent, ?keymap, "key map changed");
            binding.1 = keymap;
            return;
        }
        tracing::debug!(serpent = %serpent, ?keymap, "key map bound");
        self.bindings.push((serpent, keymap));
    }

    /// Drops the binding of a serpent. Returns whether one existed.
    pub fn unbind(&mut self, serpent: &SerpentName) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|(name, _)| name != serpent);
        self.bindings.len() != before
    }

    /// Layout currently bound to the serpent.
    #[must_use]
    pub fn keymap(&self, serpent: &SerpentName) -> Option<Keymap> {
        self.bindings
            .iter()
            .find(|(name, _)| name == serpent)
            .map(|(_, keymap)| *keymap)
    }

    /// Number of bound serpents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Reports whether no serpent is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forgets serpents that left play, then emits steering commands for the
    /// keys held this frame.
    pub fn handle(&mut self, events: &[Event], pressed: &[Key], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SerpentRemoved { serpent } | Event::SerpentDied { serpent, .. } => {
                    let _ = self.unbind(serpent);
                }
                _ => {}
            }
        }

        if pressed.is_empty() {
            return;
        }

        for (serpent, keymap) in &self.bindings {
            if let Some(direction) = keymap.resolve(pressed) {
                out.push(Command::SetIntendedDirection {
                    serpent: serpent.clone(),
                    direction,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_beats_every_other_key() {
        let pressed = [Key::A, Key::W, Key::S, Key::D];
        assert_eq!(Keymap::Wasd.resolve(&pressed), Some(Direction::Down));
    }

    #[test]
    fn right_beats_left() {
        let pressed = [Key::Numpad4, Key::Numpad6];
        assert_eq!(Keymap::NumPad8426.resolve(&pressed), Some(Direction::Right));
    }

    #[test]
    fn foreign_keys_are_ignored() {
        assert_eq!(Keymap::ArrowKeys.resolve(&[Key::W, Key::Numpad2]), None);
    }

    #[test]
    fn layouts_do_not_share_keys() {
        let mut seen = Vec::new();
        for keymap in Keymap::ALL {
            for direction in PRIORITY {
                let key = keymap.key_for(direction);
                assert!(!seen.contains(&key), "{key:?} bound twice");
                seen.push(key);
            }
        }
    }

    #[test]
    fn rebinding_replaces_layout() {
        let mut input = Input::new();
        input.bind(SerpentName::new("a"), Keymap::ArrowKeys);
        input.bind(SerpentName::new("a"), Keymap::Wasd);

        assert_eq!(input.len(), 1);
        assert_eq!(input.keymap(&SerpentName::new("a")), Some(Keymap::Wasd));
    }
}
