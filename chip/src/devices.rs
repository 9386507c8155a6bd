//! The ports the interpreter talks to the outside world through.
use std::io;

use crate::{definitions::keyboard, display::Framebuffer, InputError};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will present all the pixels of the framebuffer
    fn display(&mut self, framebuffer: &Framebuffer) -> io::Result<()>;
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the keyboard data
pub trait InputProvider {
    /// Polls the keys that are currently held down, must not block.
    fn pressed_keys(&mut self) -> Keyboard;

    /// Blocks until a key is pressed and returns its id in `0x0..=0xF`.
    ///
    /// A quit request from the user is reported as [`InputError::Quit`] so that
    /// the host can end the session while the interpreter is waiting.
    fn wait_for_key(&mut self) -> Result<u8, InputError>;
}

#[cfg_attr(test, mockall::automock)]
/// The beeper, both calls have to be idempotent.
pub trait SoundDriver {
    fn play(&mut self);
    fn stop(&mut self);
}

/// A sound driver that stays silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mute;

impl SoundDriver for Mute {
    fn play(&mut self) {}
    fn stop(&mut self) {}
}

/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Key ids outside of `0x0..=0xF` are never pressed.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    pub fn set_key(&mut self, key: usize, to: bool) {
        debug_assert!(key < keyboard::SIZE);
        if let Some(entry) = self.keys.get_mut(key) {
            *entry = to;
        }
    }

    /// The ids of all the keys held down, in ascending order.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(key, _)| key as u8)
    }

    pub fn is_empty(&self) -> bool {
        !self.keys.iter().any(|k| *k)
    }
}

impl std::iter::FromIterator<u8> for Keyboard {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut keyboard = Keyboard::new();
        for key in iter {
            keyboard.set_key(key as usize, true);
        }
        keyboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_keys() {
        let mut keys = Keyboard::new();
        assert!(keys.is_empty());

        keys.set_key(0xA, true);
        keys.set_key(0x3, true);
        assert!(keys.is_pressed(0xA));
        assert!(!keys.is_pressed(0xB));
        assert_eq!(keys.pressed().collect::<Vec<_>>(), vec![0x3, 0xA]);

        keys.set_key(0xA, false);
        assert_eq!(keys.pressed().collect::<Vec<_>>(), vec![0x3]);

        keys.set_key(0x3, false);
        assert!(keys.is_empty());
    }

    #[test]
    fn test_collect_and_out_of_range() {
        let keys: Keyboard = vec![0x0, 0xF].into_iter().collect();
        assert!(keys.is_pressed(0x0));
        assert!(keys.is_pressed(0xF));
        assert!(!keys.is_pressed(0x10));
        assert!(!keys.is_pressed(0xFF));
        assert_eq!(keys.pressed().count(), 2);
    }
}
