//! Settings of the terminal host, the machine itself is described by
//! [`chip::definitions`].
use std::time::Duration;

pub mod keyboard {
    use super::Duration;

    /// The physical keys, in the same positions as
    /// [`LAYOUT`](chip::definitions::keyboard::LAYOUT) on the keypad.
    pub const TERMINAL_LAYOUT: [[char; 4]; 4] = [
        ['1', '2', '3', '4'],
        ['q', 'w', 'e', 'r'],
        ['a', 's', 'd', 'f'],
        ['z', 'x', 'c', 'v'],
    ];

    /// Terminals only report presses, so a key is held for this long
    /// after its last press (or repeat) event.
    pub const HOLD: Duration = Duration::from_millis(150);
}

pub mod screen {
    /// The title of the frame around the canvas
    pub const TITLE: &str = "CHIP-8";
}

/// The highest instruction rate accepted on the command line.
pub const MAX_HERTZ: u32 = 1_000_000;

/// How long the main loop sleeps in between two updates.
pub const FRAME: Duration = Duration::from_millis(2);
