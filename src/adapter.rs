use std::{
    collections::HashMap,
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use {
    chip::{
        definitions::keyboard::{LAYOUT, SIZE},
        devices::{DisplayCommands, InputProvider, Keyboard, SoundDriver},
        display::Framebuffer,
        InputError,
    },
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    once_cell::sync::Lazy,
    tui::{
        backend::CrosstermBackend,
        layout::Rect,
        style::Color,
        symbols::Marker,
        widgets::{
            canvas::{Canvas, Points},
            Block, Borders,
        },
        Terminal,
    },
};

use crate::definitions::{keyboard::TERMINAL_LAYOUT, screen};

/// Draws the framebuffer onto a canvas, one terminal cell per pixel.
pub(crate) struct DisplayAdapter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
}

impl DisplayAdapter {
    pub fn new(rom: &str) -> io::Result<Self> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            title: format!("{} - {}", screen::TITLE, rom),
        })
    }
}

/// The lit pixels in canvas coordinates, `y` grows downwards on the screen.
fn lit_points(framebuffer: &Framebuffer) -> Vec<(f64, f64)> {
    framebuffer
        .rows()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &lit)| lit)
                .map(move |(x, _)| (x as f64, -(y as f64)))
        })
        .collect()
}

impl DisplayCommands for DisplayAdapter {
    fn display(&mut self, framebuffer: &Framebuffer) -> io::Result<()> {
        log::debug!("Drawing the display");

        let coords = lit_points(framebuffer);
        let (width, height) = (framebuffer.width(), framebuffer.height());
        let title = self.title.as_str();

        self.terminal.draw(|f| {
            // the border takes up a cell on every side
            let area = Rect::new(0, 0, 2 + width as u16, 2 + height as u16).intersection(f.size());
            let canvas = Canvas::default()
                .block(Block::default().title(title).borders(Borders::ALL))
                .x_bounds([0.0, (width - 1) as f64])
                .y_bounds([-((height - 1) as f64), 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &coords,
                        color: Color::White,
                    })
                });
            f.render_widget(canvas, area);
        })?;

        Ok(())
    }
}

/// Abstracts away the terminal keyboard, which only knows about presses.
pub(crate) struct KeyboardAdapter {
    /// When each keypad key was pressed the last time.
    pressed_at: [Option<Instant>; SIZE],
    hold: Duration,
    quit: bool,
}

impl KeyboardAdapter {
    /// Generates a new keyboard interface, a key stays down for `hold`
    /// after it was pressed.
    pub fn new(hold: Duration) -> Self {
        Self {
            pressed_at: [None; SIZE],
            hold,
            quit: false,
        }
    }

    /// maps the terminal keys onto the keypad values.
    pub fn map_key(key: char) -> Option<u8> {
        static LAYOUT_MAP: Lazy<HashMap<char, u8>> = Lazy::new(|| {
            TERMINAL_LAYOUT
                .iter()
                .flatten()
                .copied()
                .zip(LAYOUT.iter().flatten().copied())
                .collect()
        });

        LAYOUT_MAP.get(&key.to_ascii_lowercase()).copied()
    }

    /// If the user asked to leave.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Handles every event the terminal has queued up, without blocking.
    pub fn pump(&mut self) -> crossterm::Result<()> {
        while event::poll(Duration::from_secs(0))? {
            let event = event::read()?;
            self.handle(event, Instant::now());
        }
        Ok(())
    }

    /// Returns the keypad key, if the event pressed one.
    fn handle(&mut self, event: Event, now: Instant) -> Option<u8> {
        let KeyEvent { code, modifiers } = match event {
            Event::Key(key) => key,
            _ => return None,
        };

        match code {
            KeyCode::Esc => self.request_quit(),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.request_quit(),
            KeyCode::Char(c) => {
                let key = Self::map_key(c)?;
                self.pressed_at[key as usize] = Some(now);
                Some(key)
            }
            _ => None,
        }
    }

    fn request_quit(&mut self) -> Option<u8> {
        log::info!("quit requested");
        self.quit = true;
        None
    }

    /// All the keys that are still held at `now`.
    fn keyboard_at(&self, now: Instant) -> Keyboard {
        self.pressed_at
            .iter()
            .enumerate()
            .filter(|(_, at)| at.map_or(false, |at| now.saturating_duration_since(at) < self.hold))
            .map(|(key, _)| key as u8)
            .collect()
    }
}

impl InputProvider for KeyboardAdapter {
    fn pressed_keys(&mut self) -> Keyboard {
        if let Err(err) = self.pump() {
            log::warn!("unable to read the terminal events: {}", err);
        }
        self.keyboard_at(Instant::now())
    }

    fn wait_for_key(&mut self) -> Result<u8, InputError> {
        log::debug!("waiting for a key press");
        loop {
            if self.quit {
                return Err(InputError::Quit);
            }
            let event = event::read().map_err(|err| InputError::Device(err.to_string()))?;
            if let Some(key) = self.handle(event, Instant::now()) {
                return Ok(key);
            }
        }
    }
}

/// Rings the terminal bell once per sound, the terminal can't hold a tone.
pub(crate) struct BellAdapter<W: Write> {
    out: W,
    playing: bool,
}

impl BellAdapter<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> BellAdapter<W> {
    fn with_output(out: W) -> Self {
        Self {
            out,
            playing: false,
        }
    }
}

impl<W: Write> SoundDriver for BellAdapter<W> {
    fn play(&mut self) {
        if self.playing {
            return;
        }
        self.playing = true;
        log::debug!("ringing the bell");

        if let Err(err) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
            log::warn!("unable to ring the bell: {}", err);
        }
    }

    fn stop(&mut self) {
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_map_key() {
        assert_eq!(Some(0x1), KeyboardAdapter::map_key('1'));
        assert_eq!(Some(0xC), KeyboardAdapter::map_key('4'));
        assert_eq!(Some(0x5), KeyboardAdapter::map_key('w'));
        assert_eq!(Some(0x5), KeyboardAdapter::map_key('W'));
        assert_eq!(Some(0x0), KeyboardAdapter::map_key('x'));
        assert_eq!(Some(0xF), KeyboardAdapter::map_key('v'));
        assert_eq!(None, KeyboardAdapter::map_key('p'));
    }

    #[test]
    fn test_every_keypad_key_is_reachable() {
        let mut keys: Vec<_> = TERMINAL_LAYOUT
            .iter()
            .flatten()
            .filter_map(|&c| KeyboardAdapter::map_key(c))
            .collect();
        keys.sort_unstable();

        assert_eq!((0..SIZE as u8).collect::<Vec<_>>(), keys);
    }

    #[test]
    fn test_key_is_held_for_a_while() {
        let hold = Duration::from_millis(150);
        let mut keyboard = KeyboardAdapter::new(hold);
        let now = Instant::now();

        assert_eq!(Some(0x6), keyboard.handle(press(KeyCode::Char('e')), now));

        let held = keyboard.keyboard_at(now + Duration::from_millis(100));
        assert_eq!(vec![0x6], held.pressed().collect::<Vec<_>>());

        let released = keyboard.keyboard_at(now + hold);
        assert!(released.is_empty());
    }

    #[test]
    fn test_repeat_extends_the_hold() {
        let hold = Duration::from_millis(150);
        let mut keyboard = KeyboardAdapter::new(hold);
        let now = Instant::now();

        keyboard.handle(press(KeyCode::Char('a')), now);
        keyboard.handle(press(KeyCode::Char('a')), now + Duration::from_millis(100));

        assert!(keyboard
            .keyboard_at(now + Duration::from_millis(200))
            .is_pressed(0x7));
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut keyboard = KeyboardAdapter::new(Duration::from_millis(150));
        let now = Instant::now();

        assert_eq!(None, keyboard.handle(Event::Resize(80, 24), now));
        assert_eq!(None, keyboard.handle(press(KeyCode::Char('p')), now));
        assert_eq!(None, keyboard.handle(press(KeyCode::Enter), now));
        assert!(keyboard.keyboard_at(now).is_empty());
        assert!(!keyboard.quit_requested());
    }

    #[test]
    fn test_quit() {
        let now = Instant::now();

        let mut keyboard = KeyboardAdapter::new(Duration::from_millis(150));
        assert_eq!(None, keyboard.handle(press(KeyCode::Esc), now));
        assert!(keyboard.quit_requested());

        let mut keyboard = KeyboardAdapter::new(Duration::from_millis(150));
        let ctrl_c = Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
        });
        assert_eq!(None, keyboard.handle(ctrl_c, now));
        assert!(keyboard.quit_requested());
    }

    #[test]
    fn test_plain_c_is_a_key() {
        let mut keyboard = KeyboardAdapter::new(Duration::from_millis(150));
        assert_eq!(Some(0xB), keyboard.handle(press(KeyCode::Char('c')), Instant::now()));
        assert!(!keyboard.quit_requested());
    }

    #[test]
    fn test_quit_while_waiting() {
        let mut keyboard = KeyboardAdapter::new(Duration::from_millis(150));
        keyboard.handle(press(KeyCode::Esc), Instant::now());

        assert_eq!(Err(InputError::Quit), keyboard.wait_for_key());
    }

    #[test]
    fn test_lit_points() {
        let mut framebuffer = Framebuffer::new();
        framebuffer.toggle(0, 0);
        framebuffer.toggle(63, 31);
        framebuffer.toggle(5, 2);

        assert_eq!(
            vec![(0.0, 0.0), (5.0, -2.0), (63.0, -31.0)],
            lit_points(&framebuffer)
        );
        assert!(lit_points(&Framebuffer::new()).is_empty());
    }

    #[test]
    fn test_bell_rings_once_per_sound() {
        let mut bell = BellAdapter::with_output(Vec::new());

        bell.play();
        bell.play();
        assert_eq!(b"\x07".to_vec(), bell.out);

        bell.stop();
        bell.stop();
        bell.play();
        assert_eq!(b"\x07\x07".to_vec(), bell.out);
    }
}
