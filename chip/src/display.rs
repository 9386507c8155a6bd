//! The monochrome framebuffer and its sprite compositor.
use crate::definitions::display::{HEIGHT, RESOLUTION, SPRITE_WIDTH, WIDTH};

/// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
/// `(64 x 32)`, stored row by row.
///
/// ```text
/// ( 0, 0)   (63, 0)
/// ( 0,31)   (63,31)
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[bool; RESOLUTION]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; RESOLUTION]),
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> usize {
        WIDTH
    }

    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Will turn every pixel off.
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Returns the pixel at (`x`, `y`).
    ///
    /// # Panics
    /// If the coordinates are not on screen, the caller has to check them.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[Self::index(x, y)]
    }

    /// Flips the pixel at (`x`, `y`) and returns its previous state.
    ///
    /// # Panics
    /// If the coordinates are not on screen.
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let index = Self::index(x, y);
        let last = self.pixels[index];
        self.pixels[index] = !last;
        last
    }

    /// XORs the sprite onto the screen with its top left corner at the anchor.
    ///
    /// Every byte of `sprite` is a row, its most significant bit the leftmost
    /// pixel. Pixels falling outside of the screen are dropped, they neither wrap
    /// around nor take part in the collision. Returns `true` if any lit sprite
    /// pixel hit a pixel that was already set.
    pub fn draw_sprite(&mut self, x_anchor: usize, y_anchor: usize, sprite: &[u8]) -> bool {
        let mut collided = false;

        for (row, byte) in sprite.iter().enumerate() {
            let y = y_anchor + row;
            if y >= HEIGHT {
                break;
            }

            for col in 0..SPRITE_WIDTH {
                let x = x_anchor + col;
                if x >= WIDTH {
                    break;
                }

                let mask = 1 << (SPRITE_WIDTH - 1 - col);
                if byte & mask == 0 {
                    continue;
                }

                collided |= self.toggle(x, y);
            }
        }

        collided
    }

    /// All the pixels, row by row.
    pub fn pixels(&self) -> &[bool] {
        &self.pixels[..]
    }

    /// Iterates over the rows of the screen.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.pixels.chunks(WIDTH)
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        assert!(
            x < WIDTH && y < HEIGHT,
            "Pixel ({}, {}) is not on screen.",
            x,
            y
        );
        y * WIDTH + x
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|p| if *p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
