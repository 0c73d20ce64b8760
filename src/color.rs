// src/color.rs

//! Color types and the 256-entry palette used to resolve indexed colors.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Standard ANSI named colors (indices 0-15): the 8 normal and 8 bright colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// sRGB values common across terminal emulators.
    pub fn to_rgb(self) -> Rgb {
        match self {
            NamedColor::Black => Rgb(0, 0, 0),
            NamedColor::Red => Rgb(205, 0, 0),
            NamedColor::Green => Rgb(0, 205, 0),
            NamedColor::Yellow => Rgb(205, 205, 0),
            NamedColor::Blue => Rgb(0, 0, 238),
            NamedColor::Magenta => Rgb(205, 0, 205),
            NamedColor::Cyan => Rgb(0, 205, 205),
            NamedColor::White => Rgb(229, 229, 229),
            NamedColor::BrightBlack => Rgb(127, 127, 127),
            NamedColor::BrightRed => Rgb(255, 0, 0),
            NamedColor::BrightGreen => Rgb(0, 255, 0),
            NamedColor::BrightYellow => Rgb(255, 255, 0),
            NamedColor::BrightBlue => Rgb(92, 92, 255),
            NamedColor::BrightMagenta => Rgb(255, 0, 255),
            NamedColor::BrightCyan => Rgb(0, 255, 255),
            NamedColor::BrightWhite => Rgb(255, 255, 255),
        }
    }
}

/// A concrete color value, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A color as carried in cell styles: one of the two default slots, an
/// index into the 256-color palette, or a direct RGB value that bypasses
/// the palette entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    /// Default foreground or background, resolved through the palette's
    /// dedicated default slots.
    #[default]
    Default,
    /// An indexed color (0-255). Indices 0-15 are the named ANSI colors.
    Indexed(u8),
    /// A truecolor value; never routed through the palette.
    Rgb(Rgb),
}

const CUBE_OFFSET: usize = 16;
const CUBE_SIZE: usize = 6;
const GRAYSCALE_OFFSET: usize = 232;

/// The xterm 256-color table: 16 named colors, a 6x6x6 cube, and a
/// 24-step grayscale ramp.
static DEFAULT_TABLE: Lazy<[Rgb; 256]> = Lazy::new(|| {
    let mut table = [Rgb(0, 0, 0); 256];
    for (idx, slot) in table.iter_mut().enumerate() {
        *slot = if idx < CUBE_OFFSET {
            named_from_index(idx as u8).to_rgb()
        } else if idx < GRAYSCALE_OFFSET {
            let cube = idx - CUBE_OFFSET;
            let r = (cube / (CUBE_SIZE * CUBE_SIZE)) % CUBE_SIZE;
            let g = (cube / CUBE_SIZE) % CUBE_SIZE;
            let b = cube % CUBE_SIZE;
            let chan = |c: usize| if c == 0 { 0 } else { (c * 40 + 55) as u8 };
            Rgb(chan(r), chan(g), chan(b))
        } else {
            let level = ((idx - GRAYSCALE_OFFSET) * 10 + 8) as u8;
            Rgb(level, level, level)
        };
    }
    table
});

fn named_from_index(idx: u8) -> NamedColor {
    match idx {
        0 => NamedColor::Black,
        1 => NamedColor::Red,
        2 => NamedColor::Green,
        3 => NamedColor::Yellow,
        4 => NamedColor::Blue,
        5 => NamedColor::Magenta,
        6 => NamedColor::Cyan,
        7 => NamedColor::White,
        8 => NamedColor::BrightBlack,
        9 => NamedColor::BrightRed,
        10 => NamedColor::BrightGreen,
        11 => NamedColor::BrightYellow,
        12 => NamedColor::BrightBlue,
        13 => NamedColor::BrightMagenta,
        14 => NamedColor::BrightCyan,
        _ => NamedColor::BrightWhite,
    }
}

/// Maps the 256 indexed colors plus the two default slots (foreground,
/// background) to concrete values. Individual entries may be overridden
/// by configuration.
#[derive(Debug, Clone)]
pub struct Palette {
    table: [Rgb; 256],
    default_fg: Rgb,
    default_bg: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            table: *DEFAULT_TABLE,
            default_fg: NamedColor::White.to_rgb(),
            default_bg: NamedColor::Black.to_rgb(),
        }
    }
}

impl Palette {
    pub fn new(default_fg: Rgb, default_bg: Rgb) -> Self {
        Palette {
            table: *DEFAULT_TABLE,
            default_fg,
            default_bg,
        }
    }

    pub fn default_foreground(&self) -> Rgb {
        self.default_fg
    }

    pub fn default_background(&self) -> Rgb {
        self.default_bg
    }

    pub fn set_default_foreground(&mut self, rgb: Rgb) {
        self.default_fg = rgb;
    }

    pub fn set_default_background(&mut self, rgb: Rgb) {
        self.default_bg = rgb;
    }

    pub fn set_indexed(&mut self, idx: u8, rgb: Rgb) {
        self.table[idx as usize] = rgb;
    }

    /// Resolves a style color into a concrete value. `is_foreground`
    /// selects which default slot `Color::Default` maps to.
    pub fn resolve(&self, color: Color, is_foreground: bool) -> Rgb {
        match color {
            Color::Default => {
                if is_foreground {
                    self.default_fg
                } else {
                    self.default_bg
                }
            }
            Color::Indexed(idx) => self.table[idx as usize],
            Color::Rgb(rgb) => rgb,
        }
    }
}
