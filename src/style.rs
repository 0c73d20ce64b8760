// src/style.rs

//! Text styling: attribute flags and the `TextStyle` carried by every run.
//!
//! `TextStyle::apply` computes the "current style" resulting from a stream
//! of SGR attribute changes; the screen stamps that style onto printed and
//! erased cells.

use crate::ansi::commands::Attribute;
use crate::color::Color;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// SGR attribute flags combinable on a single run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StyleFlags: u16 {
        const BOLD          = 1 << 0;
        const FAINT         = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// The style shared by every character of one text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextStyle {
    pub fg: Color,
    pub bg: Color,
    pub flags: StyleFlags,
}

impl TextStyle {
    /// Applies one SGR attribute to this style, returning the updated style.
    pub fn apply(mut self, attr: Attribute) -> TextStyle {
        match attr {
            Attribute::Reset => self = TextStyle::default(),
            Attribute::Bold => self.flags.insert(StyleFlags::BOLD),
            Attribute::Faint => self.flags.insert(StyleFlags::FAINT),
            Attribute::Italic => self.flags.insert(StyleFlags::ITALIC),
            Attribute::Underline => self.flags.insert(StyleFlags::UNDERLINE),
            Attribute::Blink => self.flags.insert(StyleFlags::BLINK),
            Attribute::Inverse => self.flags.insert(StyleFlags::INVERSE),
            Attribute::Hidden => self.flags.insert(StyleFlags::HIDDEN),
            Attribute::Strikethrough => self.flags.insert(StyleFlags::STRIKETHROUGH),
            Attribute::NormalIntensity => {
                self.flags.remove(StyleFlags::BOLD | StyleFlags::FAINT)
            }
            Attribute::NoItalic => self.flags.remove(StyleFlags::ITALIC),
            Attribute::NoUnderline => self.flags.remove(StyleFlags::UNDERLINE),
            Attribute::NoBlink => self.flags.remove(StyleFlags::BLINK),
            Attribute::NoInverse => self.flags.remove(StyleFlags::INVERSE),
            Attribute::NoHidden => self.flags.remove(StyleFlags::HIDDEN),
            Attribute::NoStrikethrough => self.flags.remove(StyleFlags::STRIKETHROUGH),
            Attribute::Foreground(color) => self.fg = color,
            Attribute::Background(color) => self.bg = color,
        }
        self
    }

    /// Applies a full SGR parameter list in order.
    pub fn apply_all(self, attrs: &[Attribute]) -> TextStyle {
        attrs.iter().fold(self, |style, &attr| style.apply(attr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, Rgb};

    #[test]
    fn reset_clears_everything() {
        let styled = TextStyle::default()
            .apply(Attribute::Bold)
            .apply(Attribute::Foreground(Color::Indexed(1)))
            .apply(Attribute::Background(Color::Rgb(Rgb(1, 2, 3))));
        assert_ne!(styled, TextStyle::default());
        assert_eq!(styled.apply(Attribute::Reset), TextStyle::default());
    }

    #[test]
    fn normal_intensity_clears_bold_and_faint() {
        let styled = TextStyle::default()
            .apply(Attribute::Bold)
            .apply(Attribute::Faint)
            .apply(Attribute::NormalIntensity);
        assert!(styled.flags.is_empty());
    }

    #[test]
    fn apply_all_is_left_to_right() {
        let styled = TextStyle::default().apply_all(&[
            Attribute::Foreground(Color::Indexed(2)),
            Attribute::Reset,
            Attribute::Foreground(Color::Indexed(4)),
        ]);
        assert_eq!(styled.fg, Color::Indexed(4));
        assert_eq!(styled.bg, Color::Default);
    }
}
