use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A colour as written in the config: an ANSI-256 index or a hex triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Ansi256(u8),
    Hex { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Error)]
#[error("invalid color value for field \"{field}\": \"{value}\"")]
pub struct ColorParseError {
    pub field: String,
    pub value: String,
}

impl Color {
    /// Parse `"0"`–`"255"`, `"#RRGGBB"` or `"#RGB"`; `field` names the config
    /// key in the error.
    pub fn parse(s: &str, field: &str) -> Result<Self, ColorParseError> {
        let make_err = || ColorParseError {
            field: field.to_owned(),
            value: s.to_owned(),
        };

        if let Some(hex) = s.strip_prefix('#') {
            let digit = |i: usize, len: usize| {
                hex.get(i..i + len)
                    .and_then(|d| u8::from_str_radix(d, 16).ok())
                    .ok_or_else(make_err)
            };
            match hex.len() {
                6 => Ok(Color::Hex {
                    r: digit(0, 2)?,
                    g: digit(2, 2)?,
                    b: digit(4, 2)?,
                }),
                3 => Ok(Color::Hex {
                    r: digit(0, 1)? * 17,
                    g: digit(1, 1)? * 17,
                    b: digit(2, 1)? * 17,
                }),
                _ => Err(make_err()),
            }
        } else {
            s.parse::<u8>().map(Color::Ansi256).map_err(|_| make_err())
        }
    }

    /// Indices 0–15 map to crossterm's named colours so the terminal palette
    /// applies.
    pub fn to_crossterm_color(self) -> crossterm::style::Color {
        use crossterm::style::Color as C;
        match self {
            Color::Hex { r, g, b } => C::Rgb { r, g, b },
            Color::Ansi256(n) => match n {
                0 => C::Black,
                1 => C::DarkRed,
                2 => C::DarkGreen,
                3 => C::DarkYellow,
                4 => C::DarkBlue,
                5 => C::DarkMagenta,
                6 => C::DarkCyan,
                7 => C::Grey,
                8 => C::DarkGrey,
                9 => C::Red,
                10 => C::Green,
                11 => C::Yellow,
                12 => C::Blue,
                13 => C::Magenta,
                14 => C::Cyan,
                15 => C::White,
                _ => C::AnsiValue(n),
            },
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Ansi256(n) => write!(f, "{n}"),
            Color::Hex { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s, "<unknown>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ansi_index() {
        assert_eq!(Color::parse("245", "x").unwrap(), Color::Ansi256(245));
        assert!(Color::parse("256", "x").is_err());
    }

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(
            Color::parse("#c0caf5", "x").unwrap(),
            Color::Hex { r: 0xc0, g: 0xca, b: 0xf5 }
        );
        assert_eq!(
            Color::parse("#fff", "x").unwrap(),
            Color::Hex { r: 255, g: 255, b: 255 }
        );
        assert!(Color::parse("#ggg", "x").is_err());
    }

    #[test]
    fn error_names_the_field() {
        let err = Color::parse("teal", "success").unwrap_err();
        assert_eq!(err.to_string(), "invalid color value for field \"success\": \"teal\"");
    }

    #[test]
    fn display_round_trips_hex() {
        let c = Color::Hex { r: 1, g: 2, b: 3 };
        assert_eq!(c.to_string(), "#010203");
    }
}
