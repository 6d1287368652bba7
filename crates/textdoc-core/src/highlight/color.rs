/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Color {
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (the `#` is optional).
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 0x11);
                Some(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }
}

/// Foreground color plus text attributes assigned to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HighlightColor {
    /// Foreground.
    pub color: Color,
    /// Optional background.
    pub background: Option<Color>,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
}

impl HighlightColor {
    /// Plain foreground color.
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            background: None,
            bold: false,
            italic: false,
        }
    }

    /// Set the background.
    pub const fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    /// Make bold.
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Make italic.
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

impl From<Color> for HighlightColor {
    fn from(color: Color) -> Self {
        Self::new(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse_hex("#ff8000"), Some(Color::new(255, 128, 0)));
        assert_eq!(Color::parse_hex("0a0B0c"), Some(Color::new(10, 11, 12)));
        assert_eq!(Color::parse_hex("#f0a"), Some(Color::new(255, 0, 170)));
        assert_eq!(Color::parse_hex("#ff80"), None);
        assert_eq!(Color::parse_hex("#gg0000"), None);
        assert_eq!(Color::parse_hex("#ééé"), None);
    }
}
