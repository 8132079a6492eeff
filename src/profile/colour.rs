//! Colour channel parsing and hex rendering.

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    #[must_use]
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Renders as lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Renders three channels as lowercase `#rrggbb`.
#[must_use]
pub fn rgb_to_hex(red: u8, green: u8, blue: u8) -> String {
    Rgb::new(red, green, blue).to_hex()
}

/// Parses a channel value from element text.
///
/// Decimals are rounded and the result clamped to `0..=255`; blank or
/// unparsable text reads as 0.
#[must_use]
pub fn parse_channel(text: &str) -> u8 {
    let Ok(value) = text.trim().parse::<f64>() else {
        return 0;
    };
    if value.is_nan() {
        return 0;
    }
    // Clamped to the u8 range first, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channel = value.round().clamp(0.0, 255.0) as u8;
    channel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_hex_pads_and_lowercases() {
        assert_eq!(rgb_to_hex(255, 0, 10), "#ff000a");
        assert_eq!(rgb_to_hex(0, 0, 0), "#000000");
        assert_eq!(Rgb::new(171, 205, 239).to_hex(), "#abcdef");
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("128"), 128);
        assert_eq!(parse_channel(" 7 "), 7);
        assert_eq!(parse_channel("12.6"), 13);
        assert_eq!(parse_channel("300"), 255);
        assert_eq!(parse_channel("-4"), 0);
        assert_eq!(parse_channel(""), 0);
        assert_eq!(parse_channel("red"), 0);
        assert_eq!(parse_channel("NaN"), 0);
        assert_eq!(parse_channel("inf"), 255);
    }
}
