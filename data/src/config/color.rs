use iced_core::Color;
use palette::{FromColor, Hsva, RgbHue, rgb::Rgba};
use serde::{Deserialize, Deserializer, Serializer};

/// Hue step between consecutive sensors, the golden angle in degrees.
const HUE_STEP: f32 = 137.507_77;

/// A distinct, readable trace color for the `index`-th sensor.
pub fn sensor_color(index: usize) -> Color {
    let hue = (index as f32 * HUE_STEP).rem_euclid(360.0);
    let value = if index % 2 == 0 { 0.95 } else { 0.8 };

    from_hsva(Hsva::new(RgbHue::from_degrees(hue), 0.65, value, 1.0))
}

pub fn from_hsva(color: Hsva) -> Color {
    to_color(palette::Srgba::from_color(color))
}

fn to_color(rgba: Rgba) -> Color {
    Color {
        r: rgba.color.red,
        g: rgba.color.green,
        b: rgba.color.blue,
        a: rgba.alpha,
    }
}

pub fn hex_to_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return None;
    }

    let channel = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();
    let alpha = if digits.len() == 8 { channel(6)? } else { u8::MAX };

    Some(Color::from_rgba8(
        channel(0)?,
        channel(2)?,
        channel(4)?,
        f32::from(alpha) / 255.0,
    ))
}

pub fn color_to_hex(color: Color) -> String {
    let [r, g, b, a] = color.into_rgba8();

    if a < u8::MAX {
        format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
    } else {
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// `#[serde(with = "hex")]` for colors stored as `#RRGGBB[AA]` strings.
pub mod hex {
    use super::*;

    pub fn serialize<S>(color: &Color, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&color_to_hex(*color))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex_to_color(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{text}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_keeps_channels() {
        let color = Color::from_rgb8(0, 30, 30);
        assert_eq!(color_to_hex(color), "#001E1E");
        assert_eq!(hex_to_color("#001E1E"), Some(color));
        assert_eq!(hex_to_color("#FF000080").map(|c| c.into_rgba8()[3]), Some(128));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(hex_to_color("001E1E"), None);
        assert_eq!(hex_to_color("#12345"), None);
        assert_eq!(hex_to_color("#GG0000"), None);
    }

    #[test]
    fn neighbouring_sensors_differ() {
        let colors: Vec<Color> = (0..6).map(sensor_color).collect();
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
