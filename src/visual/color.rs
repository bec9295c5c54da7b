use crate::settings::Rgb;

/// Straight (non-premultiplied) RGBA, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    pub const YELLOW: Rgba = Rgba::new(1.0, 1.0, 0.0, 1.0);
    pub const PINK: Rgba = Rgba::new(1.0, 0.533, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_u8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    /// Replaces alpha; values outside `[0, 1]` are clamped here since a
    /// colour cannot be more than opaque.
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        Rgba::from_u8(c.r, c.g, c.b, 1.0)
    }
}

/// Colour at `t` along a list of `(offset, colour)` stops sorted by offset.
pub fn sample_stops(stops: &[(f32, Rgba)], t: f32) -> Rgba {
    let Some(&(first_off, first)) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first_off {
        return first;
    }
    for pair in stops.windows(2) {
        let (o0, c0) = pair[0];
        let (o1, c1) = pair[1];
        if t <= o1 {
            let span = (o1 - o0).max(f32::EPSILON);
            return c0.lerp(c1, (t - o0) / span);
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_settings_colour() {
        let c: Rgba = Rgb::new(255, 0, 51).into();
        assert_eq!(c, Rgba::new(1.0, 0.0, 0.2, 1.0));
    }

    #[test]
    fn samples_between_stops() {
        let stops = [
            (0.0, Rgba::WHITE),
            (0.5, Rgba::BLACK),
            (1.0, Rgba::TRANSPARENT),
        ];
        assert_eq!(sample_stops(&stops, -1.0), Rgba::WHITE);
        assert_eq!(sample_stops(&stops, 0.25), Rgba::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(sample_stops(&stops, 0.75).a, 0.5);
        assert_eq!(sample_stops(&stops, 2.0), Rgba::TRANSPARENT);
        assert_eq!(sample_stops(&[], 0.5), Rgba::TRANSPARENT);
    }
}
