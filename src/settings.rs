//! Visualizer settings: active theme, palette and the three user multipliers.
//!
//! Settings are owned by a [`SettingsStore`] and handed to the host and engines
//! by reference every frame. Nothing here validates ranges; out-of-range
//! multipliers pass straight through and overdrive the visuals.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use tracing::warn;

use crate::error::SettingsError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    DualPulseWaves,
    RetroEqualizer,
    PixelShockwave,
    GalaxySpiral,
    WaveformRibbon,
    PulseMirrorSpectrum,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::DualPulseWaves,
        Theme::RetroEqualizer,
        Theme::PixelShockwave,
        Theme::GalaxySpiral,
        Theme::WaveformRibbon,
        Theme::PulseMirrorSpectrum,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Theme::DualPulseWaves => "dual-pulse-waves",
            Theme::RetroEqualizer => "retro-equalizer",
            Theme::PixelShockwave => "pixel-shockwave",
            Theme::GalaxySpiral => "galaxy-spiral",
            Theme::WaveformRibbon => "waveform-ribbon",
            Theme::PulseMirrorSpectrum => "pulse-mirror-spectrum",
        }
    }

    //unknown ids fall back to the default theme
    pub fn parse_or_default(id: &str) -> Theme {
        id.parse().unwrap_or_else(|_| {
            warn!("unknown theme {id:?}, falling back to {}", Theme::default());
            Theme::default()
        })
    }

    pub fn from_index(index: usize) -> Option<Theme> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Theme::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| SettingsError::UnknownTheme(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = SettingsError;

    /// Accepts `#rrggbb`, `#rgb`, with or without the leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualizerSettings {
    pub theme: Theme,
    pub primary_color: Rgb,
    pub secondary_color: Rgb,
    pub background_color: Rgb,
    pub intensity: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            primary_color: Rgb::new(0x00, 0xff, 0xff),
            secondary_color: Rgb::new(0xff, 0x00, 0xff),
            background_color: Rgb::BLACK,
            intensity: 1.0,
            speed: 1.0,
            sensitivity: 1.0,
        }
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub primary_color: Option<Rgb>,
    pub secondary_color: Option<Rgb>,
    pub background_color: Option<Rgb>,
    pub intensity: Option<f32>,
    pub speed: Option<f32>,
    pub sensitivity: Option<f32>,
}

impl SettingsPatch {
    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }
}

/// Owner of the live settings. Every mutation bumps `revision`, which is
/// how readers notice a change without holding a reference across frames.
#[derive(Debug, Default)]
pub struct SettingsStore {
    settings: VisualizerSettings,
    revision: u64,
}

impl SettingsStore {
    pub fn new(settings: VisualizerSettings) -> Self {
        Self {
            settings,
            revision: 0,
        }
    }

    pub fn settings(&self) -> &VisualizerSettings {
        &self.settings
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update(&mut self, patch: SettingsPatch) -> bool {
        let before = self.settings.clone();
        let s = &mut self.settings;
        if let Some(theme) = patch.theme {
            s.theme = theme;
        }
        if let Some(c) = patch.primary_color {
            s.primary_color = c;
        }
        if let Some(c) = patch.secondary_color {
            s.secondary_color = c;
        }
        if let Some(c) = patch.background_color {
            s.background_color = c;
        }
        if let Some(v) = patch.intensity {
            s.intensity = v;
        }
        if let Some(v) = patch.speed {
            s.speed = v;
        }
        if let Some(v) = patch.sensitivity {
            s.sensitivity = v;
        }
        let changed = before != self.settings;
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn set_theme(&mut self, theme: Theme) -> bool {
        self.update(SettingsPatch::theme(theme))
    }

    pub fn randomize_theme<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Theme {
        let current = self.settings.theme;
        let others: Vec<Theme> = Theme::ALL.into_iter().filter(|t| *t != current).collect();
        let next = others[rng.gen_range(0..others.len())];
        self.set_theme(next);
        next
    }
}
