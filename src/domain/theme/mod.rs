//! Storefront theme configuration
//!
//! A [`ThemeConfig`] holds colour tokens (HSL, one palette per colour scheme),
//! typography, spacing and a few per-component style knobs. The
//! [`ThemeRegistry`] layers three copies of it:
//!
//! - `saved`: what the settings table last stored,
//! - `live`: the admin's in-progress edit,
//! - `preview`: an optional overlay shown without touching the other two.
//!
//! Applying a theme renders CSS custom properties into a [`ThemeSink`].

pub mod icons;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub use icons::{CustomIcon, IconRegistry, IconSource, ULTIMATE_FALLBACK_ICON};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self { Self { h, s, l } }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h, self.s, self.l)
    }
}

/// Colour tokens of one scheme. Tokens missing from stored JSON keep their
/// defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Palette {
    pub background: Hsl,
    pub foreground: Hsl,
    pub primary: Hsl,
    pub primary_foreground: Hsl,
    pub secondary: Hsl,
    pub accent: Hsl,
    pub muted: Hsl,
    pub border: Hsl,
    pub destructive: Hsl,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Hsl::new(0.0, 0.0, 100.0),
            foreground: Hsl::new(240.0, 10.0, 4.0),
            primary: Hsl::new(262.0, 83.0, 58.0),
            primary_foreground: Hsl::new(0.0, 0.0, 100.0),
            secondary: Hsl::new(240.0, 5.0, 96.0),
            accent: Hsl::new(173.0, 80.0, 40.0),
            muted: Hsl::new(240.0, 5.0, 65.0),
            border: Hsl::new(240.0, 6.0, 90.0),
            destructive: Hsl::new(0.0, 84.0, 60.0),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Hsl::new(240.0, 10.0, 4.0),
            foreground: Hsl::new(0.0, 0.0, 98.0),
            primary: Hsl::new(263.0, 70.0, 50.0),
            primary_foreground: Hsl::new(0.0, 0.0, 98.0),
            secondary: Hsl::new(240.0, 4.0, 16.0),
            accent: Hsl::new(173.0, 58.0, 39.0),
            muted: Hsl::new(240.0, 5.0, 35.0),
            border: Hsl::new(240.0, 4.0, 16.0),
            destructive: Hsl::new(0.0, 63.0, 31.0),
        }
    }

    /// Deserializes a stored dark palette over the dark defaults.
    fn deserialize_dark<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut base = serde_json::to_value(Self::dark()).map_err(D::Error::custom)?;
        if let serde_json::Value::Object(fields) = &mut base { fields.extend(overrides); }
        serde_json::from_value(base).map_err(D::Error::custom)
    }

    fn tokens(&self) -> [(&'static str, Hsl); 9] {
        [
            ("background", self.background),
            ("foreground", self.foreground),
            ("primary", self.primary),
            ("primary-foreground", self.primary_foreground),
            ("secondary", self.secondary),
            ("accent", self.accent),
            ("muted", self.muted),
            ("border", self.border),
            ("destructive", self.destructive),
        ]
    }
}

impl Default for Palette {
    fn default() -> Self { Self::light() }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub heading_font_family: String,
    pub base_font_size_px: u16,
    pub heading_weight: u16,
}

impl Default for Typography {
    fn default() -> Self {
        Self { font_family: "Inter, sans-serif".into(), heading_font_family: "Inter, sans-serif".into(), base_font_size_px: 16, heading_weight: 700 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spacing {
    pub radius_rem: f32,
    pub container_max_width_px: u16,
    pub section_padding_rem: f32,
}

impl Default for Spacing {
    fn default() -> Self { Self { radius_rem: 0.5, container_max_width_px: 1280, section_padding_rem: 4.0 } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle { #[default] Rounded, Pill, Square }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shadow { None, #[default] Soft, Strong }

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyles {
    pub button_style: ButtonStyle,
    pub card_shadow: Shadow,
    pub sticky_header: bool,
    pub product_card_hover_zoom: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeConfig {
    pub light: Palette,
    #[serde(deserialize_with = "Palette::deserialize_dark")]
    pub dark: Palette,
    pub typography: Typography,
    pub spacing: Spacing,
    pub components: ComponentStyles,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            light: Palette::light(),
            dark: Palette::dark(),
            typography: Typography::default(),
            spacing: Spacing::default(),
            components: ComponentStyles::default(),
        }
    }
}

impl ThemeConfig {
    /// CSS custom properties, light palette under `--x`, dark under `--dark-x`.
    pub fn css_variables(&self) -> Vec<(String, String)> {
        let mut vars = Vec::with_capacity(28);
        vars.extend(self.light.tokens().into_iter().map(|(name, hsl)| (format!("--{name}"), hsl.to_string())));
        vars.extend(self.dark.tokens().into_iter().map(|(name, hsl)| (format!("--dark-{name}"), hsl.to_string())));
        vars.push(("--font-sans".into(), self.typography.font_family.clone()));
        vars.push(("--font-heading".into(), self.typography.heading_font_family.clone()));
        vars.push(("--font-size-base".into(), format!("{}px", self.typography.base_font_size_px)));
        vars.push(("--heading-weight".into(), self.typography.heading_weight.to_string()));
        vars.push(("--radius".into(), format!("{}rem", self.spacing.radius_rem)));
        vars.push(("--container-max".into(), format!("{}px", self.spacing.container_max_width_px)));
        vars.push(("--section-padding".into(), format!("{}rem", self.spacing.section_padding_rem)));
        let button_radius = match self.components.button_style {
            ButtonStyle::Rounded => "var(--radius)",
            ButtonStyle::Pill => "9999px",
            ButtonStyle::Square => "0px",
        };
        vars.push(("--button-radius".into(), button_radius.into()));
        let shadow = match self.components.card_shadow {
            Shadow::None => "none",
            Shadow::Soft => "0 1px 3px rgb(0 0 0 / 0.1)",
            Shadow::Strong => "0 10px 25px rgb(0 0 0 / 0.25)",
        };
        vars.push(("--card-shadow".into(), shadow.into()));
        vars
    }
}

/// Where rendered theme variables end up (the document root in the storefront).
pub trait ThemeSink {
    fn set_variables(&mut self, variables: &[(String, String)]);
}

#[derive(Clone, Debug, Default)]
pub struct ThemeRegistry {
    saved: ThemeConfig,
    live: ThemeConfig,
    preview: Option<ThemeConfig>,
    last_applied: Option<String>,
}

impl ThemeRegistry {
    pub fn new(saved: ThemeConfig) -> Self {
        Self { live: saved.clone(), saved, preview: None, last_applied: None }
    }

    pub fn saved(&self) -> &ThemeConfig { &self.saved }
    pub fn live(&self) -> &ThemeConfig { &self.live }
    pub fn is_previewing(&self) -> bool { self.preview.is_some() }

    /// The configuration that should currently be on screen.
    pub fn active(&self) -> &ThemeConfig { self.preview.as_ref().unwrap_or(&self.live) }

    pub fn is_dirty(&self) -> bool { self.live != self.saved }

    pub fn edit(&mut self, f: impl FnOnce(&mut ThemeConfig)) { f(&mut self.live); }

    pub fn reset_live(&mut self) { self.live = self.saved.clone(); }

    /// Replaces both copies, e.g. after loading from settings.
    pub fn replace_saved(&mut self, config: ThemeConfig) {
        self.live = config.clone();
        self.saved = config;
    }

    pub fn mark_saved(&mut self) { self.saved = self.live.clone(); }

    pub fn start_preview(&mut self, config: ThemeConfig) { self.preview = Some(config); }

    pub fn end_preview(&mut self) { self.preview = None; }

    /// Writes the active configuration to `sink`. Returns `false` when the
    /// active configuration is identical to the one applied last.
    pub fn apply(&mut self, sink: &mut dyn ThemeSink) -> bool {
        let serialized = match serde_json::to_string(self.active()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize theme");
                return false;
            }
        };
        if self.last_applied.as_deref() == Some(serialized.as_str()) {
            return false;
        }
        sink.set_variables(&self.active().css_variables());
        self.last_applied = Some(serialized);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink { writes: usize, last: Vec<(String, String)> }

    impl ThemeSink for RecordingSink {
        fn set_variables(&mut self, variables: &[(String, String)]) {
            self.writes += 1;
            self.last = variables.to_vec();
        }
    }

    fn var<'a>(sink: &'a RecordingSink, name: &str) -> Option<&'a str> {
        sink.last.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_dirty_tracks_live_vs_saved() {
        let mut registry = ThemeRegistry::new(ThemeConfig::default());
        assert!(!registry.is_dirty());
        registry.edit(|c| c.spacing.radius_rem = 1.0);
        assert!(registry.is_dirty());
        registry.edit(|c| c.spacing.radius_rem = 0.5);
        assert!(!registry.is_dirty());
        registry.edit(|c| c.components.button_style = ButtonStyle::Pill);
        registry.mark_saved();
        assert!(!registry.is_dirty());
    }

    #[test]
    fn test_preview_does_not_touch_live_or_saved() {
        let mut registry = ThemeRegistry::new(ThemeConfig::default());
        registry.edit(|c| c.typography.base_font_size_px = 18);
        let mut preview = ThemeConfig::default();
        preview.light.primary = Hsl::new(10.0, 90.0, 50.0);

        registry.start_preview(preview.clone());
        assert_eq!(registry.active(), &preview);
        assert_eq!(registry.live().typography.base_font_size_px, 18);
        assert_eq!(registry.saved(), &ThemeConfig::default());

        registry.end_preview();
        assert_eq!(registry.active().typography.base_font_size_px, 18);
    }

    #[test]
    fn test_apply_is_skipped_when_unchanged() {
        let mut registry = ThemeRegistry::new(ThemeConfig::default());
        let mut sink = RecordingSink::default();
        assert!(registry.apply(&mut sink));
        assert!(!registry.apply(&mut sink));
        assert_eq!(sink.writes, 1);
        assert_eq!(var(&sink, "--primary"), Some("262 83% 58%"));

        registry.edit(|c| c.components.button_style = ButtonStyle::Square);
        assert!(registry.apply(&mut sink));
        assert_eq!(var(&sink, "--button-radius"), Some("0px"));
        assert_eq!(sink.writes, 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: ThemeConfig = serde_json::from_str(r#"{"spacing":{"radiusRem":1.0,"containerMaxWidthPx":1440,"sectionPaddingRem":2.0}}"#).unwrap();
        assert_eq!(parsed.spacing.container_max_width_px, 1440);
        assert_eq!(parsed.light, Palette::light());
    }

    #[test]
    fn test_partial_palettes_keep_scheme_defaults() {
        let parsed: ThemeConfig = serde_json::from_str(
            r#"{"light":{"primary":{"h":10.0,"s":50.0,"l":50.0}},"dark":{"accent":{"h":20.0,"s":40.0,"l":30.0}}}"#,
        ).unwrap();
        assert_eq!(parsed.light.primary, Hsl::new(10.0, 50.0, 50.0));
        assert_eq!(parsed.light.background, Palette::light().background);
        assert_eq!(parsed.dark.accent, Hsl::new(20.0, 40.0, 30.0));
        assert_eq!(parsed.dark.background, Palette::dark().background);
    }
}
