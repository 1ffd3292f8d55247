//! Theme service: loads and saves the theme registry through remote settings.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::theme::{CustomIcon, IconRegistry, ThemeConfig, ThemeRegistry};
use crate::services::settings::{get_typed, put_typed, SettingsStore, CUSTOM_ICONS_KEY, THEME_CONFIG_KEY};
use crate::Result;

pub struct ThemeService {
    settings: Arc<dyn SettingsStore>,
}

impl ThemeService {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self { Self { settings } }

    /// Theme and icons are independent rows and load concurrently. A row that
    /// is missing or fails to load leaves its registry on the defaults.
    pub async fn load(&self) -> (ThemeRegistry, IconRegistry) {
        let (theme, icons) = tokio::join!(
            get_typed::<ThemeConfig>(self.settings.as_ref(), THEME_CONFIG_KEY),
            get_typed::<HashMap<String, CustomIcon>>(self.settings.as_ref(), CUSTOM_ICONS_KEY),
        );
        let theme = theme.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load theme configuration, using defaults");
            None
        });
        let icons = icons.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load custom icons");
            None
        });
        let registry = ThemeRegistry::new(theme.unwrap_or_default());
        let mut icon_registry = IconRegistry::with_default_slots();
        icon_registry.replace_custom(icons.unwrap_or_default());
        (registry, icon_registry)
    }

    /// Upserts the live configuration; on success it becomes the saved one.
    pub async fn save(&self, registry: &mut ThemeRegistry) -> Result<()> {
        put_typed(self.settings.as_ref(), THEME_CONFIG_KEY, registry.live()).await?;
        registry.mark_saved();
        tracing::info!("theme configuration saved");
        Ok(())
    }

    pub async fn save_icons(&self, icons: &IconRegistry) -> Result<()> {
        put_typed(self.settings.as_ref(), CUSTOM_ICONS_KEY, icons.custom()).await
    }
}
