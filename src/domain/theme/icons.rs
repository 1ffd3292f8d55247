//! Custom icon lookup
//!
//! Resolution order for a slot name:
//! 1. the custom entry's uploaded image,
//! 2. the custom entry's named fallback icon,
//! 3. the slot table's default icon,
//! 4. [`ULTIMATE_FALLBACK_ICON`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ULTIMATE_FALLBACK_ICON: &str = "help-circle";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomIcon {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub fallback_icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconSource {
    /// An uploaded image. `fallback` is what to show if it fails to load.
    Image { url: String, fallback: String },
    Named(String),
}

#[derive(Clone, Debug, Default)]
pub struct IconRegistry {
    slots: HashMap<String, String>,
    custom: HashMap<String, CustomIcon>,
}

impl IconRegistry {
    /// Storefront icon slots and their built-in icons.
    pub fn with_default_slots() -> Self {
        let slots = [
            ("cart", "shopping-cart"),
            ("wishlist", "heart"),
            ("account", "user"),
            ("search", "search"),
            ("menu", "menu"),
            ("support", "message-circle"),
            ("delivery", "truck"),
        ];
        Self { slots: slots.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(), custom: HashMap::new() }
    }

    pub fn set_slot_default(&mut self, slot: impl Into<String>, icon: impl Into<String>) {
        self.slots.insert(slot.into(), icon.into());
    }

    pub fn custom(&self) -> &HashMap<String, CustomIcon> { &self.custom }

    pub fn register(&mut self, name: impl Into<String>, icon: CustomIcon) { self.custom.insert(name.into(), icon); }

    pub fn unregister(&mut self, name: &str) { self.custom.remove(name); }

    pub fn replace_custom(&mut self, custom: HashMap<String, CustomIcon>) { self.custom = custom; }

    pub fn resolve(&self, name: &str) -> IconSource {
        let fallback = self.named_fallback(name);
        match self.custom.get(name).and_then(|c| c.image_url.as_deref()).filter(|u| !u.is_empty()) {
            Some(url) => IconSource::Image { url: url.to_string(), fallback },
            None => IconSource::Named(fallback),
        }
    }

    /// Resolution used once an uploaded image failed to load.
    pub fn resolve_after_image_error(&self, name: &str) -> IconSource { IconSource::Named(self.named_fallback(name)) }

    fn named_fallback(&self, name: &str) -> String {
        self.custom.get(name).and_then(|c| c.fallback_icon.as_deref()).filter(|f| !f.is_empty())
            .or_else(|| self.slots.get(name).map(String::as_str))
            .unwrap_or(ULTIMATE_FALLBACK_ICON)
            .to_string()
    }
}
