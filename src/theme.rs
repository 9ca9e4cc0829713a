use crate::page::Document;
use crate::storage::KeyValueStore;
use std::fmt;

/// Store key and root data attribute holding the display mode
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display mode currently applied to the document, if recognised
pub fn current_theme(document: &Document) -> Option<Theme> {
    document.root().data(THEME_KEY).and_then(Theme::parse)
}

/// Flips and persists the light/dark preference
pub struct ThemeToggle<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ThemeToggle<S> {
    pub fn new(store: S) -> Self {
        ThemeToggle { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies the stored preference, or dark when nothing is stored
    pub fn apply_stored(&self, document: &mut Document) {
        let stored = self
            .store
            .get(THEME_KEY)
            .filter(|value| !value.is_empty());
        let theme = stored.unwrap_or_else(|| Theme::Dark.as_str().to_string());
        log::info!("theme: {}", theme);
        document.root_mut().set_data(THEME_KEY, theme);
    }

    /// Switches dark to light and anything else to dark, then persists it
    pub fn toggle(&mut self, document: &mut Document) -> Theme {
        let next = match current_theme(document) {
            Some(Theme::Dark) => Theme::Light,
            _ => Theme::Dark,
        };
        document.root_mut().set_data(THEME_KEY, next.as_str());
        if let Err(err) = self.store.set(THEME_KEY, next.as_str()) {
            log::warn!("could not persist theme: {}", err);
        }
        next
    }
}
