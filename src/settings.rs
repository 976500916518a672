use serde::{Deserialize, Serialize};

use crate::palette::{Palette, StyleChoice};

/// Storage key the settings are persisted under
pub const SETTINGS_KEY: &str = "fingerpaint_settings";

/// What survives a restart: the last stroke style picked from the menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct PaintSettings {
    pub style: Option<StyleChoice>,
}

impl PaintSettings {
    /// Read settings from eframe storage; anything missing or unreadable gives the defaults
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        storage
            .and_then(|storage| eframe::get_value(storage, SETTINGS_KEY))
            .unwrap_or_default()
    }

    pub fn store(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, SETTINGS_KEY, self);
    }

    /// The persisted style, if it still fits `palette`
    pub fn style_for(&self, palette: &Palette) -> Option<StyleChoice> {
        self.style.filter(|choice| palette.contains(*choice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStorage(HashMap<String, String>);

    impl eframe::Storage for MapStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_owned(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_settings_survive_storage() {
        let mut storage = MapStorage::default();
        let settings = PaintSettings {
            style: Some(StyleChoice {
                color_index: 2,
                width_index: 0,
            }),
        };
        settings.store(&mut storage);

        assert_eq!(PaintSettings::load(Some(&storage)), settings);
    }

    #[test]
    fn test_missing_settings_are_default() {
        assert_eq!(PaintSettings::load(None), PaintSettings::default());
        let storage = MapStorage::default();
        assert_eq!(PaintSettings::load(Some(&storage)).style, None);
    }

    #[test]
    fn test_stale_style_is_dropped() {
        let settings = PaintSettings {
            style: Some(StyleChoice {
                color_index: 7,
                width_index: 0,
            }),
        };
        assert_eq!(settings.style_for(&Palette::default()), None);
    }
}
