use std::env;

use anyhow::Result;
use tracing::warn;

use crate::store::{KEY_THEME, KeyValueStore, get_or_log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Appearance {
    Light,
    Dark,
}

impl Theme {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub(crate) fn cycle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err("unknown theme"),
        }
    }
}

/// Best-effort terminal color-scheme probe. `PODLEARN_COLOR_SCHEME` wins,
/// then the `COLORFGBG` convention; anything else is treated as dark.
pub(crate) fn system_prefers_dark() -> bool {
    prefers_dark_from(
        env::var("PODLEARN_COLOR_SCHEME").ok().as_deref(),
        env::var("COLORFGBG").ok().as_deref(),
    )
}

pub(crate) fn prefers_dark_from(explicit: Option<&str>, colorfgbg: Option<&str>) -> bool {
    if let Some(value) = explicit {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => return false,
            "dark" => return true,
            _ => {}
        }
    }
    if let Some(bg) = colorfgbg
        .and_then(|raw| raw.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
    {
        // COLORFGBG backgrounds 7 and 9-15 are the light ANSI colors.
        return !(bg == 7 || (9..=15).contains(&bg));
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ThemeController {
    theme: Theme,
    appearance: Appearance,
}

impl ThemeController {
    pub(crate) fn load(store: &dyn KeyValueStore, prefers_dark: bool) -> Self {
        let theme = match get_or_log(store, KEY_THEME) {
            Some(raw) => raw.parse::<Theme>().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring unknown stored theme");
                Theme::System
            }),
            None => Theme::System,
        };
        Self {
            theme,
            appearance: resolve(theme, prefers_dark),
        }
    }

    pub(crate) fn theme(&self) -> Theme {
        self.theme
    }

    pub(crate) fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub(crate) fn set_theme(
        &mut self,
        store: &dyn KeyValueStore,
        theme: Theme,
        prefers_dark: bool,
    ) -> Result<()> {
        self.theme = theme;
        self.appearance = resolve(theme, prefers_dark);
        store.set(KEY_THEME, theme.as_str())
    }

    /// Re-resolves against a changed OS preference; fixed themes ignore it.
    pub(crate) fn on_system_change(&mut self, prefers_dark: bool) -> bool {
        if self.theme != Theme::System {
            return false;
        }
        let appearance = resolve(Theme::System, prefers_dark);
        let changed = appearance != self.appearance;
        self.appearance = appearance;
        changed
    }
}

fn resolve(theme: Theme, prefers_dark: bool) -> Appearance {
    match theme {
        Theme::Light => Appearance::Light,
        Theme::Dark => Appearance::Dark,
        Theme::System if prefers_dark => Appearance::Dark,
        Theme::System => Appearance::Light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn defaults_to_system_and_resolves_it() {
        let store = MemoryStore::new();
        let controller = ThemeController::load(&store, false);
        assert_eq!(controller.theme(), Theme::System);
        assert_eq!(controller.appearance(), Appearance::Light);
    }

    #[test]
    fn set_theme_persists_choice() {
        let store = MemoryStore::new();
        let mut controller = ThemeController::load(&store, true);
        controller
            .set_theme(&store, Theme::Light, true)
            .expect("persist theme");
        assert_eq!(store.get(KEY_THEME).expect("get").as_deref(), Some("light"));
        assert_eq!(ThemeController::load(&store, true).theme(), Theme::Light);
    }

    #[test]
    fn system_change_only_affects_system_theme() {
        let store = MemoryStore::new();
        let mut controller = ThemeController::load(&store, true);
        assert!(controller.on_system_change(false));
        assert_eq!(controller.appearance(), Appearance::Light);

        controller
            .set_theme(&store, Theme::Dark, false)
            .expect("persist theme");
        assert!(!controller.on_system_change(false));
        assert_eq!(controller.appearance(), Appearance::Dark);
    }

    #[test]
    fn unknown_stored_theme_falls_back_to_system() {
        let store = MemoryStore::new();
        store.set(KEY_THEME, "sepia").expect("seed");
        assert_eq!(ThemeController::load(&store, true).theme(), Theme::System);
    }

    #[test]
    fn colorfgbg_light_background_is_detected() {
        assert!(!prefers_dark_from(None, Some("0;15")));
        assert!(prefers_dark_from(None, Some("15;0")));
        assert!(!prefers_dark_from(Some("light"), Some("15;0")));
        assert!(prefers_dark_from(Some("auto"), None));
    }

    #[test]
    fn cycle_visits_every_theme() {
        assert_eq!(Theme::Light.cycle(), Theme::Dark);
        assert_eq!(Theme::Dark.cycle(), Theme::System);
        assert_eq!(Theme::System.cycle(), Theme::Light);
    }
}
