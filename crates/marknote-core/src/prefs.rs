//! Display preferences kept alongside entries
//!
//! Theme, language and the last visited page each live under their own key
//! in the same store as the entries. Unknown or missing values fall back to
//! the defaults.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::events::StorageEvent;
use crate::i18n::Language;
use crate::storage::{KeyValueStore, StorageResult};

pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";
pub const LAST_PAGE_KEY: &str = "lastPage";

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("invalid theme '{}', expected light or dark", other)),
        }
    }
}

/// Top-level page of the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Articles,
}

impl Page {
    pub fn as_str(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Articles => "articles",
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "home" => Ok(Page::Home),
            "articles" => Ok(Page::Articles),
            other => Err(format!("invalid page '{}', expected home or articles", other)),
        }
    }
}

/// Persisted display preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
    pub last_page: Page,
}

impl Preferences {
    /// Read preferences from `store`
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> StorageResult<Self> {
        Ok(Self {
            theme: read(store, THEME_KEY)?,
            language: read(store, LANGUAGE_KEY)?,
            last_page: read(store, LAST_PAGE_KEY)?,
        })
    }

    pub fn set_theme<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        theme: Theme,
    ) -> StorageResult<()> {
        store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn set_language<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        language: Language,
    ) -> StorageResult<()> {
        store.set(LANGUAGE_KEY, language.as_str())?;
        self.language = language;
        Ok(())
    }

    pub fn set_last_page<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        page: Page,
    ) -> StorageResult<()> {
        store.set(LAST_PAGE_KEY, page.as_str())?;
        self.last_page = page;
        Ok(())
    }

    pub fn toggle_theme<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) -> StorageResult<Theme> {
        let theme = self.theme.toggled();
        self.set_theme(store, theme)?;
        Ok(theme)
    }

    pub fn toggle_language<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> StorageResult<Language> {
        let language = self.language.toggled();
        self.set_language(store, language)?;
        Ok(language)
    }

    /// Adopt a preference written by another context
    ///
    /// Returns whether anything changed. The last page is per context and
    /// is never adopted.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> bool {
        let before = *self;
        let value = event.new_value.as_deref().unwrap_or_default();
        match event.key.as_deref() {
            Some(THEME_KEY) => self.theme = value.parse().unwrap_or_default(),
            Some(LANGUAGE_KEY) => self.language = value.parse().unwrap_or_default(),
            None => {
                self.theme = Theme::default();
                self.language = Language::default();
            }
            Some(_) => {}
        }
        let changed = *self != before;
        if changed {
            debug!("Preferences changed elsewhere: {:?}", self);
        }
        changed
    }
}

fn read<S, T>(store: &S, key: &str) -> StorageResult<T>
where
    S: KeyValueStore + ?Sized,
    T: FromStr + Default,
{
    Ok(store
        .get(key)?
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, NullStore};

    #[test]
    fn test_defaults() {
        let prefs = Preferences::load(&MemoryStore::new()).unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.language, Language::En);
        assert_eq!(prefs.last_page, Page::Home);
    }

    #[test]
    fn test_set_and_reload() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();
        prefs.set_theme(&mut store, Theme::Dark).unwrap();
        prefs.set_language(&mut store, Language::Ja).unwrap();
        prefs.set_last_page(&mut store, Page::Articles).unwrap();

        assert_eq!(store.get("lastPage").unwrap().as_deref(), Some("articles"));
        assert_eq!(Preferences::load(&store).unwrap(), prefs);
    }

    #[test]
    fn test_toggles() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::default();
        assert_eq!(prefs.toggle_theme(&mut store).unwrap(), Theme::Dark);
        assert_eq!(prefs.toggle_language(&mut store).unwrap(), Language::Ja);
        assert_eq!(prefs.toggle_theme(&mut store).unwrap(), Theme::Light);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_garbage_falls_back() {
        let store: MemoryStore = [("theme", "sepia"), ("language", "fr")].into_iter().collect();
        assert_eq!(Preferences::load(&store).unwrap(), Preferences::default());
    }

    #[test]
    fn test_null_store() {
        let mut store = NullStore;
        let mut prefs = Preferences::default();
        prefs.set_theme(&mut store, Theme::Dark).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(Preferences::load(&store).unwrap().theme, Theme::Light);
    }

    #[test]
    fn test_apply_storage_event() {
        let mut prefs = Preferences::default();
        let event = StorageEvent::new(THEME_KEY, None, Some("dark".to_string()));
        assert!(prefs.apply_storage_event(&event));
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.apply_storage_event(&event));

        let event = StorageEvent::new(LAST_PAGE_KEY, None, Some("articles".to_string()));
        assert!(!prefs.apply_storage_event(&event));
        assert_eq!(prefs.last_page, Page::Home);

        assert!(prefs.apply_storage_event(&StorageEvent::cleared()));
        assert_eq!(prefs.theme, Theme::Light);
    }
}
