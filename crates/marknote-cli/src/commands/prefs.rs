//! Preference command handlers

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

use marknote_core::{KeyValueStore, Language, Preferences, Theme};

use crate::output::Output;

/// Which preference `marknote prefs` addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrefKey {
    Theme,
    Language,
}

impl PrefKey {
    fn name(self) -> &'static str {
        match self {
            PrefKey::Theme => "theme",
            PrefKey::Language => "language",
        }
    }
}

/// Show preferences, or change one
///
/// `value` may be a concrete value or `toggle`.
pub fn run<S: KeyValueStore>(
    store: &mut S,
    key: Option<PrefKey>,
    value: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut prefs = Preferences::load(store).context("Failed to read preferences")?;

    let (key, value) = match (key, value) {
        (None, _) => {
            output.print_prefs(&prefs);
            return Ok(());
        }
        (Some(PrefKey::Theme), None) => {
            println!("{}", prefs.theme);
            return Ok(());
        }
        (Some(PrefKey::Language), None) => {
            println!("{}", prefs.language);
            return Ok(());
        }
        (Some(key), Some(value)) => (key, value),
    };

    let shown = match (key, value.as_str()) {
        (PrefKey::Theme, "toggle") => prefs.toggle_theme(store)?.to_string(),
        (PrefKey::Language, "toggle") => prefs.toggle_language(store)?.to_string(),
        (PrefKey::Theme, raw) => {
            let theme: Theme = raw.parse().map_err(|e: String| anyhow!(e))?;
            prefs.set_theme(store, theme)?;
            theme.to_string()
        }
        (PrefKey::Language, raw) => {
            let language: Language = raw.parse().map_err(|e: String| anyhow!(e))?;
            prefs.set_language(store, language)?;
            language.to_string()
        }
    };

    output.success(&format!("{} set to {}", key.name(), shown));
    Ok(())
}
