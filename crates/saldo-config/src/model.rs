use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf};

use crate::ConfigError;

/// Stores user preferences and the names of the remote collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "Config::default_decimal_separator")]
    pub decimal_separator: char,
    #[serde(default)]
    pub appearance: Appearance,
    /// Number of transactions covered by the recent summary.
    #[serde(default = "Config::default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "Config::default_transactions_collection")]
    pub transactions_collection: String,
    #[serde(default = "Config::default_users_collection")]
    pub users_collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for local data. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            currency: "BRL".into(),
            currency_symbol: Self::default_currency_symbol(),
            decimal_separator: Self::default_decimal_separator(),
            appearance: Appearance::default(),
            recent_window: Self::default_recent_window(),
            transactions_collection: Self::default_transactions_collection(),
            users_collection: Self::default_users_collection(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_currency_symbol() -> String {
        "R$".into()
    }

    pub fn default_decimal_separator() -> char {
        ','
    }

    pub fn default_recent_window() -> usize {
        10
    }

    pub fn default_transactions_collection() -> String {
        "transactions".into()
    }

    pub fn default_users_collection() -> String {
        "users".into()
    }

    pub fn is_dark_mode(&self) -> bool {
        matches!(self.appearance, Appearance::Dark)
    }

    pub fn toggle_appearance(&mut self) {
        self.appearance = match self.appearance {
            Appearance::Light => Appearance::Dark,
            Appearance::Dark => Appearance::Light,
        };
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }

        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("saldo")
    }

    /// Rejects values the services cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_window == 0 {
            return Err(ConfigError::Invalid("recent_window must be at least 1".into()));
        }
        if self.transactions_collection.trim().is_empty() || self.users_collection.trim().is_empty()
        {
            return Err(ConfigError::Invalid("collection names must not be empty".into()));
        }
        if self.decimal_separator.is_ascii_digit() {
            return Err(ConfigError::Invalid(format!(
                "`{}` cannot be used as decimal separator",
                self.decimal_separator
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    Light,
    Dark,
}

impl Appearance {
    fn from_value(value: Option<String>) -> Self {
        value
            .map(|v| Appearance::from_label(v.trim()))
            .unwrap_or_default()
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" | "escuro" => Appearance::Dark,
            _ => Appearance::Light,
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Appearance::Light
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Appearance::Light => "light",
            Appearance::Dark => "dark",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for Appearance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(Appearance::from_value(value))
    }
}
