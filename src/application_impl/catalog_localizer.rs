use crate::application_port::*;
use anyhow::{Context, bail};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

type Catalog = HashMap<MessageId, String>;

/// Message catalogs keyed by lowercase language tag.
#[derive(Debug, Clone)]
pub struct CatalogLocalizer {
    catalogs: HashMap<String, Catalog>,
    default_language: String,
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

impl CatalogLocalizer {
    pub fn new(default_language: &str) -> Self {
        Self {
            catalogs: HashMap::new(),
            default_language: normalize_tag(default_language),
        }
    }

    pub fn with_catalog(mut self, language: &str, catalog: HashMap<MessageId, String>) -> Self {
        self.catalogs.insert(normalize_tag(language), catalog);
        self
    }

    pub fn builtin_english() -> Self {
        let catalog = [
            (MessageId::BadRequest, "Malformed authorization header"),
            (MessageId::Unauthorized, "Unauthorized"),
            (MessageId::Expired, "Token expired"),
            (MessageId::Forbidden, "Access denied"),
            (MessageId::Unavailable, "Authentication service unavailable"),
            (MessageId::Internal, "Internal server error"),
        ]
        .into_iter()
        .map(|(id, text)| (id, text.to_string()))
        .collect();
        Self::new("en").with_catalog("en", catalog)
    }

    /// Load every `<lang>.json` file in `dir`. Unknown keys are skipped.
    pub fn load_dir(dir: impl AsRef<Path>, default_language: &str) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut localizer = Self::new(default_language);

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read i18n dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("read catalog {}", path.display()))?;
            let flat: HashMap<String, String> = serde_json::from_str(&raw)
                .with_context(|| format!("parse catalog {}", path.display()))?;

            let mut catalog = Catalog::new();
            for (key, text) in flat {
                match key.parse::<MessageId>() {
                    Ok(id) => {
                        catalog.insert(id, text);
                    }
                    Err(_) => warn!(%key, file = %path.display(), "skipping unknown message id"),
                }
            }
            debug!(language, messages = catalog.len(), "catalog loaded");
            localizer = localizer.with_catalog(language, catalog);
        }

        if !localizer.catalogs.contains_key(&localizer.default_language) {
            bail!(
                "no catalog for default language {} in {}",
                localizer.default_language,
                dir.display()
            );
        }
        Ok(localizer)
    }

    fn negotiate(&self, language: Option<&str>) -> Option<(&str, &Catalog)> {
        let preferred = language
            .and_then(|l| l.split(',').next())
            .and_then(|l| l.split(';').next())
            .map(normalize_tag)
            .filter(|l| !l.is_empty())?;

        if let Some((tag, catalog)) = self.catalogs.get_key_value(&preferred) {
            return Some((tag.as_str(), catalog));
        }
        let primary = preferred.split('-').next()?;
        self.catalogs
            .get_key_value(primary)
            .map(|(tag, catalog)| (tag.as_str(), catalog))
    }
}

impl Localizer for CatalogLocalizer {
    fn localize(&self, id: MessageId, language: Option<&str>) -> Result<String, LocalizeError> {
        if let Some((_, catalog)) = self.negotiate(language) {
            if let Some(text) = catalog.get(&id) {
                return Ok(text.clone());
            }
        }
        self.catalogs
            .get(&self.default_language)
            .and_then(|catalog| catalog.get(&id))
            .cloned()
            .ok_or_else(|| LocalizeError::Missing {
                id,
                language: self.default_language.clone(),
            })
    }
}
