//! Immutable game data shared by every session, and how it gets loaded.
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::achievements::{AchievementRegistry, DEFAULT_ACHIEVEMENTS_DATA};
use crate::careers::{CareerCatalog, DEFAULT_CAREERS_DATA};
use crate::error::CatalogError;
use crate::events::{DEFAULT_EVENTS_DATA, EventCatalog};

/// The three JSON documents that make up the game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogSource {
    Careers,
    Events,
    Achievements,
}

impl CatalogSource {
    pub const ALL: [Self; 3] = [Self::Careers, Self::Events, Self::Achievements];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Careers => "careers",
            Self::Events => "events",
            Self::Achievements => "achievements",
        }
    }

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Careers => "careers.json",
            Self::Events => "events.json",
            Self::Achievements => "achievements.json",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Platform-specific access to the raw catalog JSON.
pub trait CatalogLoader {
    /// # Errors
    ///
    /// Returns `CatalogError::Io` when the document cannot be read.
    fn read(&self, source: CatalogSource) -> Result<Cow<'static, str>, CatalogError>;
}

/// Catalogs compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalogs;

impl CatalogLoader for EmbeddedCatalogs {
    fn read(&self, source: CatalogSource) -> Result<Cow<'static, str>, CatalogError> {
        Ok(Cow::Borrowed(match source {
            CatalogSource::Careers => DEFAULT_CAREERS_DATA,
            CatalogSource::Events => DEFAULT_EVENTS_DATA,
            CatalogSource::Achievements => DEFAULT_ACHIEVEMENTS_DATA,
        }))
    }
}

/// Reads `careers.json`, `events.json` and `achievements.json` from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogs {
    root: PathBuf,
}

impl DirectoryCatalogs {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CatalogLoader for DirectoryCatalogs {
    fn read(&self, source: CatalogSource) -> Result<Cow<'static, str>, CatalogError> {
        let path = self.root.join(source.file_name());
        std::fs::read_to_string(&path)
            .map(Cow::Owned)
            .map_err(|error| CatalogError::Io {
                source_name: source.name(),
                error,
            })
    }
}

/// Careers, events and achievements, validated together.
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub careers: CareerCatalog,
    pub events: EventCatalog,
    pub achievements: AchievementRegistry,
}

impl GameData {
    /// Load and validate every catalog through `loader`.
    ///
    /// # Errors
    ///
    /// Returns the first read, parse or validation error encountered.
    pub fn load<L: CatalogLoader + ?Sized>(loader: &L) -> Result<Self, CatalogError> {
        let careers = CareerCatalog::from_json(&loader.read(CatalogSource::Careers)?)?;
        let events = EventCatalog::from_json(&loader.read(CatalogSource::Events)?)?;
        let achievements =
            AchievementRegistry::from_json(&loader.read(CatalogSource::Achievements)?)?;
        Self::from_parts(careers, events, achievements)
    }

    /// Combine already-validated catalogs, checking cross references.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownAchievementHint` when a decision names an
    /// achievement the registry does not declare.
    pub fn from_parts(
        careers: CareerCatalog,
        events: EventCatalog,
        achievements: AchievementRegistry,
    ) -> Result<Self, CatalogError> {
        for decision in careers.decisions() {
            if let Some(hint) = &decision.achievement_hint
                && !achievements.contains(hint)
            {
                return Err(CatalogError::UnknownAchievementHint {
                    decision_id: decision.id.clone(),
                    achievement_id: hint.clone(),
                });
            }
        }
        Ok(Self {
            careers,
            events,
            achievements,
        })
    }

    /// Process-wide copy of the embedded catalogs, loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalogs fail validation.
    pub fn shared_default() -> Result<Arc<Self>, CatalogError> {
        static DATA: OnceLock<Arc<GameData>> = OnceLock::new();
        if let Some(data) = DATA.get() {
            return Ok(Arc::clone(data));
        }
        let loaded = Arc::new(Self::load(&EmbeddedCatalogs)?);
        Ok(Arc::clone(DATA.get_or_init(|| loaded)))
    }
}
