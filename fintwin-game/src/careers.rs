//! Career archetypes and their baseline finances and scenario pools.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::constants::MIN_SCENARIO_OPTIONS;
use crate::data::Scenario;
use crate::error::{CatalogError, EngineError};
use crate::finance::FinancialState;

pub(crate) const DEFAULT_CAREERS_DATA: &str = include_str!("../assets/data/careers.json");

/// Selectable career path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareerArchetype {
    Student,
    Entrepreneur,
    Artist,
    Banker,
}

impl CareerArchetype {
    pub const ALL: &'static [Self] = &[
        Self::Student,
        Self::Entrepreneur,
        Self::Artist,
        Self::Banker,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Entrepreneur => "entrepreneur",
            Self::Artist => "artist",
            Self::Banker => "banker",
        }
    }

    /// Two-letter prefix used in share codes.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Student => "ST",
            Self::Entrepreneur => "EN",
            Self::Artist => "AR",
            Self::Banker => "BK",
        }
    }

    /// Case-insensitive lookup by key.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|archetype| archetype.key().eq_ignore_ascii_case(label))
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|archetype| archetype.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for CareerArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CareerArchetype {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EngineError::InvalidArchetype(s.to_string()))
    }
}

/// One archetype's baseline profile and scenario library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerProfile {
    pub archetype: CareerArchetype,
    pub name: String,
    pub desc: String,
    pub baseline: FinancialState,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CareerProfileNoId {
    name: String,
    #[serde(default)]
    desc: String,
    baseline: FinancialState,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

impl CareerProfile {
    fn with_archetype(archetype: CareerArchetype, p: CareerProfileNoId) -> Self {
        Self {
            archetype,
            name: p.name,
            desc: p.desc,
            baseline: p.baseline,
            scenarios: p.scenarios,
        }
    }

    #[must_use]
    pub fn scenario(&self, scenario_id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == scenario_id)
    }
}

/// Validated table of all career profiles, ordered as [`CareerArchetype::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerCatalog(Vec<CareerProfile>);

impl CareerCatalog {
    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails validation.
    pub fn load_default() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CAREERS_DATA)
    }

    /// Parse a catalog keyed by archetype (`"student": {...}`).
    ///
    /// Unknown keys are ignored; every archetype must be present.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalog violates a
    /// shape rule (missing archetype, empty scenario pool, fewer than two
    /// options, duplicate ids, negative baseline income or debt).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let map: HashMap<String, CareerProfileNoId> =
            serde_json::from_str(json).map_err(|error| CatalogError::Parse {
                source_name: "careers",
                error,
            })?;
        let mut by_archetype: HashMap<CareerArchetype, CareerProfileNoId> = HashMap::new();
        for (key, profile) in map {
            let Some(archetype) = CareerArchetype::parse(&key) else {
                log::warn!("ignoring unknown career key '{key}'");
                continue;
            };
            if by_archetype.insert(archetype, profile).is_some() {
                return Err(CatalogError::DuplicateArchetype(archetype));
            }
        }
        let mut profiles = Vec::with_capacity(CareerArchetype::ALL.len());
        for &archetype in CareerArchetype::ALL {
            let profile = by_archetype
                .remove(&archetype)
                .ok_or(CatalogError::MissingArchetype(archetype))?;
            profiles.push(CareerProfile::with_archetype(archetype, profile));
        }
        Self::from_profiles(profiles)
    }

    /// Build a catalog from pre-parsed profiles.
    ///
    /// # Errors
    ///
    /// Returns an error under the same rules as [`CareerCatalog::from_json`].
    pub fn from_profiles(mut profiles: Vec<CareerProfile>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.archetype) {
                return Err(CatalogError::DuplicateArchetype(profile.archetype));
            }
            validate_profile(profile)?;
        }
        for &archetype in CareerArchetype::ALL {
            if !seen.contains(&archetype) {
                return Err(CatalogError::MissingArchetype(archetype));
            }
        }
        profiles.sort_by_key(|profile| profile.archetype);
        Ok(Self(profiles))
    }

    #[must_use]
    pub fn profile(&self, archetype: CareerArchetype) -> &CareerProfile {
        // Construction guarantees exactly one profile per archetype in `ALL` order.
        &self.0[archetype as usize]
    }

    #[must_use]
    pub fn baseline(&self, archetype: CareerArchetype) -> FinancialState {
        self.profile(archetype).baseline
    }

    #[must_use]
    pub fn scenarios(&self, archetype: CareerArchetype) -> &[Scenario] {
        &self.profile(archetype).scenarios
    }

    #[must_use]
    pub fn scenario(&self, archetype: CareerArchetype, scenario_id: &str) -> Option<&Scenario> {
        self.profile(archetype).scenario(scenario_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CareerProfile> {
        self.0.iter()
    }

    pub fn decisions(&self) -> impl Iterator<Item = &crate::data::Decision> {
        self.0
            .iter()
            .flat_map(|profile| profile.scenarios.iter())
            .flat_map(|scenario| scenario.options.iter())
    }
}

impl<'a> IntoIterator for &'a CareerCatalog {
    type Item = &'a CareerProfile;
    type IntoIter = std::slice::Iter<'a, CareerProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate_profile(profile: &CareerProfile) -> Result<(), CatalogError> {
    let archetype = profile.archetype;
    if profile.baseline.income < 0.0 {
        return Err(CatalogError::NegativeBaseline {
            archetype,
            field: "income",
        });
    }
    if profile.baseline.debt < 0.0 {
        return Err(CatalogError::NegativeBaseline {
            archetype,
            field: "debt",
        });
    }
    if profile.scenarios.is_empty() {
        return Err(CatalogError::NoScenarios(archetype));
    }
    let mut scenario_ids = HashSet::new();
    for scenario in &profile.scenarios {
        if !scenario_ids.insert(scenario.id.as_str()) {
            return Err(CatalogError::DuplicateId {
                kind: "scenario",
                id: scenario.id.clone(),
            });
        }
        if scenario.options.len() < MIN_SCENARIO_OPTIONS {
            return Err(CatalogError::TooFewOptions {
                scenario_id: scenario.id.clone(),
                count: scenario.options.len(),
                min: MIN_SCENARIO_OPTIONS,
            });
        }
        let mut option_ids = HashSet::new();
        for option in &scenario.options {
            if !option_ids.insert(option.id.as_str()) {
                return Err(CatalogError::DuplicateOption {
                    scenario_id: scenario.id.clone(),
                    decision_id: option.id.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    fn scenario_json(id: &str, options: usize) -> String {
        let options: Vec<String> = (0..options)
            .map(|i| {
                format!(
                    r#"{{"id":"opt{i}","label":"Option {i}","xp_grant":10,"message_key":"decision.{id}.opt{i}"}}"#
                )
            })
            .collect();
        format!(
            r#"{{"id":"{id}","narrative_key":"scenario.{id}","options":[{}]}}"#,
            options.join(",")
        )
    }

    fn catalog_json(options_per_scenario: usize, skip: Option<&str>) -> String {
        let entries: Vec<String> = CareerArchetype::ALL
            .iter()
            .filter(|a| Some(a.key()) != skip)
            .map(|a| {
                format!(
                    r#""{key}": {{"name":"{key}","baseline":{{"income":1000,"expenses":800,"savings":100,"debt":50}},"scenarios":[{s}]}}"#,
                    key = a.key(),
                    s = scenario_json(&format!("{}_one", a.key()), options_per_scenario)
                )
            })
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    #[test]
    fn default_catalog_is_complete_and_ordered() {
        let catalog = CareerCatalog::load_default().expect("bundled catalog is valid");
        let order: Vec<_> = catalog.iter().map(|p| p.archetype).collect();
        assert_eq!(order, CareerArchetype::ALL.to_vec());
        for archetype in CareerArchetype::ALL {
            assert!(!catalog.scenarios(*archetype).is_empty());
        }
    }

    #[test]
    fn student_baseline_matches_reference_profile() {
        let catalog = CareerCatalog::load_default().unwrap();
        let baseline = catalog.baseline(CareerArchetype::Student);
        assert_eq!(baseline, FinancialState::new(1200.0, 1000.0, 500.0, 20_000.0));
        assert!((baseline.debt_to_income_ratio() - 1.388_888_888_9).abs() < 1e-6);
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(CareerArchetype::parse("Student"), Some(CareerArchetype::Student));
        assert_eq!(CareerArchetype::parse(" BANKER "), Some(CareerArchetype::Banker));
        assert!(CareerArchetype::parse("astronaut").is_none());
        let err = "astronaut".parse::<CareerArchetype>().unwrap_err();
        assert_eq!(err, EngineError::InvalidArchetype("astronaut".to_string()));
        assert_eq!(CareerArchetype::from_code("ar"), Some(CareerArchetype::Artist));
    }

    #[test]
    fn missing_archetype_is_an_error() {
        let err = CareerCatalog::from_json(&catalog_json(2, Some("artist"))).unwrap_err();
        assert!(matches!(err, CatalogError::MissingArchetype(CareerArchetype::Artist)));
    }

    #[test]
    fn scenarios_need_two_options() {
        let err = CareerCatalog::from_json(&catalog_json(1, None)).unwrap_err();
        assert!(matches!(err, CatalogError::TooFewOptions { count: 1, .. }));
    }

    #[test]
    fn minimal_catalog_parses() {
        let catalog = CareerCatalog::from_json(&catalog_json(2, None)).unwrap();
        let banker = catalog.profile(CareerArchetype::Banker);
        assert!((banker.baseline.income - 1000.0).abs() < FLOAT_EPSILON);
        assert!(catalog.scenario(CareerArchetype::Banker, "banker_one").is_some());
        assert!(catalog.scenario(CareerArchetype::Banker, "student_one").is_none());
        assert_eq!(catalog.decisions().count(), 8);
    }

    #[test]
    fn negative_baseline_debt_is_rejected() {
        let json = catalog_json(2, None).replacen(r#""debt":50"#, r#""debt":-50"#, 1);
        let err = CareerCatalog::from_json(&json).unwrap_err();
        assert!(matches!(err, CatalogError::NegativeBaseline { field: "debt", .. }));
    }
}
