use anyhow::{Context, Result, bail};
use fintwin_game::{CareerArchetype, decode_to_seed, generate_code_from_entropy};
use std::collections::HashMap;

/// Detailed seed metadata used for automated runs.
///
/// Numeric tokens are treated as entropy and turned into a share code per
/// career, so every run the tester reports can be replayed from its code.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub entropy: u64,
    pub code: Option<String>,
    pub source_archetype: Option<CareerArchetype>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(entropy: u64) -> Self {
        Self {
            entropy,
            code: None,
            source_archetype: None,
        }
    }

    #[must_use]
    pub fn from_share_code(seed: u64, archetype: CareerArchetype, code: String) -> Self {
        Self {
            entropy: seed,
            code: Some(code),
            source_archetype: Some(archetype),
        }
    }

    #[must_use]
    pub fn matches_archetype(&self, archetype: CareerArchetype) -> bool {
        match self.source_archetype {
            Some(source) => source == archetype,
            None => true,
        }
    }

    /// Session seed and share code for `archetype` on the given iteration.
    ///
    /// A share-code token replays its own seed on iteration zero; later
    /// iterations and numeric tokens derive fresh codes from the entropy.
    #[must_use]
    pub fn session_seed(&self, archetype: CareerArchetype, iteration: usize) -> (u64, String) {
        if iteration == 0
            && let (Some(code), Some(source)) = (&self.code, self.source_archetype)
            && source == archetype
        {
            return (self.entropy, code.clone());
        }

        let step = u64::try_from(iteration).unwrap_or(u64::MAX);
        let code = generate_code_from_entropy(archetype, self.entropy.wrapping_add(step));
        match decode_to_seed(&code) {
            Some((_, seed)) => (seed, code),
            None => (self.entropy.wrapping_add(step), code),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.code {
            Some(code) => code.clone(),
            None => self.entropy.to_string(),
        }
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, share codes, and the special keywords
/// `all` / `available` which expand to one share code per word and career.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("available") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some((archetype, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(
                seed,
                archetype,
                token.trim().to_uppercase(),
            ));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_share_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<CareerArchetype>), usize> = HashMap::new();

    for info in pending {
        let key = (info.entropy, info.source_archetype);
        if let Some(&existing) = index.get(&key) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

fn generate_all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    use fintwin_game::seed::WORD_LIST;

    let mut seeds = Vec::with_capacity(WORD_LIST.len() * CareerArchetype::ALL.len());
    for &archetype in CareerArchetype::ALL {
        for word in WORD_LIST {
            let code = format!("{}-{word}00", archetype.code());
            let (decoded, seed) =
                decode_to_seed(&code).with_context(|| format!("failed to parse share code: {code}"))?;
            seeds.push(SeedInfo::from_share_code(seed, decoded, code));
        }
    }
    Ok(seeds)
}
