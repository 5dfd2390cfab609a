//! Scored multi-field entity search (spec §4.4). The table is canonical:
//! every exact-match and contains-match rule is evaluated independently and
//! the final score is the *maximum* across rules, never a sum — the source
//! material mixes additive and max-style scoring for the same entity, and
//! the additive path for exact-match rules must not be reintroduced
//! (spec §9 Open Question 2).

use crate::cache::StateCache;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub entity_id: String,
    pub friendly_name: String,
    pub score: f64,
    pub has_state: bool,
}

/// Run the scored search over the cache's current snapshot.
pub fn search(cache: &StateCache, query: &str, domain: Option<&str>) -> Vec<SearchResult> {
    let candidates: Vec<String> = cache
        .candidate_ids()
        .into_iter()
        .filter(|id| match domain {
            Some(d) => id.starts_with(&format!("{d}.")),
            None => true,
        })
        .collect();

    if query.is_empty() {
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .map(|id| describe(cache, &id))
            .map(|(id, friendly_name, has_state)| SearchResult {
                entity_id: id,
                friendly_name,
                score: 1.0,
                has_state,
            })
            .collect();
        results.sort_by(|a, b| a.friendly_name.cmp(&b.friendly_name));
        return results;
    }

    let query_lower = query.to_lowercase();
    let tokens: Vec<&str> = query_lower.split_whitespace().collect();

    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|id| {
            let fields = Fields::load(cache, &id);
            let score = score_entity(&query_lower, &tokens, &fields);
            if score > 0.0 {
                Some(SearchResult {
                    entity_id: id,
                    friendly_name: fields.friendly_name.clone(),
                    score,
                    has_state: fields.has_state,
                })
            } else {
                None
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then_with(|| a.friendly_name.cmp(&b.friendly_name))
    });
    results
}

struct Fields {
    entity_id: String,
    domain: String,
    slug: String,
    friendly_name: String,
    registry_name: String,
    area: String,
    device_name: String,
    manufacturer: String,
    model: String,
    device_class: String,
    has_state: bool,
}

impl Fields {
    fn load(cache: &StateCache, entity_id: &str) -> Self {
        let state = cache.state_of(entity_id);
        let registry = cache.registry_entry(entity_id);
        let device = registry
            .as_ref()
            .and_then(|r| r.device_id.as_ref())
            .and_then(|d| cache.device_entry(d));

        let domain = entity_id.split('.').next().unwrap_or("").to_string();
        let slug = entity_id
            .split_once('.')
            .map(|(_, s)| s.to_string())
            .unwrap_or_default();

        let friendly_name = state
            .as_ref()
            .and_then(|s| s.friendly_name().map(|s| s.to_string()))
            .or_else(|| registry.as_ref().and_then(|r| r.name.clone()))
            .unwrap_or_else(|| slug.replace('_', " "));

        let device_class = state
            .as_ref()
            .and_then(|s| s.attributes.get("device_class"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Fields {
            entity_id: entity_id.to_string(),
            domain,
            slug,
            friendly_name,
            registry_name: registry.as_ref().and_then(|r| r.name.clone()).unwrap_or_default(),
            area: registry.as_ref().and_then(|r| r.area.clone()).unwrap_or_default(),
            device_name: device.as_ref().and_then(|d| d.name.clone()).unwrap_or_default(),
            manufacturer: device.as_ref().and_then(|d| d.manufacturer.clone()).unwrap_or_default(),
            model: device.as_ref().and_then(|d| d.model.clone()).unwrap_or_default(),
            device_class,
            has_state: state.is_some(),
        }
    }

    fn describe(&self) -> (String, String, bool) {
        (self.entity_id.clone(), self.friendly_name.clone(), self.has_state)
    }
}

fn describe(cache: &StateCache, entity_id: &str) -> (String, String, bool) {
    Fields::load(cache, entity_id).describe()
}

fn eq_ci(a: &str, b: &str) -> bool {
    !b.is_empty() && a.eq_ignore_ascii_case(b)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && !haystack.is_empty() && haystack.to_lowercase().contains(needle)
}

fn score_entity(query: &str, tokens: &[&str], f: &Fields) -> f64 {
    let mut score: f64 = 0.0;
    let mut set = |s: f64| {
        if s > score {
            score = s;
        }
    };

    // Exact-match tiers.
    if eq_ci(&f.entity_id, query) {
        set(100.0);
    }
    if eq_ci(&f.friendly_name, query) {
        set(90.0);
    }
    if eq_ci(&f.registry_name, query) {
        set(88.0);
    }
    if eq_ci(&f.area, query) {
        set(85.0);
    }
    if eq_ci(&f.device_name, query) {
        set(83.0);
    }
    if eq_ci(&f.slug, query) {
        set(80.0);
    }
    if eq_ci(&f.manufacturer, query) {
        set(75.0);
    }
    if eq_ci(&f.model, query) {
        set(72.0);
    }

    // Contains tiers.
    if contains_ci(&f.entity_id, query) {
        set(70.0);
    }
    if contains_ci(&f.friendly_name, query) {
        set(65.0);
    }
    if contains_ci(&f.registry_name, query) {
        set(64.0);
    }
    if contains_ci(&f.area, query) {
        set(62.0);
    }
    if contains_ci(&f.device_class, query) {
        set(60.0);
    }
    if contains_ci(&f.device_name, query) {
        set(60.0);
    }
    if contains_ci(&f.manufacturer, query) {
        set(55.0);
    }
    if contains_ci(&f.model, query) {
        set(53.0);
    }

    // Token-set intersection, capped at 50, plus token-location bonuses.
    if !tokens.is_empty() {
        let haystacks = [
            f.entity_id.to_lowercase(),
            f.friendly_name.to_lowercase(),
            f.area.to_lowercase(),
            f.device_name.to_lowercase(),
            f.domain.to_lowercase(),
        ];
        let matched: Vec<&&str> = tokens
            .iter()
            .filter(|t| haystacks.iter().any(|h| h.contains(**t)))
            .collect();
        if !matched.is_empty() {
            let mut token_score = (matched.len() as f64 / tokens.len() as f64) * 50.0;
            let fname = f.friendly_name.to_lowercase();
            let area = f.area.to_lowercase();
            let device = f.device_name.to_lowercase();
            let domain = f.domain.to_lowercase();
            if matched.iter().any(|t| fname.contains(**t)) {
                token_score += 10.0;
            }
            if matched.iter().any(|t| area.contains(**t)) {
                token_score += 8.0;
            }
            if matched.iter().any(|t| device.contains(**t)) {
                token_score += 7.0;
            }
            if matched.iter().any(|t| domain.contains(**t)) {
                token_score += 5.0;
            }
            set(token_score);
        }
    }

    // Substring fallback tiers.
    let words: Vec<&str> = f.friendly_name.split_whitespace().collect();
    let words_lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    if words_lower.iter().any(|w| w.contains(query) || query.contains(w.as_str())) {
        set(20.0);
    }
    if !tokens.is_empty()
        && tokens
            .iter()
            .any(|t| words_lower.iter().any(|w| w.contains(*t)))
    {
        set(15.0);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceRegistryEntry, EntityRegistryEntry, HaState};
    use chrono::Utc;
    use std::collections::HashMap;

    fn setup() -> StateCache {
        let cache = StateCache::new();
        let mut attrs = HashMap::new();
        attrs.insert("friendly_name".to_string(), serde_json::json!("Basement Main"));
        cache.apply_state_changed(
            "light.basement_main",
            Some(HaState {
                entity_id: "light.basement_main".to_string(),
                state: "off".to_string(),
                attributes: attrs,
                last_changed: Utc::now(),
            }),
        );
        cache.replace_entity_registry(vec![EntityRegistryEntry {
            entity_id: "light.basement_main".to_string(),
            name: Some("Basement Main".to_string()),
            area: Some("Basement".to_string()),
            device_id: Some("dev1".to_string()),
            ..Default::default()
        }]);
        cache.replace_device_registry(vec![DeviceRegistryEntry {
            id: "dev1".to_string(),
            name: Some("Hue".to_string()),
            manufacturer: Some("Signify".to_string()),
            ..Default::default()
        }]);
        cache
    }

    #[test]
    fn basement_query_resolves_to_basement_light() {
        let cache = setup();
        let results = search(&cache, "basement", Some("light"));
        assert_eq!(results[0].entity_id, "light.basement_main");
        assert!(results[0].score >= 85.0, "score was {}", results[0].score);
    }

    #[test]
    fn exact_entity_id_scores_100() {
        let cache = setup();
        let results = search(&cache, "light.basement_main", None);
        assert_eq!(results[0].score, 100.0);
    }

    #[test]
    fn empty_query_with_domain_returns_all_sorted_by_name() {
        let cache = setup();
        let results = search(&cache, "", Some("light"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn no_match_returns_empty() {
        let cache = setup();
        let results = search(&cache, "xyzzy_not_present", None);
        assert!(results.is_empty());
    }
}
