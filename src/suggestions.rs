//! Frequency-ranked autocomplete suggestions.
//!
//! Part codes, batch numbers and notes typed into the batch form are cached
//! per field. Entries are ranked by how often and how recently they were used;
//! recency is a logical tick so ranking never depends on the wall clock.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form fields that carry suggestions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionField {
    PartCode,
    BatchNumber,
    Notes,
}

impl SuggestionField {
    pub const ALL: [SuggestionField; 3] = [
        SuggestionField::PartCode,
        SuggestionField::BatchNumber,
        SuggestionField::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionField::PartCode => "part_code",
            SuggestionField::BatchNumber => "batch_number",
            SuggestionField::Notes => "notes",
        }
    }
}

impl fmt::Display for SuggestionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionField {
    type Err = SuggestionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        SuggestionField::ALL
            .into_iter()
            .find(|field| field.as_str() == raw)
            .ok_or_else(|| SuggestionError::UnknownField(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuggestionError {
    #[error("Unknown suggestion field: '{0}'")]
    UnknownField(String),
    #[error("Suggestion value must not be empty")]
    EmptyValue,
}

/// Cached value with its usage statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct SuggestionItem {
    pub value: String,
    pub frequency: u64,
    pub last_used: u64,
}

/// Limits for the suggestion cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SuggestionConfig {
    /// Maximum entries kept per field before the least used one is evicted
    pub capacity: usize,
    /// Maximum suggestions returned per query
    pub max_results: usize,
}

impl SuggestionConfig {
    pub const DEFAULT_CAPACITY: usize = 100;
    pub const DEFAULT_MAX_RESULTS: usize = 10;
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }
}

/// In-memory suggestion cache, one ranked list per field.
#[derive(Clone, Debug, Default)]
pub struct SuggestionCache {
    config: SuggestionConfig,
    entries: HashMap<SuggestionField, Vec<SuggestionItem>>,
    tick: u64,
}

impl SuggestionCache {
    pub fn new(config: SuggestionConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            tick: 0,
        }
    }

    /// Number of cached values for a field.
    pub fn len(&self, field: SuggestionField) -> usize {
        self.entries.get(&field).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, field: SuggestionField) -> bool {
        self.len(field) == 0
    }

    /// Records one use of `value` for `field`.
    ///
    /// Returns the updated entry. Blank values are rejected.
    pub fn record(
        &mut self,
        field: SuggestionField,
        value: &str,
    ) -> Result<SuggestionItem, SuggestionError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SuggestionError::EmptyValue);
        }

        self.tick += 1;
        let tick = self.tick;
        let capacity = self.config.capacity.max(1);
        let items = self.entries.entry(field).or_default();

        if let Some(existing) = items.iter_mut().find(|item| item.value == value) {
            existing.frequency += 1;
            existing.last_used = tick;
            return Ok(existing.clone());
        }

        if items.len() >= capacity {
            if let Some(victim) = least_used_index(items) {
                items.swap_remove(victim);
            }
        }

        let item = SuggestionItem {
            value: value.to_string(),
            frequency: 1,
            last_used: tick,
        };
        items.push(item.clone());
        Ok(item)
    }

    /// Ranked suggestions for the typed `input`.
    ///
    /// Case-insensitive substring match; values starting with the input come
    /// first, then higher frequency, then more recent use.
    pub fn suggest(&self, field: SuggestionField, input: &str) -> Vec<SuggestionItem> {
        let Some(items) = self.entries.get(&field) else {
            return Vec::new();
        };

        let needle = input.trim().to_lowercase();
        let mut matches: Vec<(bool, &SuggestionItem)> = items
            .iter()
            .filter_map(|item| {
                let haystack = item.value.to_lowercase();
                haystack
                    .contains(&needle)
                    .then(|| (haystack.starts_with(&needle), item))
            })
            .collect();

        matches.sort_by(|(a_prefix, a), (b_prefix, b)| {
            b_prefix
                .cmp(a_prefix)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| b.last_used.cmp(&a.last_used))
        });

        matches
            .into_iter()
            .take(self.config.max_results)
            .map(|(_, item)| item.clone())
            .collect()
    }
}

fn least_used_index(items: &[SuggestionItem]) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.frequency
                .cmp(&b.frequency)
                .then_with(|| a.last_used.cmp(&b.last_used))
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[SuggestionItem]) -> Vec<&str> {
        items.iter().map(|item| item.value.as_str()).collect()
    }

    #[test]
    fn repeated_use_increments_frequency() {
        let mut cache = SuggestionCache::default();
        cache.record(SuggestionField::PartCode, "A-100").unwrap();
        let item = cache.record(SuggestionField::PartCode, " A-100 ").unwrap();
        assert_eq!(item.frequency, 2);
        assert_eq!(cache.len(SuggestionField::PartCode), 1);
    }

    #[test]
    fn blank_values_are_rejected() {
        let mut cache = SuggestionCache::default();
        assert_eq!(
            cache.record(SuggestionField::Notes, "   "),
            Err(SuggestionError::EmptyValue)
        );
        assert!(cache.is_empty(SuggestionField::Notes));
    }

    #[test]
    fn prefix_matches_rank_before_frequency() {
        let mut cache = SuggestionCache::default();
        for _ in 0..3 {
            cache.record(SuggestionField::PartCode, "XAB-1").unwrap();
        }
        cache.record(SuggestionField::PartCode, "AB-2").unwrap();

        let ranked = cache.suggest(SuggestionField::PartCode, "ab");
        assert_eq!(values(&ranked), vec!["AB-2", "XAB-1"]);
    }

    #[test]
    fn frequency_then_recency_break_ties() {
        let mut cache = SuggestionCache::default();
        cache.record(SuggestionField::BatchNumber, "L-1").unwrap();
        cache.record(SuggestionField::BatchNumber, "L-2").unwrap();
        cache.record(SuggestionField::BatchNumber, "L-3").unwrap();
        cache.record(SuggestionField::BatchNumber, "L-1").unwrap();

        let ranked = cache.suggest(SuggestionField::BatchNumber, "l-");
        assert_eq!(values(&ranked), vec!["L-1", "L-3", "L-2"]);
    }

    #[test]
    fn empty_input_lists_everything_up_to_the_limit() {
        let mut cache = SuggestionCache::new(SuggestionConfig {
            capacity: 100,
            max_results: 2,
        });
        for value in ["a", "b", "c"] {
            cache.record(SuggestionField::Notes, value).unwrap();
        }
        assert_eq!(cache.suggest(SuggestionField::Notes, "").len(), 2);
    }

    #[test]
    fn fields_are_independent() {
        let mut cache = SuggestionCache::default();
        cache.record(SuggestionField::PartCode, "P-1").unwrap();
        assert!(cache.suggest(SuggestionField::BatchNumber, "P").is_empty());
    }

    #[test]
    fn full_cache_evicts_least_used_entry() {
        let mut cache = SuggestionCache::new(SuggestionConfig {
            capacity: 2,
            max_results: 10,
        });
        cache.record(SuggestionField::PartCode, "old").unwrap();
        cache.record(SuggestionField::PartCode, "kept").unwrap();
        cache.record(SuggestionField::PartCode, "kept").unwrap();
        cache.record(SuggestionField::PartCode, "new").unwrap();

        let mut remaining = values(&cache.suggest(SuggestionField::PartCode, ""))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        remaining.sort();
        assert_eq!(remaining, vec!["kept".to_string(), "new".to_string()]);
    }

    #[test]
    fn equal_frequency_evicts_the_oldest_entry() {
        let mut cache = SuggestionCache::new(SuggestionConfig {
            capacity: 2,
            max_results: 10,
        });
        for value in ["a", "b", "c"] {
            cache.record(SuggestionField::Notes, value).unwrap();
        }

        let ranked = cache.suggest(SuggestionField::Notes, "");
        assert_eq!(values(&ranked), vec!["c", "b"]);
    }

    #[test]
    fn refreshed_entry_survives_a_frequency_tie() {
        let mut cache = SuggestionCache::new(SuggestionConfig {
            capacity: 2,
            max_results: 10,
        });
        cache.record(SuggestionField::Notes, "a").unwrap();
        cache.record(SuggestionField::Notes, "b").unwrap();
        // both now at frequency 2, "a" used most recently
        cache.record(SuggestionField::Notes, "b").unwrap();
        cache.record(SuggestionField::Notes, "a").unwrap();
        cache.record(SuggestionField::Notes, "c").unwrap();

        let mut remaining = values(&cache.suggest(SuggestionField::Notes, ""))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        remaining.sort();
        assert_eq!(remaining, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn field_names_round_trip_through_from_str() {
        for field in SuggestionField::ALL {
            assert_eq!(field.as_str().parse::<SuggestionField>(), Ok(field));
        }
        assert_eq!(
            "colour".parse::<SuggestionField>(),
            Err(SuggestionError::UnknownField("colour".to_string()))
        );
    }
}
