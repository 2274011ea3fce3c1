use std::{fs, path::Path};

use chrono::NaiveDate;
use engine::{ExpectedCash, Shift};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Last expected-cash record seen today, kept across restarts so the
/// reconciliation screen does not start empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCache {
    pub expected: Option<ExpectedCash>,
}

impl DayCache {
    /// Loads the cache, dropping an entry recorded on another day.
    pub fn load(path: &str, today: NaiveDate) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let mut cache: Self = serde_json::from_str(&content)?;
        if cache
            .expected
            .as_ref()
            .is_some_and(|expected| expected.date != today)
        {
            tracing::debug!("discarding day cache from a previous day");
            cache.expected = None;
        }
        Ok(cache)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let parent = Path::new(path).parent();
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn valid_for(&self, today: NaiveDate, shift: Shift, handler: &str) -> Option<&ExpectedCash> {
        self.expected.as_ref().filter(|expected| {
            expected.date == today && expected.shift == shift && expected.handler == handler
        })
    }

    pub fn remember(&mut self, expected: ExpectedCash) {
        self.expected = Some(expected);
    }

    pub fn forget(&mut self) {
        self.expected = None;
    }
}

#[cfg(test)]
mod tests {
    use engine::Money;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn expected(date: NaiveDate) -> ExpectedCash {
        ExpectedCash {
            amount: Money::from_pesos(21_500),
            date,
            shift: Shift::Morning,
            handler: "Nico".to_string(),
        }
    }

    fn scratch_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("caja_tui_{}_{name}", std::process::id()))
            .join("state.json")
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn missing_file_is_empty() {
        let cache = DayCache::load("/nonexistent/caja_state.json", day(7)).unwrap();
        assert_eq!(cache, DayCache::default());
    }

    #[test]
    fn saved_entry_is_reused_the_same_day() {
        let path = scratch_path("same_day");
        let mut cache = DayCache::default();
        cache.remember(expected(day(7)));
        cache.save(&path).unwrap();

        let loaded = DayCache::load(&path, day(7)).unwrap();
        let hit = loaded.valid_for(day(7), Shift::Morning, "Nico").unwrap();
        assert_eq!(hit.amount, Money::from_pesos(21_500));
        assert!(loaded.valid_for(day(7), Shift::Afternoon, "Nico").is_none());
        assert!(loaded.valid_for(day(7), Shift::Morning, "Ana").is_none());
    }

    #[test]
    fn entry_from_yesterday_is_dropped() {
        let path = scratch_path("yesterday");
        let mut cache = DayCache::default();
        cache.remember(expected(day(6)));
        cache.save(&path).unwrap();

        let loaded = DayCache::load(&path, day(7)).unwrap();
        assert!(loaded.expected.is_none());
    }
}
