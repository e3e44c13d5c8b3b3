//! Swappable store for completed assessments.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::assessment::AssessmentRecord;
use crate::error::Result;

/// Where completed assessments are kept on this device.
pub trait AssessmentRepository: Send {
    /// Insert or replace the record keyed by its session id.
    fn save(&self, record: &AssessmentRecord) -> Result<()>;

    fn find_by_id(&self, session_id: &str) -> Result<Option<AssessmentRecord>>;

    /// All records, most recently completed first.
    fn list(&self) -> Result<Vec<AssessmentRecord>>;
}

/// In-memory repository for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<String, AssessmentRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn save(&self, record: &AssessmentRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    fn find_by_id(&self, session_id: &str) -> Result<Option<AssessmentRecord>> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(records.get(session_id).cloned())
    }

    fn list(&self) -> Result<Vec<AssessmentRecord>> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        let mut all: Vec<AssessmentRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{local_analysis, ScoreMap, StemCategory};
    use chrono::{Duration, Utc};

    fn record(id: &str, minutes_ago: i64) -> AssessmentRecord {
        let scores = ScoreMap::default().with_increment(StemCategory::Engineering, 10);
        AssessmentRecord::new(
            id,
            None,
            local_analysis(scores),
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    #[test]
    fn save_and_find() {
        let repo = MemoryRepository::new();
        repo.save(&record("a", 0)).unwrap();
        let found = repo.find_by_id("a").unwrap().unwrap();
        assert_eq!(found.primary_category, StemCategory::Engineering);
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let repo = MemoryRepository::new();
        repo.save(&record("old", 30)).unwrap();
        repo.save(&record("new", 1)).unwrap();
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|r| r.session_id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
