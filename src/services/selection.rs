use crate::error::{Error, Result};
use crate::models::Shot;
use crate::services::filter::{DateFilter, IndexSelector};
use chrono::{DateTime, Utc};

/// One filter criterion. Date and index filters never combine.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Date(DateFilter),
    Index(IndexSelector),
}

/// Chooses which scanned shots an action applies to
#[derive(Debug, Clone)]
pub struct Selection {
    criteria: Option<Criteria>,
    /// Reference time for relative date filters, fixed once per invocation
    now: DateTime<Utc>,
}

impl Selection {
    pub fn new(criteria: Option<Criteria>, now: DateTime<Utc>) -> Self {
        Self { criteria, now }
    }

    /// Build a selection from the raw filter texts a user supplied
    pub fn from_filters(
        date: Option<&str>,
        index: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let criteria = match (date, index) {
            (Some(_), Some(_)) => return Err(Error::ConflictingFilter),
            (Some(text), None) => Some(Criteria::Date(DateFilter::parse(text)?)),
            (None, Some(text)) => Some(Criteria::Index(IndexSelector::parse(text)?)),
            (None, None) => None,
        };
        Ok(Self::new(criteria, now))
    }

    pub fn is_all(&self) -> bool {
        self.criteria.is_none()
    }

    pub fn matches(&self, shot: &Shot) -> bool {
        match &self.criteria {
            None => true,
            Some(Criteria::Date(filter)) => filter.matches(shot.created_at, self.now),
            Some(Criteria::Index(selector)) => selector.contains(shot.index),
        }
    }

    /// Stable filter: keeps the input order (ascending index for scanned shots)
    pub fn select<'a>(&self, shots: &'a [Shot]) -> Vec<&'a Shot> {
        shots.iter().filter(|shot| self.matches(shot)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimestampSource;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn make_shot(index: u32, age_hours: i64) -> Shot {
        Shot::new(
            index,
            PathBuf::from(format!("DJI_{index:04}.MP4")),
            now() - Duration::hours(age_hours),
            TimestampSource::Birth,
            0,
        )
    }

    fn indices(shots: &[&Shot]) -> Vec<u32> {
        shots.iter().map(|s| s.index).collect()
    }

    #[test]
    fn test_no_filter_selects_all() {
        let shots = vec![make_shot(1, 1), make_shot(2, 100), make_shot(3, 1000)];
        let selection = Selection::from_filters(None, None, now()).unwrap();

        assert!(selection.is_all());
        assert_eq!(indices(&selection.select(&shots)), vec![1, 2, 3]);
    }

    #[test]
    fn test_index_filter_preserves_order() {
        let shots = vec![make_shot(3, 1), make_shot(5, 1), make_shot(8, 1), make_shot(9, 1)];
        let selection = Selection::from_filters(None, Some("9,3-5"), now()).unwrap();

        assert_eq!(indices(&selection.select(&shots)), vec![3, 5, 9]);
    }

    #[test]
    fn test_date_filter() {
        let shots = vec![make_shot(1, 2), make_shot(2, 48), make_shot(3, 5)];

        let recent = Selection::from_filters(Some("<1d"), None, now()).unwrap();
        assert_eq!(indices(&recent.select(&shots)), vec![1, 3]);

        let old = Selection::from_filters(Some(">1d"), None, now()).unwrap();
        assert_eq!(indices(&old.select(&shots)), vec![2]);
    }

    #[test]
    fn test_both_filters_conflict() {
        let err = Selection::from_filters(Some("<1d"), Some("1-3"), now()).unwrap_err();
        assert!(matches!(err, Error::ConflictingFilter));
    }

    #[test]
    fn test_syntax_error_propagates() {
        let err = Selection::from_filters(None, Some("8-5"), now()).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }
}
