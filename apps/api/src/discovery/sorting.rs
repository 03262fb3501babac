//! Sort Policy Engine: three interchangeable comparator strategies.
//!
//! Jobs without a `created` date compare as the earliest possible date.
//! `sort_by` is stable, so equal keys keep their merged order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::job::{Category, Job};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    /// AI Video jobs first, newest first within each group.
    #[default]
    Smart,
    Recent,
    Oldest,
}

fn by_created_desc(a: &Job, b: &Job) -> Ordering {
    // `None < Some(_)`, so missing dates sink to the end.
    b.created.cmp(&a.created)
}

fn by_created_asc(a: &Job, b: &Job) -> Ordering {
    a.created.cmp(&b.created)
}

fn smart(a: &Job, b: &Job) -> Ordering {
    let a_video = a.has_category(Category::AiVideo);
    let b_video = b.has_category(Category::AiVideo);
    b_video
        .cmp(&a_video)
        .then_with(|| by_created_desc(a, b))
}

impl SortStrategy {
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        match self {
            SortStrategy::Smart => smart(a, b),
            SortStrategy::Recent => by_created_desc(a, b),
            SortStrategy::Oldest => by_created_asc(a, b),
        }
    }

    pub fn sort(&self, jobs: &mut [Job]) {
        jobs.sort_by(|a, b| self.compare(a, b));
    }

    pub fn sort_refs(&self, jobs: &mut [&Job]) {
        jobs.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::job;
    use chrono::{TimeZone, Utc};

    fn dated(id: &str, day: u32, categories: Vec<Category>) -> Job {
        let mut j = job(id, id);
        j.created = Some(Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).unwrap());
        j.detected_categories = categories;
        j
    }

    fn ids(jobs: &[Job]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn test_smart_sort_scenario() {
        let mut jobs = vec![
            dated("C", 3, vec![Category::AiVideo]),
            dated("A", 1, vec![Category::AiVideo]),
            dated("B", 5, vec![Category::Marketing]),
        ];
        SortStrategy::Smart.sort(&mut jobs);
        assert_eq!(ids(&jobs), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_smart_puts_ai_video_first_regardless_of_date() {
        let mut jobs = vec![
            dated("new-plain", 18, vec![]),
            dated("old-video", 1, vec![Category::AiVideo, Category::Editor]),
        ];
        SortStrategy::Smart.sort(&mut jobs);
        assert_eq!(ids(&jobs), vec!["old-video", "new-plain"]);
    }

    #[test]
    fn test_recent_and_oldest_with_missing_dates() {
        let mut undated = job("none", "none");
        undated.created = None;
        let base = vec![dated("d2", 2, vec![]), undated, dated("d9", 9, vec![])];

        let mut recent = base.clone();
        SortStrategy::Recent.sort(&mut recent);
        assert_eq!(ids(&recent), vec!["d9", "d2", "none"]);

        let mut oldest = base;
        SortStrategy::Oldest.sort(&mut oldest);
        assert_eq!(ids(&oldest), vec!["none", "d2", "d9"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut jobs = vec![dated("first", 4, vec![]), dated("second", 4, vec![])];
        SortStrategy::Recent.sort(&mut jobs);
        assert_eq!(ids(&jobs), vec!["first", "second"]);
    }

    #[test]
    fn test_default_strategy_is_smart() {
        assert_eq!(SortStrategy::default(), SortStrategy::Smart);
        let parsed: SortStrategy = serde_json::from_str(r#""oldest""#).unwrap();
        assert_eq!(parsed, SortStrategy::Oldest);
    }
}
