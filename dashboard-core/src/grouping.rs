//! Partitioning of the flat 3-hour forecast into calendar days.

use std::collections::HashMap;

use crate::model::ForecastSample;

/// Number of day groups the dashboard surfaces; later groups are dropped.
pub const MAX_SURFACED_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub date: String,
    pub samples: Vec<ForecastSample>,
}

/// Day groups keyed by date, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayGroups {
    groups: Vec<DayGroup>,
}

impl DayGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayGroup> {
        self.groups.iter()
    }

    pub fn first(&self) -> Option<&DayGroup> {
        self.groups.first()
    }

    pub fn get(&self, date: &str) -> Option<&DayGroup> {
        self.groups.iter().find(|g| g.date == date)
    }

    pub fn contains(&self, date: &str) -> bool {
        self.get(date).is_some()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.date.as_str())
    }

    /// Keep only the first `n` groups.
    pub fn truncated(mut self, n: usize) -> Self {
        self.groups.truncate(n);
        self
    }
}

/// Group samples by the date portion of their local timestamp text.
///
/// Keys appear in the order they are first seen, not sorted; samples keep
/// their input order within each group.
pub fn group_by_day(samples: &[ForecastSample]) -> DayGroups {
    let mut groups: Vec<DayGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let key = sample.date_key();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(DayGroup {
                date: key.to_string(),
                samples: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].samples.push(sample.clone());
    }

    DayGroups { groups }
}
