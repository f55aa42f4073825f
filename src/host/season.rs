//! Seasonal events and the items tied to them.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A yearly event window, inclusive on both ends. A window whose start is
/// after its end wraps over new year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEvent {
    pub name: String,
    /// (month, day)
    pub start: (u32, u32),
    pub end: (u32, u32),
    /// Item templates that only spawn while the event runs.
    pub items: Vec<String>,
}

impl SeasonalEvent {
    pub fn is_active(&self, date: NaiveDate) -> bool {
        let today = (date.month(), date.day());
        if self.start <= self.end {
            self.start <= today && today <= self.end
        } else {
            today >= self.start || today <= self.end
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalCalendar {
    pub events: Vec<SeasonalEvent>,
}

impl Default for SeasonalCalendar {
    fn default() -> Self {
        Self {
            events: vec![
                SeasonalEvent {
                    name: "christmas".into(),
                    start: (12, 7),
                    end: (1, 7),
                    items: vec![
                        // tree ornaments, santa hat
                        "5df8a6a186f77412640e2e80".into(),
                        "5df8a72c86f77412640e2e83".into(),
                        "5df8a77486f77412672a1e3f".into(),
                        "5a43943586f77416ad2f06e2".into(),
                    ],
                },
                SeasonalEvent {
                    name: "halloween".into(),
                    start: (10, 15),
                    end: (11, 5),
                    items: vec![
                        "635267ab3c89e2112001f826".into(),
                        "59ef13ca86f77445fd0e2483".into(),
                    ],
                },
            ],
        }
    }
}

impl SeasonalCalendar {
    /// Items whose event is not running on `date`.
    ///
    /// An item listed under both an active and an inactive event counts as
    /// active.
    pub fn inactive_items(&self, date: NaiveDate) -> HashSet<String> {
        let active: HashSet<&str> = self
            .events
            .iter()
            .filter(|e| e.is_active(date))
            .flat_map(|e| e.items.iter().map(String::as_str))
            .collect();

        self.events
            .iter()
            .filter(|e| !e.is_active(date))
            .flat_map(|e| e.items.iter())
            .filter(|item| !active.contains(item.as_str()))
            .cloned()
            .collect()
    }
}
