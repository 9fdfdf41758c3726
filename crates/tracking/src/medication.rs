//! Medication answers: dosages, their weekly schedules and the timestamps logged against them.
//!
//! A dosage is either scheduled (a set of weekdays plus one timestamp per time of day) or
//! "anytime", in which case it only carries the timestamps of doses actually taken.
//! [`MedicationAnswer::finalize_editing`] normalises an answer into one of those two shapes
//! before it is stored.

use crate::item::TrackedItemAnswer;
use chrono::{DateTime, FixedOffset};
use datatrack_types::{RecordedTimeZone, TimeOfDay, WeekdaySet};
use uuid::Uuid;

/// One scheduled slot or one logged dose.
///
/// At least one of `time_of_day` and `logged_date` is set. `uuid` is a local identity used to
/// address the timestamp while logging; it is never persisted and does not take part in
/// equality.
#[derive(Clone, Debug)]
pub struct MedicationTimestamp {
    pub uuid: String,
    pub time_of_day: Option<TimeOfDay>,
    pub logged_date: Option<DateTime<FixedOffset>>,
    pub quantity: u32,
    pub time_zone: RecordedTimeZone,
}

impl MedicationTimestamp {
    /// An unlogged scheduled slot.
    pub fn scheduled(time_of_day: TimeOfDay, time_zone: RecordedTimeZone) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            time_of_day: Some(time_of_day),
            logged_date: None,
            quantity: 1,
            time_zone,
        }
    }

    /// A dose logged at `logged_date`, outside any schedule.
    pub fn logged(logged_date: DateTime<FixedOffset>, time_zone: RecordedTimeZone) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            time_of_day: None,
            logged_date: Some(logged_date),
            quantity: 1,
            time_zone,
        }
    }

    /// Ordering used for stored timestamps: scheduled slots by time of day, then unscheduled
    /// doses by logged date.
    fn sort_key(&self) -> (bool, Option<TimeOfDay>, Option<DateTime<FixedOffset>>) {
        (self.time_of_day.is_none(), self.time_of_day, self.logged_date)
    }
}

impl PartialEq for MedicationTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.time_of_day == other.time_of_day
            && self.logged_date == other.logged_date
            && self.quantity == other.quantity
            && self.time_zone == other.time_zone
    }
}

impl Eq for MedicationTimestamp {}

/// A time of day and the weekdays it applies to, for reminder scheduling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleItem {
    pub time_of_day: TimeOfDay,
    pub days_of_week: WeekdaySet,
}

/// A labelled dose of a medication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dosage {
    /// Free text such as `"10 mg"`.
    pub label: Option<String>,
    pub days_of_week: Option<WeekdaySet>,
    pub timestamps: Option<Vec<MedicationTimestamp>>,
    pub is_anytime: Option<bool>,
}

impl Dosage {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    fn has_label(&self) -> bool {
        self.label.as_deref().is_some_and(|label| !label.is_empty())
    }

    /// Whether any timestamp carries a time of day.
    pub fn has_scheduled_time(&self) -> bool {
        self.timestamps
            .iter()
            .flatten()
            .any(|timestamp| timestamp.time_of_day.is_some())
    }

    /// The distinct scheduled times, earliest first.
    pub fn selected_times(&self) -> Vec<TimeOfDay> {
        let mut times: Vec<TimeOfDay> = self
            .timestamps
            .iter()
            .flatten()
            .filter_map(|timestamp| timestamp.time_of_day)
            .collect();
        times.sort();
        times.dedup();
        times
    }

    /// One schedule item per scheduled time, each covering the dosage's weekdays.
    ///
    /// Empty for anytime dosages and for dosages without weekdays.
    pub fn schedule_items(&self) -> Vec<ScheduleItem> {
        let Some(days) = self.days_of_week.as_ref().filter(|days| !days.is_empty()) else {
            return Vec::new();
        };
        if self.is_anytime.unwrap_or(false) {
            return Vec::new();
        }
        self.selected_times()
            .into_iter()
            .map(|time_of_day| ScheduleItem {
                time_of_day,
                days_of_week: days.clone(),
            })
            .collect()
    }

    /// Complete when labelled and either anytime, or scheduled on at least one weekday at
    /// at least one time.
    pub fn has_required_values(&self) -> bool {
        if !self.has_label() {
            return false;
        }
        match self.is_anytime {
            None => false,
            Some(true) => true,
            Some(false) => {
                self.days_of_week.as_ref().is_some_and(|days| !days.is_empty())
                    && !self.selected_times().is_empty()
            }
        }
    }
}

/// The answer for one selected medication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicationAnswer {
    pub identifier: String,
    pub dosage_items: Option<Vec<Dosage>>,
    pub is_continuous_injection: Option<bool>,
}

impl MedicationAnswer {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            dosage_items: None,
            is_continuous_injection: None,
        }
    }

    /// Normalises the dosages after editing so only storable information remains.
    ///
    /// In order:
    /// 1. dosages without a label are dropped;
    /// 2. an unset `is_anytime` becomes `true` iff no timestamp has a time of day;
    /// 3. anytime dosages lose their weekdays, unlogged timestamps and times of day;
    /// 4. dosages with the same label and weekdays are merged, keeping the first one's place;
    /// 5. timestamps with neither a time of day nor a logged date are dropped and the rest are
    ///    sorted, scheduled slots by time of day before unscheduled doses by logged date.
    pub fn finalize_editing(&mut self) {
        let Some(dosage_items) = self.dosage_items.take() else {
            return;
        };

        let mut merged: Vec<Dosage> = Vec::with_capacity(dosage_items.len());
        for mut dosage in dosage_items {
            if !dosage.has_label() {
                continue;
            }

            let inferred = !dosage.has_scheduled_time();
            let is_anytime = *dosage.is_anytime.get_or_insert(inferred);
            if is_anytime {
                dosage.days_of_week = None;
                dosage.timestamps = dosage.timestamps.map(|timestamps| {
                    timestamps
                        .into_iter()
                        .filter(|timestamp| timestamp.logged_date.is_some())
                        .map(|mut timestamp| {
                            timestamp.time_of_day = None;
                            timestamp
                        })
                        .collect()
                });
            }

            let existing = merged.iter_mut().find(|existing| {
                existing.label == dosage.label && existing.days_of_week == dosage.days_of_week
            });
            match existing {
                Some(existing) => {
                    if let Some(incoming) = dosage.timestamps {
                        existing
                            .timestamps
                            .get_or_insert_with(Vec::new)
                            .extend(incoming);
                    }
                }
                None => merged.push(dosage),
            }
        }

        for dosage in &mut merged {
            if let Some(timestamps) = dosage.timestamps.as_mut() {
                timestamps
                    .retain(|timestamp| timestamp.time_of_day.is_some() || timestamp.logged_date.is_some());
                timestamps.sort_by_key(MedicationTimestamp::sort_key);
            }
        }

        self.dosage_items = Some(merged);
    }
}

impl TrackedItemAnswer for MedicationAnswer {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Continuous injections need nothing else; otherwise every dosage must be complete and
    /// there must be at least one.
    fn has_required_values(&self) -> bool {
        if self.is_continuous_injection.unwrap_or(false) {
            return true;
        }
        match &self.dosage_items {
            Some(items) if !items.is_empty() => items.iter().all(Dosage::has_required_values),
            _ => false,
        }
    }
}
