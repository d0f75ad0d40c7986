//! Reminder scheduling: occurrence math and due-checking.
//!
//! A reminder fires inside a short window after its target time so a
//! polling check cannot miss it, and `last_triggered` suppresses
//! re-firing: one-shot reminders fire once ever, daily ones once per
//! day, weekly ones once per week.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// How long after the target time a poll still counts as on time.
pub const TRIGGER_WINDOW_MINUTES: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReminderKind {
    /// Fires once on a specific date.
    Once { date: NaiveDate },
    /// Fires every day.
    Daily,
    /// Fires every week on the given day (0 = Sunday .. 6 = Saturday).
    /// Stored as `dayOfWeek` in the notes file.
    Weekly {
        #[serde(rename = "dayOfWeek")]
        weekday: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub note_id: String,
    #[serde(flatten)]
    pub kind: ReminderKind,
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    #[serde(default)]
    pub message: String,
    pub enabled: bool,
    #[serde(default)]
    pub last_triggered: Option<NaiveDateTime>,
}

/// The notes file stores times as `"HH:MM"`; reading also accepts the
/// seconds-bearing form.
mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

fn weekday_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

fn weekday_name(index: u8) -> &'static str {
    match index {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        _ => "Saturday",
    }
}

impl Reminder {
    /// The next time this reminder should fire, from `now`. `None` for
    /// a one-shot reminder whose moment has passed.
    pub fn next_occurrence(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.kind {
            ReminderKind::Once { date } => {
                let target = date.and_time(self.time);
                (target >= now).then_some(target)
            }
            ReminderKind::Daily => {
                let today = now.date().and_time(self.time);
                if today >= now {
                    Some(today)
                } else {
                    Some(today + Duration::days(1))
                }
            }
            ReminderKind::Weekly { weekday } => {
                let today_index = weekday_index(now.weekday());
                let ahead = (7 + weekday as i64 - today_index as i64) % 7;
                let mut target = (now.date() + Duration::days(ahead)).and_time(self.time);
                if target < now {
                    target += Duration::days(7);
                }
                Some(target)
            }
        }
    }

    /// Whether a poll at `now` should fire this reminder.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        if !self.enabled {
            return false;
        }
        let window = Duration::minutes(TRIGGER_WINDOW_MINUTES);
        match self.kind {
            ReminderKind::Once { date } => {
                let target = date.and_time(self.time);
                now >= target && now - target <= window && self.last_triggered.is_none()
            }
            ReminderKind::Daily => {
                let target = now.date().and_time(self.time);
                let in_window = now >= target && now - target <= window;
                let already_today = self
                    .last_triggered
                    .is_some_and(|t| t.date() == now.date());
                in_window && !already_today
            }
            ReminderKind::Weekly { weekday } => {
                if weekday_index(now.weekday()) != weekday {
                    return false;
                }
                let target = now.date().and_time(self.time);
                let in_window = now >= target && now - target <= window;
                let recently = self
                    .last_triggered
                    .is_some_and(|t| now - t <= Duration::days(6));
                in_window && !recently
            }
        }
    }

    pub fn mark_triggered(&mut self, now: NaiveDateTime) {
        self.last_triggered = Some(now);
    }

    /// Human-readable schedule line, e.g. "Today at 3:05 PM".
    pub fn describe(&self, now: NaiveDateTime) -> String {
        let time = self.time.format("%-I:%M %p");
        match self.kind {
            ReminderKind::Once { date } => {
                let today = now.date();
                if date == today {
                    format!("Today at {time}")
                } else if date == today + Duration::days(1) {
                    format!("Tomorrow at {time}")
                } else {
                    format!("{} at {time}", date.format("%b %-d"))
                }
            }
            ReminderKind::Daily => format!("Every day at {time}"),
            ReminderKind::Weekly { weekday } => {
                format!("Every {} at {time}", weekday_name(weekday))
            }
        }
    }
}

/// All reminders across `notes` that should fire at `now`.
pub fn due_reminders<'a>(
    notes: &'a [crate::note::Note],
    now: NaiveDateTime,
) -> Vec<&'a Reminder> {
    notes
        .iter()
        .flat_map(|n| n.reminders.iter())
        .filter(|r| r.is_due(now))
        .collect()
}
