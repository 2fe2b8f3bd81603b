use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimelineError {
    #[error("practice duration must be > 0")]
    ZeroDuration,

    #[error("unknown {kind}: {raw}")]
    UnknownValue { kind: &'static str, raw: String },
}

fn unknown(kind: &'static str, raw: &str) -> TimelineError {
    TimelineError::UnknownValue {
        kind,
        raw: raw.to_owned(),
    }
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

/// Style of a logged practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YogaStyle {
    Hatha,
    Vinyasa,
    Yin,
    Restorative,
}

impl YogaStyle {
    pub const ALL: [YogaStyle; 4] = [
        YogaStyle::Hatha,
        YogaStyle::Vinyasa,
        YogaStyle::Yin,
        YogaStyle::Restorative,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            YogaStyle::Hatha => "hatha",
            YogaStyle::Vinyasa => "vinyasa",
            YogaStyle::Yin => "yin",
            YogaStyle::Restorative => "restorative",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            YogaStyle::Hatha => "Hatha",
            YogaStyle::Vinyasa => "Vinyasa",
            YogaStyle::Yin => "Yin",
            YogaStyle::Restorative => "Restorative",
        }
    }

    /// Chart colour, shared with the sunburst palette.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            YogaStyle::Hatha => "#5A67D8",
            YogaStyle::Vinyasa => "#38A169",
            YogaStyle::Yin => "#DD6B20",
            YogaStyle::Restorative => "#805AD5",
        }
    }

    /// Typical session length in minutes.
    #[must_use]
    pub fn minute_range(self) -> RangeInclusive<u32> {
        match self {
            YogaStyle::Hatha => 20..=60,
            YogaStyle::Vinyasa => 30..=75,
            YogaStyle::Yin => 45..=90,
            YogaStyle::Restorative => 40..=80,
        }
    }

    /// Relative likelihood of an extra session of this style on a given day.
    #[must_use]
    pub fn frequency(self) -> f64 {
        match self {
            YogaStyle::Hatha => 0.4,
            YogaStyle::Vinyasa => 0.3,
            YogaStyle::Yin => 0.2,
            YogaStyle::Restorative => 0.1,
        }
    }
}

impl fmt::Display for YogaStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YogaStyle {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YogaStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| unknown("yoga style", s))
    }
}

macro_rules! labelled_enum {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl FromStr for $name {
            type Err = TimelineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == s)
                    .ok_or_else(|| unknown($kind, s))
            }
        }
    };
}

labelled_enum!(Focus, "focus", [Strength, Flexibility, Balance, Mindfulness]);
labelled_enum!(Intensity, "intensity", [Gentle, Moderate, Vigorous]);
labelled_enum!(Prop, "prop", [Blocks, Strap, Bolster, Mat]);

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

/// One logged practice session on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeEntry {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub style: YogaStyle,
    pub type_name: String,
    pub color: String,
    /// Minutes.
    pub duration: u32,
    pub focus: Focus,
    pub intensity: Intensity,
    pub props: Prop,
}

impl PracticeEntry {
    /// Create an entry; the id, display name and colour derive from date and style.
    ///
    /// # Errors
    ///
    /// Returns `TimelineError::ZeroDuration` if `duration` is zero.
    pub fn new(
        date: NaiveDate,
        style: YogaStyle,
        duration: u32,
        focus: Focus,
        intensity: Intensity,
        props: Prop,
    ) -> Result<Self, TimelineError> {
        if duration == 0 {
            return Err(TimelineError::ZeroDuration);
        }
        Ok(Self {
            id: format!("{}-{}", date.format("%Y-%m-%d"), style.as_str()),
            date,
            style,
            type_name: style.display_name().to_owned(),
            color: style.color().to_owned(),
            duration,
            focus,
            intensity,
            props,
        })
    }
}

//
// ─── RANGE ─────────────────────────────────────────────────────────────────────
//

/// Window of days a timeline query covers, counted back from today inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Week,
    Month,
    ThreeMonths,
    #[default]
    All,
}

impl TimeRange {
    #[must_use]
    pub fn days(self) -> Option<u64> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::ThreeMonths => Some(90),
            TimeRange::All => None,
        }
    }

    /// Earliest date included in the window.
    #[must_use]
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        self.days()
            .map(|days| today.checked_sub_days(Days::new(days - 1)).unwrap_or(NaiveDate::MIN))
    }

    #[must_use]
    pub fn contains(self, today: NaiveDate, date: NaiveDate) -> bool {
        self.start(today).is_none_or(|start| date >= start)
    }
}

impl FromStr for TimeRange {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "3months" => Ok(TimeRange::ThreeMonths),
            "all" => Ok(TimeRange::All),
            other => Err(unknown("time range", other)),
        }
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Aggregate statistics over a set of timeline entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub total_practices: u32,
    pub total_minutes: u64,
    pub type_distribution: BTreeMap<YogaStyle, u32>,
    pub average_duration: u32,
    pub longest_streak: u32,
    pub current_streak: u32,
}

impl TimelineSummary {
    /// Summarise `entries` as of `today`.
    ///
    /// The current streak ends today, or yesterday when nothing is logged today.
    #[must_use]
    pub fn from_entries(entries: &[PracticeEntry], today: NaiveDate) -> Self {
        let mut type_distribution: BTreeMap<YogaStyle, u32> =
            YogaStyle::ALL.into_iter().map(|style| (style, 0)).collect();
        let mut total_minutes = 0_u64;
        for entry in entries {
            total_minutes += u64::from(entry.duration);
            *type_distribution.entry(entry.style).or_default() += 1;
        }

        let total_practices = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let average_duration = if entries.is_empty() {
            0
        } else {
            let count = entries.len() as u64;
            u32::try_from((total_minutes + count / 2) / count).unwrap_or(u32::MAX)
        };

        let days: BTreeSet<NaiveDate> = entries.iter().map(|entry| entry.date).collect();

        Self {
            total_practices,
            total_minutes,
            type_distribution,
            average_duration,
            longest_streak: longest_streak(&days),
            current_streak: current_streak(&days, today),
        }
    }
}

fn longest_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &day in days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}
