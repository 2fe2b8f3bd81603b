use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::info;
use wellness_core::model::{
    Focus, Intensity, PracticeEntry, Prop, TimeRange, TimelineSummary, UserId, YogaStyle,
};

use storage::repository::TimelineRepository;

use crate::Clock;
use crate::error::TimelineServiceError;

/// Chance that a synthetic day holds a single practice rather than two.
const SINGLE_PRACTICE_ODDS: f64 = 0.7;

/// Practice sessions of a user, filtered and summarised.
#[derive(Clone)]
pub struct TimelineService {
    clock: Clock,
    timeline: Arc<dyn TimelineRepository>,
}

impl TimelineService {
    #[must_use]
    pub fn new(clock: Clock, timeline: Arc<dyn TimelineRepository>) -> Self {
        Self { clock, timeline }
    }

    /// Entries inside `range` (newest first) and their summary.
    ///
    /// # Errors
    ///
    /// Returns `TimelineServiceError::Storage` if the entries cannot be read.
    pub async fn list(
        &self,
        user_id: UserId,
        range: TimeRange,
    ) -> Result<(Vec<PracticeEntry>, TimelineSummary), TimelineServiceError> {
        let today = self.clock.today();
        let entries = self
            .timeline
            .list_entries(user_id, range.start(today))
            .await?;
        let summary = TimelineSummary::from_entries(&entries, today);
        Ok((entries, summary))
    }

    /// Overwrite the user's timeline.
    ///
    /// # Errors
    ///
    /// Returns `TimelineServiceError::Storage` on duplicate ids or backend failure.
    pub async fn replace(
        &self,
        user_id: UserId,
        entries: &[PracticeEntry],
    ) -> Result<(), TimelineServiceError> {
        self.timeline.replace_entries(user_id, entries).await?;
        info!(user = %user_id, entries = entries.len(), "replaced practice timeline");
        Ok(())
    }
}

/// Generate plausible practice history for the `days` days ending today.
///
/// Each day gets one or two sessions of distinct styles; the first is always
/// kept, the second only with its style's frequency.
#[must_use]
pub fn synthesize_entries<R: Rng + ?Sized>(
    rng: &mut R,
    today: NaiveDate,
    days: u32,
) -> Vec<PracticeEntry> {
    let mut entries = Vec::new();
    for offset in (0..days).rev() {
        let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            continue;
        };
        entries.extend(synthesize_day(rng, date));
    }
    entries
}

fn synthesize_day<R: Rng + ?Sized>(rng: &mut R, date: NaiveDate) -> Vec<PracticeEntry> {
    let count = if rng.random_bool(SINGLE_PRACTICE_ODDS) { 1 } else { 2 };
    let mut styles = YogaStyle::ALL;
    styles.shuffle(rng);

    let mut day = Vec::with_capacity(count);
    for (slot, style) in styles.into_iter().take(count).enumerate() {
        if slot > 0 && !rng.random_bool(style.frequency()) {
            continue;
        }
        let duration = rng.random_range(style.minute_range());
        let focus = *Focus::ALL.choose(rng).unwrap_or(&Focus::Strength);
        let intensity = *Intensity::ALL.choose(rng).unwrap_or(&Intensity::Moderate);
        let props = *Prop::ALL.choose(rng).unwrap_or(&Prop::Mat);
        if let Ok(entry) = PracticeEntry::new(date, style, duration, focus, intensity, props) {
            day.push(entry);
        }
    }
    day
}
