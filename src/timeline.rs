// src/timeline.rs
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

pub const BUCKETS: usize = 24;

/// 24 contiguous one-hour buckets covering `[now - 24h, now]`, oldest first.
///
/// Bucket `i` starts at `now - (24 - i)h` and ends where bucket `i + 1`
/// starts; the last bucket is closed at `now`.
#[derive(Debug, Clone)]
pub struct Timeline {
    now: DateTime<Utc>,
    starts: Vec<DateTime<Utc>>,
    labels: Vec<String>,
}

impl Timeline {
    /// Labels use the wall-clock hour of each bucket start in `now`'s zone.
    pub fn new<Tz: TimeZone>(now: DateTime<Tz>) -> Self {
        let mut starts = Vec::with_capacity(BUCKETS);
        let mut labels = Vec::with_capacity(BUCKETS);

        for hours_back in (1..=BUCKETS as i64).rev() {
            let start = now.clone() - Duration::hours(hours_back);
            labels.push(hour_label(start.hour()));
            starts.push(start.with_timezone(&Utc));
        }

        Self {
            now: now.with_timezone(&Utc),
            starts,
            labels,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.starts[0]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Start timestamp of every bucket.
    pub fn boundaries(&self) -> &[DateTime<Utc>] {
        &self.starts
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.now
    }

    /// Index of the bucket holding `at`, or `None` outside the window.
    pub fn bucket_of(&self, at: DateTime<Utc>) -> Option<usize> {
        if !self.contains(at) {
            return None;
        }
        // last start <= at; always exists once the window check passed
        let idx = self.starts.partition_point(|start| *start <= at);
        Some(idx - 1)
    }
}

/// `13` -> `1PM`, `0` -> `12AM`.
pub fn hour_label(hour: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 14, 30, 0).unwrap()
    }

    #[test]
    fn labels_follow_bucket_starts() {
        let timeline = Timeline::new(now());
        assert_eq!(timeline.labels().len(), BUCKETS);
        assert_eq!(timeline.labels()[0], "2PM");
        assert_eq!(timeline.labels()[10], "12AM");
        assert_eq!(timeline.labels()[22], "12PM");
        assert_eq!(timeline.labels()[23], "1PM");
    }

    #[test]
    fn labels_use_the_zone_of_now() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let timeline = Timeline::new(now().with_timezone(&offset));
        assert_eq!(timeline.labels()[23], "3PM");
        assert_eq!(timeline.start(), now() - Duration::hours(24));
    }

    #[test]
    fn hour_labels() {
        assert_eq!(hour_label(0), "12AM");
        assert_eq!(hour_label(1), "1AM");
        assert_eq!(hour_label(11), "11AM");
        assert_eq!(hour_label(12), "12PM");
        assert_eq!(hour_label(23), "11PM");
    }

    fn span(timeline: &Timeline, i: usize) -> (DateTime<Utc>, DateTime<Utc>) {
        let starts = timeline.boundaries();
        (starts[i], starts.get(i + 1).copied().unwrap_or(now()))
    }

    #[test]
    fn buckets_partition_the_window() {
        let timeline = Timeline::new(now());
        assert_eq!(timeline.boundaries().len(), BUCKETS);
        assert_eq!(span(&timeline, 0).0, now() - Duration::hours(24));
        for i in 0..BUCKETS {
            assert_eq!(span(&timeline, i).1 - span(&timeline, i).0, Duration::hours(1));
        }
        assert_eq!(span(&timeline, BUCKETS - 1).1, now());
    }

    #[test]
    fn every_instant_in_window_has_exactly_one_bucket() {
        let timeline = Timeline::new(now());
        let mut at = now() - Duration::hours(24);
        while at <= now() {
            let i = timeline.bucket_of(at).expect("inside window");
            let (start, end) = span(&timeline, i);
            assert!(at >= start);
            assert!(at < end || (i == BUCKETS - 1 && at == end));
            at += Duration::minutes(7);
        }
        assert_eq!(timeline.bucket_of(now()), Some(BUCKETS - 1));
        assert_eq!(timeline.bucket_of(now() - Duration::hours(24)), Some(0));
        assert_eq!(timeline.bucket_of(now() - Duration::hours(1)), Some(BUCKETS - 1));
    }

    #[test]
    fn outside_window_has_no_bucket() {
        let timeline = Timeline::new(now());
        assert_eq!(timeline.bucket_of(now() + Duration::seconds(1)), None);
        assert_eq!(timeline.bucket_of(now() - Duration::hours(25)), None);
    }
}
