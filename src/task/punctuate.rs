use std::time::Duration;

use crate::stream::Timestamp;

/// Converts a duration to stream-time milliseconds, saturating at the
/// largest timestamp.
pub fn millis(d: Duration) -> Timestamp {
    Timestamp::try_from(d.as_millis()).unwrap_or(Timestamp::MAX)
}

/// Task-local logical clock: the largest record timestamp seen so far.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamTime {
    current: Option<Timestamp>,
}

impl StreamTime {
    /// Moves the clock forward to `ts`. Late records never move it back.
    pub fn advance(&mut self, ts: Timestamp) -> Timestamp {
        let now = self.current.map_or(ts, |current| current.max(ts));
        self.current = Some(now);
        now
    }

    pub fn now(&self) -> Option<Timestamp> {
        self.current
    }
}

/// Schedules a recurring callback on stream time.
///
/// The schedule is anchored at the first observed stream time and fires
/// whenever stream time reaches the next boundary of a fixed grid. Boundaries
/// skipped by a large jump fire once, not once per boundary. Without input
/// the clock does not move and nothing fires.
#[derive(Debug, Clone)]
pub struct Punctuator {
    interval: Timestamp,
    next: Option<Timestamp>,
}

impl Punctuator {
    pub fn new(interval: Duration) -> Self {
        Punctuator {
            interval: millis(interval).max(1),
            next: None,
        }
    }

    /// Returns the punctuation time if a punctuation is due at `stream_time`.
    pub fn poll(&mut self, stream_time: Timestamp) -> Option<Timestamp> {
        let next = match self.next {
            None => {
                self.next = Some(stream_time.saturating_add(self.interval));
                return None;
            }
            Some(next) => next,
        };
        if stream_time < next {
            return None;
        }
        let missed = stream_time.saturating_sub(next) / self.interval;
        let skip = missed.saturating_add(1).saturating_mul(self.interval);
        self.next = Some(next.saturating_add(skip));
        Some(stream_time)
    }

    pub fn next_due(&self) -> Option<Timestamp> {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_time_never_goes_back() {
        let mut t = StreamTime::default();
        assert_eq!(t.now(), None);
        assert_eq!(t.advance(20), 20);
        assert_eq!(t.advance(10), 20);
        assert_eq!(t.advance(30), 30);
    }

    #[test]
    fn first_observation_only_anchors() {
        let mut p = Punctuator::new(Duration::from_secs(2));
        assert_eq!(p.poll(10), None);
        assert_eq!(p.next_due(), Some(2010));
        assert_eq!(p.poll(2009), None);
        assert_eq!(p.poll(2010), Some(2010));
        assert_eq!(p.next_due(), Some(4010));
    }

    #[test]
    fn large_jump_fires_once() {
        let mut p = Punctuator::new(Duration::from_secs(2));
        p.poll(0);
        assert_eq!(p.poll(6001), Some(6001));
        assert_eq!(p.next_due(), Some(8000));
        assert_eq!(p.poll(6002), None);
    }

    #[test]
    fn huge_durations_saturate() {
        assert_eq!(millis(Duration::MAX), Timestamp::MAX);
        assert_eq!(millis(Duration::from_millis(1500)), 1500);

        let mut p = Punctuator::new(Duration::MAX);
        assert_eq!(p.poll(10), None);
        assert_eq!(p.next_due(), Some(Timestamp::MAX));
        assert_eq!(p.poll(1_000_000_000), None);
    }

    #[test]
    fn jump_to_end_of_time_does_not_overflow() {
        let mut p = Punctuator::new(Duration::from_secs(2));
        p.poll(0);
        assert_eq!(p.poll(Timestamp::MAX), Some(Timestamp::MAX));
        assert_eq!(p.next_due(), Some(Timestamp::MAX));
    }
}
