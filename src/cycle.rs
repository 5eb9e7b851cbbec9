//! Which flight to show, and when to move on to the next one.
//!
//! The flight list is re-supplied on every render and may grow or shrink
//! between calls, so the stored index is always reduced modulo the current
//! list length before use.

use serde::Serialize;

/// Rendering phase implied by the number of flights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// No flights: show the loading screen.
    Empty,
    /// One flight: always show it.
    Single,
    /// Two or more: rotate on the cycle interval.
    Cycling,
}

impl CyclePhase {
    pub fn of(flight_count: usize) -> Self {
        match flight_count {
            0 => Self::Empty,
            1 => Self::Single,
            _ => Self::Cycling,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleState {
    current_flight_index: usize,
    last_cycle_ms: u64,
}

impl CycleState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            current_flight_index: 0,
            last_cycle_ms: now_ms,
        }
    }

    pub fn current_flight_index(&self) -> usize {
        self.current_flight_index
    }

    pub fn last_cycle_ms(&self) -> u64 {
        self.last_cycle_ms
    }

    /// Pick the flight to render out of `flight_count`, advancing at most once
    /// if `interval_ms` has passed since the last advance.
    ///
    /// Returns `None` when there are no flights. With exactly one flight the
    /// index is pinned to 0 but the cycle timestamp is left alone, so a list
    /// that later grows may advance on its very first render.
    pub fn select(&mut self, flight_count: usize, now_ms: u64, interval_ms: u64) -> Option<usize> {
        match CyclePhase::of(flight_count) {
            CyclePhase::Empty => None,
            CyclePhase::Single => {
                self.current_flight_index = 0;
                Some(0)
            }
            CyclePhase::Cycling => {
                if now_ms.saturating_sub(self.last_cycle_ms) >= interval_ms {
                    self.last_cycle_ms = now_ms;
                    self.current_flight_index = (self.current_flight_index + 1) % flight_count;
                    tracing::debug!(
                        "Advanced to flight {} of {}",
                        self.current_flight_index + 1,
                        flight_count
                    );
                }
                Some(self.current_flight_index % flight_count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const INTERVAL: u64 = 5000;

    #[rstest]
    #[case(0, CyclePhase::Empty)]
    #[case(1, CyclePhase::Single)]
    #[case(2, CyclePhase::Cycling)]
    #[case(17, CyclePhase::Cycling)]
    fn phase_of_count(#[case] count: usize, #[case] expected: CyclePhase) {
        assert_eq!(CyclePhase::of(count), expected);
    }

    #[test]
    fn empty_list_leaves_state_untouched() {
        let mut state = CycleState::new(100);
        assert_eq!(state.select(0, 999_999, INTERVAL), None);
        assert_eq!(state, CycleState::new(100));
    }

    #[test]
    fn single_flight_never_advances() {
        let mut state = CycleState::new(0);
        for now in [0, 4_999, 5_000, 60_000, 1_000_000] {
            assert_eq!(state.select(1, now, INTERVAL), Some(0));
            assert_eq!(state.current_flight_index(), 0);
        }
        assert_eq!(state.last_cycle_ms(), 0);
    }

    #[test]
    fn cycling_waits_for_the_full_interval() {
        let mut state = CycleState::new(1_000);
        assert_eq!(state.select(3, 1_000, INTERVAL), Some(0));
        assert_eq!(state.select(3, 5_999, INTERVAL), Some(0));
        assert_eq!(state.select(3, 6_000, INTERVAL), Some(1));
        assert_eq!(state.last_cycle_ms(), 6_000);
    }

    #[test]
    fn cycling_advances_at_most_once_per_call() {
        let mut state = CycleState::new(0);
        // Many intervals have elapsed, but one call only moves one step.
        assert_eq!(state.select(4, 50_000, INTERVAL), Some(1));
        assert_eq!(state.select(4, 50_001, INTERVAL), Some(1));
    }

    #[test]
    fn cycling_visits_every_index_in_order_and_wraps() {
        let mut state = CycleState::new(0);
        let mut shown = Vec::new();
        for tick in 1..=7 {
            shown.push(state.select(3, tick * INTERVAL, INTERVAL).unwrap());
        }
        assert_eq!(shown, vec![1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn shrinking_list_is_reduced_modulo_length() {
        let mut state = CycleState::new(0);
        for tick in 1..=4 {
            state.select(5, tick * INTERVAL, INTERVAL);
        }
        assert_eq!(state.current_flight_index(), 4);

        // Same window, fewer flights: no advance, index wraps into range.
        assert_eq!(state.select(3, 4 * INTERVAL + 1, INTERVAL), Some(1));
        assert_eq!(state.current_flight_index(), 4);

        // Next advance is taken modulo the new length.
        assert_eq!(state.select(3, 5 * INTERVAL, INTERVAL), Some(2));
    }

    #[test]
    fn single_phase_keeps_a_stale_timestamp() {
        let mut state = CycleState::new(0);
        // A long stretch with a single flight never refreshes the timestamp...
        state.select(1, 30_000, INTERVAL);
        assert_eq!(state.last_cycle_ms(), 0);

        // ...so the first render after the list grows advances immediately.
        assert_eq!(state.select(2, 30_001, INTERVAL), Some(1));
        assert_eq!(state.last_cycle_ms(), 30_001);
    }

    #[test]
    fn zero_interval_advances_every_call() {
        let mut state = CycleState::new(0);
        assert_eq!(state.select(2, 0, 0), Some(1));
        assert_eq!(state.select(2, 0, 0), Some(0));
    }

    #[test]
    fn clock_going_backwards_does_not_advance() {
        let mut state = CycleState::new(10_000);
        assert_eq!(state.select(2, 5_000, INTERVAL), Some(0));
    }
}
