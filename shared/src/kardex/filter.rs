//! Read-side narrowing of a movement sequence by kind and date window.
//!
//! Filters operate on the already-reconstructed sequence so running balances
//! stay correct: balances are computed over the full history, then narrowed
//! for presentation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use super::reconstruct::LedgerLine;
use crate::models::{MovementKind, StockMovement};

/// Movement-kind filter; `All` leaves the sequence unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Increase,
    Decrease,
}

impl KindFilter {
    pub fn matches(&self, kind: MovementKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Increase => kind == MovementKind::Increase,
            KindFilter::Decrease => kind == MovementKind::Decrease,
        }
    }
}

/// Calendar-day window over movement timestamps.
///
/// `from` is the inclusive start of its day (00:00 UTC); `to` is inclusive
/// as a date — the window extends up to, and excludes, the start of the
/// following day. An absent bound means no constraint on that side.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if at < from.and_time(NaiveTime::MIN).and_utc() {
                return false;
            }
        }
        if let Some(to) = self.to {
            match to.succ_opt() {
                Some(next_day) => {
                    if at >= next_day.and_time(NaiveTime::MIN).and_utc() {
                        return false;
                    }
                }
                // `to` is the last representable date; nothing lies beyond it.
                None => {}
            }
        }
        true
    }
}

/// Narrow a raw movement sequence. Filters compose by AND.
pub fn filter_movements(
    movements: Vec<StockMovement>,
    kind: KindFilter,
    window: DateWindow,
) -> Vec<StockMovement> {
    movements
        .into_iter()
        .filter(|m| kind.matches(m.kind) && window.contains(m.created_at))
        .collect()
}

/// Narrow a reconstructed kardex sequence. Filters compose by AND.
pub fn filter_lines(lines: Vec<LedgerLine>, kind: KindFilter, window: DateWindow) -> Vec<LedgerLine> {
    lines
        .into_iter()
        .filter(|l| kind.matches(l.movement.kind) && window.contains(l.movement.created_at))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_window_contains_everything() {
        assert!(DateWindow::default().contains(at(2024, 1, 2, 15)));
    }

    #[test]
    fn from_is_inclusive_start_of_day() {
        let window = DateWindow {
            from: Some(date(2024, 1, 2)),
            to: None,
        };
        assert!(window.contains(at(2024, 1, 2, 0)));
        assert!(!window.contains(at(2024, 1, 1, 23)));
    }

    #[test]
    fn to_covers_the_whole_day() {
        let window = DateWindow {
            from: None,
            to: Some(date(2024, 1, 2)),
        };
        assert!(window.contains(at(2024, 1, 2, 23)));
        assert!(!window.contains(at(2024, 1, 3, 0)));
    }

    #[test]
    fn single_day_window() {
        let window = DateWindow {
            from: Some(date(2024, 1, 2)),
            to: Some(date(2024, 1, 2)),
        };
        assert!(window.contains(at(2024, 1, 2, 12)));
        assert!(!window.contains(at(2024, 1, 1, 12)));
        assert!(!window.contains(at(2024, 1, 5, 12)));
    }
}
