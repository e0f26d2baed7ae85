//! Payment term expansion
//!
//! Turns a recurring term into the dated cash events that fall inside a
//! horizon. Expansion is pure: the same term and horizon always produce the
//! same events, and [`TermSchedule`] is `Clone`, so a schedule can be
//! replayed without touching the term again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentTermId};

use crate::payment_term::{EntityType, PaymentTerm, TermType};

/// One projected occurrence of a payment term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCashEvent {
    pub date: NaiveDate,
    pub amount: Money,
    pub event_type: TermType,
    pub entity_name: String,
    pub entity_type: EntityType,
    /// 1-based position of the occurrence within the term
    pub period_number: u32,
    pub source_term_id: PaymentTermId,
    pub description: Option<String>,
}

/// Lazily generated events of one term within a horizon
#[derive(Debug, Clone)]
pub struct TermSchedule<'a> {
    term: &'a PaymentTerm,
    horizon_start: NaiveDate,
    horizon_end: NaiveDate,
    next: u32,
}

impl<'a> Iterator for TermSchedule<'a> {
    type Item = ProjectedCashEvent;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.term.periods {
            let n = self.next;
            self.next += 1;

            let date = match self.term.recurrence.occurrence(self.term.start_date, n) {
                Some(date) if date <= self.horizon_end => date,
                // Dates only grow with n, so nothing later can qualify
                _ => {
                    self.next = self.term.periods;
                    return None;
                }
            };
            if date < self.horizon_start {
                continue;
            }

            return Some(ProjectedCashEvent {
                date,
                amount: self.term.amount,
                event_type: self.term.term_type,
                entity_name: self.term.entity_name.clone(),
                entity_type: self.term.entity_type,
                period_number: n + 1,
                source_term_id: self.term.id,
                description: self.term.description.clone(),
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.term.periods.saturating_sub(self.next) as usize))
    }
}

/// Events of `term` dated within `[horizon_start, horizon_end]`
///
/// At most `term.periods` events are produced; a term with no periods, or
/// one that starts after the horizon, yields nothing. Term status is not
/// consulted here; callers decide which terms to expand.
pub fn expand(term: &PaymentTerm, horizon_start: NaiveDate, horizon_end: NaiveDate) -> TermSchedule<'_> {
    TermSchedule {
        term,
        horizon_start,
        horizon_end,
        next: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment_term::Recurrence;
    use core_kernel::{Currency, EntityId, OrganizationId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn term(recurrence: Recurrence, periods: u32, start: NaiveDate) -> PaymentTerm {
        PaymentTerm::new(
            OrganizationId::new(),
            TermType::Income,
            EntityType::Client,
            EntityId::new(),
            "Cliente Norte",
            Money::new(dec!(100), Currency::USD),
            start,
            recurrence,
            periods,
        )
    }

    #[test]
    fn test_monthly_three_periods() {
        let t = term(Recurrence::Monthly, 3, date(2025, 1, 1));
        let events: Vec<_> = expand(&t, date(2025, 1, 1), date(2025, 3, 31)).collect();

        let dates: Vec<_> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 2, 1), date(2025, 3, 1)]);
        assert!(events.iter().all(|e| e.amount == Money::new(dec!(100), Currency::USD)));
        assert_eq!(events.iter().map(|e| e.period_number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_horizon_clips_both_ends() {
        let t = term(Recurrence::Weekly, 10, date(2025, 1, 1));
        let events: Vec<_> = expand(&t, date(2025, 1, 10), date(2025, 1, 25)).collect();

        assert_eq!(
            events.iter().map(|e| (e.date, e.period_number)).collect::<Vec<_>>(),
            vec![(date(2025, 1, 15), 3), (date(2025, 1, 22), 4)]
        );
    }

    #[test]
    fn test_empty_cases() {
        let none = term(Recurrence::Monthly, 0, date(2025, 1, 1));
        assert_eq!(expand(&none, date(2025, 1, 1), date(2026, 1, 1)).count(), 0);

        let late = term(Recurrence::Monthly, 12, date(2026, 1, 1));
        assert_eq!(expand(&late, date(2025, 1, 1), date(2025, 12, 31)).count(), 0);
    }

    #[test]
    fn test_schedule_is_restartable() {
        let t = term(Recurrence::Biweekly, 6, date(2025, 3, 3));
        let schedule = expand(&t, date(2025, 3, 1), date(2025, 6, 30));

        let first: Vec<_> = schedule.clone().collect();
        let second: Vec<_> = schedule.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }
}
