//! Consumption dashboard DTOs

use chrono::NaiveDate;
use serde::Deserialize;

use core_kernel::{DateRange, MonthKey, OrganizationId, TemporalError};

/// Query string of `GET /dashboard/consumption`
#[derive(Debug, Deserialize)]
pub struct ConsumptionQuery {
    pub organization_id: OrganizationId,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ConsumptionQuery {
    /// Requested period; missing bounds default to the current month
    pub fn period(&self, today: NaiveDate) -> Result<DateRange, TemporalError> {
        let month = MonthKey::of(today);
        DateRange::new(
            self.start.unwrap_or_else(|| month.first_day()),
            self.end.unwrap_or_else(|| month.last_day()),
        )
    }
}
