//! Cash-flow projection DTOs

use std::str::FromStr;

use serde::Deserialize;
use validator::Validate;

use core_kernel::{Currency, OrganizationId};
use domain_cashflow::{EntityType, ProjectionFilters, TermType};

use crate::error::ApiError;

/// Query string of `GET /cashflow/projection`
///
/// Filter codes stay raw strings here and are parsed by [`Self::filters`].
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectionQuery {
    pub organization_id: OrganizationId,
    #[validate(range(min = 1, max = 120))]
    pub months_ahead: Option<u32>,
    #[serde(rename = "type")]
    #[validate(length(max = 16))]
    pub event_type: Option<String>,
    #[validate(length(max = 16))]
    pub entity_type: Option<String>,
    #[validate(length(max = 16))]
    pub currency: Option<String>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

impl ProjectionQuery {
    pub fn filters(&self) -> Result<ProjectionFilters, ApiError> {
        let currency = self
            .currency
            .as_deref()
            .map(Currency::from_str)
            .transpose()
            .map_err(|e| ApiError::Validation {
                kind: "InvalidCurrency",
                message: e.to_string(),
                remaining: None,
            })?;

        Ok(ProjectionFilters {
            event_type: parse_code::<TermType>(self.event_type.as_deref())?,
            entity_type: parse_code::<EntityType>(self.entity_type.as_deref())?,
            currency,
            search: self.search.clone(),
        })
    }
}

fn parse_code<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = String>,
{
    raw.map(T::from_str).transpose().map_err(ApiError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ProjectionQuery {
        ProjectionQuery {
            organization_id: OrganizationId::new(),
            months_ahead: None,
            event_type: None,
            entity_type: None,
            currency: None,
            search: None,
        }
    }

    #[test]
    fn test_filters_parse_codes() {
        let filters = ProjectionQuery {
            event_type: Some("expense".into()),
            entity_type: Some("PROVIDER".into()),
            currency: Some("eur".into()),
            ..query()
        }
        .filters()
        .unwrap();

        assert_eq!(filters.event_type, Some(TermType::Expense));
        assert_eq!(filters.entity_type, Some(EntityType::Provider));
        assert_eq!(filters.currency, Some(Currency::EUR));
    }

    #[test]
    fn test_unknown_codes_rejected() {
        let currency = ProjectionQuery {
            currency: Some("GBP".into()),
            ..query()
        }
        .filters();
        assert!(matches!(
            currency,
            Err(ApiError::Validation { kind: "InvalidCurrency", .. })
        ));

        let event_type = ProjectionQuery {
            event_type: Some("REFUND".into()),
            ..query()
        }
        .filters();
        assert!(matches!(event_type, Err(ApiError::BadRequest(_))));
    }
}
