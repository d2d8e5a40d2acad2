use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::Business;

/// Directory search options, as sent by the listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub search: Option<String>,
    pub service_type: Option<String>,
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub verified_only: bool,
}

impl ListingFilter {
    /// Filter used by a location landing page.
    pub fn for_city(city: &str) -> Self {
        Self {
            city: Some(city.to_string()),
            ..Self::default()
        }
    }

    fn matches_city(&self, business: &Business) -> bool {
        non_empty(&self.city).map_or(true, |city| business.city.trim().eq_ignore_ascii_case(city))
    }

    fn matches_search(&self, business: &Business) -> bool {
        let Some(term) = non_empty(&self.search) else {
            return true;
        };
        let term = term.to_lowercase();

        business.name.to_lowercase().contains(&term)
            || business.city.to_lowercase().contains(&term)
            || business.zip_code.to_lowercase().contains(&term)
            || business
                .services
                .iter()
                .any(|service| service.to_lowercase().contains(&term))
    }

    fn matches_service(&self, business: &Business) -> bool {
        let Some(service_type) = non_empty(&self.service_type) else {
            return true;
        };
        business
            .services
            .iter()
            .any(|service| service.trim().eq_ignore_ascii_case(service_type))
    }

    fn matches_rating(&self, business: &Business) -> bool {
        self.min_rating.map_or(true, |min| business.rating >= min)
    }

    fn matches_verified(&self, business: &Business) -> bool {
        !self.verified_only || business.insurance_verified
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Applies the filter passes in order, then sorts featured first and by
/// rating, highest first.
pub fn apply_filters(businesses: Vec<Business>, filter: &ListingFilter) -> Vec<Business> {
    let mut result: Vec<Business> = businesses
        .into_iter()
        .filter(|b| filter.matches_city(b))
        .filter(|b| filter.matches_search(b))
        .filter(|b| filter.matches_service(b))
        .filter(|b| filter.matches_rating(b))
        .filter(|b| filter.matches_verified(b))
        .collect();

    sort_listings(&mut result);
    result
}

pub fn sort_listings(businesses: &mut [Business]) {
    businesses.sort_by(|a, b| {
        b.featured.cmp(&a.featured).then_with(|| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
        })
    });
}
