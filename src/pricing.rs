use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Order, OrderStatus, OrderType, PricingTier};

/// Features a listing can unlock by tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    FeaturedPlacement,
    LeadNotifications,
    VerifiedBadge,
    AnalyticsDashboard,
    MultipleLocations,
}

/// Public description of a tier for the pricing page.
#[derive(Debug, Clone, Serialize)]
pub struct PricingPlan {
    pub tier: PricingTier,
    pub name: &'static str,
    pub monthly_price_cents: i32,
    pub max_photos: u32,
    pub max_service_areas: u32,
    pub features: Vec<Feature>,
}

impl PricingTier {
    pub const ALL: [PricingTier; 4] = [
        PricingTier::Free,
        PricingTier::Basic,
        PricingTier::Premium,
        PricingTier::Enterprise,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            PricingTier::Free => "Free",
            PricingTier::Basic => "Basic",
            PricingTier::Premium => "Premium",
            PricingTier::Enterprise => "Enterprise",
        }
    }

    pub fn monthly_price_cents(self) -> i32 {
        match self {
            PricingTier::Free => 0,
            PricingTier::Basic => 2900,
            PricingTier::Premium => 7900,
            PricingTier::Enterprise => 19900,
        }
    }

    pub fn max_photos(self) -> u32 {
        match self {
            PricingTier::Free => 1,
            PricingTier::Basic => 5,
            PricingTier::Premium => 20,
            PricingTier::Enterprise => 100,
        }
    }

    pub fn max_service_areas(self) -> u32 {
        match self {
            PricingTier::Free => 1,
            PricingTier::Basic => 3,
            PricingTier::Premium => 10,
            PricingTier::Enterprise => 50,
        }
    }

    pub fn allows(self, feature: Feature) -> bool {
        match feature {
            Feature::VerifiedBadge | Feature::LeadNotifications => self != PricingTier::Free,
            Feature::FeaturedPlacement | Feature::AnalyticsDashboard => {
                matches!(self, PricingTier::Premium | PricingTier::Enterprise)
            }
            Feature::MultipleLocations => self == PricingTier::Enterprise,
        }
    }

    pub fn plan(self) -> PricingPlan {
        const FEATURES: [Feature; 5] = [
            Feature::FeaturedPlacement,
            Feature::LeadNotifications,
            Feature::VerifiedBadge,
            Feature::AnalyticsDashboard,
            Feature::MultipleLocations,
        ];

        PricingPlan {
            tier: self,
            name: self.display_name(),
            monthly_price_cents: self.monthly_price_cents(),
            max_photos: self.max_photos(),
            max_service_areas: self.max_service_areas(),
            features: FEATURES.into_iter().filter(|f| self.allows(*f)).collect(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentReturnError {
    #[error("Missing '{0}' in payment return URL")]
    Missing(&'static str),
    #[error("Unknown pricing tier '{0}'")]
    UnknownTier(String),
    #[error("Unknown order type '{0}'")]
    UnknownOrderType(String),
}

impl FromStr for PricingTier {
    type Err = PaymentReturnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PricingTier::Free),
            "basic" => Ok(PricingTier::Basic),
            "premium" => Ok(PricingTier::Premium),
            "enterprise" => Ok(PricingTier::Enterprise),
            _ => Err(PaymentReturnError::UnknownTier(s.to_string())),
        }
    }
}

impl FromStr for OrderType {
    type Err = PaymentReturnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subscription" => Ok(OrderType::Subscription),
            "advertising" => Ok(OrderType::Advertising),
            _ => Err(PaymentReturnError::UnknownOrderType(s.to_string())),
        }
    }
}

/// Raw query string of the payment-success page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentReturnQuery {
    pub tier: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub session_id: Option<String>,
}

/// Parsed payment-success return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentReturn {
    pub tier: PricingTier,
    pub order_type: OrderType,
    pub session_id: String,
}

pub fn payment_return(query: &PaymentReturnQuery) -> Result<PaymentReturn, PaymentReturnError> {
    fn required<'a>(
        value: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, PaymentReturnError> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(PaymentReturnError::Missing(name))
    }

    Ok(PaymentReturn {
        tier: required(&query.tier, "tier")?.parse()?,
        order_type: required(&query.order_type, "type")?.parse()?,
        session_id: required(&query.session_id, "session_id")?.to_string(),
    })
}

/// Placement a paid order grants to the listing it was bought for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingUpgrade {
    pub business_id: Uuid,
    pub tier: PricingTier,
    pub featured: bool,
}

/// Only an active order tied to a business changes a listing.
pub fn listing_upgrade(order: &Order) -> Option<ListingUpgrade> {
    if order.status != OrderStatus::Active {
        return None;
    }

    order.business_id.map(|business_id| ListingUpgrade {
        business_id,
        tier: order.tier,
        featured: order.tier.allows(Feature::FeaturedPlacement),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_gating() {
        assert!(!PricingTier::Free.allows(Feature::LeadNotifications));
        assert!(PricingTier::Basic.allows(Feature::VerifiedBadge));
        assert!(!PricingTier::Basic.allows(Feature::FeaturedPlacement));
        assert!(PricingTier::Premium.allows(Feature::FeaturedPlacement));
        assert!(!PricingTier::Premium.allows(Feature::MultipleLocations));
        assert!(PricingTier::Enterprise.allows(Feature::MultipleLocations));
    }

    #[test]
    fn test_plans_grow_with_tier() {
        let plans: Vec<PricingPlan> = PricingTier::ALL.iter().map(|t| t.plan()).collect();
        assert!(plans[0].features.is_empty());
        assert_eq!(plans[3].features.len(), 5);
        for pair in plans.windows(2) {
            assert!(pair[0].monthly_price_cents < pair[1].monthly_price_cents);
            assert!(pair[0].max_photos < pair[1].max_photos);
        }
    }

    #[test]
    fn test_payment_return_parses() {
        let query = PaymentReturnQuery {
            tier: Some("Premium".into()),
            order_type: Some("subscription".into()),
            session_id: Some("cs_test_abc".into()),
        };
        assert_eq!(
            payment_return(&query).unwrap(),
            PaymentReturn {
                tier: PricingTier::Premium,
                order_type: OrderType::Subscription,
                session_id: "cs_test_abc".into(),
            }
        );
    }

    #[test]
    fn test_payment_return_errors() {
        let mut query = PaymentReturnQuery {
            tier: Some("gold".into()),
            order_type: Some("advertising".into()),
            session_id: None,
        };
        assert_eq!(
            payment_return(&query).unwrap_err(),
            PaymentReturnError::UnknownTier("gold".into())
        );

        query.tier = Some("basic".into());
        assert_eq!(
            payment_return(&query).unwrap_err(),
            PaymentReturnError::Missing("session_id")
        );

        query.session_id = Some("cs_1".into());
        query.order_type = Some("".into());
        assert_eq!(
            payment_return(&query).unwrap_err(),
            PaymentReturnError::Missing("type")
        );
    }

    fn order(business_id: Option<Uuid>, tier: PricingTier, status: OrderStatus) -> Order {
        let now = chrono::Utc::now();
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            business_id,
            tier,
            order_type: OrderType::Subscription,
            price_cents: tier.monthly_price_cents(),
            status,
            checkout_session_id: "cs_test_upgrade".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_active_order_upgrades_its_listing() {
        let business_id = Uuid::new_v4();
        let premium = order(Some(business_id), PricingTier::Premium, OrderStatus::Active);
        assert_eq!(
            listing_upgrade(&premium),
            Some(ListingUpgrade {
                business_id,
                tier: PricingTier::Premium,
                featured: true,
            })
        );

        let basic = order(Some(business_id), PricingTier::Basic, OrderStatus::Active);
        assert_eq!(listing_upgrade(&basic).map(|u| u.featured), Some(false));
    }

    #[test]
    fn test_pending_or_unattached_orders_change_nothing() {
        let business_id = Some(Uuid::new_v4());
        let pending = order(business_id, PricingTier::Enterprise, OrderStatus::Pending);
        assert!(listing_upgrade(&pending).is_none());

        let unattached = order(None, PricingTier::Enterprise, OrderStatus::Active);
        assert!(listing_upgrade(&unattached).is_none());
    }
}
