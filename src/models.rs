use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::access::DashboardView;
use crate::bulk::ImportReport;
use crate::cities::City;
use crate::pricing::PaymentReturn;

// ============================================================================
// ENUMS
// ============================================================================

/// Pricing tier of a listing (this is also a Postgres enum)
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    postgres_types::ToSql,
    postgres_types::FromSql,
)]
#[postgres(name = "pricing_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingTier {
    Free,
    Basic,
    Premium,
    Enterprise,
}

/// Role tag assigned to a user (also a Postgres enum)
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    postgres_types::ToSql,
    postgres_types::FromSql,
)]
#[postgres(name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    Admin,
    Moderator,
    User,
}

/// Billing state mirrored from the payment provider
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    postgres_types::ToSql,
    postgres_types::FromSql,
)]
#[postgres(name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Active,
    Cancelled,
    Failed,
}

/// What an order pays for
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    postgres_types::ToSql,
    postgres_types::FromSql,
)]
#[postgres(name = "order_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Subscription,
    Advertising,
}

// ============================================================================
// BUSINESSES
// ============================================================================

/// Business listing as stored in the directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub services: Vec<String>,
    pub rating: f64,
    pub review_count: i32,
    pub featured: bool,
    pub insurance_verified: bool,
    pub license_number: Option<String>,
    pub owner_user_id: Option<Uuid>,
    pub tier: PricingTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Helper for inserting a new business, from a form or a CSV row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBusiness {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub services: Vec<String>,
    pub rating: f64,
    pub review_count: i32,
    pub featured: bool,
    pub insurance_verified: bool,
    pub license_number: Option<String>,
    pub owner_user_id: Option<Uuid>,
    pub tier: PricingTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// REVIEWS
// ============================================================================

/// End-user review of a business
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub business_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewer_name: String,
    pub user_id: Option<Uuid>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub id: Uuid,
    pub business_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewer_name: String,
    pub user_id: Option<Uuid>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// ROLES
// ============================================================================

/// Role assignment row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: AppRole,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// ORDERS (Subscriptions / Advertising)
// ============================================================================

/// Order mirrored from the billing provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_id: Option<Uuid>,
    pub tier: PricingTier,
    pub order_type: OrderType,
    pub price_cents: i32,
    pub status: OrderStatus,
    pub checkout_session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_id: Option<Uuid>,
    pub tier: PricingTier,
    pub order_type: OrderType,
    pub price_cents: i32,
    pub status: OrderStatus,
    pub checkout_session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// QUOTE REQUESTS
// ============================================================================

/// Lead submitted through a quote or emergency form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: Uuid,
    pub business_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub zip_code: String,
    pub service_type: String,
    pub message: Option<String>,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuoteRequest {
    pub id: Uuid,
    pub business_id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub zip_code: String,
    pub service_type: String,
    pub message: Option<String>,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Payload of the manual "list your business" form
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 3, max = 200))]
    pub address: String,
    #[validate(length(min = 2, max = 80))]
    pub city: String,
    #[validate(length(min = 2, max = 32))]
    pub state: String,
    #[validate(length(min = 3, max = 10))]
    pub zip_code: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[validate(length(max = 64))]
    pub license_number: Option<String>,
    #[serde(default)]
    pub insurance_verified: bool,
    pub owner_user_id: Option<Uuid>,
}

impl CreateBusinessRequest {
    pub fn into_new_business(self) -> NewBusiness {
        let now = Utc::now();
        NewBusiness {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            phone: self.phone,
            email: self.email,
            website: self.website,
            services: self.services,
            rating: 0.0,
            review_count: 0,
            featured: false,
            insurance_verified: self.insurance_verified,
            license_number: self.license_number,
            owner_user_id: self.owner_user_id,
            tier: PricingTier::Free,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner/admin edit form for a listing
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 3, max = 200))]
    pub address: String,
    #[validate(length(min = 2, max = 80))]
    pub city: String,
    #[validate(length(min = 2, max = 32))]
    pub state: String,
    #[validate(length(min = 3, max = 10))]
    pub zip_code: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[validate(length(max = 64))]
    pub license_number: Option<String>,
    pub insurance_verified: bool,
    pub featured: bool,
    pub tier: PricingTier,
}

impl UpdateBusinessRequest {
    /// `tier` and `featured` are paid placement, so only an admin edit may
    /// change them; an owner's edit keeps the stored values.
    pub fn apply_to_existing(&self, existing: &mut Business, by_admin: bool) {
        existing.name = self.name.clone();
        existing.description = self.description.clone();
        existing.address = self.address.clone();
        existing.city = self.city.clone();
        existing.state = self.state.clone();
        existing.zip_code = self.zip_code.clone();
        existing.phone = self.phone.clone();
        existing.email = self.email.clone();
        existing.website = self.website.clone();
        existing.services = self.services.clone();
        existing.license_number = self.license_number.clone();
        existing.insurance_verified = self.insurance_verified;
        if by_admin {
            existing.featured = self.featured;
            existing.tier = self.tier;
        }
        existing.updated_at = Utc::now();
    }
}

/// Review submitted by an end user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub reviewer_name: String,
    pub user_id: Option<Uuid>,
}

impl CreateReviewRequest {
    pub fn into_new_review(self, business_id: Uuid) -> NewReview {
        NewReview {
            id: Uuid::new_v4(),
            business_id,
            rating: self.rating,
            comment: self.comment,
            reviewer_name: self.reviewer_name,
            user_id: self.user_id,
            verified: false,
            created_at: Utc::now(),
        }
    }
}

/// Admin verification toggle
#[derive(Debug, Deserialize)]
pub struct ReviewVerificationRequest {
    pub verified: bool,
}

/// Admin role assignment
#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: AppRole,
}

/// Starts the redirect-based payment handoff
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub business_id: Option<Uuid>,
    pub tier: PricingTier,
    pub order_type: OrderType,
    #[validate(email)]
    pub customer_email: Option<String>,
}

impl CheckoutRequest {
    pub fn validate_business_rules(&self) -> Result<(), String> {
        if self.tier == PricingTier::Free {
            return Err("The free tier does not require checkout".into());
        }

        if self.order_type == OrderType::Advertising && self.business_id.is_none() {
            return Err("Advertising orders must reference a business".into());
        }

        Ok(())
    }

    pub fn into_new_order(&self, checkout_session_id: String) -> NewOrder {
        let now = Utc::now();
        NewOrder {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            business_id: self.business_id,
            tier: self.tier,
            order_type: self.order_type,
            price_cents: self.tier.monthly_price_cents(),
            status: OrderStatus::Pending,
            checkout_session_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Quote / emergency service form
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    pub business_id: Option<Uuid>,
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 10))]
    pub zip_code: String,
    #[validate(length(min = 2, max = 80))]
    pub service_type: String,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    #[serde(default)]
    pub urgent: bool,
}

impl CreateQuoteRequest {
    pub fn into_new_quote(self) -> NewQuoteRequest {
        NewQuoteRequest {
            id: Uuid::new_v4(),
            business_id: self.business_id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            zip_code: self.zip_code,
            service_type: self.service_type,
            message: self.message,
            urgent: self.urgent,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// COMPOSITE RESPONSE TYPES
// ============================================================================

/// Business detail page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessWithReviews {
    pub business: Business,
    pub reviews: Vec<Review>,
}

/// Checkout handoff returned to the client, which redirects to `redirect_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub order: Order,
    pub redirect_url: String,
}

/// Payment-success page payload
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub payment: PaymentReturn,
    pub order: Order,
}

/// Result of a sheet upload
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub committed: bool,
    pub inserted: u64,
    pub report: ImportReport,
}

/// Back-office landing payload
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub user_id: Uuid,
    pub view: DashboardView,
    pub roles: Vec<AppRole>,
    pub orders: Vec<Order>,
}

/// Location landing page payload
#[derive(Debug, Clone, Serialize)]
pub struct CityPage {
    pub city: City,
    pub businesses: Vec<Business>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateBusinessRequest {
        CreateBusinessRequest {
            name: "Cool Breeze HVAC".into(),
            description: None,
            address: "500 Ocean Dr".into(),
            city: "Miami Beach".into(),
            state: "FL".into(),
            zip_code: "33139".into(),
            phone: Some("305-555-0100".into()),
            email: Some("hello@coolbreeze.example".into()),
            website: Some("https://coolbreeze.example".into()),
            services: vec!["AC Repair".into()],
            license_number: None,
            insurance_verified: true,
            owner_user_id: None,
        }
    }

    #[test]
    fn test_create_business_request_validates() {
        assert!(create_request().validate().is_ok());

        let mut bad = create_request();
        bad.email = Some("not-an-email".into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_new_business_starts_on_free_tier_unrated() {
        let business = create_request().into_new_business();
        assert_eq!(business.tier, PricingTier::Free);
        assert_eq!(business.rating, 0.0);
        assert_eq!(business.review_count, 0);
        assert!(!business.featured);
        assert!(business.insurance_verified);
    }

    fn listing() -> Business {
        let now = Utc::now();
        Business {
            id: Uuid::new_v4(),
            name: "Cool Breeze HVAC".into(),
            description: None,
            address: "500 Ocean Dr".into(),
            city: "Miami Beach".into(),
            state: "FL".into(),
            zip_code: "33139".into(),
            phone: None,
            email: None,
            website: None,
            services: vec![],
            rating: 4.0,
            review_count: 3,
            featured: false,
            insurance_verified: false,
            license_number: None,
            owner_user_id: Some(Uuid::new_v4()),
            tier: PricingTier::Basic,
            created_at: now,
            updated_at: now,
        }
    }

    fn upgrade_edit() -> UpdateBusinessRequest {
        UpdateBusinessRequest {
            name: "Cool Breeze Heating & Air".into(),
            description: Some("Family owned".into()),
            address: "500 Ocean Dr".into(),
            city: "Miami Beach".into(),
            state: "FL".into(),
            zip_code: "33139".into(),
            phone: None,
            email: None,
            website: None,
            services: vec!["AC Repair".into()],
            license_number: None,
            insurance_verified: true,
            featured: true,
            tier: PricingTier::Enterprise,
        }
    }

    #[test]
    fn test_owner_edit_keeps_paid_placement() {
        let mut business = listing();
        upgrade_edit().apply_to_existing(&mut business, false);

        assert_eq!(business.name, "Cool Breeze Heating & Air");
        assert!(business.insurance_verified);
        assert_eq!(business.tier, PricingTier::Basic);
        assert!(!business.featured);
    }

    #[test]
    fn test_admin_edit_sets_paid_placement() {
        let mut business = listing();
        upgrade_edit().apply_to_existing(&mut business, true);

        assert_eq!(business.tier, PricingTier::Enterprise);
        assert!(business.featured);
    }

    #[test]
    fn test_review_rating_bounds() {
        let review = CreateReviewRequest {
            rating: 6,
            comment: None,
            reviewer_name: "Ana".into(),
            user_id: None,
        };
        assert!(review.validate().is_err());

        let review = CreateReviewRequest { rating: 5, ..review };
        assert!(review.validate().is_ok());
        assert!(!review.into_new_review(Uuid::new_v4()).verified);
    }

    #[test]
    fn test_checkout_rules() {
        let mut request = CheckoutRequest {
            user_id: Uuid::new_v4(),
            business_id: None,
            tier: PricingTier::Free,
            order_type: OrderType::Subscription,
            customer_email: None,
        };
        assert!(request.validate_business_rules().is_err());

        request.tier = PricingTier::Premium;
        assert!(request.validate_business_rules().is_ok());

        request.order_type = OrderType::Advertising;
        assert!(request.validate_business_rules().is_err());

        request.business_id = Some(Uuid::new_v4());
        assert!(request.validate_business_rules().is_ok());

        let order = request.into_new_order("cs_test_123".into());
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.price_cents, 7900);
    }

    #[test]
    fn test_api_response_envelope() {
        let ok = ApiResponse::success(3);
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));

        let err = ApiResponse::<()>::error("boom".into());
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }
}
