use actix_web::{delete, get, http::header, post, put, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::access::{self, dashboard_view};
use crate::bulk::{export_businesses, parse_business_sheet, ImportReport};
use crate::cities;
use crate::clients::checkout::{return_urls, CheckoutClient, CreateCheckoutSessionRequest};
use crate::config::AppConfig;
use crate::database::DatabaseService;
use crate::listing::{apply_filters, ListingFilter};
use crate::models::{
    ApiResponse, AppRole, AssignRoleRequest, Business, BusinessWithReviews, CheckoutRequest,
    CheckoutSession, CityPage, CreateBusinessRequest, CreateQuoteRequest, CreateReviewRequest,
    DashboardSummary, ImportOutcome, OrderStatus, PaymentConfirmation, PricingTier,
    ReviewVerificationRequest, UpdateBusinessRequest,
};
use crate::pricing::{payment_return, PaymentReturnQuery, PricingPlan};

type Error = Box<dyn std::error::Error + Send + Sync>;

fn extract_actor_id(req: &HttpRequest) -> Result<Uuid, String> {
    req.headers()
        .get("X-Actor-Id")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| "Missing or invalid X-Actor-Id header".to_string())
}

fn actor_from_request(req: &HttpRequest) -> Result<Uuid, HttpResponse> {
    extract_actor_id(req)
        .map_err(|err| HttpResponse::BadRequest().json(ApiResponse::<()>::error(err)))
}

/// Turns the role lookup for `actor_id` into the admin gate outcome. The
/// error side is the response to return as-is.
fn admin_gate(actor_id: Uuid, is_admin: Result<bool, Error>) -> Result<Uuid, HttpResponse> {
    match is_admin {
        Ok(true) => Ok(actor_id),
        Ok(false) => Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Admin role required".into()))),
        Err(err) => {
            log::error!("Failed to check admin role: {err:?}");
            Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to check permissions".into())))
        }
    }
}

async fn require_admin(req: &HttpRequest, db: &DatabaseService) -> Result<Uuid, HttpResponse> {
    let actor_id = actor_from_request(req)?;
    admin_gate(actor_id, access::is_admin(db, actor_id).await)
}

/// Owners may act on their own listing; admins on any. `Ok(true)` means the
/// actor is an admin.
fn listing_gate(
    actor_id: Uuid,
    business: &Business,
    is_admin: Result<bool, Error>,
) -> Result<bool, HttpResponse> {
    match is_admin {
        Ok(true) => Ok(true),
        Ok(false) if business.owner_user_id == Some(actor_id) => Ok(false),
        Ok(false) => Err(HttpResponse::Forbidden().json(ApiResponse::<()>::error(
            "Only the listing owner or an admin may do this".into(),
        ))),
        Err(err) => {
            log::error!("Failed to check admin role: {err:?}");
            Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to check permissions".into())))
        }
    }
}

async fn require_owner_or_admin(
    req: &HttpRequest,
    db: &DatabaseService,
    business: &Business,
) -> Result<bool, HttpResponse> {
    let actor_id = actor_from_request(req)?;
    listing_gate(actor_id, business, access::is_admin(db, actor_id).await)
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "acrepair-directory-service",
        "timestamp": chrono::Utc::now()
    }))
}

// ============================================================================
// BUSINESSES
// ============================================================================

#[get("/businesses")]
pub async fn list_businesses(
    db: web::Data<DatabaseService>,
    query: web::Query<ListingFilter>,
) -> impl Responder {
    match db.list_businesses().await {
        Ok(businesses) => {
            HttpResponse::Ok().json(ApiResponse::success(apply_filters(businesses, &query)))
        }
        Err(err) => {
            log::error!("Failed to list businesses: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list businesses".into()))
        }
    }
}

#[post("/businesses")]
pub async fn create_business(
    db: web::Data<DatabaseService>,
    payload: web::Json<CreateBusinessRequest>,
) -> impl Responder {
    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let new_business = body.into_new_business();
    match db.create_business(new_business).await {
        Ok(business) => HttpResponse::Created().json(ApiResponse::success(business)),
        Err(err) => {
            log::error!("Failed to create business: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to create business".into()))
        }
    }
}

#[derive(Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug)]
enum ImportPlan {
    /// Nothing is written: a dry run, or a sheet without a single valid row.
    Preview(ImportOutcome),
    Commit(ImportReport),
}

fn plan_import(body: &str, dry_run: bool) -> Result<ImportPlan, HttpResponse> {
    let report = parse_business_sheet(body).map_err(|err| {
        HttpResponse::BadRequest().json(ApiResponse::<()>::error(err.to_string()))
    })?;

    log::info!(
        "Parsed business sheet: {} rows, {} accepted, {} rejected",
        report.total_rows,
        report.accepted(),
        report.rejected()
    );

    if dry_run || report.records.is_empty() {
        return Ok(ImportPlan::Preview(ImportOutcome {
            committed: false,
            inserted: 0,
            report,
        }));
    }

    Ok(ImportPlan::Commit(report))
}

fn import_commit_response(report: ImportReport, result: Result<u64, Error>) -> HttpResponse {
    match result {
        Ok(inserted) => {
            log::info!("Imported {inserted} businesses");
            HttpResponse::Created().json(ApiResponse::success(ImportOutcome {
                committed: true,
                inserted,
                report,
            }))
        }
        Err(err) => {
            // one failure covers the whole batch; the store's message is shown verbatim
            log::error!("Failed to import businesses: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(format!("Import failed: {err}")))
        }
    }
}

#[post("/businesses/import")]
pub async fn import_businesses(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    query: web::Query<ImportQuery>,
    body: String,
) -> impl Responder {
    if let Err(response) = require_admin(&req, &db).await {
        return response;
    }

    let report = match plan_import(&body, query.dry_run) {
        Ok(ImportPlan::Preview(outcome)) => {
            return HttpResponse::Ok().json(ApiResponse::success(outcome));
        }
        Ok(ImportPlan::Commit(report)) => report,
        Err(response) => return response,
    };

    let result = db.bulk_insert_businesses(&report.records).await;
    import_commit_response(report, result)
}

#[get("/businesses/export")]
pub async fn export_business_sheet(db: web::Data<DatabaseService>) -> impl Responder {
    let businesses = match db.list_businesses().await {
        Ok(businesses) => businesses,
        Err(err) => {
            log::error!("Failed to load businesses for export: {err:?}");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to export businesses".into()));
        }
    };

    match export_businesses(&businesses) {
        Ok(sheet) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"businesses.csv\"",
            ))
            .body(sheet),
        Err(err) => {
            log::error!("Failed to write business sheet: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to export businesses".into()))
        }
    }
}

#[get("/businesses/{business_id}")]
pub async fn get_business(
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    let result = futures_util::try_join!(
        db.get_business(business_id),
        db.list_reviews_for_business(business_id)
    );

    match result {
        Ok((Some(business), reviews)) => {
            HttpResponse::Ok().json(ApiResponse::success(BusinessWithReviews { business, reviews }))
        }
        Ok((None, _)) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Business not found".into()))
        }
        Err(err) => {
            log::error!("Failed to get business: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to get business".into()))
        }
    }
}

#[put("/businesses/{business_id}")]
pub async fn update_business(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
    payload: web::Json<UpdateBusinessRequest>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    let body = payload.into_inner();

    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    let mut existing_business = match db.get_business(business_id).await {
        Ok(Some(business)) => business,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Business not found".into()));
        }
        Err(err) => {
            log::error!("Failed to fetch business: {err:?}");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to load business".into()));
        }
    };

    let by_admin = match require_owner_or_admin(&req, &db, &existing_business).await {
        Ok(by_admin) => by_admin,
        Err(response) => return response,
    };

    body.apply_to_existing(&mut existing_business, by_admin);

    match db.update_business(existing_business).await {
        Ok(updated) => HttpResponse::Ok().json(ApiResponse::success(updated)),
        Err(err) => {
            log::error!("Failed to update business: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to update business".into()))
        }
    }
}

#[delete("/businesses/{business_id}")]
pub async fn delete_business(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
) -> impl Responder {
    if let Err(response) = require_admin(&req, &db).await {
        return response;
    }

    let business_id = business_id.into_inner();
    match db.delete_business(business_id).await {
        Ok(0) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Business not found".into()))
        }
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(err) => {
            log::error!("Failed to delete business: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to delete business".into()))
        }
    }
}

// ============================================================================
// REVIEWS
// ============================================================================

#[get("/businesses/{business_id}/reviews")]
pub async fn list_business_reviews(
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    match db.list_reviews_for_business(business_id).await {
        Ok(reviews) => HttpResponse::Ok().json(ApiResponse::success(reviews)),
        Err(err) => {
            log::error!("Failed to list reviews: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list reviews".into()))
        }
    }
}

#[post("/businesses/{business_id}/reviews")]
pub async fn create_review(
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
    payload: web::Json<CreateReviewRequest>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    let body = payload.into_inner();

    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    match db.get_business(business_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Business not found".into()));
        }
        Err(err) => {
            log::error!("Failed to fetch business: {err:?}");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to create review".into()));
        }
    }

    match db.create_review(body.into_new_review(business_id)).await {
        Ok(review) => HttpResponse::Created().json(ApiResponse::success(review)),
        Err(err) => {
            log::error!("Failed to create review: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to create review".into()))
        }
    }
}

#[derive(Deserialize)]
pub struct ReviewQueueQuery {
    pub verified: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[get("/reviews")]
pub async fn list_reviews(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    query: web::Query<ReviewQueueQuery>,
) -> impl Responder {
    if let Err(response) = require_admin(&req, &db).await {
        return response;
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    match db.list_reviews(query.verified, limit, offset).await {
        Ok(reviews) => HttpResponse::Ok().json(ApiResponse::success(reviews)),
        Err(err) => {
            log::error!("Failed to list review queue: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list reviews".into()))
        }
    }
}

#[put("/reviews/{review_id}/verification")]
pub async fn set_review_verification(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    review_id: web::Path<Uuid>,
    payload: web::Json<ReviewVerificationRequest>,
) -> impl Responder {
    if let Err(response) = require_admin(&req, &db).await {
        return response;
    }

    let review_id = review_id.into_inner();
    match db.set_review_verified(review_id, payload.verified).await {
        Ok(Some(review)) => HttpResponse::Ok().json(ApiResponse::success(review)),
        Ok(None) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Review not found".into()))
        }
        Err(err) => {
            log::error!("Failed to update review verification: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to update review".into()))
        }
    }
}

// ============================================================================
// ROLES & DASHBOARDS
// ============================================================================

#[get("/users/{user_id}/roles")]
pub async fn list_user_roles(
    db: web::Data<DatabaseService>,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    match db.list_roles_for_user(user_id).await {
        Ok(roles) => HttpResponse::Ok().json(ApiResponse::success(roles)),
        Err(err) => {
            log::error!("Failed to list roles: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list roles".into()))
        }
    }
}

#[post("/users/{user_id}/roles")]
pub async fn assign_user_role(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    user_id: web::Path<Uuid>,
    payload: web::Json<AssignRoleRequest>,
) -> impl Responder {
    let actor_id = match require_admin(&req, &db).await {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };

    let user_id = user_id.into_inner();
    match db.assign_role(user_id, payload.role).await {
        Ok(role) => {
            log::info!("User {actor_id} granted {:?} to {user_id}", role.role);
            HttpResponse::Created().json(ApiResponse::success(role))
        }
        Err(err) => {
            log::error!("Failed to assign role: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to assign role".into()))
        }
    }
}

#[delete("/users/{user_id}/roles/{role}")]
pub async fn remove_user_role(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    path: web::Path<(Uuid, AppRole)>,
) -> impl Responder {
    let actor_id = match require_admin(&req, &db).await {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };

    let (user_id, role) = path.into_inner();
    if user_id == actor_id && role == AppRole::Admin {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("Admins cannot revoke their own admin role".into()));
    }

    match db.remove_role(user_id, role).await {
        Ok(0) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Role not assigned".into()))
        }
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(err) => {
            log::error!("Failed to remove role: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to remove role".into()))
        }
    }
}

#[get("/users/{user_id}/dashboard")]
pub async fn get_user_dashboard(
    db: web::Data<DatabaseService>,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    let result = futures_util::try_join!(
        db.list_roles_for_user(user_id),
        db.list_orders_for_user(user_id)
    );

    match result {
        Ok((assignments, orders)) => {
            let roles: Vec<AppRole> = assignments.into_iter().map(|a| a.role).collect();
            HttpResponse::Ok().json(ApiResponse::success(DashboardSummary {
                user_id,
                view: dashboard_view(&roles),
                roles,
                orders,
            }))
        }
        Err(err) => {
            log::error!("Failed to load dashboard: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to load dashboard".into()))
        }
    }
}

// ============================================================================
// PRICING & PAYMENTS
// ============================================================================

#[get("/pricing")]
pub async fn list_pricing() -> impl Responder {
    let plans: Vec<PricingPlan> = PricingTier::ALL.iter().map(|tier| tier.plan()).collect();
    HttpResponse::Ok().json(ApiResponse::success(plans))
}

#[post("/checkout")]
pub async fn create_checkout(
    db: web::Data<DatabaseService>,
    checkout: web::Data<CheckoutClient>,
    config: web::Data<AppConfig>,
    payload: web::Json<CheckoutRequest>,
) -> impl Responder {
    let body = payload.into_inner();

    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    if let Err(message) = body.validate_business_rules() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(message));
    }

    let (success_url, cancel_url) =
        return_urls(&config.public_site_url, body.tier, body.order_type);
    let session_request = CreateCheckoutSessionRequest {
        client_reference_id: body.user_id,
        business_id: body.business_id,
        tier: body.tier,
        order_type: body.order_type,
        amount_cents: body.tier.monthly_price_cents(),
        currency: "usd",
        customer_email: body.customer_email.clone(),
        success_url,
        cancel_url,
    };

    let session = match checkout.create_session(&session_request).await {
        Ok(session) => session,
        Err(err) => {
            log::error!("Failed to create checkout session: {err:?}");
            return HttpResponse::BadGateway()
                .json(ApiResponse::<()>::error("Failed to start checkout".into()));
        }
    };

    match db.create_order(body.into_new_order(session.session_id)).await {
        Ok(order) => HttpResponse::Created().json(ApiResponse::success(CheckoutSession {
            order,
            redirect_url: session.url,
        })),
        Err(err) => {
            log::error!("Failed to record order: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to record order".into()))
        }
    }
}

#[get("/payments/success")]
pub async fn payment_success(
    db: web::Data<DatabaseService>,
    query: web::Query<PaymentReturnQuery>,
) -> impl Responder {
    let payment = match payment_return(&query) {
        Ok(payment) => payment,
        Err(err) => {
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error(err.to_string()));
        }
    };

    let existing = match db.get_order_by_session(&payment.session_id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Order not found".into()));
        }
        Err(err) => {
            log::error!("Failed to load order: {err:?}");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to confirm payment".into()));
        }
    };

    // revisiting the success page must not touch an already active order
    if existing.status == OrderStatus::Active {
        return HttpResponse::Ok().json(ApiResponse::success(PaymentConfirmation {
            payment,
            order: existing,
        }));
    }

    match db
        .update_order_status(&payment.session_id, OrderStatus::Active)
        .await
    {
        Ok(Some(order)) => {
            if order.tier != payment.tier || order.order_type != payment.order_type {
                log::warn!(
                    "Payment return for session {} does not match the stored order",
                    payment.session_id
                );
            }
            HttpResponse::Ok().json(ApiResponse::success(PaymentConfirmation { payment, order }))
        }
        Ok(None) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Order not found".into()))
        }
        Err(err) => {
            log::error!("Failed to confirm payment: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to confirm payment".into()))
        }
    }
}

#[get("/users/{user_id}/orders")]
pub async fn list_user_orders(
    db: web::Data<DatabaseService>,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    let user_id = user_id.into_inner();
    match db.list_orders_for_user(user_id).await {
        Ok(orders) => HttpResponse::Ok().json(ApiResponse::success(orders)),
        Err(err) => {
            log::error!("Failed to list orders: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list orders".into()))
        }
    }
}

// ============================================================================
// QUOTE REQUESTS
// ============================================================================

#[post("/quotes")]
pub async fn create_quote(
    db: web::Data<DatabaseService>,
    payload: web::Json<CreateQuoteRequest>,
) -> impl Responder {
    let body = payload.into_inner();
    if let Err(e) = body.validate() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error(format!("Validation failed: {}", e)));
    }

    match db.create_quote_request(body.into_new_quote()).await {
        Ok(quote) => HttpResponse::Created().json(ApiResponse::success(quote)),
        Err(err) => {
            log::error!("Failed to create quote request: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to submit quote request".into()))
        }
    }
}

#[get("/businesses/{business_id}/quotes")]
pub async fn list_business_quotes(
    req: HttpRequest,
    db: web::Data<DatabaseService>,
    business_id: web::Path<Uuid>,
) -> impl Responder {
    let business_id = business_id.into_inner();
    let business = match db.get_business(business_id).await {
        Ok(Some(business)) => business,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Business not found".into()));
        }
        Err(err) => {
            log::error!("Failed to fetch business: {err:?}");
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list quote requests".into()));
        }
    };

    if let Err(response) = require_owner_or_admin(&req, &db, &business).await {
        return response;
    }

    match db.list_quote_requests_for_business(business_id).await {
        Ok(quotes) => HttpResponse::Ok().json(ApiResponse::success(quotes)),
        Err(err) => {
            log::error!("Failed to list quote requests: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to list quote requests".into()))
        }
    }
}

// ============================================================================
// CITIES
// ============================================================================

#[get("/cities")]
pub async fn list_cities() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(cities::all_cities()))
}

#[get("/cities/{slug}")]
pub async fn get_city_page(
    db: web::Data<DatabaseService>,
    slug: web::Path<String>,
) -> impl Responder {
    let Some(city) = cities::find_by_slug(&slug) else {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error("City not found".into()));
    };

    match db.list_businesses().await {
        Ok(businesses) => {
            let businesses = apply_filters(businesses, &ListingFilter::for_city(city.name));
            HttpResponse::Ok().json(ApiResponse::success(CityPage {
                city: *city,
                businesses,
            }))
        }
        Err(err) => {
            log::error!("Failed to load city page: {err:?}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to load city page".into()))
        }
    }
}

#[get("/zip/{zip}")]
pub async fn lookup_zip(zip: web::Path<String>) -> impl Responder {
    match cities::find_by_zip(&zip) {
        Some(city) => HttpResponse::Ok().json(ApiResponse::success(city)),
        None => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Zip code not served".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    use super::*;

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_list_pricing() {
        let app =
            test::init_service(App::new().service(web::scope("/api/v1").service(list_pricing)))
                .await;
        let req = test::TestRequest::get().uri("/api/v1/pricing").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        let plans = body["data"].as_array().unwrap();
        assert_eq!(plans.len(), 4);
        assert_eq!(plans[0]["tier"], "free");
        assert_eq!(plans[2]["monthly_price_cents"], 7900);
        assert_eq!(plans[3]["name"], "Enterprise");
    }

    #[actix_web::test]
    async fn test_cities_and_zip_lookup() {
        let app = test::init_service(App::new().service(list_cities).service(lookup_zip)).await;

        let req = test::TestRequest::get().uri("/cities").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|city| city["slug"] == "miami-fl"));

        let req = test::TestRequest::get().uri("/zip/33139").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["name"], "Miami Beach");

        let req = test::TestRequest::get().uri("/zip/00000").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_extract_actor_id() {
        let req = test::TestRequest::default()
            .insert_header(("X-Actor-Id", "not-a-uuid"))
            .to_http_request();
        assert!(extract_actor_id(&req).is_err());

        let id = Uuid::new_v4();
        let req = test::TestRequest::default()
            .insert_header(("X-Actor-Id", id.to_string()))
            .to_http_request();
        assert_eq!(extract_actor_id(&req).unwrap(), id);
    }

    async fn json_body(response: HttpResponse) -> Value {
        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn listing(owner: Option<Uuid>) -> Business {
        let now = chrono::Utc::now();
        Business {
            id: Uuid::new_v4(),
            name: "Arctic Air".into(),
            description: None,
            address: "77 Bayshore Blvd".into(),
            city: "Tampa".into(),
            state: "FL".into(),
            zip_code: "33606".into(),
            phone: None,
            email: None,
            website: None,
            services: vec!["AC Repair".into()],
            rating: 4.4,
            review_count: 18,
            featured: false,
            insurance_verified: true,
            license_number: None,
            owner_user_id: owner,
            tier: PricingTier::Basic,
            created_at: now,
            updated_at: now,
        }
    }

    const SHEET: &str = "name,address,city,state,zip\n\
                         Arctic Air,77 Bayshore Blvd,Tampa,FL,33606\n\
                         ,1 Nowhere Ln,Tampa,FL,33606\n";

    #[actix_web::test]
    async fn test_missing_actor_header_is_bad_request() {
        let req = test::TestRequest::default().to_http_request();
        let Err(response) = actor_from_request(&req) else {
            panic!("request without an actor was accepted");
        };

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing or invalid X-Actor-Id header");
    }

    #[actix_web::test]
    async fn test_admin_gate_outcomes() {
        let actor_id = Uuid::new_v4();
        assert_eq!(admin_gate(actor_id, Ok(true)).ok(), Some(actor_id));

        let Err(forbidden) = admin_gate(actor_id, Ok(false)) else {
            panic!("non-admin passed the admin gate");
        };
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(forbidden).await["error"], "Admin role required");

        let Err(failed) = admin_gate(actor_id, Err("connection reset".into())) else {
            panic!("role lookup failure passed the admin gate");
        };
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_listing_gate_separates_owner_from_admin() {
        let owner = Uuid::new_v4();
        let business = listing(Some(owner));

        assert_eq!(listing_gate(owner, &business, Ok(false)).ok(), Some(false));
        assert_eq!(listing_gate(Uuid::new_v4(), &business, Ok(true)).ok(), Some(true));

        let Err(response) = listing_gate(Uuid::new_v4(), &business, Ok(false)) else {
            panic!("stranger passed the listing gate");
        };
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_empty_upload_is_bad_request() {
        let Err(response) = plan_import("", false) else {
            panic!("empty upload was accepted");
        };

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "The uploaded file is empty");
    }

    #[actix_web::test]
    async fn test_dry_run_previews_without_commit() {
        let Ok(ImportPlan::Preview(outcome)) = plan_import(SHEET, true) else {
            panic!("dry run was planned for commit");
        };

        assert!(!outcome.committed);
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.report.accepted(), 1);
        assert_eq!(
            outcome.report.errors,
            vec!["Row 3: Missing required fields (name)"]
        );
    }

    #[actix_web::test]
    async fn test_sheet_without_valid_rows_is_not_committed() {
        let sheet = "name,address,city,state,zip\n,1 Nowhere Ln,Tampa,FL,33606\n";
        let Ok(ImportPlan::Preview(outcome)) = plan_import(sheet, false) else {
            panic!("sheet without valid rows was planned for commit");
        };

        assert!(!outcome.committed);
        assert!(outcome.report.records.is_empty());
        assert_eq!(outcome.report.rejected(), 1);
    }

    #[actix_web::test]
    async fn test_commit_outcomes() {
        let Ok(ImportPlan::Commit(report)) = plan_import(SHEET, false) else {
            panic!("valid sheet was not planned for commit");
        };

        let created = import_commit_response(report.clone(), Ok(1));
        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json_body(created).await;
        assert_eq!(body["data"]["committed"], true);
        assert_eq!(body["data"]["inserted"], 1);

        let failed = import_commit_response(
            report,
            Err("duplicate key value violates unique constraint \"businesses_pkey\"".into()),
        );
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(failed).await["error"],
            "Import failed: duplicate key value violates unique constraint \"businesses_pkey\""
        );
    }
}
