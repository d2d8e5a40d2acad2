use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::models::{
    AppRole, Business, NewBusiness, NewOrder, NewQuoteRequest, NewReview, Order, OrderStatus,
    QuoteRequest, Review, UserRole,
};
use crate::pricing::listing_upgrade;

type Error = Box<dyn std::error::Error + Send + Sync>;

pub type DbPool = Pool;

const INSERT_BUSINESS_SQL: &str = r#"
    INSERT INTO businesses (
        id, name, description, address, city, state, zip_code, phone, email,
        website, services, rating, review_count, featured, insurance_verified,
        license_number, owner_user_id, tier, created_at, updated_at
    )
    VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
        $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
    )
    RETURNING *
"#;

pub struct DatabaseService {
    pool: DbPool,
}

impl DatabaseService {
    pub async fn new(database_url: &str) -> Result<Self, Error> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        let client = pool.get().await?;
        client.execute("SELECT 1", &[]).await?;

        log::info!("Database connection established");
        Ok(Self { pool })
    }

    pub async fn get_client(&self) -> Result<deadpool_postgres::Client, Error> {
        Ok(self.pool.get().await?)
    }

    // ========================================================================
    // BUSINESSES
    // ========================================================================

    pub async fn create_business(&self, business: NewBusiness) -> Result<Business, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                INSERT_BUSINESS_SQL,
                &[
                    &business.id,
                    &business.name,
                    &business.description,
                    &business.address,
                    &business.city,
                    &business.state,
                    &business.zip_code,
                    &business.phone,
                    &business.email,
                    &business.website,
                    &business.services,
                    &business.rating,
                    &business.review_count,
                    &business.featured,
                    &business.insurance_verified,
                    &business.license_number,
                    &business.owner_user_id,
                    &business.tier,
                    &business.created_at,
                    &business.updated_at,
                ],
            )
            .await?;

        Ok(row_to_business(&row))
    }

    /// Inserts every row in one transaction: either the whole batch lands or
    /// none of it does.
    pub async fn bulk_insert_businesses(&self, businesses: &[NewBusiness]) -> Result<u64, Error> {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;
        let statement = tx.prepare(INSERT_BUSINESS_SQL).await?;

        let mut inserted = 0;
        for business in businesses {
            inserted += tx
                .execute(
                    &statement,
                    &[
                        &business.id,
                        &business.name,
                        &business.description,
                        &business.address,
                        &business.city,
                        &business.state,
                        &business.zip_code,
                        &business.phone,
                        &business.email,
                        &business.website,
                        &business.services,
                        &business.rating,
                        &business.review_count,
                        &business.featured,
                        &business.insurance_verified,
                        &business.license_number,
                        &business.owner_user_id,
                        &business.tier,
                        &business.created_at,
                        &business.updated_at,
                    ],
                )
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn get_business(&self, business_id: Uuid) -> Result<Option<Business>, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_opt("SELECT * FROM businesses WHERE id = $1", &[&business_id])
            .await?;

        Ok(row.map(|r| row_to_business(&r)))
    }

    pub async fn list_businesses(&self) -> Result<Vec<Business>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                "SELECT * FROM businesses ORDER BY featured DESC, rating DESC, name ASC",
                &[],
            )
            .await?;

        Ok(rows.iter().map(row_to_business).collect())
    }

    pub async fn update_business(&self, business: Business) -> Result<Business, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                r#"
                UPDATE businesses
                SET name = $2, description = $3, address = $4, city = $5, state = $6,
                    zip_code = $7, phone = $8, email = $9, website = $10, services = $11,
                    featured = $12, insurance_verified = $13, license_number = $14,
                    tier = $15, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
                &[
                    &business.id,
                    &business.name,
                    &business.description,
                    &business.address,
                    &business.city,
                    &business.state,
                    &business.zip_code,
                    &business.phone,
                    &business.email,
                    &business.website,
                    &business.services,
                    &business.featured,
                    &business.insurance_verified,
                    &business.license_number,
                    &business.tier,
                ],
            )
            .await?;

        Ok(row_to_business(&row))
    }

    pub async fn delete_business(&self, business_id: Uuid) -> Result<u64, Error> {
        let client = self.get_client().await?;
        let deleted = client
            .execute("DELETE FROM businesses WHERE id = $1", &[&business_id])
            .await?;
        Ok(deleted)
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    pub async fn create_review(&self, review: NewReview) -> Result<Review, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO reviews (
                    id, business_id, rating, comment, reviewer_name, user_id, verified, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
                &[
                    &review.id,
                    &review.business_id,
                    &review.rating,
                    &review.comment,
                    &review.reviewer_name,
                    &review.user_id,
                    &review.verified,
                    &review.created_at,
                ],
            )
            .await?;

        Ok(row_to_review(&row))
    }

    pub async fn list_reviews_for_business(&self, business_id: Uuid) -> Result<Vec<Review>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                "SELECT * FROM reviews WHERE business_id = $1 ORDER BY created_at DESC",
                &[&business_id],
            )
            .await?;

        Ok(rows.iter().map(row_to_review).collect())
    }

    /// Review moderation queue; `verified = None` lists everything.
    pub async fn list_reviews(
        &self,
        verified: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                r#"
                SELECT * FROM reviews
                WHERE ($1::BOOLEAN IS NULL OR verified = $1)
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
                &[&verified, &limit, &offset],
            )
            .await?;

        Ok(rows.iter().map(row_to_review).collect())
    }

    pub async fn set_review_verified(
        &self,
        review_id: Uuid,
        verified: bool,
    ) -> Result<Option<Review>, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_opt(
                "UPDATE reviews SET verified = $2 WHERE id = $1 RETURNING *",
                &[&review_id, &verified],
            )
            .await?;

        Ok(row.map(|r| row_to_review(&r)))
    }

    // ========================================================================
    // ROLES
    // ========================================================================

    pub async fn list_roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                "SELECT * FROM user_roles WHERE user_id = $1 ORDER BY created_at ASC",
                &[&user_id],
            )
            .await?;

        Ok(rows.iter().map(row_to_user_role).collect())
    }

    pub async fn assign_role(&self, user_id: Uuid, role: AppRole) -> Result<UserRole, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO user_roles (id, user_id, role, created_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (user_id, role) DO UPDATE SET role = EXCLUDED.role
                RETURNING *
                "#,
                &[&Uuid::new_v4(), &user_id, &role],
            )
            .await?;

        Ok(row_to_user_role(&row))
    }

    pub async fn remove_role(&self, user_id: Uuid, role: AppRole) -> Result<u64, Error> {
        let client = self.get_client().await?;
        let removed = client
            .execute(
                "DELETE FROM user_roles WHERE user_id = $1 AND role = $2",
                &[&user_id, &role],
            )
            .await?;
        Ok(removed)
    }

    pub async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
                &[&user_id, &role],
            )
            .await?;
        Ok(row.get(0))
    }

    // ========================================================================
    // ORDERS
    // ========================================================================

    pub async fn create_order(&self, order: NewOrder) -> Result<Order, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO orders (
                    id, user_id, business_id, tier, order_type, price_cents, status,
                    checkout_session_id, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
                &[
                    &order.id,
                    &order.user_id,
                    &order.business_id,
                    &order.tier,
                    &order.order_type,
                    &order.price_cents,
                    &order.status,
                    &order.checkout_session_id,
                    &order.created_at,
                    &order.updated_at,
                ],
            )
            .await?;

        Ok(row_to_order(&row))
    }

    pub async fn get_order_by_session(&self, session_id: &str) -> Result<Option<Order>, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_opt(
                "SELECT * FROM orders WHERE checkout_session_id = $1",
                &[&session_id],
            )
            .await?;

        Ok(row.map(|r| row_to_order(&r)))
    }

    /// Updates an order by its checkout session. When the order becomes
    /// active, its listing takes the purchased tier in the same transaction.
    pub async fn update_order_status(
        &self,
        session_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, Error> {
        let mut client = self.get_client().await?;
        let tx = client.transaction().await?;

        let Some(row) = tx
            .query_opt(
                r#"
                UPDATE orders SET status = $2, updated_at = NOW()
                WHERE checkout_session_id = $1
                RETURNING *
                "#,
                &[&session_id, &status],
            )
            .await?
        else {
            return Ok(None);
        };
        let order = row_to_order(&row);

        if let Some(upgrade) = listing_upgrade(&order) {
            tx.execute(
                r#"
                UPDATE businesses
                SET tier = $2, featured = featured OR $3, updated_at = NOW()
                WHERE id = $1
                "#,
                &[&upgrade.business_id, &upgrade.tier, &upgrade.featured],
            )
            .await?;
            log::info!(
                "Business {} moved to {:?} by order {}",
                upgrade.business_id,
                upgrade.tier,
                order.id
            );
        }

        tx.commit().await?;
        Ok(Some(order))
    }

    pub async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
                &[&user_id],
            )
            .await?;

        Ok(rows.iter().map(row_to_order).collect())
    }

    // ========================================================================
    // QUOTE REQUESTS
    // ========================================================================

    pub async fn create_quote_request(
        &self,
        quote: NewQuoteRequest,
    ) -> Result<QuoteRequest, Error> {
        let client = self.get_client().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO quote_requests (
                    id, business_id, name, phone, email, zip_code, service_type, message,
                    urgent, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
                &[
                    &quote.id,
                    &quote.business_id,
                    &quote.name,
                    &quote.phone,
                    &quote.email,
                    &quote.zip_code,
                    &quote.service_type,
                    &quote.message,
                    &quote.urgent,
                    &quote.created_at,
                ],
            )
            .await?;

        Ok(row_to_quote_request(&row))
    }

    pub async fn list_quote_requests_for_business(
        &self,
        business_id: Uuid,
    ) -> Result<Vec<QuoteRequest>, Error> {
        let client = self.get_client().await?;
        let rows = client
            .query(
                r#"
                SELECT * FROM quote_requests
                WHERE business_id = $1
                ORDER BY urgent DESC, created_at DESC
                "#,
                &[&business_id],
            )
            .await?;

        Ok(rows.iter().map(row_to_quote_request).collect())
    }
}

// Row mapping functions
fn row_to_business(row: &tokio_postgres::Row) -> Business {
    Business {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        address: row.get("address"),
        city: row.get("city"),
        state: row.get("state"),
        zip_code: row.get("zip_code"),
        phone: row.get("phone"),
        email: row.get("email"),
        website: row.get("website"),
        services: row.get("services"),
        rating: row.get("rating"),
        review_count: row.get("review_count"),
        featured: row.get("featured"),
        insurance_verified: row.get("insurance_verified"),
        license_number: row.get("license_number"),
        owner_user_id: row.get("owner_user_id"),
        tier: row.get("tier"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_review(row: &tokio_postgres::Row) -> Review {
    Review {
        id: row.get("id"),
        business_id: row.get("business_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        reviewer_name: row.get("reviewer_name"),
        user_id: row.get("user_id"),
        verified: row.get("verified"),
        created_at: row.get("created_at"),
    }
}

fn row_to_user_role(row: &tokio_postgres::Row) -> UserRole {
    UserRole {
        id: row.get("id"),
        user_id: row.get("user_id"),
        role: row.get("role"),
        created_at: row.get("created_at"),
    }
}

fn row_to_order(row: &tokio_postgres::Row) -> Order {
    Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        business_id: row.get("business_id"),
        tier: row.get("tier"),
        order_type: row.get("order_type"),
        price_cents: row.get("price_cents"),
        status: row.get("status"),
        checkout_session_id: row.get("checkout_session_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_quote_request(row: &tokio_postgres::Row) -> QuoteRequest {
    QuoteRequest {
        id: row.get("id"),
        business_id: row.get("business_id"),
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        zip_code: row.get("zip_code"),
        service_type: row.get("service_type"),
        message: row.get("message"),
        urgent: row.get("urgent"),
        created_at: row.get("created_at"),
    }
}
