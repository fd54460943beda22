use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::authentication::{require_admin, AdminAuthError, AdminSecret};
use crate::domain::product::{NewProduct, NewProductBody, Product};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(thiserror::Error)]
pub enum ProductError {
    #[error(transparent)]
    Unauthorized(#[from] AdminAuthError),
    #[error("{0}")]
    Validation(String),
    #[error("No product exists with that slug.")]
    UnknownProduct,
    #[error("A product with that slug already exists.")]
    DuplicateSlug,
    #[error("Something went wrong while reading the catalog.")]
    Store(#[source] sqlx::Error),
}

impl std::fmt::Debug for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for ProductError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProductError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProductError::Validation(_) => StatusCode::BAD_REQUEST,
            ProductError::UnknownProduct => StatusCode::NOT_FOUND,
            ProductError::DuplicateSlug => StatusCode::CONFLICT,
            ProductError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

#[derive(Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

/// Published products, newest first, with optional category/featured filters
/// and offset pagination.
#[tracing::instrument(name = "Listing products", skip(query, db_pool))]
pub async fn list_products(
    query: web::Query<ProductListQuery>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, ProductError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 {
        return Err(ProductError::Validation(String::from(
            "page must be 1 or greater",
        )));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ProductError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let offset = (page - 1) * limit;
    let products = sqlx::query(
        r#"
        SELECT id, slug, name, short_description, description, price, compare_at_price,
               product_type, category, tags, features, is_featured, affiliate_commission,
               status, created_at
        FROM products
        WHERE status = 'published'
          AND ($1::text IS NULL OR category = $1)
          AND ($2::bool IS NULL OR is_featured = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.category)
    .bind(query.featured)
    .bind(limit)
    .bind(offset)
    .map(product_from_row)
    .fetch_all(db_pool.get_ref())
    .await
    .map_err(ProductError::Store)?;

    let total = sqlx::query(
        r#"
        SELECT COUNT(*) AS total
        FROM products
        WHERE status = 'published'
          AND ($1::text IS NULL OR category = $1)
          AND ($2::bool IS NULL OR is_featured = $2)
        "#,
    )
    .bind(&query.category)
    .bind(query.featured)
    .map(|row: PgRow| row.get::<i64, _>("total"))
    .fetch_one(db_pool.get_ref())
    .await
    .map_err(ProductError::Store)?;

    let has_more = total > offset + products.len() as i64;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "products": products,
        "total": total,
        "page": page,
        "limit": limit,
        "has_more": has_more,
    })))
}

#[tracing::instrument(name = "Fetching a product by slug", skip(db_pool))]
pub async fn get_product(
    slug: web::Path<String>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, ProductError> {
    let product = sqlx::query(
        r#"
        SELECT id, slug, name, short_description, description, price, compare_at_price,
               product_type, category, tags, features, is_featured, affiliate_commission,
               status, created_at
        FROM products
        WHERE slug = $1 AND status = 'published'
        "#,
    )
    .bind(slug.as_str())
    .map(product_from_row)
    .fetch_optional(db_pool.get_ref())
    .await
    .map_err(ProductError::Store)?
    .ok_or(ProductError::UnknownProduct)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "product": product,
    })))
}

#[tracing::instrument(
    name = "Creating a product",
    skip(request, body, db_pool, admin_secret)
)]
pub async fn create_product(
    request: HttpRequest,
    body: web::Json<NewProductBody>,
    db_pool: web::Data<PgPool>,
    admin_secret: web::Data<AdminSecret>,
) -> Result<HttpResponse, ProductError> {
    require_admin(&request, &admin_secret)?;

    let new_product: NewProduct = body.0.try_into().map_err(ProductError::Validation)?;
    let product = insert_product(&db_pool, &new_product)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ProductError::DuplicateSlug
            } else {
                ProductError::Store(err)
            }
        })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "product": product,
        "message": "Product created successfully",
    })))
}

#[tracing::instrument(name = "Inserting a product into the database", skip(db_pool, new_product))]
async fn insert_product(db_pool: &PgPool, new_product: &NewProduct) -> Result<Product, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products
            (id, slug, name, short_description, description, price, compare_at_price,
             product_type, category, tags, features, is_featured, affiliate_commission,
             status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'published', $14)
        RETURNING id, slug, name, short_description, description, price, compare_at_price,
                  product_type, category, tags, features, is_featured, affiliate_commission,
                  status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new_product.slug)
    .bind(&new_product.name)
    .bind(&new_product.short_description)
    .bind(&new_product.description)
    .bind(new_product.price)
    .bind(new_product.compare_at_price)
    .bind(&new_product.product_type)
    .bind(&new_product.category)
    .bind(&new_product.tags)
    .bind(&new_product.features)
    .bind(new_product.is_featured)
    .bind(new_product.affiliate_commission)
    .bind(Utc::now())
    .map(product_from_row)
    .fetch_one(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

pub(crate) fn product_from_row(row: PgRow) -> Product {
    Product {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        short_description: row.get("short_description"),
        description: row.get("description"),
        price: row.get("price"),
        compare_at_price: row.get("compare_at_price"),
        product_type: row.get("product_type"),
        category: row.get("category"),
        tags: row.get("tags"),
        features: row.get("features"),
        is_featured: row.get("is_featured"),
        affiliate_commission: row.get("affiliate_commission"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
