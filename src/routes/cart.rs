use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A cart line, denormalized from the product at add time and stored in a
/// per-session Redis hash keyed by product id.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct AddCartItemBody {
    pub product_id: Uuid,
    pub quantity: Option<u32>,
}

#[derive(thiserror::Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(String),
    #[error("No published product exists with that id.")]
    UnknownProduct,
    #[error("That product is not in the cart.")]
    UnknownItem,
    #[error("Something went wrong while reading the catalog.")]
    Store(#[source] sqlx::Error),
    #[error("Something went wrong while updating the cart.")]
    Cache(#[source] redis::RedisError),
    #[error("Something went wrong while encoding the cart.")]
    Encoding(#[from] serde_json::Error),
}

impl std::fmt::Debug for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for CartError {
    fn status_code(&self) -> StatusCode {
        match self {
            CartError::Validation(_) => StatusCode::BAD_REQUEST,
            CartError::UnknownProduct | CartError::UnknownItem => StatusCode::NOT_FOUND,
            CartError::Store(_) | CartError::Cache(_) | CartError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

#[tracing::instrument(
    name = "Adding an item to a session cart",
    skip(body, db_pool, redis_client),
    fields(product_id = %body.product_id)
)]
pub async fn add_cart_item(
    session_id: web::Path<String>,
    body: web::Json<AddCartItemBody>,
    db_pool: web::Data<PgPool>,
    redis_client: web::Data<redis::Client>,
) -> Result<HttpResponse, CartError> {
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(CartError::Validation(String::from(
            "quantity must be 1 or greater",
        )));
    }

    let (name, price) = find_published_product(&db_pool, body.product_id)
        .await
        .map_err(CartError::Store)?
        .ok_or(CartError::UnknownProduct)?;

    let mut redis_conn = redis_client
        .get_tokio_connection()
        .await
        .map_err(CartError::Cache)?;
    let key = cart_key(&session_id);
    let field = body.product_id.to_string();

    let existing: Option<String> = redis::cmd("HGET")
        .arg(&key)
        .arg(&field)
        .query_async(&mut redis_conn)
        .await
        .map_err(CartError::Cache)?;

    let item = match existing {
        Some(raw) => {
            let mut item: CartItem = serde_json::from_str(&raw)?;
            item.quantity += quantity;
            item
        }
        None => CartItem {
            product_id: body.product_id,
            name,
            price,
            quantity,
        },
    };

    redis::cmd("HSET")
        .arg(&key)
        .arg(&field)
        .arg(serde_json::to_string(&item)?)
        .query_async::<_, ()>(&mut redis_conn)
        .await
        .map_err(CartError::Cache)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "item": item,
    })))
}

#[tracing::instrument(name = "Reading a session cart", skip(redis_client))]
pub async fn get_cart(
    session_id: web::Path<String>,
    redis_client: web::Data<redis::Client>,
) -> Result<HttpResponse, CartError> {
    let mut redis_conn = redis_client
        .get_tokio_connection()
        .await
        .map_err(CartError::Cache)?;

    let entries: std::collections::HashMap<String, String> = redis::cmd("HGETALL")
        .arg(cart_key(&session_id))
        .query_async(&mut redis_conn)
        .await
        .map_err(CartError::Cache)?;

    let mut items = Vec::with_capacity(entries.len());
    for raw in entries.into_values() {
        let item: CartItem = serde_json::from_str(&raw)?;
        items.push(item);
    }
    items.sort_by_key(|item| item.product_id);

    let total: f64 = items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "items": items,
        "total": total,
    })))
}

#[tracing::instrument(name = "Removing an item from a session cart", skip(redis_client))]
pub async fn remove_cart_item(
    path: web::Path<(String, Uuid)>,
    redis_client: web::Data<redis::Client>,
) -> Result<HttpResponse, CartError> {
    let (session_id, product_id) = path.into_inner();
    let mut redis_conn = redis_client
        .get_tokio_connection()
        .await
        .map_err(CartError::Cache)?;

    let removed: i64 = redis::cmd("HDEL")
        .arg(cart_key(&session_id))
        .arg(product_id.to_string())
        .query_async(&mut redis_conn)
        .await
        .map_err(CartError::Cache)?;

    if removed == 0 {
        return Err(CartError::UnknownItem);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

async fn find_published_product(
    db_pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<(String, f64)>, sqlx::Error> {
    sqlx::query("SELECT name, price FROM products WHERE id = $1 AND status = 'published'")
        .bind(product_id)
        .map(|row: PgRow| (row.get("name"), row.get("price")))
        .fetch_optional(db_pool)
        .await
}

fn cart_key(session_id: &str) -> String {
    format!("cart:{}", session_id)
}
