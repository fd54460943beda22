use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analytics::{compute_stats, StatsWindow};
use crate::authentication::{require_admin, AdminAuthError, AdminSecret};
use crate::domain::subscriber::Subscriber;
use crate::routes::waitlist::subscriber_from_row;

const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Unauthorized(#[from] AdminAuthError),
    #[error("{0}")]
    Validation(String),
    #[error("No subscriber exists with that id.")]
    UnknownSubscriber,
    #[error("Something went wrong while reading the waitlist.")]
    Store(#[source] sqlx::Error),
}

impl std::fmt::Debug for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AdminError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminError::UnknownSubscriber => StatusCode::NOT_FOUND,
            AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

/// Bulk read for the dashboard: the full subscriber list, newest first, plus
/// a short recent-activity feed.
#[tracing::instrument(name = "Listing all subscribers", skip(request, db_pool, admin_secret))]
pub async fn list_subscribers(
    request: HttpRequest,
    db_pool: web::Data<PgPool>,
    admin_secret: web::Data<AdminSecret>,
) -> Result<HttpResponse, AdminError> {
    require_admin(&request, &admin_secret)?;

    let subscribers = fetch_all_subscribers(&db_pool)
        .await
        .map_err(AdminError::Store)?;
    let recent_activity: Vec<_> = subscribers
        .iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|subscriber| {
            serde_json::json!({
                "name": subscriber.name,
                "email": subscriber.email,
                "subscribed_at": subscriber.subscribed_at,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total": subscribers.len(),
        "subscribers": subscribers,
        "recent_activity": recent_activity,
    })))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub window: Option<String>,
}

/// Recomputes the dashboard summary from scratch over the full record set.
#[tracing::instrument(
    name = "Computing waitlist stats",
    skip(request, query, db_pool, admin_secret)
)]
pub async fn waitlist_stats(
    request: HttpRequest,
    query: web::Query<StatsQuery>,
    db_pool: web::Data<PgPool>,
    admin_secret: web::Data<AdminSecret>,
) -> Result<HttpResponse, AdminError> {
    require_admin(&request, &admin_secret)?;

    let window = match &query.window {
        Some(raw) => StatsWindow::parse(raw).map_err(AdminError::Validation)?,
        None => StatsWindow::default(),
    };
    let subscribers = fetch_all_subscribers(&db_pool)
        .await
        .map_err(AdminError::Store)?;

    let stats = compute_stats(&subscribers, Utc::now(), window);

    Ok(HttpResponse::Ok().json(stats))
}

#[tracing::instrument(name = "Removing a subscriber", skip(request, db_pool, admin_secret))]
pub async fn remove_subscriber(
    request: HttpRequest,
    subscriber_id: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
    admin_secret: web::Data<AdminSecret>,
) -> Result<HttpResponse, AdminError> {
    require_admin(&request, &admin_secret)?;

    let result = sqlx::query("DELETE FROM waitlist_subscribers WHERE id = $1")
        .bind(*subscriber_id)
        .execute(db_pool.get_ref())
        .await
        .map_err(AdminError::Store)?;

    if result.rows_affected() == 0 {
        return Err(AdminError::UnknownSubscriber);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

async fn fetch_all_subscribers(db_pool: &PgPool) -> Result<Vec<Subscriber>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT id, email, name, role, company_size, use_case, signup_source, device_type, referral_code, subscribed_at, status
        FROM waitlist_subscribers
        ORDER BY subscribed_at DESC
        "#,
    )
    .map(subscriber_from_row)
    .fetch_all(db_pool)
    .await
}
