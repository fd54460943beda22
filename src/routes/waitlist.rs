use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::new_subscriber::{NewSubscriber, NewSubscriberBody};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_status::SubscriberStatus;
use crate::email_client::EmailClient;
use crate::startup::WaitlistCapacity;

const REFERRAL_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERRAL_CODE_LENGTH: usize = 8;

#[derive(thiserror::Error)]
pub enum WaitlistError {
    #[error("{0}")]
    Validation(String),
    #[error("That email is already on the waitlist.")]
    DuplicateEmail,
    #[error("Something went wrong while handling the signup.")]
    Store(#[source] sqlx::Error),
}

impl std::fmt::Debug for WaitlistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for WaitlistError {
    fn status_code(&self) -> StatusCode {
        match self {
            WaitlistError::Validation(_) => StatusCode::BAD_REQUEST,
            WaitlistError::DuplicateEmail => StatusCode::CONFLICT,
            WaitlistError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

#[tracing::instrument(
    name = "Adding a new waitlist signup",
    skip(body, db_pool, email_client),
    fields(
        subscriber_email = tracing::field::Empty,
        subscriber_name = tracing::field::Empty,
    )
)]
pub async fn join_waitlist(
    body: web::Json<NewSubscriberBody>,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, WaitlistError> {
    let new_subscriber: NewSubscriber =
        body.0.try_into().map_err(WaitlistError::Validation)?;

    tracing::Span::current()
        .record("subscriber_email", new_subscriber.email.as_ref())
        .record("subscriber_name", new_subscriber.name.as_ref());

    // Friendlier error path only. The existence check is not atomic with the
    // insert, so the unique constraint stays the source of truth and its
    // violation is mapped to the same conflict below.
    if subscriber_exists(&db_pool, &new_subscriber.email)
        .await
        .map_err(WaitlistError::Store)?
    {
        return Err(WaitlistError::DuplicateEmail);
    }

    let subscriber = insert_subscriber(&db_pool, &new_subscriber)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                WaitlistError::DuplicateEmail
            } else {
                WaitlistError::Store(err)
            }
        })?;

    // Fire-and-forget: a failed welcome email never fails the signup.
    if let Err(err) = send_welcome_email(&email_client, &subscriber).await {
        tracing::warn!(
            "Failed to send the welcome email to {}: {:?}",
            subscriber.email.as_ref(),
            err
        );
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Successfully added to the waitlist!",
        "data": subscriber,
    })))
}

#[derive(Deserialize)]
pub struct WaitlistQuery {
    pub email: Option<String>,
}

/// Read path: an existence lookup when an email is supplied, otherwise a
/// lightweight counter for polling. Never a bulk export.
#[tracing::instrument(name = "Waitlist status lookup", skip(query, db_pool, capacity))]
pub async fn waitlist_status(
    query: web::Query<WaitlistQuery>,
    db_pool: web::Data<PgPool>,
    capacity: web::Data<WaitlistCapacity>,
) -> Result<HttpResponse, WaitlistError> {
    match &query.email {
        Some(raw_email) => {
            let email =
                SubscriberEmail::parse(raw_email.clone()).map_err(WaitlistError::Validation)?;
            let preview = find_subscriber(&db_pool, &email)
                .await
                .map_err(WaitlistError::Store)?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "exists": preview.is_some(),
                "data": preview,
            })))
        }
        None => {
            let total = count_subscribers(&db_pool)
                .await
                .map_err(WaitlistError::Store)?;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "total_subscribers": total,
                "remaining_spots": (capacity.0 - total).max(0),
            })))
        }
    }
}

#[derive(serde::Serialize)]
struct SubscriberPreview {
    email: SubscriberEmail,
    name: SubscriberName,
    status: SubscriberStatus,
    subscribed_at: chrono::DateTime<Utc>,
}

#[tracing::instrument(name = "Checking whether an email is already subscribed", skip(db_pool))]
async fn subscriber_exists(db_pool: &PgPool, email: &SubscriberEmail) -> Result<bool, sqlx::Error> {
    let existing = sqlx::query("SELECT id FROM waitlist_subscribers WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(db_pool)
        .await?;

    Ok(existing.is_some())
}

#[tracing::instrument(
    name = "Inserting a new subscriber into the database",
    skip(db_pool, new_subscriber)
)]
async fn insert_subscriber(
    db_pool: &PgPool,
    new_subscriber: &NewSubscriber,
) -> Result<Subscriber, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO waitlist_subscribers
            (id, email, name, role, company_size, use_case, signup_source, device_type, referral_code, subscribed_at, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'confirmed')
        RETURNING id, email, name, role, company_size, use_case, signup_source, device_type, referral_code, subscribed_at, status
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.name.as_ref())
    .bind(&new_subscriber.role)
    .bind(&new_subscriber.company_size)
    .bind(&new_subscriber.use_case)
    .bind(&new_subscriber.signup_source)
    .bind(&new_subscriber.device_type)
    .bind(generate_referral_code())
    .bind(Utc::now())
    .map(subscriber_from_row)
    .fetch_one(db_pool)
    .await
    .map_err(|err| {
        tracing::error!("Failed to execute query: {:?}", err);
        err
    })
}

#[tracing::instrument(name = "Looking up a subscriber by email", skip(db_pool))]
async fn find_subscriber(
    db_pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<Option<SubscriberPreview>, sqlx::Error> {
    sqlx::query(
        "SELECT email, name, status, subscribed_at FROM waitlist_subscribers WHERE email = $1",
    )
    .bind(email.as_ref())
    .map(|row: PgRow| SubscriberPreview {
        email: SubscriberEmail::parse(row.get("email")).unwrap(),
        name: SubscriberName::parse(row.get("name")).unwrap(),
        status: SubscriberStatus::parse(row.get("status")).unwrap(),
        subscribed_at: row.get("subscribed_at"),
    })
    .fetch_optional(db_pool)
    .await
}

async fn count_subscribers(db_pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query("SELECT COUNT(*) AS total FROM waitlist_subscribers")
        .map(|row: PgRow| row.get::<i64, _>("total"))
        .fetch_one(db_pool)
        .await
}

pub(crate) fn subscriber_from_row(row: PgRow) -> Subscriber {
    Subscriber {
        id: row.get("id"),
        email: SubscriberEmail::parse(row.get("email")).unwrap(),
        name: SubscriberName::parse(row.get("name")).unwrap(),
        role: row.get("role"),
        company_size: row.get("company_size"),
        use_case: row.get("use_case"),
        signup_source: row.get("signup_source"),
        device_type: row.get("device_type"),
        referral_code: row.get("referral_code"),
        subscribed_at: row.get("subscribed_at"),
        status: SubscriberStatus::parse(row.get("status")).unwrap(),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[tracing::instrument(
    name = "Sending the welcome email to a new subscriber",
    skip(email_client, subscriber)
)]
async fn send_welcome_email(
    email_client: &EmailClient,
    subscriber: &Subscriber,
) -> Result<(), reqwest::Error> {
    let name = subscriber.name.as_ref();
    let html_body = format!(
        r#"
            <div>
                <h1>You're on the list!</h1>
                <p>Hi <strong>{}</strong>,</p>
                <p>Thank you for joining the waitlist.</p>
                <p>We'll notify you as soon as early access becomes available.</p>
            </div>
        "#,
        name
    );
    let text_body = format!(
        "Hi {},\n\nThank you for joining the waitlist.\n\nWe'll notify you as soon as early access becomes available.",
        name
    );

    email_client
        .send_email(
            &subscriber.email,
            "You're on the waitlist!",
            html_body.as_str(),
            text_body.as_str(),
        )
        .await
}

fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();

    (0..REFERRAL_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..REFERRAL_CODE_CHARSET.len());
            REFERRAL_CODE_CHARSET[idx] as char
        })
        .collect()
}
