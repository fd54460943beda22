use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_status::SubscriberStatus;

#[derive(Debug, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub name: SubscriberName,
    pub role: String,
    pub company_size: Option<String>,
    pub use_case: Option<String>,
    pub signup_source: Option<String>,
    pub device_type: Option<String>,
    pub referral_code: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub status: SubscriberStatus,
}
