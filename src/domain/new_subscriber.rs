use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
    pub role: String,
    pub company_size: Option<String>,
    pub use_case: Option<String>,
    pub signup_source: Option<String>,
    pub device_type: Option<String>,
}

/// Every field is optional at the wire level so that missing required fields
/// surface as our own validation error body instead of a deserialization
/// failure.
#[derive(Deserialize)]
pub struct NewSubscriberBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub company_size: Option<String>,
    pub use_case: Option<String>,
    pub signup_source: Option<String>,
    pub device_type: Option<String>,
}

impl TryFrom<NewSubscriberBody> for NewSubscriber {
    type Error = String;

    fn try_from(body: NewSubscriberBody) -> Result<Self, Self::Error> {
        let name = SubscriberName::parse(body.name.unwrap_or_default())?;
        let email = SubscriberEmail::parse(body.email.unwrap_or_default())?;
        let role = match body.role {
            Some(role) if !role.trim().is_empty() => role.trim().to_string(),
            _ => return Err(String::from("role is required")),
        };

        Ok(NewSubscriber {
            email,
            name,
            role,
            company_size: none_if_blank(body.company_size),
            use_case: none_if_blank(body.use_case),
            signup_source: none_if_blank(body.signup_source),
            device_type: none_if_blank(body.device_type),
        })
    }
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
