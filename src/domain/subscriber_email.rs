use validator::validate_email;

#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Emails are stored lowercased so the store's uniqueness constraint is
    /// effectively case-insensitive. A dot in the domain part is required:
    /// `a@b` passes the HTML5 shape `validate_email` checks but is not a
    /// deliverable address.
    pub fn parse(email: String) -> Result<SubscriberEmail, String> {
        let email = email.trim().to_lowercase();
        let has_tld = email
            .rsplit_once('@')
            .map(|(_, domain)| domain.contains('.'))
            .unwrap_or(false);

        if !validate_email(&email) || !has_tld {
            return Err(format!("{} is not a valid email address", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
