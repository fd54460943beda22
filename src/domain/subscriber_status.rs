/// Lifecycle tag set at creation. The ingestion path always writes
/// `Confirmed`; the other states are advanced by operators outside this
/// service, so no transitions are implemented here.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Pending,
    Confirmed,
    Verified,
    Active,
}

impl SubscriberStatus {
    pub fn parse(status: String) -> Result<SubscriberStatus, String> {
        match status.as_str() {
            "pending" => Ok(SubscriberStatus::Pending),
            "confirmed" => Ok(SubscriberStatus::Confirmed),
            "verified" => Ok(SubscriberStatus::Verified),
            "active" => Ok(SubscriberStatus::Active),
            _ => Err(format!("{} is not a valid subscriber status", status)),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubscriberStatus::Confirmed)
    }
}

impl AsRef<str> for SubscriberStatus {
    fn as_ref(&self) -> &str {
        match self {
            SubscriberStatus::Pending => "pending",
            SubscriberStatus::Confirmed => "confirmed",
            SubscriberStatus::Verified => "verified",
            SubscriberStatus::Active => "active",
        }
    }
}
