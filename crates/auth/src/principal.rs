use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RawClaims;
use crate::claims::names;

/// Default ERP actor when a token carries no usable user name.
pub const DEFAULT_ERP_USER: &str = "axservices";

/// Who is calling, as far as the ERP and the logs are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: Option<String>,
    /// ERP actor for writes.
    pub username: String,
}

impl Identity {
    /// Resolve the user name through `preferred_username`, `username`,
    /// `name`, `sub`, then `default_user`.
    pub fn from_claims(raw: &RawClaims, default_user: &str) -> Self {
        let subject = string_claim(raw, names::SUBJECT);

        let username = [names::PREFERRED_USERNAME, names::USERNAME, names::NAME]
            .into_iter()
            .find_map(|claim| string_claim(raw, claim))
            .or_else(|| subject.clone())
            .unwrap_or_else(|| default_user.to_string());

        Self { subject, username }
    }
}

fn string_claim(raw: &RawClaims, name: &str) -> Option<String> {
    raw.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
