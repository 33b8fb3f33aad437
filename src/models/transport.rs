use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Outbound channel. Email goes to admin and clients; SMS is admin-only and
/// used for booking alerts when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
        }
    }
}

/// Rendered template parameters handed to the send API.
pub type TemplateFields = HashMap<String, String>;

/// Request body for the hosted template-send API.
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: TemplateFields,
}
