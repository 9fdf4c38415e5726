use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// VOLTXT exposes two payment flows with different endpoints and fields:
/// session-based dynamic payments and the older invoice-number flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFamily {
    Dynamic,
    Traditional,
}

impl PaymentFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFamily::Dynamic => "dynamic",
            PaymentFamily::Traditional => "traditional",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "dynamic" => Some(PaymentFamily::Dynamic),
            "traditional" => Some(PaymentFamily::Traditional),
            _ => None,
        }
    }
}

impl Display for PaymentFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
