use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Canonical payment session status. The VOLTXT API grew three spellings for
/// the same terminal condition (`completed`, `paid`, `auto_processed`); they
/// are collapsed to `Completed` at the inbound boundary and only survive in
/// the `from_api` mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Received,
    Partial,
    Completed,
    Expired,
    Overpaid,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Received => "received",
            SessionStatus::Partial => "partial",
            SessionStatus::Completed => "completed",
            SessionStatus::Expired => "expired",
            SessionStatus::Overpaid => "overpaid",
        }
    }

    /// Maps a raw API status value to the canonical status.
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SessionStatus::Pending),
            "payment_received" | "received" => Some(SessionStatus::Received),
            "partial" => Some(SessionStatus::Partial),
            "completed" | "paid" | "auto_processed" => Some(SessionStatus::Completed),
            "expired" => Some(SessionStatus::Expired),
            "overpaid" => Some(SessionStatus::Overpaid),
            _ => None,
        }
    }

    /// Maps a webhook event type to the status it implies.
    pub fn from_event(event_type: &str) -> Option<Self> {
        match event_type {
            "payment_received" => Some(SessionStatus::Received),
            "partial_payment_received" => Some(SessionStatus::Partial),
            "payment_completed" => Some(SessionStatus::Completed),
            "payment_expired" => Some(SessionStatus::Expired),
            "overpayment_detected" => Some(SessionStatus::Overpaid),
            _ => None,
        }
    }

    /// Only `Completed` triggers payment recording.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_success_aliases_collapse_to_completed() {
        for alias in ["completed", "paid", "auto_processed"] {
            let status = SessionStatus::from_api(alias).unwrap();
            assert_eq!(status, SessionStatus::Completed);
            assert!(status.is_terminal_success());
        }
    }

    #[test]
    fn non_terminal_statuses_never_succeed() {
        for raw in ["pending", "partial", "expired"] {
            let status = SessionStatus::from_api(raw).unwrap();
            assert!(!status.is_terminal_success());
        }
    }

    #[test]
    fn event_types_map_to_statuses() {
        assert_eq!(
            SessionStatus::from_event("payment_completed"),
            Some(SessionStatus::Completed)
        );
        assert_eq!(
            SessionStatus::from_event("payment_received"),
            Some(SessionStatus::Received)
        );
        assert_eq!(
            SessionStatus::from_event("partial_payment_received"),
            Some(SessionStatus::Partial)
        );
        assert_eq!(
            SessionStatus::from_event("payment_expired"),
            Some(SessionStatus::Expired)
        );
        assert_eq!(SessionStatus::from_event("unknown_event"), None);
    }
}
