//! Status enums for orders, payments and account verification.

use serde::{Deserialize, Serialize};

/// Order status as reported by the backend.
///
/// Anything other than `pending` or `completed` is shown as cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    #[serde(other)]
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Stable identifier used for styling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Outcome reported by the payment gateway when it sends the buyer back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Failure,
    Pending,
}

impl PaymentOutcome {
    /// Page title for the return page.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Success => "Payment successful",
            Self::Failure => "Payment failed",
            Self::Pending => "Payment pending",
        }
    }

    /// Whether the buyer's cart should be emptied once this outcome is shown.
    #[must_use]
    pub const fn clears_cart(self) -> bool {
        matches!(self, Self::Success | Self::Pending)
    }
}

/// Result of following an email verification link.
///
/// The backend redirects to `/verify-email?status=...`; unrecognised values
/// map to [`VerificationStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerificationStatus {
    Success,
    Invalid,
    Expired,
    Error,
    #[default]
    Unknown,
}

impl VerificationStatus {
    /// Parse the `status` query parameter.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("success") => Self::Success,
            Some("invalid") => Self::Invalid,
            Some("expired") => Self::Expired,
            Some("error") => Self::Error,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values() {
        let status: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, OrderStatus::Completed);
        let status: OrderStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, OrderStatus::Pending);
    }

    #[test]
    fn test_order_status_unknown_reads_as_cancelled() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(status.label(), "Cancelled");
    }

    #[test]
    fn test_payment_outcome_clears_cart() {
        assert!(PaymentOutcome::Success.clears_cart());
        assert!(PaymentOutcome::Pending.clears_cart());
        assert!(!PaymentOutcome::Failure.clears_cart());
    }

    #[test]
    fn test_verification_status_from_query() {
        assert_eq!(
            VerificationStatus::from_query(Some("success")),
            VerificationStatus::Success
        );
        assert_eq!(
            VerificationStatus::from_query(Some("expired")),
            VerificationStatus::Expired
        );
        assert_eq!(
            VerificationStatus::from_query(Some("bogus")),
            VerificationStatus::Unknown
        );
        assert_eq!(VerificationStatus::from_query(None), VerificationStatus::Unknown);
    }
}
