use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an order as recorded by the order subsystem.
///
/// The catalog never writes orders; it only reads them to decide whether a
/// purchase counts toward verified reviews and vendor revenue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, awaiting payment or processing.
    Pending,
    /// Payment captured, being prepared.
    Processing,
    /// Handed over to the carrier.
    Shipped,
    /// Received by the buyer.
    Delivered,
    /// Closed out after delivery.
    Completed,
    /// Cancelled before fulfilment.
    Cancelled,
    /// Money returned to the buyer.
    Refunded,
}

impl OrderStatus {
    /// Returns true if the order counts as a finished purchase.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Delivered | Self::Completed)
    }

    /// All possible status values.
    pub const ALL: &'static [OrderStatus] = &[
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Statuses that qualify for verified reviews and revenue.
    pub const COMPLETED: &'static [OrderStatus] = &[Self::Delivered, Self::Completed];

    /// Returns the string stored in the `order.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Column values of [`OrderStatus::COMPLETED`], for `IN (...)` filters.
    pub fn completed_values() -> Vec<&'static str> {
        Self::COMPLETED.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status '{0}'")]
pub struct ParseOrderStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseOrderStatusError(s.to_string()))
    }
}
