use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Unassigned,
    Taken,
    Success,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Unassigned => "UNASSIGNED",
            OrderStatus::Taken => "TAKEN",
            OrderStatus::Success => "SUCCESS",
        }
    }

    /// The only status this one may move to, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Unassigned => Some(OrderStatus::Taken),
            OrderStatus::Taken => Some(OrderStatus::Success),
            OrderStatus::Success => None,
        }
    }

    pub fn can_advance_to(self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(OrderStatus::Unassigned),
            "TAKEN" => Ok(OrderStatus::Taken),
            "SUCCESS" => Ok(OrderStatus::Success),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub id: i64,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Route distance in meters, fixed at creation.
    pub distance: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to persist a new order. The store assigns the id and the
/// initial status.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance: i64,
}

/// Public view of an order: `{id, distance, status}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: i64,
    pub distance: String,
    pub status: OrderStatus,
}

impl From<&DeliveryOrder> for OrderSummary {
    fn from(order: &DeliveryOrder) -> Self {
        Self {
            id: order.id,
            distance: order.distance.to_string(),
            status: order.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus;

    #[test]
    fn statuses_only_move_forward_one_step() {
        assert!(OrderStatus::Unassigned.can_advance_to(OrderStatus::Taken));
        assert!(OrderStatus::Taken.can_advance_to(OrderStatus::Success));

        assert!(!OrderStatus::Unassigned.can_advance_to(OrderStatus::Success));
        assert!(!OrderStatus::Taken.can_advance_to(OrderStatus::Unassigned));
        assert!(!OrderStatus::Success.can_advance_to(OrderStatus::Taken));
        assert!(!OrderStatus::Success.can_advance_to(OrderStatus::Success));
    }

    #[test]
    fn wire_names_match_storage_names() {
        for status in [OrderStatus::Unassigned, OrderStatus::Taken, OrderStatus::Success] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("taken".parse::<OrderStatus>().is_err());
    }
}
