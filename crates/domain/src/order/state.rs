//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of a submitted order.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Confirmed ──► InTransit ──► Delivered
///           │
///           └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Submitted, awaiting the administrator.
    #[default]
    Pending,

    /// Accepted by the administrator.
    Confirmed,

    /// On its way to the customer.
    InTransit,

    /// Handed over (terminal state).
    Delivered,

    /// Rejected by the administrator (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Statuses reachable in one step along the lifecycle graph.
    pub fn next_statuses(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::InTransit],
            OrderStatus::InTransit => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InTransit => "in-transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The sentence sent to the customer when the order enters this status.
    pub fn customer_phrase(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Your order is pending",
            OrderStatus::Confirmed => "Your order has been confirmed",
            OrderStatus::InTransit => "Your order is in transit",
            OrderStatus::Delivered => "Your order has been delivered",
            OrderStatus::Cancelled => "Your order has been cancelled",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "⏳",
            OrderStatus::Confirmed => "✅",
            OrderStatus::InTransit => "🚗",
            OrderStatus::Delivered => "🎉",
            OrderStatus::Cancelled => "❌",
        }
    }

    /// Prefix of the admin button payload that moves an order into this status.
    ///
    /// `Pending` has no button.
    pub fn callback_verb(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some("accept"),
            OrderStatus::InTransit => Some("intransit"),
            OrderStatus::Delivered => Some("delivered"),
            OrderStatus::Cancelled => Some("reject"),
        }
    }

    pub fn from_callback_verb(verb: &str) -> Option<OrderStatus> {
        match verb {
            "accept" => Some(OrderStatus::Confirmed),
            "intransit" => Some(OrderStatus::InTransit),
            "delivered" => Some(OrderStatus::Delivered),
            "reject" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Label of the admin button that moves an order into this status.
    pub fn action_label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "⏳ Pending",
            OrderStatus::Confirmed => "✅ Accept",
            OrderStatus::InTransit => "🚗 In Transit",
            OrderStatus::Delivered => "🎉 Delivered",
            OrderStatus::Cancelled => "❌ Reject",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How strictly status updates follow the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Only edges of the lifecycle graph are accepted.
    #[default]
    Strict,
    /// Any status may be set at any time, including the current one.
    Permissive,
}

impl TransitionPolicy {
    /// Returns true if an order in `from` may be moved to `to`.
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Strict => from.next_statuses().contains(&to),
            TransitionPolicy::Permissive => true,
        }
    }

    /// Statuses offered to the administrator for an order in `from`.
    pub fn next_statuses(&self, from: OrderStatus) -> Vec<OrderStatus> {
        match self {
            TransitionPolicy::Strict => from.next_statuses().to_vec(),
            TransitionPolicy::Permissive => OrderStatus::ALL
                .into_iter()
                .filter(|s| *s != from && s.callback_verb().is_some())
                .collect(),
        }
    }
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            other => Err(format!("unknown transition policy: {other}")),
        }
    }
}
