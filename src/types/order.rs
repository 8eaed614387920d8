use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum_macros::Display;

use super::swap::SwapAction;

/// Opaque, immutable order identifier assigned by the orderbook
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Orderbooks hand out either numeric or string ids
impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => OrderId(id),
            RawId::Number(id) => OrderId(id.to_string()),
        })
    }
}

/// Order status as computed by the orderbook, relative to the observing user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Matched,
    UserInitiated,
    CounterpartyInitiated,
    UserRedeemed,
    Completed,
    Expired,
    UserRefunded,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Order record streamed by the orderbook. Fields besides `id` and `status` are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "ID")]
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Order {
    pub fn new(id: OrderId, status: OrderStatus) -> Self {
        Self {
            id,
            status,
            details: Map::new(),
        }
    }

    pub fn action(&self) -> Action {
        classify(self.status)
    }
}

/// What the user is expected to do next for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Action {
    NoAction,
    UserCanInitiate,
    UserCanRedeem,
    UserMustRefund,
    Done,
    Refunded,
    Cancelled,
}

impl Action {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Done | Action::Refunded | Action::Cancelled)
    }

    pub fn next_step(&self) -> NextStep {
        match self {
            Action::UserCanInitiate => NextStep::Initiate,
            Action::UserCanRedeem => NextStep::Redeem,
            Action::UserMustRefund => NextStep::Refund,
            Action::NoAction | Action::Done | Action::Refunded | Action::Cancelled => {
                NextStep::None
            }
        }
    }
}

/// The single on-chain step to take for an order, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NextStep {
    Initiate,
    Redeem,
    Refund,
    None,
}

impl NextStep {
    pub fn swap_action(&self) -> Option<SwapAction> {
        match self {
            NextStep::Initiate => Some(SwapAction::Initiate),
            NextStep::Redeem => Some(SwapAction::Redeem),
            NextStep::Refund => Some(SwapAction::Refund),
            NextStep::None => None,
        }
    }
}

pub fn classify(status: OrderStatus) -> Action {
    match status {
        OrderStatus::Created | OrderStatus::UserInitiated | OrderStatus::Unknown => {
            Action::NoAction
        }
        OrderStatus::Matched => Action::UserCanInitiate,
        OrderStatus::CounterpartyInitiated => Action::UserCanRedeem,
        OrderStatus::UserRedeemed | OrderStatus::Completed => Action::Done,
        OrderStatus::Expired => Action::UserMustRefund,
        OrderStatus::UserRefunded => Action::Refunded,
        OrderStatus::Cancelled => Action::Cancelled,
    }
}
