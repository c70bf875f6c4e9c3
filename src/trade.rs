//! Trade representation produced by the matching engine.
//!
//! A Trade pairs the buy-side and sell-side order identifiers of a match,
//! the price of first contact, and the quantity traded between the two
//! parties over one incoming event (iceberg refills hit by the same taker
//! aggregate into a single record).

use crate::order::{Id, Price, Qty, Side};
use std::fmt;

/// One aggregated execution between a buy order and a sell order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Trade {
    /// Identifier of the buy-side participant.
    pub buy_order_id: Id,
    /// Identifier of the sell-side participant.
    pub sell_order_id: Id,
    /// Price at which the incoming order first hit this counterparty.
    pub price: Price,
    /// Total quantity traded against this counterparty during the event.
    pub quantity: Qty,
}

impl Trade {
    /// Pair an incoming order with the resting counterparty it traded
    /// against, orienting the two identifiers by side.
    pub fn between(
        incoming_side: Side,
        incoming_id: Id,
        resting_id: Id,
        price: Price,
        quantity: Qty,
    ) -> Self {
        match incoming_side {
            Side::Buy => Trade {
                buy_order_id: incoming_id,
                sell_order_id: resting_id,
                price,
                quantity,
            },
            Side::Sell => Trade {
                buy_order_id: resting_id,
                sell_order_id: incoming_id,
                price,
                quantity,
            },
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {} {} {} {}",
            self.buy_order_id, self.sell_order_id, self.price, self.quantity
        )
    }
}
