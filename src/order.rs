use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "B"),
            Side::Sell => write!(f, "S"),
        }
    }
}

pub type Id = u32;
pub type Price = u32; // ticks
pub type Qty = u32;

/// A limit order. Iceberg orders share the same representation; a
/// `peak_size` of zero denotes a plain limit order, a positive `peak_size`
/// bounds the visible slice of an iceberg.
///
/// `visible_qty` carries the full quantity until the order rests; the book
/// splits it into visible and hidden parts at rest time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Id,
    pub side: Side,
    pub price: Price,
    pub visible_qty: Qty,
    pub hidden_qty: Qty,
    pub peak_size: Qty,
}

impl Order {
    pub fn limit(id: Id, side: Side, price: Price, quantity: Qty) -> Self {
        Order {
            id,
            side,
            price,
            visible_qty: quantity,
            hidden_qty: 0,
            peak_size: 0,
        }
    }

    pub fn iceberg(id: Id, side: Side, price: Price, quantity: Qty, peak_size: Qty) -> Self {
        Order {
            id,
            side,
            price,
            visible_qty: quantity,
            hidden_qty: 0,
            peak_size,
        }
    }

    pub fn remaining(&self) -> Qty {
        self.visible_qty + self.hidden_qty
    }
}

pub mod book;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_orders_have_no_peak() {
        let o = Order::limit(1, Side::Buy, 100, 10);
        assert_eq!(o.peak_size, 0, "plain limit must carry peak_size 0");
        assert_eq!(o.remaining(), 10);
    }

    #[test]
    fn iceberg_quantity_is_all_visible_until_resting() {
        let o = Order::iceberg(2, Side::Sell, 100, 50, 10);
        assert_eq!(
            o.visible_qty, 50,
            "incoming iceberg exposes its full quantity to matching"
        );
        assert_eq!(o.hidden_qty, 0);
        assert_eq!(o.remaining(), 50);
    }

    #[test]
    fn sides_format_as_single_letters() {
        assert_eq!(Side::Buy.to_string(), "B");
        assert_eq!(Side::Sell.to_string(), "S");
    }
}
