//! Price/time-priority limit order book with iceberg replenishment.
//!
//! Resting orders live in a slab arena and are linked into per-price FIFO
//! queues through intrusive prev/next indexes, so a queue slot can be
//! unlinked or spliced to the back without disturbing handles to other
//! slots. Each side keeps a map of price levels plus a binary-heap ladder
//! over the populated prices; an entry whose level was emptied by a
//! cancellation is reclaimed lazily at the top of the matching loop.
//!
//! Matching runs to completion inside [`Book::submit`]: the incoming order
//! walks the opposite ladder best price first, consumes resting visible
//! quantity in FIFO order, triggers iceberg refills (which cost the refilled
//! order its time priority), and finally rests any residual.

pub mod ladder;

use crate::order::{Id, Order, Price, Qty, Side};
use crate::trade::Trade;
use ladder::Ladder;
use slab::Slab;
use std::cmp;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;

/// Generic order-book errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("could not find order with id #{0}")]
    /// Tried to operate on an order that does not rest on the book.
    OrderIdNotFound(Id),
    #[error("another order with the same id #{0} already exists")]
    /// Tried to submit an order whose ID is still live on the book.
    OrderIdExists(Id),
}

/// Node representing a resting order stored in the slab and linked within
/// its price level's FIFO queue.
#[derive(Debug, Clone)]
struct Node {
    order: Order,
    next: Option<usize>,
    prev: Option<usize>,
}

/// A single price level: head and tail of a doubly-linked FIFO queue of
/// resting orders, oldest at the head.
#[derive(Debug, Default)]
struct Level {
    head: Option<usize>,
    tail: Option<usize>,
}

impl Level {
    /// Append an order node to the back of the level's queue. The
    /// `order_idx` must reference a valid entry in `orders`.
    fn push_back(&mut self, orders: &mut Slab<Node>, order_idx: usize) {
        match self.tail {
            Some(tail) => {
                orders[tail].next = Some(order_idx);
                orders[order_idx].prev = Some(tail);
                self.tail = Some(order_idx);
            }
            None => {
                self.head = Some(order_idx);
                self.tail = Some(order_idx);
                orders[order_idx].prev = None;
            }
        }
    }

    /// Remove a specific order node from the level's queue. The node must
    /// be currently linked in this level; handles to every other slot stay
    /// valid.
    fn unlink(&mut self, orders: &mut Slab<Node>, order_idx: usize) {
        let prev = orders[order_idx].prev;
        let next = orders[order_idx].next;

        if let Some(p) = prev {
            orders[p].next = next;
        } else {
            self.head = next;
        }
        if let Some(n) = next {
            orders[n].prev = prev;
        } else {
            self.tail = prev;
        }
        orders[order_idx].prev = None;
        orders[order_idx].next = None;
    }

    /// Move a node to the back of the queue, behind every order currently
    /// linked at this level.
    fn splice_to_back(&mut self, orders: &mut Slab<Node>, order_idx: usize) {
        self.unlink(orders, order_idx);
        self.push_back(orders, order_idx);
    }

    fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// One side of the book: its populated price levels and the ladder ranking
/// them. A price is a key of `levels` iff the ladder tracks it, even while
/// the level's queue is empty.
#[derive(Debug)]
struct BookSide {
    levels: HashMap<Price, Level>,
    ladder: Ladder,
}

impl BookSide {
    fn new(side: Side) -> Self {
        BookSide {
            levels: HashMap::new(),
            ladder: Ladder::for_side(side),
        }
    }
}

/// A resting order as disclosed by a snapshot. The hidden iceberg reserve
/// is not included.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resting {
    pub side: Side,
    pub id: Id,
    pub price: Price,
    pub visible_qty: Qty,
}

impl std::fmt::Display for Resting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "O {} {} {} {}",
            self.side, self.id, self.price, self.visible_qty
        )
    }
}

/// An incoming order at `limit` crosses a resting level at `best` when the
/// level's price is at least as good.
fn crosses(incoming: Side, limit: Price, best: Price) -> bool {
    match incoming {
        Side::Buy => best <= limit,
        Side::Sell => best >= limit,
    }
}

/// Slab-backed order book implementing price/time priority with iceberg
/// support.
#[derive(Debug)]
pub struct Book {
    orders: Slab<Node>,
    by_id: HashMap<Id, usize>,
    buys: BookSide,
    sells: BookSide,
}

impl Default for Book {
    fn default() -> Self {
        Book::new()
    }
}

impl Book {
    /// Create a new, empty book.
    pub fn new() -> Self {
        Book {
            orders: Slab::new(),
            by_id: HashMap::new(),
            buys: BookSide::new(Side::Buy),
            sells: BookSide::new(Side::Sell),
        }
    }

    /// Match `order` against the opposite side, then rest any residual.
    ///
    /// Returns one aggregated trade per counterparty, in the order in which
    /// counterparties were first hit. A single incoming order can consume
    /// several slices of the same resting iceberg across refills; those
    /// fills accrue to one aggregate, priced at first contact.
    pub fn submit(&mut self, order: Order) -> Result<Vec<Trade>, Error> {
        if self.by_id.contains_key(&order.id) {
            return Err(Error::OrderIdExists(order.id));
        }

        let Book {
            orders,
            by_id,
            buys,
            sells,
        } = self;
        let (own, opposite) = match order.side {
            Side::Buy => (buys, sells),
            Side::Sell => (sells, buys),
        };

        let original_qty = order.visible_qty;
        let mut remaining = order.visible_qty;

        let mut traded_by: HashMap<Id, Qty> = HashMap::new();
        let mut touched: Vec<(Id, Price)> = Vec::new();

        while remaining > 0 {
            let Some(best) = opposite.ladder.best() else {
                break;
            };
            if !crosses(order.side, order.price, best) {
                break;
            }

            // Lazy drain: a cancellation may have emptied this level while
            // leaving its ladder entry behind.
            if opposite.levels.get(&best).is_none_or(Level::is_empty) {
                opposite.levels.remove(&best);
                opposite.ladder.pop_best();
                continue;
            }
            let level = opposite.levels.get_mut(&best).unwrap();

            let head = level.head.unwrap();
            let counterparty = orders[head].order.id;
            let trade_qty = cmp::min(orders[head].order.visible_qty, remaining);
            orders[head].order.visible_qty -= trade_qty;
            remaining -= trade_qty;

            if let Some(total) = traded_by.get_mut(&counterparty) {
                *total += trade_qty;
            } else {
                traded_by.insert(counterparty, trade_qty);
                touched.push((counterparty, best));
            }

            if orders[head].order.visible_qty == 0 {
                if orders[head].order.hidden_qty > 0 {
                    // Iceberg refill: disclose the next slice and requeue at
                    // the back; disclosed reserve loses its time priority.
                    let node = &mut orders[head];
                    let slice = cmp::min(node.order.hidden_qty, node.order.peak_size);
                    node.order.visible_qty = slice;
                    node.order.hidden_qty -= slice;
                    level.splice_to_back(orders, head);
                } else {
                    level.unlink(orders, head);
                    let node = orders.remove(head);
                    by_id.remove(&node.order.id);
                    if level.is_empty() {
                        opposite.levels.remove(&best);
                        opposite.ladder.pop_best();
                    }
                }
            }
        }

        if remaining > 0 {
            let mut resting = order;
            resting.visible_qty = remaining;
            resting.hidden_qty = 0;
            if resting.peak_size > 0 && remaining > resting.peak_size {
                // Continue the peak cadence from whatever traded on entry,
                // so every later refill discloses exactly peak_size shares.
                let traded = original_qty - remaining;
                resting.visible_qty = resting.peak_size - traded % resting.peak_size;
                resting.hidden_qty = remaining - resting.visible_qty;
            }

            let idx = orders.insert(Node {
                order: resting,
                next: None,
                prev: None,
            });
            by_id.insert(resting.id, idx);
            let level = match own.levels.entry(resting.price) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    own.ladder.push(resting.price);
                    e.insert(Level::default())
                }
            };
            level.push_back(orders, idx);
        }

        Ok(touched
            .into_iter()
            .map(|(counterparty, price)| {
                Trade::between(
                    order.side,
                    order.id,
                    counterparty,
                    price,
                    traded_by[&counterparty],
                )
            })
            .collect())
    }

    /// Remove a resting order by id, returning it.
    ///
    /// The emptied level, if any, keeps its ladder entry; the next matching
    /// pass reclaims both together.
    pub fn cancel(&mut self, id: Id) -> Result<Order, Error> {
        let idx = *self.by_id.get(&id).ok_or(Error::OrderIdNotFound(id))?;
        let (side, price) = {
            let node = &self.orders[idx];
            (node.order.side, node.order.price)
        };

        let own = match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };
        let level = own.levels.get_mut(&price).unwrap();
        level.unlink(&mut self.orders, idx);

        self.by_id.remove(&id);
        Ok(self.orders.remove(idx).order)
    }

    /// Gets a resting order by its ID.
    pub fn lookup(&self, id: Id) -> Option<&Order> {
        let idx = self.by_id.get(&id)?;

        Some(&self.orders[*idx].order)
    }

    /// Number of resting orders.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All resting orders: buys first (best to worst price), then sells,
    /// FIFO within each level. The book is not mutated; each ladder is
    /// cloned and the clone drained.
    pub fn snapshot(&self) -> Vec<Resting> {
        let mut out = Vec::with_capacity(self.by_id.len());
        self.snapshot_side(&self.buys, &mut out);
        self.snapshot_side(&self.sells, &mut out);
        out
    }

    fn snapshot_side(&self, side: &BookSide, out: &mut Vec<Resting>) {
        for price in side.ladder.iter_best_first() {
            let Some(level) = side.levels.get(&price) else {
                error!("snapshot: no level found for price {price}, skipping");
                continue;
            };
            let mut next = level.head;
            while let Some(idx) = next {
                let node = &self.orders[idx];
                out.push(Resting {
                    side: node.order.side,
                    id: node.order.id,
                    price: node.order.price,
                    visible_qty: node.order.visible_qty,
                });
                next = node.next;
            }
        }
    }
}
