//! Shared identifiers and the order model used across the cafe.

/// Identifier of a placed order.
pub type OrderId = u64;
/// Identifier of a customer (producer) thread, 1-based.
pub type CustomerId = u64;
/// Identifier of a barista (consumer) thread, 1-based.
pub type BaristaId = u64;

/// Unit of work handed from a customer to a barista.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    /// Stable order identifier for notifications.
    pub id: OrderId,
    /// Number of preparation steps a barista must complete.
    pub steps: u32,
}

impl Order {
    /// Construct a new order with the provided id and step count.
    pub fn new(id: OrderId, steps: u32) -> Self {
        Self { id, steps }
    }
}
