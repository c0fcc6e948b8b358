//! Customer (producer) task: places exactly one order and leaves.

use tracing::debug;

use crate::error::{Result, SimError};
use crate::events::Notification;
use crate::sim::Cafe;
use crate::types::{CustomerId, Order, OrderId};

/// Place a single order for `customer`, blocking while the queue is full.
///
/// The order id equals the customer id. The "order placed" notification is
/// emitted inside the queue's critical section so it can never be observed
/// out of order with the insertion itself.
pub fn place_order(cafe: &Cafe, customer: CustomerId, steps: u32) -> Result<OrderId> {
    let order = Order::new(customer, steps);
    let order_id = order.id;
    cafe.queue()
        .push_with(order, |order| {
            cafe.sink().emit(Notification::OrderPlaced {
                customer,
                order: order.id,
            });
        })
        .map_err(|order| SimError::QueueClosed { order: order.id })?;
    debug!(customer, order = order_id, "order queued");
    Ok(order_id)
}
