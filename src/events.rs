//! Human-readable notifications emitted by customers and baristas.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::types::{BaristaId, CustomerId, OrderId};

/// One observable state change in the cafe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    OrderPlaced {
        customer: CustomerId,
        order: OrderId,
    },
    Progress {
        barista: BaristaId,
        order: OrderId,
        percent: u32,
    },
    Finished {
        barista: BaristaId,
        order: OrderId,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::OrderPlaced { customer, order } => {
                write!(f, "Customer {customer} placed order: {order}")
            }
            Notification::Progress {
                barista,
                order,
                percent,
            } => write!(f, "Barista {barista} - Order {order} progress: {percent}%"),
            Notification::Finished { barista, order } => {
                write!(f, "Barista {barista} finished order {order}")
            }
        }
    }
}

/// Destination for notifications; implementations serialize emission.
pub trait EventSink: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Writes one line per notification to stdout.
///
/// Output is serialized on its own lock, independent of the order queue.
pub struct ConsoleSink {
    out: Mutex<io::Stdout>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(io::stdout()),
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, notification: Notification) {
        let out = self.out.lock().expect("console mutex poisoned");
        let mut out = out.lock();
        // Write failures are logged and otherwise ignored.
        if let Err(err) = writeln!(out, "{notification}") {
            tracing::warn!(%err, "failed to write notification");
        }
    }
}

/// Keeps every notification in memory, in emission order.
#[cfg(test)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("events mutex poisoned").clone()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit(&self, notification: Notification) {
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(notification);
    }
}
