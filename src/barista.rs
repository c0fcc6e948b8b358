//! Barista (consumer) task: takes orders until the cafe closes.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::Timings;
use crate::events::{EventSink, Notification};
use crate::sim::Cafe;
use crate::types::{BaristaId, Order};

/// Progress through one order's preparation steps.
///
/// Owned exclusively by the barista working on the order.
#[derive(Debug)]
pub struct Preparation {
    order: Order,
    done: u32,
}

impl Preparation {
    pub fn new(order: Order) -> Self {
        debug_assert!(order.steps > 0, "orders need at least one step");
        Self { order, done: 0 }
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.order.steps
    }

    /// Completed share of the order, `100 * done / steps`, rounded down.
    pub fn percent(&self) -> u32 {
        let percent = u64::from(self.done) * 100 / u64::from(self.order.steps);
        percent as u32
    }

    /// Complete one step and describe the new state.
    ///
    /// The final step yields `Finished` rather than a 100% progress event.
    pub fn advance(&mut self, barista: BaristaId) -> Notification {
        debug_assert!(!self.is_complete(), "advance past the last step");
        self.done += 1;
        if self.is_complete() {
            Notification::Finished {
                barista,
                order: self.order.id,
            }
        } else {
            Notification::Progress {
                barista,
                order: self.order.id,
                percent: self.percent(),
            }
        }
    }
}

/// Serve orders until the queue is shut down and drained.
///
/// Returns the number of orders this barista completed. An order that has
/// been picked up is always finished before shutdown is looked at again.
pub fn serve(cafe: &Cafe, barista: BaristaId, timings: Timings) -> usize {
    let mut served = 0usize;
    loop {
        if !timings.rest.is_zero() {
            thread::sleep(timings.rest);
        }
        let Some(order) = cafe.queue().pop_or_shutdown() else {
            break;
        };
        debug!(barista, order = order.id, steps = order.steps, "picked up order");
        prepare(cafe.sink(), barista, order, timings.step);
        served += 1;
    }
    debug!(barista, served, "no more orders, going home");
    served
}

fn prepare(sink: &dyn EventSink, barista: BaristaId, order: Order, step: Duration) {
    let mut preparation = Preparation::new(order);
    while !preparation.is_complete() {
        thread::sleep(step);
        sink.emit(preparation.advance(barista));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use ntest::timeout;
    use std::sync::{Arc, mpsc};

    fn run_preparation(steps: u32) -> Vec<Notification> {
        let mut preparation = Preparation::new(Order::new(9, steps));
        assert_eq!(preparation.percent(), 0);
        let mut events = Vec::new();
        while !preparation.is_complete() {
            events.push(preparation.advance(1));
        }
        events
    }

    fn progress(order: u64, percent: u32) -> Notification {
        Notification::Progress {
            barista: 1,
            order,
            percent,
        }
    }

    fn finished(order: u64) -> Notification {
        Notification::Finished { barista: 1, order }
    }

    #[test]
    fn four_steps_report_quarters_then_finish() {
        assert_eq!(
            run_preparation(4),
            vec![progress(9, 25), progress(9, 50), progress(9, 75), finished(9)]
        );
    }

    #[test]
    fn uneven_steps_round_down() {
        assert_eq!(
            run_preparation(3),
            vec![progress(9, 33), progress(9, 66), finished(9)]
        );
    }

    #[test]
    fn single_step_only_finishes() {
        assert_eq!(run_preparation(1), vec![finished(9)]);
    }

    #[test]
    fn percentages_increase_strictly() {
        let events = run_preparation(7);
        let percents: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Notification::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.len(), 6);
        assert!(percents.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(percents.iter().all(|&p| p < 100));
        assert_eq!(events.last(), Some(&finished(9)));
    }

    #[test]
    #[timeout(5000)]
    fn two_orders_of_two_steps_emit_four_events_in_dequeue_order() {
        let sink = Arc::new(RecordingSink::new());
        let cafe = Cafe::new(2, sink.clone());
        cafe.queue().push(Order::new(1, 2)).expect("queue open");
        cafe.queue().push(Order::new(2, 2)).expect("queue open");
        cafe.queue().shutdown();

        let served = serve(&cafe, 1, Timings::instant());

        assert_eq!(served, 2);
        assert_eq!(
            sink.events(),
            vec![progress(1, 50), finished(1), progress(2, 50), finished(2)]
        );
    }

    #[test]
    #[timeout(5000)]
    fn baristas_leave_without_work_when_closed_immediately() {
        let sink = Arc::new(RecordingSink::new());
        let cafe = Arc::new(Cafe::new(3, sink.clone()));
        cafe.queue().shutdown();

        let (tx, rx) = mpsc::channel();
        let handles: Vec<_> = (1..=3)
            .map(|id| {
                let cafe = Arc::clone(&cafe);
                let tx = tx.clone();
                thread::spawn(move || {
                    tx.send(serve(&cafe, id, Timings::instant()))
                        .expect("send served");
                })
            })
            .collect();

        for _ in 0..3 {
            let served = rx
                .recv_timeout(Duration::from_secs(2))
                .expect("barista never left");
            assert_eq!(served, 0);
        }
        for handle in handles {
            handle.join().expect("barista thread panicked");
        }
        assert!(sink.events().is_empty());
    }

    /// Forwards every notification to a channel so a test can react to it.
    struct ChannelSink {
        tx: std::sync::Mutex<mpsc::Sender<Notification>>,
    }

    impl EventSink for ChannelSink {
        fn emit(&self, notification: Notification) {
            // The receiver may already be gone once the test has what it needs.
            let _ = self
                .tx
                .lock()
                .expect("channel sink mutex poisoned")
                .send(notification);
        }
    }

    #[test]
    #[timeout(5000)]
    fn in_flight_order_finishes_after_shutdown() {
        let (tx, rx) = mpsc::channel();
        let sink = Arc::new(ChannelSink {
            tx: std::sync::Mutex::new(tx),
        });
        let cafe = Arc::new(Cafe::new(1, sink));
        cafe.queue().push(Order::new(7, 3)).expect("queue open");

        let barista = {
            let cafe = Arc::clone(&cafe);
            let timings = Timings {
                step: Duration::from_millis(30),
                ..Timings::instant()
            };
            thread::spawn(move || serve(&cafe, 2, timings))
        };

        // Close only once the first step is done, so the order is mid-preparation.
        let first = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("barista never started the order");
        assert_eq!(
            first,
            Notification::Progress {
                barista: 2,
                order: 7,
                percent: 33
            }
        );
        assert_eq!(cafe.queue().len(), 0);
        assert!(cafe.queue().shutdown());

        let served = barista.join().expect("barista thread panicked");
        let rest: Vec<Notification> = rx.try_iter().collect();

        assert_eq!(served, 1);
        assert_eq!(
            rest,
            vec![
                Notification::Progress {
                    barista: 2,
                    order: 7,
                    percent: 66
                },
                Notification::Finished {
                    barista: 2,
                    order: 7
                },
            ]
        );
    }
}
