//! Cafe context and the coordinator that runs one simulation.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::barista;
use crate::config::SimConfig;
use crate::customer;
use crate::error::{Result, SimError};
use crate::events::EventSink;
use crate::order_queue::OrderQueue;
use crate::types::OrderId;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: rc == 0 means the kernel filled the struct; it was zeroed anyway.
    let usage = unsafe { usage.assume_init() };
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Shared state for one simulation: the order queue and the output sink.
///
/// Every customer and barista gets a handle to the same `Cafe`; separate
/// runs never share anything.
pub struct Cafe {
    queue: OrderQueue,
    sink: Arc<dyn EventSink>,
}

impl Cafe {
    pub fn new(capacity: usize, sink: Arc<dyn EventSink>) -> Self {
        Self {
            queue: OrderQueue::new(capacity),
            sink,
        }
    }

    pub fn queue(&self) -> &OrderQueue {
        &self.queue
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub customers: u64,
    pub baristas: u64,
    pub capacity: usize,
    pub orders_placed: usize,
    /// Orders completed per barista, index 0 is barista 1.
    pub served_per_barista: Vec<usize>,
    pub peak_queue_len: usize,
    pub leftover: usize,
    pub elapsed: Duration,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
}

impl RunReport {
    pub fn orders_served(&self) -> usize {
        self.served_per_barista.iter().sum()
    }
}

/// Join every handle, then report the first panic.
///
/// All handles are joined even after a failure, so no task outlives the call.
fn join_all<T>(handles: Vec<(u64, thread::JoinHandle<T>)>, role: &'static str) -> Result<Vec<T>> {
    let joined: Vec<Result<T>> = handles
        .into_iter()
        .map(|(id, handle)| {
            handle
                .join()
                .map_err(|_| SimError::TaskPanicked { role, id })
        })
        .collect();
    joined.into_iter().collect()
}

fn spawn_named<T, F>(name: String, task: F) -> Result<thread::JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(task)
        .map_err(|source| SimError::Spawn { name, source })
}

type CustomerHandles = Vec<(u64, thread::JoinHandle<Result<OrderId>>)>;
type BaristaHandles = Vec<(u64, thread::JoinHandle<usize>)>;

/// Close the queue and wait for every task already started.
///
/// Used when the run cannot continue; parked customers get `QueueClosed`
/// and parked baristas see an empty, shut-down queue.
fn close_and_join(cafe: &Cafe, customers: CustomerHandles, baristas: BaristaHandles) {
    cafe.queue().shutdown();
    if let Err(err) = join_all(customers, "customer") {
        warn!(%err, "customer failed while closing early");
    }
    if let Err(err) = join_all(baristas, "barista") {
        warn!(%err, "barista failed while closing early");
    }
}

/// Run the cafe: customers, warm-up, baristas, then the two-phase shutdown.
///
/// Shutdown is signaled only after every customer has been joined, so a
/// barista seeing an empty, shut-down queue knows no order can still arrive.
pub fn run(config: &SimConfig, sink: Arc<dyn EventSink>) -> Result<RunReport> {
    let cafe = Arc::new(Cafe::new(config.capacity, sink));
    let timings = config.timings;
    let cpu_start = cpu_times_seconds();
    let start = Instant::now();

    info!(
        customers = config.customers,
        baristas = config.baristas,
        capacity = config.capacity,
        steps = config.steps,
        "cafe opening"
    );

    let mut customers: CustomerHandles = Vec::with_capacity(config.customers as usize);
    for customer_id in 1..=config.customers {
        let task_cafe = Arc::clone(&cafe);
        let steps = config.steps;
        let spawned = spawn_named(format!("customer-{customer_id}"), move || {
            customer::place_order(&task_cafe, customer_id, steps)
        });
        match spawned {
            Ok(handle) => customers.push((customer_id, handle)),
            Err(err) => {
                close_and_join(&cafe, customers, Vec::new());
                return Err(err);
            }
        }
    }

    debug!(warmup_ms = timings.warmup.as_millis() as u64, "warming up");
    thread::sleep(timings.warmup);

    let mut baristas: BaristaHandles = Vec::with_capacity(config.baristas as usize);
    for barista_id in 1..=config.baristas {
        let task_cafe = Arc::clone(&cafe);
        let spawned = spawn_named(format!("barista-{barista_id}"), move || {
            barista::serve(&task_cafe, barista_id, timings)
        });
        match spawned {
            Ok(handle) => baristas.push((barista_id, handle)),
            Err(err) => {
                close_and_join(&cafe, customers, baristas);
                return Err(err);
            }
        }
    }
    info!(baristas = config.baristas, "baristas on shift");

    // Close the queue even if a customer failed, so baristas can still leave.
    let placed = join_all(customers, "customer");
    debug!("all customers done");
    cafe.queue().shutdown();
    info!("no more customers, closing the queue");

    let served_per_barista = join_all(baristas, "barista")?;
    let orders_placed = placed?.into_iter().collect::<Result<Vec<_>>>()?.len();

    // Every order should have been drained by the baristas.
    let mut leftover = 0usize;
    while cafe.queue().try_pop().is_some() {
        leftover += 1;
    }
    if leftover > 0 {
        warn!(leftover, "orders left in the queue after shutdown");
    }

    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    let report = RunReport {
        customers: config.customers,
        baristas: config.baristas,
        capacity: cafe.queue().capacity(),
        orders_placed,
        served_per_barista,
        peak_queue_len: cafe.queue().peak_len(),
        leftover,
        elapsed: start.elapsed(),
        cpu_user_s,
        cpu_sys_s,
    };
    info!(
        served = report.orders_served(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "cafe closed"
    );
    Ok(report)
}

/// Print the run summary block after all notifications.
pub fn print_summary(report: &RunReport) {
    let cpu = |value: Option<f64>| {
        value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string())
    };
    println!("CAFE SUMMARY");
    println!(
        "customers={} baristas={} capacity={}",
        report.customers, report.baristas, report.capacity
    );
    println!("orders_placed={}", report.orders_placed);
    println!("orders_served={}", report.orders_served());
    println!("served_per_barista={:?}", report.served_per_barista);
    println!("peak_queue_len={}", report.peak_queue_len);
    println!("leftover_orders={}", report.leftover);
    println!("elapsed_ms={}", report.elapsed.as_millis());
    println!(
        "cpu_user_s={} cpu_sys_s={}",
        cpu(report.cpu_user_s),
        cpu(report.cpu_sys_s)
    );
}
