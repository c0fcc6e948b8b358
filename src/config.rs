//! Command-line arguments and the validated run configuration.

use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

/// Bounded-buffer cafe: customers place orders, baristas prepare them
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cafe_queue",
    version,
    about = "Bounded-buffer producer/consumer cafe simulation",
    after_help = "EXAMPLES:\n    \
        cafe_queue\n    \
        cafe_queue -c 8 -b 3 --capacity 2\n    \
        cafe_queue --step-ms 50 --warmup-ms 0 --rest-ms 0 -v"
)]
pub struct CliArgs {
    /// Number of customers, each placing exactly one order
    #[arg(short = 'c', long, default_value_t = 5, value_name = "NUM")]
    pub customers: u64,

    /// Number of baristas preparing orders
    #[arg(short = 'b', long, default_value_t = 2, value_name = "NUM")]
    pub baristas: u64,

    /// Maximum number of pending orders in the queue
    #[arg(long, default_value_t = 5, value_name = "NUM")]
    pub capacity: usize,

    /// Preparation steps per order
    #[arg(long, default_value_t = 4, value_name = "NUM")]
    pub steps: u32,

    /// Delay before the baristas start, letting a backlog build up
    #[arg(long, default_value_t = 500, value_name = "MS")]
    pub warmup_ms: u64,

    /// Time spent on each preparation step
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub step_ms: u64,

    /// Pause a barista takes before looking for the next order
    #[arg(long, default_value_t = 300, value_name = "MS")]
    pub rest_ms: u64,

    /// Verbose diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Sleep intervals used by the coordinator and baristas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub warmup: Duration,
    pub step: Duration,
    pub rest: Duration,
}

impl Timings {
    /// No sleeping at all; useful for tests.
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            warmup: Duration::ZERO,
            step: Duration::ZERO,
            rest: Duration::ZERO,
        }
    }
}

/// Validated configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub customers: u64,
    pub baristas: u64,
    pub capacity: usize,
    pub steps: u32,
    pub timings: Timings,
}

impl SimConfig {
    pub fn new(
        customers: u64,
        baristas: u64,
        capacity: usize,
        steps: u32,
        timings: Timings,
    ) -> Result<Self, ConfigError> {
        if customers == 0 {
            return Err(ConfigError::ZeroCustomers);
        }
        if baristas == 0 {
            return Err(ConfigError::ZeroBaristas);
        }
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        Ok(Self {
            customers,
            baristas,
            capacity,
            steps,
            timings,
        })
    }

    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        Self::new(
            args.customers,
            args.baristas,
            args.capacity,
            args.steps,
            Timings {
                warmup: Duration::from_millis(args.warmup_ms),
                step: Duration::from_millis(args.step_ms),
                rest: Duration::from_millis(args.rest_ms),
            },
        )
    }
}
