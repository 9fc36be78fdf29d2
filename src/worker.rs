//! Simplification off the calling thread
//!
//! A [`SimplifyJob`] runs a [`Simplifier`] on a small rayon pool of its own
//! and hands the result back through a channel. The global pool stays free for
//! `build`, so a long simplification never holds up a new propagation.
//! Cancelling a job wins over any result the worker may already have produced.

use std::sync::OnceLock;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::expression::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITERATIONS, Expression, ExpressionError, Simplifier,
};

pub use crate::expression::CancelToken;

/// Stack reserved for each simplification thread
pub const WORKER_STACK_SIZE: usize = 128 * 1024 * 1024;

/// Deepest tree a simplification thread accepts. Leaves 16 KiB of stack per level.
pub const WORKER_MAX_DEPTH: usize = 8192;

const WORKER_THREADS: usize = 2;

static WORKER_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

fn worker_pool() -> Option<&'static ThreadPool> {
    WORKER_POOL
        .get_or_init(|| {
            let built = ThreadPoolBuilder::new()
                .num_threads(WORKER_THREADS)
                .stack_size(WORKER_STACK_SIZE)
                .thread_name(|index| format!("hazy-simplify-{}", index))
                .build();
            match built {
                Ok(pool) => Some(pool),
                Err(err) => {
                    warn!("Cannot start simplification threads: {}", err);
                    None
                }
            }
        })
        .as_ref()
}

/// Knobs for a background simplification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyConfig {
    pub max_iterations: usize,
    pub max_depth: usize,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: WORKER_MAX_DEPTH,
        }
    }
}

impl SimplifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

type Outcome = Result<Expression, ExpressionError>;

/// Handle to a simplification running on the simplification pool
#[derive(Debug)]
pub struct SimplifyJob {
    token: CancelToken,
    receiver: Receiver<Outcome>,
    outcome: Option<Outcome>,
}

impl SimplifyJob {
    /// Start simplifying `expression` and return immediately
    pub fn spawn(expression: Expression, config: SimplifyConfig) -> Self {
        let token = CancelToken::new();
        let (sender, receiver) = mpsc::channel();
        let simplifier = Simplifier::new()
            .with_max_iterations(config.max_iterations)
            .with_cancel_token(token.clone());

        info!(
            "Simplifying a {}-level expression in the background",
            expression.depth()
        );

        let work = move |simplifier: Simplifier| {
            let outcome = simplifier.simplify(&expression);
            if sender.send(outcome).is_err() {
                debug!("Simplification finished after its job was dropped");
            }
        };

        match worker_pool() {
            Some(pool) => {
                let simplifier = simplifier.with_max_depth(config.max_depth);
                pool.spawn(move || work(simplifier));
            }
            None => {
                // ordinary stacks only take the default depth
                let simplifier =
                    simplifier.with_max_depth(config.max_depth.min(DEFAULT_MAX_DEPTH));
                rayon::spawn(move || work(simplifier));
            }
        }

        Self {
            token,
            receiver,
            outcome: None,
        }
    }

    /// Ask the worker to stop. Returns without waiting for it.
    pub fn cancel(&self) {
        debug!("Cancelling simplification");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Poll for the result without blocking. `None` means the worker is still running.
    pub fn try_result(&mut self) -> Option<Outcome> {
        if self.token.is_cancelled() {
            return Some(Err(ExpressionError::Cancelled));
        }

        if self.outcome.is_none() {
            match self.receiver.try_recv() {
                Ok(outcome) => self.outcome = Some(outcome),
                Err(TryRecvError::Empty) => return None,
                // worker panicked before sending
                Err(TryRecvError::Disconnected) => {
                    self.outcome = Some(Err(ExpressionError::Cancelled));
                }
            }
        }

        self.outcome.clone()
    }

    /// Block until the worker finishes
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::Cancelled`] if the job was cancelled, even when the
    /// worker completed first.
    pub fn wait(mut self) -> Outcome {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => self
                .receiver
                .recv()
                .unwrap_or(Err(ExpressionError::Cancelled)),
        };

        if self.token.is_cancelled() {
            return Err(ExpressionError::Cancelled);
        }
        outcome
    }
}
