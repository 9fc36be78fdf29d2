//! Interactive state: the quantity table, the current propagation and a pending simplification

mod errors;

use std::fmt;

use log::{debug, info, warn};

use crate::expression::{Expression, ExpressionError};
use crate::propagation::{
    InputSpec, Measurement, Propagation, ValueMap, build, uncertainty_symbol,
};
use crate::worker::{SimplifyConfig, SimplifyJob};

pub use errors::SessionError;

/// One line of the quantity table. Values and errors are kept as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityRow {
    pub symbol: String,
    pub value: Option<String>,
    pub error: Option<String>,
}

impl QuantityRow {
    pub fn new(symbol: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            value: Some(value.into()),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Which half of a [`Propagation`] to simplify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Expression,
    Uncertainty,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Expression => write!(f, "expression"),
            Target::Uncertainty => write!(f, "uncertainty"),
        }
    }
}

#[derive(Debug)]
struct PendingSimplify {
    job: SimplifyJob,
    target: Target,
}

/// Everything a front end needs between user actions
///
/// A failed [`compute`](Session::compute) or [`evaluate`](Session::evaluate) never
/// disturbs the current propagation. Computing a new propagation cancels any
/// pending simplification, so a late result is never applied to the wrong expression.
#[derive(Debug, Default)]
pub struct Session {
    rows: Vec<QuantityRow>,
    propagation: Option<Propagation>,
    pending: Option<PendingSimplify>,
    simplify_config: SimplifyConfig,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplify_config(mut self, config: SimplifyConfig) -> Self {
        self.simplify_config = config;
        self
    }

    pub fn rows(&self) -> &[QuantityRow] {
        &self.rows
    }

    pub fn add_row(&mut self, row: QuantityRow) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// # Errors
    ///
    /// Returns [`SessionError::RowOutOfRange`] when `index` is past the end of the table.
    pub fn remove_row(&mut self, index: usize) -> Result<QuantityRow, SessionError> {
        if index >= self.rows.len() {
            return Err(SessionError::RowOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Collect the table into a [`ValueMap`], binding each row's error to `u_<symbol>`.
    /// Rows with a blank symbol are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when a value or error does not reduce to a number.
    pub fn values(&self) -> Result<ValueMap, SessionError> {
        let mut values = ValueMap::new();

        for row in &self.rows {
            let symbol = row.symbol.trim();
            if symbol.is_empty() {
                continue;
            }
            if let Some(value) = &row.value {
                values.insert_str(symbol, value)?;
            }
            if let Some(error) = &row.error {
                values.insert_str(&uncertainty_symbol(symbol), error)?;
            }
        }

        Ok(values)
    }

    pub fn propagation(&self) -> Option<&Propagation> {
        self.propagation.as_ref()
    }

    /// Build a new propagation and make it current.
    ///
    /// # Errors
    ///
    /// Returns the build error; the previous propagation stays current.
    pub fn compute<S: AsRef<str>>(
        &mut self,
        spec: &InputSpec,
        symbols: &[S],
    ) -> Result<&Propagation, SessionError> {
        let propagation = match build(spec, symbols) {
            Ok(propagation) => propagation,
            Err(err) => {
                warn!("Compute failed, keeping previous result: {}", err);
                return Err(err.into());
            }
        };

        self.cancel_simplify();
        Ok(self.propagation.insert(propagation))
    }

    /// Evaluate the current expression and uncertainty against the table.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoExpression`] before the first successful compute,
    /// [`SessionError::NoValues`] for an empty table, and the evaluation error otherwise.
    pub fn evaluate(&self) -> Result<Measurement, SessionError> {
        let propagation = self.propagation.as_ref().ok_or(SessionError::NoExpression)?;
        let values = self.values()?;
        if values.is_empty() {
            return Err(SessionError::NoValues);
        }

        let measurement = propagation.evaluate(&values)?;
        info!("Evaluated: {}", measurement);
        Ok(measurement)
    }

    /// Start simplifying one half of the current propagation in the background,
    /// replacing any simplification already running.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoExpression`] before the first successful compute.
    pub fn simplify(&mut self, target: Target) -> Result<(), SessionError> {
        let propagation = self.propagation.as_ref().ok_or(SessionError::NoExpression)?;
        let expression = match target {
            Target::Expression => propagation.expression().clone(),
            Target::Uncertainty => propagation.uncertainty().clone(),
        };

        self.cancel_simplify();
        debug!("Starting simplification of the {}", target);
        self.pending = Some(PendingSimplify {
            job: SimplifyJob::spawn(expression, self.simplify_config),
            target,
        });
        Ok(())
    }

    pub fn is_simplifying(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply a finished simplification, if there is one.
    ///
    /// Returns `None` while nothing has finished, otherwise the target that was
    /// replaced or the error the job ended with.
    pub fn poll_simplify(&mut self) -> Option<Result<Target, SessionError>> {
        let mut pending = self.pending.take()?;
        match pending.job.try_result() {
            None => {
                self.pending = Some(pending);
                None
            }
            Some(outcome) => Some(self.apply(pending.target, outcome)),
        }
    }

    /// Block until the pending simplification finishes and apply it.
    pub fn wait_simplify(&mut self) -> Option<Result<Target, SessionError>> {
        let pending = self.pending.take()?;
        let outcome = pending.job.wait();
        Some(self.apply(pending.target, outcome))
    }

    /// Abandon the pending simplification. Returns whether one was running.
    pub fn cancel_simplify(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.job.cancel();
                true
            }
            None => false,
        }
    }

    fn apply(
        &mut self,
        target: Target,
        outcome: Result<Expression, ExpressionError>,
    ) -> Result<Target, SessionError> {
        let simplified = outcome?;
        let propagation = self.propagation.as_ref().ok_or(SessionError::NoExpression)?;

        info!("Simplified {}: {}", target, simplified);
        self.propagation = Some(match target {
            Target::Expression => propagation.with_expression(simplified),
            Target::Uncertainty => propagation.with_uncertainty(simplified),
        });
        Ok(target)
    }
}
