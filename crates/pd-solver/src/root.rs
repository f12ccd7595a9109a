//! Two-stage root finder: bracket by bisection, polish by secant.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bracket::{BisectOutcome, Bracket, ScanOutcome, SignChange, bisect, scan};
use crate::error::{SolverError, SolverResult};
use crate::secant::{SecantConfig, safeguarded_secant, secant_descent};

/// Root finder configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootFindConfig {
    /// Bisection stops once the bracket half width is below this
    pub bracket_xtol: f64,
    /// Secant refinement stops once a step is below this
    pub refine_tol: f64,
    /// Maximum bisection halvings
    pub max_bisect_iterations: usize,
    /// Maximum secant iterations
    pub max_refine_iterations: usize,
    /// Sub-intervals scanned when the endpoints do not differ in sign (0 disables)
    pub scan_intervals: usize,
    /// Residual required to accept a root the function only touches.
    ///
    /// Absolute, in the units of the function value: a curve whose minimum
    /// lies within this distance of zero is reported as touching it. Set to
    /// `0.0` to accept only sign changes.
    pub touch_residual_tol: f64,
}

impl Default for RootFindConfig {
    fn default() -> Self {
        Self {
            bracket_xtol: 1.0,
            refine_tol: 0.01,
            max_bisect_iterations: 200,
            max_refine_iterations: 50,
            scan_intervals: 64,
            touch_residual_tol: 1e-9,
        }
    }
}

/// Why no root was reported.
#[derive(Clone, Debug, PartialEq)]
pub enum NotFoundReason {
    /// The function keeps one sign over the whole interval.
    NoSignChange,
    /// The function failed while the bracket was searched.
    DomainError(String),
    /// The function returned a non-finite value at `at`.
    NonFinite { at: f64 },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignChange => write!(f, "no sign change in search interval"),
            Self::DomainError(msg) => write!(f, "domain error while bracketing: {msg}"),
            Self::NonFinite { at } => write!(f, "non-finite function value at {at}"),
        }
    }
}

/// Outcome of a root search.
#[derive(Clone, Debug, PartialEq)]
pub enum RootFindResult {
    Found(f64),
    NotFound(NotFoundReason),
}

impl RootFindResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Found(x) => Some(*x),
            Self::NotFound(_) => None,
        }
    }

    /// Numeric form for plotting grids: the root, or `NaN` when not found.
    pub fn to_sentinel(&self) -> f64 {
        self.value().unwrap_or(f64::NAN)
    }
}

/// What the bracketing stage produced.
enum Located {
    Root(f64),
    Bracketed(SignChange),
    Flat { best_x: f64, best_f: f64 },
    Failed(NotFoundReason),
}

/// Bisection + secant root finder.
#[derive(Clone, Debug)]
pub struct RootFinder {
    config: RootFindConfig,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self {
            config: RootFindConfig::default(),
        }
    }
}

impl RootFinder {
    pub fn new(config: RootFindConfig) -> SolverResult<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(config.bracket_xtol) {
            return Err(SolverError::InvalidConfig {
                what: format!("bracket_xtol must be positive, got {}", config.bracket_xtol),
            });
        }
        if !positive(config.refine_tol) {
            return Err(SolverError::InvalidConfig {
                what: format!("refine_tol must be positive, got {}", config.refine_tol),
            });
        }
        if !(config.touch_residual_tol >= 0.0) {
            return Err(SolverError::InvalidConfig {
                what: "touch_residual_tol must be non-negative".to_string(),
            });
        }
        if config.max_refine_iterations == 0 {
            return Err(SolverError::InvalidConfig {
                what: "max_refine_iterations must be positive".to_string(),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &RootFindConfig {
        &self.config
    }

    /// Find `x` in `bracket` with `f(x) ≈ 0`.
    ///
    /// Failures of `f` while bracketing are reported as
    /// [`RootFindResult::NotFound`]; failures during refinement are returned
    /// as `Err`.
    pub fn find<F, E>(&self, mut f: F, bracket: Bracket) -> Result<RootFindResult, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
        E: fmt::Display,
    {
        let located = match self.locate(&mut f, bracket) {
            Ok(located) => located,
            Err(e) => {
                debug!(error = %e, "bracket search failed");
                return Ok(RootFindResult::NotFound(NotFoundReason::DomainError(
                    e.to_string(),
                )));
            }
        };

        let secant = SecantConfig {
            max_iterations: self.config.max_refine_iterations,
            step_tol: self.config.refine_tol,
        };

        match located {
            Located::Root(x) => Ok(RootFindResult::Found(x)),
            Located::Failed(reason) => Ok(RootFindResult::NotFound(reason)),
            Located::Bracketed(change) => {
                let x0 = change.midpoint();
                let f0 = f(x0)?;
                if !f0.is_finite() {
                    return Ok(RootFindResult::NotFound(NotFoundReason::NonFinite { at: x0 }));
                }
                match safeguarded_secant(&mut f, change, x0, f0, &secant)? {
                    Some(out) => {
                        if !out.converged {
                            warn!(x = out.x, fx = out.fx, "secant refinement did not converge");
                        }
                        debug!(x = out.x, iterations = out.iterations, "root refined");
                        Ok(RootFindResult::Found(out.x))
                    }
                    None => Ok(RootFindResult::NotFound(NotFoundReason::NonFinite { at: x0 })),
                }
            }
            Located::Flat { best_x, best_f } => {
                let touch = secant_descent(
                    &mut f,
                    best_x,
                    best_f,
                    bracket,
                    self.config.touch_residual_tol,
                    &secant,
                );
                match touch {
                    Ok(Some(out)) => {
                        debug!(x = out.x, iterations = out.iterations, "tangential root found");
                        Ok(RootFindResult::Found(out.x))
                    }
                    Ok(None) => Ok(RootFindResult::NotFound(NotFoundReason::NoSignChange)),
                    Err(e) => Ok(RootFindResult::NotFound(NotFoundReason::DomainError(
                        e.to_string(),
                    ))),
                }
            }
        }
    }

    fn locate<F, E>(&self, f: &mut F, bracket: Bracket) -> Result<Located, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut outcome = scan(f, bracket, 1)?;
        if matches!(outcome, ScanOutcome::NoSignChange { .. }) && self.config.scan_intervals > 1 {
            debug!(
                intervals = self.config.scan_intervals,
                "no sign change at endpoints, scanning interior"
            );
            outcome = scan(f, bracket, self.config.scan_intervals)?;
        }

        let change = match outcome {
            ScanOutcome::Root(x) => return Ok(Located::Root(x)),
            ScanOutcome::NonFinite { at } => {
                return Ok(Located::Failed(NotFoundReason::NonFinite { at }));
            }
            ScanOutcome::NoSignChange { best_x, best_f } => {
                return Ok(Located::Flat { best_x, best_f });
            }
            ScanOutcome::SignChange(change) => change,
        };

        Ok(
            match bisect(
                f,
                change,
                self.config.bracket_xtol,
                self.config.max_bisect_iterations,
            )? {
                BisectOutcome::Root(x) => Located::Root(x),
                BisectOutcome::Narrowed(change) => Located::Bracketed(change),
                BisectOutcome::NonFinite { at } => {
                    Located::Failed(NotFoundReason::NonFinite { at })
                }
            },
        )
    }
}
