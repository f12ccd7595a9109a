//! Sign-change bracketing: interval scan and bisection.

use pd_core::{ensure_finite, linspace};

use crate::error::{SolverError, SolverResult};

/// Search interval `[lower, upper]` with `lower < upper`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    pub lower: f64,
    pub upper: f64,
}

impl Bracket {
    pub fn new(lower: f64, upper: f64) -> SolverResult<Self> {
        ensure_finite(lower, "bracket lower bound")?;
        ensure_finite(upper, "bracket upper bound")?;
        if lower >= upper {
            return Err(SolverError::InvalidConfig {
                what: format!("bracket lower bound {lower} must be below upper bound {upper}"),
            });
        }
        Ok(Self { lower, upper })
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

/// Two points with function values of opposite sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignChange {
    pub lo: f64,
    pub hi: f64,
    pub f_lo: f64,
    pub f_hi: f64,
}

impl SignChange {
    pub fn midpoint(&self) -> f64 {
        self.lo + 0.5 * (self.hi - self.lo)
    }

    pub fn half_width(&self) -> f64 {
        0.5 * (self.hi - self.lo).abs()
    }

    /// Replace whichever end has the same sign as `fx`.
    pub fn update(&mut self, x: f64, fx: f64) {
        if fx.signum() == self.f_lo.signum() {
            self.lo = x;
            self.f_lo = fx;
        } else {
            self.hi = x;
            self.f_hi = fx;
        }
    }
}

/// Result of scanning an interval for a sign change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScanOutcome {
    /// A sample landed exactly on a root.
    Root(f64),
    /// First (leftmost) sub-interval whose end values differ in sign.
    SignChange(SignChange),
    /// No sign change; the sample with the smallest `|f|`.
    NoSignChange { best_x: f64, best_f: f64 },
    /// The function produced a non-finite value at `at`.
    NonFinite { at: f64 },
}

/// Evaluate `f` on `intervals + 1` equally spaced points of `bracket`.
pub fn scan<F, E>(f: &mut F, bracket: Bracket, intervals: usize) -> Result<ScanOutcome, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let points = linspace(bracket.lower, bracket.upper, intervals.max(1) + 1);
    let mut prev: Option<(f64, f64)> = None;
    let mut best = (bracket.lower, f64::INFINITY);

    for x in points {
        let fx = f(x)?;
        if !fx.is_finite() {
            return Ok(ScanOutcome::NonFinite { at: x });
        }
        if fx == 0.0 {
            return Ok(ScanOutcome::Root(x));
        }
        if fx.abs() < best.1.abs() {
            best = (x, fx);
        }
        if let Some((px, pf)) = prev {
            if pf.signum() != fx.signum() {
                return Ok(ScanOutcome::SignChange(SignChange {
                    lo: px,
                    hi: x,
                    f_lo: pf,
                    f_hi: fx,
                }));
            }
        }
        prev = Some((x, fx));
    }

    Ok(ScanOutcome::NoSignChange {
        best_x: best.0,
        best_f: best.1,
    })
}

/// Result of bisecting a sign change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BisectOutcome {
    Root(f64),
    /// Narrowed bracket; its midpoint is the estimate.
    Narrowed(SignChange),
    NonFinite { at: f64 },
}

/// Halve `change` until its half width is at most `xtol` (or `max_iter` halvings).
pub fn bisect<F, E>(
    f: &mut F,
    mut change: SignChange,
    xtol: f64,
    max_iter: usize,
) -> Result<BisectOutcome, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    for _ in 0..max_iter {
        if change.half_width() <= xtol {
            break;
        }
        let mid = change.midpoint();
        let fm = f(mid)?;
        if !fm.is_finite() {
            return Ok(BisectOutcome::NonFinite { at: mid });
        }
        if fm == 0.0 {
            return Ok(BisectOutcome::Root(mid));
        }
        change.update(mid, fm);
    }
    Ok(BisectOutcome::Narrowed(change))
}
