//! Conditions applied to the value array at discrete times during the backward march.

use std::fmt;
use std::sync::Arc;

use crate::core::{FdmError, close_times, ensure_size};
use crate::fdm::inner_value::InnerValueCalculator;
use crate::fdm::meshers::FdmMesherComposite;
use crate::math::CubicNaturalSpline;

/// Floor applied to the post-dividend spot before taking its logarithm.
const MIN_EX_DIVIDEND_SPOT: f64 = 1.0e-8;

/// When a step condition fires.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTimes {
    /// After every solver sub-step.
    EveryStep,
    /// Only at these times.
    At(Vec<f64>),
}

impl ConditionTimes {
    /// `true` when the condition fires at `t`.
    pub fn matches(&self, t: f64) -> bool {
        match self {
            Self::EveryStep => true,
            Self::At(times) => times.iter().any(|&s| close_times(s, t)),
        }
    }
}

/// Modification of the value array at declared times.
pub trait StepCondition: Send {
    /// Times at which the condition fires.
    fn times(&self) -> ConditionTimes;

    /// Applies the condition at time `t`.
    fn apply_to(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError>;

    /// Stored snapshot `(time, values)`, for conditions that record one.
    fn snapshot(&self) -> Option<(f64, &[f64])> {
        None
    }
}

fn clamp_to_exercise(
    mesher: &FdmMesherComposite,
    calculator: &dyn InnerValueCalculator,
    a: &mut [f64],
    t: f64,
) -> Result<(), FdmError> {
    ensure_size("value array", a.len(), mesher.size())?;
    for point in mesher.iter() {
        let exercise = calculator.inner_value(&point, t);
        if exercise > a[point.index] {
            a[point.index] = exercise;
        }
    }
    Ok(())
}

/// Early exercise at every step: `a[i] = max(a[i], inner_value(i, t))`.
#[derive(Clone)]
pub struct FdmAmericanStepCondition {
    mesher: Arc<FdmMesherComposite>,
    calculator: Arc<dyn InnerValueCalculator>,
}

impl FdmAmericanStepCondition {
    /// Creates the condition.
    pub fn new(mesher: Arc<FdmMesherComposite>, calculator: Arc<dyn InnerValueCalculator>) -> Self {
        Self { mesher, calculator }
    }
}

impl fmt::Debug for FdmAmericanStepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdmAmericanStepCondition")
            .field("size", &self.mesher.size())
            .finish()
    }
}

impl StepCondition for FdmAmericanStepCondition {
    fn times(&self) -> ConditionTimes {
        ConditionTimes::EveryStep
    }

    fn apply_to(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        clamp_to_exercise(&self.mesher, self.calculator.as_ref(), a, t)
    }
}

/// Early exercise on a discrete set of dates.
#[derive(Clone)]
pub struct FdmBermudanStepCondition {
    mesher: Arc<FdmMesherComposite>,
    calculator: Arc<dyn InnerValueCalculator>,
    exercise_times: Vec<f64>,
}

impl FdmBermudanStepCondition {
    /// Exercise allowed at `exercise_times` (year fractions).
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        calculator: Arc<dyn InnerValueCalculator>,
        mut exercise_times: Vec<f64>,
    ) -> Result<Self, FdmError> {
        if exercise_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(FdmError::configuration("exercise times must be finite and >= 0"));
        }
        exercise_times.sort_by(f64::total_cmp);
        Ok(Self {
            mesher,
            calculator,
            exercise_times,
        })
    }
}

impl fmt::Debug for FdmBermudanStepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdmBermudanStepCondition")
            .field("exercise_times", &self.exercise_times)
            .finish()
    }
}

impl StepCondition for FdmBermudanStepCondition {
    fn times(&self) -> ConditionTimes {
        ConditionTimes::At(self.exercise_times.clone())
    }

    fn apply_to(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        clamp_to_exercise(&self.mesher, self.calculator.as_ref(), a, t)
    }
}

/// Discrete cash dividends on a log-spot axis.
///
/// At a dividend time the value at `x` becomes the pre-dividend value at
/// `ln(max(eˣ − D, ε))`, read off a natural cubic spline along the axis.
/// Queries below the grid are clamped to its first node.
#[derive(Debug, Clone)]
pub struct FdmDividendHandler {
    mesher: Arc<FdmMesherComposite>,
    axis: usize,
    dividends: Vec<(f64, f64)>,
}

impl FdmDividendHandler {
    /// Dividends as `(time, amount)` pairs on log-spot axis `axis`.
    pub fn new(
        mesher: Arc<FdmMesherComposite>,
        axis: usize,
        mut dividends: Vec<(f64, f64)>,
    ) -> Result<Self, FdmError> {
        mesher.check_axis(axis)?;
        if dividends
            .iter()
            .any(|(t, d)| !t.is_finite() || *t < 0.0 || !d.is_finite() || *d < 0.0)
        {
            return Err(FdmError::configuration(
                "dividend times and amounts must be finite and >= 0",
            ));
        }
        dividends.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            mesher,
            axis,
            dividends,
        })
    }
}

impl StepCondition for FdmDividendHandler {
    fn times(&self) -> ConditionTimes {
        ConditionTimes::At(self.dividends.iter().map(|(t, _)| *t).collect())
    }

    fn apply_to(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        ensure_size("value array", a.len(), self.mesher.size())?;
        let amount: f64 = self
            .dividends
            .iter()
            .filter(|(s, _)| close_times(*s, t))
            .map(|(_, d)| d)
            .sum();
        if amount == 0.0 {
            return Ok(());
        }

        let layout = self.mesher.layout();
        let n = layout.dim()[self.axis];
        let stride = layout.spacing()[self.axis];
        let x = self.mesher.meshers()[self.axis].locations().to_vec();
        let (x_min, x_max) = (x[0], x[n - 1]);

        for (start, coords) in layout.iter() {
            if coords[self.axis] != 0 {
                continue;
            }
            let line: Vec<f64> = (0..n).map(|k| a[start + k * stride]).collect();
            let spline = CubicNaturalSpline::new(x.clone(), line)?;
            for (k, xk) in x.iter().enumerate() {
                let ex_div = (xk.exp() - amount).max(MIN_EX_DIVIDEND_SPOT).ln();
                a[start + k * stride] = spline.value(ex_div.clamp(x_min, x_max))?;
            }
        }
        Ok(())
    }
}

/// Records a copy of the value array at one time.
#[derive(Debug, Clone)]
pub struct FdmSnapshotCondition {
    t: f64,
    values: Option<Vec<f64>>,
}

impl FdmSnapshotCondition {
    /// Snapshot taken at `t`.
    pub fn new(t: f64) -> Self {
        Self { t, values: None }
    }

    /// Snapshot time.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Recorded values, once the march has passed `t`.
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref()
    }
}

impl StepCondition for FdmSnapshotCondition {
    fn times(&self) -> ConditionTimes {
        ConditionTimes::At(vec![self.t])
    }

    fn apply_to(&mut self, a: &mut [f64], _t: f64) -> Result<(), FdmError> {
        self.values = Some(a.to_vec());
        Ok(())
    }

    fn snapshot(&self) -> Option<(f64, &[f64])> {
        self.values.as_deref().map(|v| (self.t, v))
    }
}

/// Ordered step conditions with their merged stopping times.
#[derive(Default)]
pub struct FdmStepConditionComposite {
    conditions: Vec<Box<dyn StepCondition>>,
    stopping_times: Vec<f64>,
}

impl fmt::Debug for FdmStepConditionComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdmStepConditionComposite")
            .field("conditions", &self.conditions.len())
            .field("stopping_times", &self.stopping_times)
            .finish()
    }
}

impl FdmStepConditionComposite {
    /// Empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite over `conditions`, applied in the given order.
    pub fn from_conditions(conditions: Vec<Box<dyn StepCondition>>) -> Self {
        let mut out = Self::new();
        for c in conditions {
            out.push(c);
        }
        out
    }

    /// Appends a condition and merges its times into the stopping times.
    pub fn push(&mut self, condition: Box<dyn StepCondition>) {
        if let ConditionTimes::At(times) = condition.times() {
            self.stopping_times.extend(times);
            self.stopping_times.sort_by(f64::total_cmp);
            self.stopping_times.dedup_by(|a, b| close_times(*a, *b));
        }
        self.conditions.push(condition);
    }

    /// Builder-style [`FdmStepConditionComposite::push`].
    pub fn with(mut self, condition: impl StepCondition + 'static) -> Self {
        self.push(Box::new(condition));
        self
    }

    /// Consumes the composite, returning its conditions in order.
    pub fn into_conditions(self) -> Vec<Box<dyn StepCondition>> {
        self.conditions
    }

    /// Increasing, deduplicated stopping times of all conditions.
    pub fn stopping_times(&self) -> &[f64] {
        &self.stopping_times
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// `true` without conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Applies, in order, every condition that fires at `t`.
    pub fn apply_to(&mut self, a: &mut [f64], t: f64) -> Result<(), FdmError> {
        for condition in &mut self.conditions {
            if condition.times().matches(t) {
                condition.apply_to(a, t)?;
            }
        }
        Ok(())
    }

    /// First recorded snapshot, if any.
    pub fn snapshot(&self) -> Option<(f64, &[f64])> {
        self.conditions.iter().find_map(|c| c.snapshot())
    }
}
