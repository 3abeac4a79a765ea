use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Toots,
    Profiles,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Toots => "toots",
            Flow::Profiles => "profiles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Discover,
    Fetch,
    StoreRaw,
    ReadBack,
    Classify,
    StoreDerived,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Discover => "discover",
            Step::Fetch => "fetch",
            Step::StoreRaw => "store_raw",
            Step::ReadBack => "read_back",
            Step::Classify => "classify",
            Step::StoreDerived => "store_derived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done { rows: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
}

/// What happened at each step of one run.
///
/// A failed step under the `Continue` policy is recorded here and the run goes
/// on with empty data, so an empty result can always be told apart from a
/// failure by looking at the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub flow: Flow,
    steps: Vec<StepOutcome>,
    halted_at: Option<Step>,
}

impl RunReport {
    pub(crate) fn new(flow: Flow) -> Self {
        Self {
            flow,
            steps: Vec::new(),
            halted_at: None,
        }
    }

    pub(crate) fn done(&mut self, step: Step, rows: impl TryInto<u64>) {
        let rows = rows.try_into().unwrap_or(u64::MAX);
        self.steps.push(StepOutcome {
            step,
            status: StepStatus::Done { rows },
        });
    }

    pub(crate) fn failed(&mut self, step: Step, error: impl fmt::Display) {
        self.steps.push(StepOutcome {
            step,
            status: StepStatus::Failed {
                error: error.to_string(),
            },
        });
    }

    pub(crate) fn halt(&mut self, step: Step) {
        self.halted_at = Some(step);
    }

    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    /// Status of the last recorded attempt at `step`.
    pub fn status(&self, step: Step) -> Option<&StepStatus> {
        self.steps
            .iter()
            .rev()
            .find(|o| o.step == step)
            .map(|o| &o.status)
    }

    pub fn rows(&self, step: Step) -> Option<u64> {
        match self.status(step)? {
            StepStatus::Done { rows } => Some(*rows),
            StepStatus::Failed { .. } => None,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps
            .iter()
            .filter(|o| matches!(o.status, StepStatus::Failed { .. }))
    }

    /// The step that stopped the run early, if any.
    pub fn halted_at(&self) -> Option<Step> {
        self.halted_at
    }

    pub fn is_clean(&self) -> bool {
        self.halted_at.is_none() && self.failures().next().is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} run", self.flow.as_str())?;
        match self.halted_at {
            Some(step) => write!(f, " halted at {}", step.as_str())?,
            None => f.write_str(" completed")?,
        }
        for o in &self.steps {
            match &o.status {
                StepStatus::Done { rows } => write!(f, "\n  {:<14} ok ({rows} rows)", o.step.as_str())?,
                StepStatus::Failed { error } => {
                    write!(f, "\n  {:<14} FAILED: {error}", o.step.as_str())?
                }
            }
        }
        Ok(())
    }
}
