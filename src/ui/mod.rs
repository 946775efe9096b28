//! Progress reporting for a bootstrap run
//!
//! The run reports through the [`Ui`] trait:
//! - Current phase (Connecting, CreatingTables, Seeding, ...)
//! - Progress (current/total with a label)
//! - Activity log lines
//!
//! [`LogUi`] turns these into tracing events; [`SilentUi`] drops them.

/// Application phases, in the order a run goes through them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    CheckingTables,
    CreatingTables,
    ReadingSeedData,
    Seeding,
    Reporting,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connecting => write!(f, "Connecting"),
            Phase::CheckingTables => write!(f, "Checking for existing tables"),
            Phase::CreatingTables => write!(f, "Creating tables"),
            Phase::ReadingSeedData => write!(f, "Reading seed data"),
            Phase::Seeding => write!(f, "Loading seed data"),
            Phase::Reporting => write!(f, "Collecting summary"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Trait for UI implementations - allows both logging and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn log(&mut self, message: impl Into<String>);
}

/// Reports progress as tracing events
#[derive(Debug, Default)]
pub struct LogUi {
    phase: Option<Phase>,
}

impl LogUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }
}

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phase = Some(phase);
        tracing::info!("{}...", phase);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        tracing::debug!(current, total, "{}", label.into());
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        match self.phase {
            Some(phase) => tracing::info!(phase = %phase, "{}", message),
            None => tracing::info!("{}", message),
        }
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
