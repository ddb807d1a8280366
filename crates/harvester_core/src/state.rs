/// Lifecycle of one summary record inside a harvest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    #[default]
    Pending,
    Fetching,
    Merged,
    Skipped,
}

impl RecordState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordState::Merged | RecordState::Skipped)
    }
}

/// How the detail side of a merged entry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Answer container rendered and was extracted.
    Clean,
    /// Timeout, navigation failure or missing markup; entry carries the
    /// unknown answer.
    Degraded,
    /// Record had no detail link, so nothing was fetched.
    NotAttempted,
}
