//! Harvester core: record model, site profile and the pure run state machine.
mod profile;
mod record;
mod run;
mod state;

pub use profile::{ElementRole, SiteProfile};
pub use record::{
    absolutize, DetailRecord, HarvestEntry, RelatedReference, SummaryRecord, UNKNOWN_ANSWER,
    UNKNOWN_TAG,
};
pub use run::{HarvestRun, HarvestRunBuilder, HarvestTally};
pub use state::{FetchStatus, RecordState};
