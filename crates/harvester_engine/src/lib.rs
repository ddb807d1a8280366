//! Harvester engine: render sessions and the harvesting pipeline.
mod coordinator;
mod decode;
mod detail;
mod extract;
mod http_session;
mod index;
mod listing;
mod selectors;
mod session;
mod settings;
mod sink;
mod types;

#[cfg(feature = "browser")]
mod chromium;

pub use coordinator::Harvester;
pub use decode::decode_page;
pub use detail::{DetailFetcher, FetchOutcome};
pub use extract::{DetailExtractor, SummaryExtraction, SummaryExtractor};
pub use http_session::{HttpRenderSession, HttpSessionSettings};
pub use index::{
    ask, index_entries, AskError, AskRequest, AskResponse, AskResult, Embedder, FaqProperties,
    FieldType, IndexError, IndexTally, SchemaField, ScoredHit, VectorStore, DEFAULT_ASK_LIMIT,
    DEFAULT_COLLECTION, FAQ_FIELDS, NO_MATCH_ANSWER,
};
pub use listing::{ListingScan, ListingScanner, ScanStop};
pub use selectors::{element_href, element_text, SelectorTable};
pub use session::RenderSession;
pub use settings::{default_max_scrolls, HarvestSettings};
pub use sink::{
    ensure_output_dir, read_entries, JsonFileSink, PersistError, Sink, DEFAULT_OUTPUT_FILE,
};
pub use types::{ContextHandle, DegradeReason, HarvestError, RenderError, RenderFailure};

#[cfg(feature = "browser")]
pub use chromium::{ChromiumOptions, ChromiumSession};
