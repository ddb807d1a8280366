//! Downstream collaborators: embedding, the hybrid vector store, the upload
//! job that feeds it, and the question-answering lookup served on top.

use engine_logging::{engine_info, engine_warn};
use harvester_core::{HarvestEntry, UNKNOWN_TAG};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLLECTION: &str = "FAQ";
pub const DEFAULT_ASK_LIMIT: usize = 3;
pub const NO_MATCH_ANSWER: &str = "No matching answers found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    pub name: &'static str,
    pub data_type: FieldType,
}

/// Properties stored per FAQ object.
pub const FAQ_FIELDS: [SchemaField; 4] = [
    SchemaField { name: "question", data_type: FieldType::Text },
    SchemaField { name: "answer", data_type: FieldType::Text },
    SchemaField { name: "tag", data_type: FieldType::Text },
    SchemaField { name: "href", data_type: FieldType::Text },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqProperties {
    pub question: String,
    pub answer: String,
    pub tag: String,
    pub href: String,
}

impl From<&HarvestEntry> for FaqProperties {
    fn from(entry: &HarvestEntry) -> Self {
        let tag = if entry.tag.trim().is_empty() {
            UNKNOWN_TAG.to_string()
        } else {
            entry.tag.clone()
        };
        Self {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            tag,
            href: entry.href.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub properties: FaqProperties,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("vector store error: {0}")]
    Store(String),
}

/// Text to fixed-length vector. Expected to be deterministic for a given
/// model version.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;
}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist yet.
    async fn ensure_schema(&self, collection: &str, fields: &[SchemaField])
        -> Result<(), IndexError>;

    async fn insert(
        &self,
        collection: &str,
        properties: FaqProperties,
        vector: Vec<f32>,
    ) -> Result<(), IndexError>;

    /// Ranked best-first.
    async fn hybrid_query(
        &self,
        collection: &str,
        text: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredHit>, IndexError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexTally {
    pub success: usize,
    pub failure: usize,
}

/// Embed each entry's question and insert it with its properties.
///
/// Only schema setup is fatal; a failing entry is logged and counted.
pub async fn index_entries(
    entries: &[HarvestEntry],
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
) -> Result<IndexTally, IndexError> {
    store.ensure_schema(collection, &FAQ_FIELDS).await?;

    let mut tally = IndexTally::default();
    for entry in entries {
        let result = async {
            let vector = embedder.embed(&entry.question).await?;
            store
                .insert(collection, FaqProperties::from(entry), vector)
                .await
        }
        .await;
        match result {
            Ok(()) => tally.success += 1,
            Err(err) => {
                engine_warn!("Failed to upload: {} | Error: {}", entry.question, err);
                tally.failure += 1;
            }
        }
    }

    engine_info!(
        "Upload complete: success={} failure={}",
        tally.success,
        tally.failure
    );
    Ok(tally)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskResult {
    pub question: String,
    pub answer: String,
    pub tag: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AskResponse {
    Results { results: Vec<AskResult> },
    NoMatch { answer: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AskError {
    #[error("empty query")]
    EmptyQuestion,
    #[error(transparent)]
    Backend(#[from] IndexError),
}

impl AskError {
    /// True when the caller sent a bad request rather than the backend failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AskError::EmptyQuestion)
    }
}

/// Answer a free-text question with the closest stored FAQs.
pub async fn ask(
    request: &AskRequest,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    collection: &str,
    limit: usize,
) -> Result<AskResponse, AskError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AskError::EmptyQuestion);
    }

    let vector = embedder.embed(question).await?;
    let hits = store
        .hybrid_query(collection, question, &vector, limit)
        .await?;
    if hits.is_empty() {
        return Ok(AskResponse::NoMatch {
            answer: NO_MATCH_ANSWER.to_string(),
        });
    }

    let results = hits
        .into_iter()
        .map(|hit| AskResult {
            question: hit.properties.question,
            answer: hit.properties.answer,
            tag: hit.properties.tag,
            link: hit.properties.href,
        })
        .collect();
    Ok(AskResponse::Results { results })
}
