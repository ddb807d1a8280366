use std::sync::Arc;

use engine_logging::engine_warn;
use harvester_core::{absolutize, DetailRecord, ElementRole, RelatedReference, SummaryRecord};
use scraper::Html;

use crate::selectors::{element_href, element_text};
use crate::{DegradeReason, SelectorTable};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryExtraction {
    /// Records in document order.
    pub records: Vec<SummaryRecord>,
    /// Positions of listing elements dropped for lacking a question.
    pub skipped: Vec<usize>,
}

/// Turns a listing snapshot into summary records.
pub struct SummaryExtractor {
    selectors: Arc<SelectorTable>,
}

impl SummaryExtractor {
    pub fn new(selectors: Arc<SelectorTable>) -> Self {
        Self { selectors }
    }

    /// Walk listing items in document order, producing at most `max_count`
    /// records. Deterministic for a given snapshot.
    pub fn extract(&self, snapshot: &str, max_count: usize) -> SummaryExtraction {
        let document = Html::parse_document(snapshot);
        let mut extraction = SummaryExtraction::default();

        for (index, item) in self
            .selectors
            .select_all(&document, ElementRole::ListingItem)
            .enumerate()
        {
            if extraction.records.len() >= max_count {
                break;
            }

            let question = self
                .selectors
                .find_first(item, ElementRole::Title)
                .map(element_text)
                .unwrap_or_default();
            let tag = self
                .selectors
                .find_first(item, ElementRole::Tag)
                .map(element_text);
            let link = self
                .selectors
                .find_first(item, ElementRole::DetailLink)
                .and_then(element_href)
                .map(|href| absolutize(self.selectors.origin(), href));

            match SummaryRecord::new(question, tag, link) {
                Some(record) => extraction.records.push(record),
                None => {
                    engine_warn!("[{}] No question found, skipping listing item", index);
                    extraction.skipped.push(index);
                }
            }
        }

        extraction
    }
}

/// Turns a rendered detail page into a detail record.
pub struct DetailExtractor {
    selectors: Arc<SelectorTable>,
}

impl DetailExtractor {
    pub fn new(selectors: Arc<SelectorTable>) -> Self {
        Self { selectors }
    }

    /// A missing or empty answer container is a structural failure. Related
    /// blocks lacking a title or a link are skipped.
    pub fn extract(&self, snapshot: &str) -> Result<DetailRecord, DegradeReason> {
        let document = Html::parse_document(snapshot);
        let answer = self
            .selectors
            .select_all(&document, ElementRole::Answer)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .ok_or(DegradeReason::MissingAnswer)?;

        let related = self
            .selectors
            .select_all(&document, ElementRole::RelatedItem)
            .filter_map(|block| {
                let question = self
                    .selectors
                    .find_first(block, ElementRole::Title)
                    .map(element_text)
                    .filter(|text| !text.is_empty())?;
                let href = self
                    .selectors
                    .find_first(block, ElementRole::DetailLink)
                    .and_then(element_href)?;
                Some(RelatedReference {
                    question,
                    href: absolutize(self.selectors.origin(), href),
                })
            })
            .collect();

        Ok(DetailRecord { answer, related })
    }
}
