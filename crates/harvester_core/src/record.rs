use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};
use url::Url;

/// Tag used when a listing item carries no category.
pub const UNKNOWN_TAG: &str = "Unknown";
/// Answer recorded when a detail fetch degrades.
pub const UNKNOWN_ANSWER: &str = "Unknown";

/// Lightweight fields read straight from one listing element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    question: String,
    tag: String,
    detail_link: Option<String>,
}

impl SummaryRecord {
    /// Returns `None` when `question` is empty after trimming.
    ///
    /// An empty or missing tag falls back to [`UNKNOWN_TAG`]; an empty link is
    /// treated as absent.
    pub fn new(
        question: impl Into<String>,
        tag: Option<String>,
        detail_link: Option<String>,
    ) -> Option<Self> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return None;
        }
        let tag = tag
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TAG.to_string());
        let detail_link = detail_link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Some(Self {
            question,
            tag,
            detail_link,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn detail_link(&self) -> Option<&str> {
        self.detail_link.as_deref()
    }

    /// The detail link when present, else the question.
    pub fn identity(&self) -> &str {
        self.detail_link.as_deref().unwrap_or(&self.question)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedReference {
    pub question: String,
    pub href: String,
}

/// Fields only available from an item's rendered detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    pub answer: String,
    pub related: Vec<RelatedReference>,
}

impl DetailRecord {
    /// The degraded record: unknown answer, no related references.
    pub fn unknown() -> Self {
        Self {
            answer: UNKNOWN_ANSWER.to_string(),
            related: Vec::new(),
        }
    }
}

/// One persisted record: a summary merged with its optional detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestEntry {
    pub tag: String,
    pub question: String,
    pub href: String,
    pub answer: String,
    #[serde(rename = "suggested_questions", default)]
    pub related: Vec<RelatedReference>,
}

impl HarvestEntry {
    /// Merge a summary with its detail. Without a detail (no link was
    /// followed) the answer is left empty, which is distinct from the
    /// degraded [`UNKNOWN_ANSWER`].
    pub fn merge(summary: SummaryRecord, detail: Option<DetailRecord>) -> Self {
        let (answer, related) = match detail {
            Some(detail) => (detail.answer, detail.related),
            None => (String::new(), Vec::new()),
        };
        Self {
            tag: summary.tag,
            question: summary.question,
            href: summary.detail_link.unwrap_or_default(),
            answer,
            related,
        }
    }
}

/// Resolve a site-relative reference (leading `/`) against `origin`.
///
/// Protocol-relative references take the origin's scheme and dot segments
/// are normalized. Anything else is returned unchanged, as is a reference
/// that cannot be resolved.
pub fn absolutize(origin: &str, href: &str) -> String {
    let href = href.trim();
    if !href.starts_with('/') {
        return href.to_string();
    }
    match Url::parse(origin).and_then(|base| base.join(href)) {
        Ok(url) => url.into(),
        Err(err) => {
            engine_warn!("Cannot resolve {:?} against {:?}: {}", href, origin, err);
            href.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_href_gets_origin() {
        assert_eq!(
            absolutize("https://site.example", "/faq/x"),
            "https://site.example/faq/x"
        );
        assert_eq!(
            absolutize("https://site.example/", "/faq/x"),
            "https://site.example/faq/x"
        );
    }

    #[test]
    fn protocol_relative_href_keeps_its_host() {
        assert_eq!(
            absolutize("https://www.askiitm.com", "//cdn.example/faq/x"),
            "https://cdn.example/faq/x"
        );
    }

    #[test]
    fn dot_segments_are_normalized() {
        assert_eq!(
            absolutize("https://site.example", "/a/../b"),
            "https://site.example/b"
        );
    }

    #[test]
    fn unparsable_origin_leaves_href_alone() {
        assert_eq!(absolutize("not an origin", "/faq/x"), "/faq/x");
    }

    #[test]
    fn absolute_href_is_untouched() {
        assert_eq!(
            absolutize("https://site.example", "https://other.example/a"),
            "https://other.example/a"
        );
    }

    #[test]
    fn blank_question_is_rejected() {
        assert!(SummaryRecord::new("   ", None, None).is_none());
    }

    #[test]
    fn identity_prefers_link() {
        let linked = SummaryRecord::new("Q", None, Some("https://a/b".into())).unwrap();
        assert_eq!(linked.identity(), "https://a/b");
        let bare = SummaryRecord::new("Q", Some(String::new()), None).unwrap();
        assert_eq!(bare.identity(), "Q");
        assert_eq!(bare.tag(), UNKNOWN_TAG);
    }
}
