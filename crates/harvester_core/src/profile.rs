use serde::{Deserialize, Serialize};

/// Markup roles the pipeline looks up on listing and detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// One card on the listing page.
    ListingItem,
    /// Question title inside a card or a related block.
    Title,
    /// Category label inside a card.
    Tag,
    /// Anchor to the detail page inside a card or a related block.
    DetailLink,
    /// Rendered answer container on a detail page.
    Answer,
    /// One related-question block on a detail page.
    RelatedItem,
}

impl ElementRole {
    pub const ALL: [ElementRole; 6] = [
        ElementRole::ListingItem,
        ElementRole::Title,
        ElementRole::Tag,
        ElementRole::DetailLink,
        ElementRole::Answer,
        ElementRole::RelatedItem,
    ];
}

/// Site-specific markup knowledge: the origin used to absolutize links and one
/// CSS selector per [`ElementRole`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub origin: String,
    pub listing_item: String,
    pub title: String,
    pub tag: String,
    pub detail_link: String,
    pub answer: String,
    pub related_item: String,
}

impl SiteProfile {
    pub fn selector(&self, role: ElementRole) -> &str {
        match role {
            ElementRole::ListingItem => &self.listing_item,
            ElementRole::Title => &self.title,
            ElementRole::Tag => &self.tag,
            ElementRole::DetailLink => &self.detail_link,
            ElementRole::Answer => &self.answer,
            ElementRole::RelatedItem => &self.related_item,
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            origin: "https://www.askiitm.com".to_string(),
            listing_item: "div.w-dyn-item".to_string(),
            title: "h3.articel-chip-title".to_string(),
            tag: r#"div[fs-cmsfilter-field="category"]"#.to_string(),
            detail_link: "a.link-block.w-inline-block".to_string(),
            answer: "div.rich-text-wrapper.w-richtext".to_string(),
            related_item: "div.reads-collection-list-wrapper div.reads-collection-item".to_string(),
        }
    }
}
