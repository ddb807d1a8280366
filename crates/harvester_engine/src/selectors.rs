use std::collections::HashMap;

use harvester_core::{ElementRole, SiteProfile};
use scraper::{ElementRef, Html, Selector};

use crate::HarvestError;

/// A [`SiteProfile`] with every selector parsed once up front.
#[derive(Debug)]
pub struct SelectorTable {
    origin: String,
    raw: SiteProfile,
    compiled: HashMap<ElementRole, Selector>,
}

impl SelectorTable {
    pub fn compile(profile: &SiteProfile) -> Result<Self, HarvestError> {
        let mut compiled = HashMap::with_capacity(ElementRole::ALL.len());
        for role in ElementRole::ALL {
            let css = profile.selector(role);
            let selector = Selector::parse(css).map_err(|err| {
                HarvestError::Config(format!("selector for {role:?} ({css}) is invalid: {err:?}"))
            })?;
            compiled.insert(role, selector);
        }
        Ok(Self {
            origin: profile.origin.trim_end_matches('/').to_string(),
            raw: profile.clone(),
            compiled,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The CSS text for `role`, for handing to a render session.
    pub fn css(&self, role: ElementRole) -> &str {
        self.raw.selector(role)
    }

    fn selector(&self, role: ElementRole) -> &Selector {
        // compile() inserts every role
        &self.compiled[&role]
    }

    /// First descendant of `scope` playing `role`.
    pub fn find_first<'a>(&self, scope: ElementRef<'a>, role: ElementRole) -> Option<ElementRef<'a>> {
        scope.select(self.selector(role)).next()
    }

    /// Every element in `document` playing `role`, in document order.
    pub fn select_all<'a>(
        &'a self,
        document: &'a Html,
        role: ElementRole,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        document.select(self.selector(role))
    }

    pub fn count(&self, html: &str, role: ElementRole) -> usize {
        let document = Html::parse_document(html);
        self.select_all(&document, role).count()
    }
}

/// Text content of `element` with whitespace runs collapsed to one space and
/// the ends trimmed. Inline markup adds no separator of its own.
pub fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `href` of `element`, trimmed; `None` when missing or blank.
pub fn element_href(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
}
