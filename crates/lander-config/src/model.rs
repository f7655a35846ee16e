//! Configuration document types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when working with configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown list: {0}")]
    UnknownList(String),

    #[error("Invalid value for section {section}: {message}")]
    InvalidSection { section: String, message: String },

    #[error("No ids left in {0}")]
    IdExhausted(ItemList),
}

/// A complete landing page configuration.
///
/// Snapshots are replaced wholesale on every edit and never mutated in place
/// once handed to the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub header: Header,
    pub hero: Hero,
    pub sections: Sections,
    pub features: Vec<Feature>,
    pub pricing: Vec<PricingTier>,
    pub testimonials: Vec<Testimonial>,
    pub footer: Footer,
    pub theme: Theme,
}

/// A navigation or footer link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    pub href: String,
}

impl Link {
    pub fn new(name: &str, href: &str) -> Self {
        Self {
            name: name.to_string(),
            href: href.to_string(),
        }
    }
}

/// Top navigation bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Header {
    pub brand_name: String,
    pub brand_initials: String,
    pub nav: Vec<Link>,
    pub cta_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_href: Option<String>,
    /// Whether the header links back into the editor. Forced off when publishing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_editor_link: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hero {
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
    pub cta_secondary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_primary_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_secondary_href: Option<String>,
    pub background_image: String,
    pub hero_image: String,
}

/// Heading copy for one list section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionCopy {
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_popular_label: Option<String>,
}

/// Copy blocks keyed by section name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub features: SectionCopy,
    pub pricing: SectionCopy,
    pub testimonials: SectionCopy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingTier {
    pub id: u32,
    pub name: String,
    pub price: String,
    pub period: String,
    pub description: String,
    pub features: Vec<String>,
    pub popular: bool,
    pub cta_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Testimonial {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub company: String,
    pub content: String,
    pub avatar: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterLinks {
    pub product: Vec<Link>,
    pub company: Vec<Link>,
    pub support: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
    pub name: String,
    pub href: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Footer {
    pub company_name: String,
    pub tagline: String,
    pub description: String,
    pub links: FooterLinks,
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub text_color: String,
}

/// List items that carry a small integer id unique within their list.
pub trait Identified {
    fn id(&self) -> u32;
}

impl Identified for Feature {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for PricingTier {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Testimonial {
    fn id(&self) -> u32 {
        self.id
    }
}

/// Next id for a list: `max(existing ids, 0) + 1`, or `None` once the
/// largest id is `u32::MAX`.
pub fn next_id<T: Identified>(items: &[T]) -> Option<u32> {
    max_of(items).checked_add(1)
}

fn max_of<T: Identified>(items: &[T]) -> u32 {
    items.iter().map(Identified::id).max().unwrap_or(0)
}

/// Top-level keys of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Hero,
    Sections,
    Features,
    Pricing,
    Testimonials,
    Footer,
    Theme,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Header,
        Section::Hero,
        Section::Sections,
        Section::Features,
        Section::Pricing,
        Section::Testimonials,
        Section::Footer,
        Section::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Hero => "hero",
            Section::Sections => "sections",
            Section::Features => "features",
            Section::Pricing => "pricing",
            Section::Testimonials => "testimonials",
            Section::Footer => "footer",
            Section::Theme => "theme",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownSection(s.to_string()))
    }
}

/// The id-carrying lists of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemList {
    Features,
    Pricing,
    Testimonials,
}

impl ItemList {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemList::Features => "features",
            ItemList::Pricing => "pricing",
            ItemList::Testimonials => "testimonials",
        }
    }
}

impl fmt::Display for ItemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemList {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "features" => Ok(ItemList::Features),
            "pricing" => Ok(ItemList::Pricing),
            "testimonials" => Ok(ItemList::Testimonials),
            other => Err(ConfigError::UnknownList(other.to_string())),
        }
    }
}

impl ConfigSnapshot {
    /// Parse a complete document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The configuration as it is published: identical to `self` except the
    /// header never links back into the editor.
    pub fn publish_view(&self) -> Self {
        let mut view = self.clone();
        view.header.show_editor_link = Some(false);
        view
    }

    /// Returns a copy with one top-level section replaced by `value`.
    pub fn with_section(
        &self,
        section: Section,
        value: serde_json::Value,
    ) -> Result<Self, ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidSection {
            section: section.to_string(),
            message: e.to_string(),
        };

        let mut next = self.clone();
        match section {
            Section::Header => next.header = serde_json::from_value(value).map_err(invalid)?,
            Section::Hero => next.hero = serde_json::from_value(value).map_err(invalid)?,
            Section::Sections => next.sections = serde_json::from_value(value).map_err(invalid)?,
            Section::Features => next.features = serde_json::from_value(value).map_err(invalid)?,
            Section::Pricing => next.pricing = serde_json::from_value(value).map_err(invalid)?,
            Section::Testimonials => {
                next.testimonials = serde_json::from_value(value).map_err(invalid)?
            }
            Section::Footer => next.footer = serde_json::from_value(value).map_err(invalid)?,
            Section::Theme => next.theme = serde_json::from_value(value).map_err(invalid)?,
        }
        Ok(next)
    }

    /// Largest id currently used in `list`, or 0 when empty.
    pub fn max_id(&self, list: ItemList) -> u32 {
        match list {
            ItemList::Features => max_of(&self.features),
            ItemList::Pricing => max_of(&self.pricing),
            ItemList::Testimonials => max_of(&self.testimonials),
        }
    }

    /// Returns a copy with a placeholder item appended to `list` under `id`.
    pub fn with_item_added(&self, list: ItemList, id: u32) -> Self {
        let mut next = self.clone();
        match list {
            ItemList::Features => next.features.push(Feature {
                id,
                title: "New Feature".to_string(),
                description: "Feature description".to_string(),
                icon: "/placeholder.svg?height=64&width=64".to_string(),
                image: "/placeholder.svg?height=300&width=400".to_string(),
            }),
            ItemList::Pricing => next.pricing.push(PricingTier {
                id,
                name: "New Plan".to_string(),
                price: "$19".to_string(),
                period: "month".to_string(),
                description: "Plan description".to_string(),
                features: vec!["Feature 1".to_string(), "Feature 2".to_string()],
                popular: false,
                cta_text: "Get Started".to_string(),
                cta_href: None,
            }),
            ItemList::Testimonials => next.testimonials.push(Testimonial {
                id,
                name: "Customer Name".to_string(),
                role: "Job Title".to_string(),
                company: "Company Name".to_string(),
                content: "This is an amazing product that has transformed our business."
                    .to_string(),
                avatar: "/placeholder.svg?height=80&width=80".to_string(),
                rating: 5,
            }),
        }
        next
    }

    /// Returns a copy without the item `id`, or `None` if `list` has no such item.
    pub fn with_item_removed(&self, list: ItemList, id: u32) -> Option<Self> {
        let mut next = self.clone();
        let removed = match list {
            ItemList::Features => remove_by_id(&mut next.features, id),
            ItemList::Pricing => remove_by_id(&mut next.pricing, id),
            ItemList::Testimonials => remove_by_id(&mut next.testimonials, id),
        };
        removed.then_some(next)
    }
}

fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: u32) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

/// Hands out list ids for one editing session.
///
/// Ids follow `max(existing ids, 0) + 1` but never drop below the highest id
/// this allocator already issued, so an id freed by a deletion (or by undoing
/// an insertion) is not handed out again.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    features: u32,
    pricing: u32,
    testimonials: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for `list` given the current document.
    ///
    /// Fails without handing out anything once the list's ids reach
    /// `u32::MAX`; wrapping around would collide with existing items.
    pub fn allocate(
        &mut self,
        config: &ConfigSnapshot,
        list: ItemList,
    ) -> Result<u32, ConfigError> {
        let issued = match list {
            ItemList::Features => &mut self.features,
            ItemList::Pricing => &mut self.pricing,
            ItemList::Testimonials => &mut self.testimonials,
        };
        let id = config
            .max_id(list)
            .max(*issued)
            .checked_add(1)
            .ok_or(ConfigError::IdExhausted(list))?;
        *issued = id;
        Ok(id)
    }
}
