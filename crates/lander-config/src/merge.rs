//! Reconciling externally supplied configuration against a known-good base.
//!
//! Top-level keys present in the incoming document replace the base value
//! wholesale. `header` and `sections` are merged one level deeper: every field
//! the incoming document names overrides the matching base field, the rest is
//! kept. Lists and the `hero`/`footer`/`theme` blocks are atomic because there
//! is no element-matching rule for partial lists.

use serde::{Deserialize, Serialize};

use crate::model::{
    ConfigError, ConfigSnapshot, Feature, Footer, Header, Hero, Link, PricingTier, SectionCopy,
    Sections, Testimonial, Theme,
};

/// A configuration document in which every top-level key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<PartialHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<Hero>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<PartialSections>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Vec<PricingTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testimonials: Option<Vec<Testimonial>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Header fields, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialHeader {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_initials: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav: Option<Vec<Link>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_editor_link: Option<bool>,
}

/// Section copy blocks, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<SectionCopy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<SectionCopy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testimonials: Option<SectionCopy>,
}

impl PartialConfig {
    /// Parse a possibly partial document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl From<&ConfigSnapshot> for PartialConfig {
    fn from(config: &ConfigSnapshot) -> Self {
        Self {
            header: Some(PartialHeader::from(&config.header)),
            hero: Some(config.hero.clone()),
            sections: Some(PartialSections::from(&config.sections)),
            features: Some(config.features.clone()),
            pricing: Some(config.pricing.clone()),
            testimonials: Some(config.testimonials.clone()),
            footer: Some(config.footer.clone()),
            theme: Some(config.theme.clone()),
        }
    }
}

impl From<&Header> for PartialHeader {
    fn from(header: &Header) -> Self {
        Self {
            brand_name: Some(header.brand_name.clone()),
            brand_initials: Some(header.brand_initials.clone()),
            nav: Some(header.nav.clone()),
            cta_label: Some(header.cta_label.clone()),
            cta_href: header.cta_href.clone(),
            show_editor_link: header.show_editor_link,
        }
    }
}

impl From<&Sections> for PartialSections {
    fn from(sections: &Sections) -> Self {
        Self {
            features: Some(sections.features.clone()),
            pricing: Some(sections.pricing.clone()),
            testimonials: Some(sections.testimonials.clone()),
        }
    }
}

impl PartialHeader {
    fn apply(&self, mut header: Header) -> Header {
        if let Some(brand_name) = &self.brand_name {
            header.brand_name = brand_name.clone();
        }
        if let Some(brand_initials) = &self.brand_initials {
            header.brand_initials = brand_initials.clone();
        }
        if let Some(nav) = &self.nav {
            header.nav = nav.clone();
        }
        if let Some(cta_label) = &self.cta_label {
            header.cta_label = cta_label.clone();
        }
        if self.cta_href.is_some() {
            header.cta_href = self.cta_href.clone();
        }
        if self.show_editor_link.is_some() {
            header.show_editor_link = self.show_editor_link;
        }
        header
    }
}

impl PartialSections {
    fn apply(&self, mut sections: Sections) -> Sections {
        if let Some(features) = &self.features {
            sections.features = features.clone();
        }
        if let Some(pricing) = &self.pricing {
            sections.pricing = pricing.clone();
        }
        if let Some(testimonials) = &self.testimonials {
            sections.testimonials = testimonials.clone();
        }
        sections
    }
}

/// Merge `incoming` onto `base`. An absent document returns `base` unchanged.
pub fn merge(base: ConfigSnapshot, incoming: Option<&PartialConfig>) -> ConfigSnapshot {
    let Some(incoming) = incoming else {
        return base;
    };

    let mut merged = base;

    if let Some(header) = &incoming.header {
        merged.header = header.apply(merged.header);
    }
    if let Some(sections) = &incoming.sections {
        merged.sections = sections.apply(merged.sections);
    }
    if let Some(hero) = &incoming.hero {
        merged.hero = hero.clone();
    }
    if let Some(features) = &incoming.features {
        merged.features = features.clone();
    }
    if let Some(pricing) = &incoming.pricing {
        merged.pricing = pricing.clone();
    }
    if let Some(testimonials) = &incoming.testimonials {
        merged.testimonials = testimonials.clone();
    }
    if let Some(footer) = &incoming.footer {
        merged.footer = footer.clone();
    }
    if let Some(theme) = &incoming.theme {
        merged.theme = theme.clone();
    }

    merged
}

/// Parse `source` and merge it onto `base`.
///
/// A JSON `null` document counts as absent.
pub fn merge_json(base: ConfigSnapshot, source: &str) -> Result<ConfigSnapshot, ConfigError> {
    let incoming: Option<PartialConfig> =
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(merge(base, incoming.as_ref()))
}

/// A configuration document arriving from storage, a file or a URL.
///
/// A document carrying every top-level key is a complete snapshot and is
/// taken exactly as written, including the optional header fields it leaves
/// out. Anything else is partial and goes through [`merge`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigDocument {
    Complete(ConfigSnapshot),
    Partial(PartialConfig),
}

impl ConfigDocument {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The snapshot this document describes on top of `base`.
    pub fn resolve(self, base: ConfigSnapshot) -> ConfigSnapshot {
        match self {
            ConfigDocument::Complete(config) => config,
            ConfigDocument::Partial(partial) => merge(base, Some(&partial)),
        }
    }
}

/// Parse `source` as a [`ConfigDocument`] and resolve it against `base`.
///
/// A JSON `null` document counts as absent.
pub fn resolve_json(base: ConfigSnapshot, source: &str) -> Result<ConfigSnapshot, ConfigError> {
    let document: Option<ConfigDocument> =
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(match document {
        Some(document) => document.resolve(base),
        None => base,
    })
}
