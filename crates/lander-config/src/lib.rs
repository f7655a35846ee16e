//! Landing page configuration model.
//!
//! Defines the configuration document edited by the lander editor, the
//! built-in default page, list id allocation, and the merge policy shared by
//! JSON import, URL bootstrap and inbound preview messages.

pub mod defaults;
pub mod merge;
pub mod model;

pub use merge::{
    merge, merge_json, resolve_json, ConfigDocument, PartialConfig, PartialHeader, PartialSections,
};
pub use model::{
    next_id, ConfigError, ConfigSnapshot, Feature, Footer, FooterLinks, Header, Hero, IdAllocator,
    Identified, ItemList, Link, PricingTier, Section, SectionCopy, Sections, SocialLink,
    Testimonial, Theme,
};
