//! Rendering-context side of the preview protocol.

use std::sync::Arc;

use lander_config::{ConfigDocument, ConfigSnapshot};
use lander_store::DurableSlots;

use crate::message::{PreviewError, PreviewMessage, PreviewPayload};
use crate::transport::{Delivery, InProcessInbox};

/// Handle returned by [`Renderer::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn Fn(&ConfigSnapshot) + Send + Sync>;

/// Where the renderer's initial configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    Defaults,
    Storage,
    UrlParameter,
}

/// State of one rendering context.
///
/// Every accepted message replaces the displayed configuration with the
/// complete snapshot it carries; nothing from the previous state leaks
/// through. Interested parties register a callback instead of reaching for a
/// global entry point.
pub struct Renderer {
    allowed_origins: Vec<String>,
    defaults: ConfigSnapshot,
    config: Arc<ConfigSnapshot>,
    source: BootstrapSource,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("allowed_origins", &self.allowed_origins)
            .field("source", &self.source)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// A renderer showing the built-in defaults, accepting messages only from
    /// `allowed_origins`.
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let defaults = ConfigSnapshot::default();
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
            config: Arc::new(defaults.clone()),
            defaults,
            source: BootstrapSource::Defaults,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Initialise a freshly created rendering context.
    ///
    /// Loads from durable storage (cross-session slot first, then the session
    /// slot), falling back to the defaults. When `query` marks the context as
    /// a preview and carries a `config` parameter, that document is applied on
    /// top: a complete snapshot replaces, a partial one is merged.
    pub fn bootstrap<I, S>(allowed_origins: I, slots: &DurableSlots, query: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut renderer = Self::new(allowed_origins);

        if let Some(stored) = slots.load::<ConfigDocument>() {
            renderer.config = Arc::new(stored.resolve(renderer.defaults.clone()));
            renderer.source = BootstrapSource::Storage;
        }

        if let Some(incoming) = query.and_then(config_from_query) {
            let base = (*renderer.config).clone();
            renderer.config = Arc::new(incoming.resolve(base));
            renderer.source = BootstrapSource::UrlParameter;
        }

        tracing::debug!("Rendering context bootstrapped from {:?}", renderer.source);
        renderer
    }

    pub fn config(&self) -> &Arc<ConfigSnapshot> {
        &self.config
    }

    pub fn source(&self) -> BootstrapSource {
        self.source
    }

    /// Register `callback` to run with every newly applied configuration.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ConfigSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Apply one delivery.
    ///
    /// Messages from origins outside the allow-list, undecodable messages and
    /// messages of another protocol version are rejected, logged and leave
    /// the rendered state untouched.
    pub fn receive(&mut self, delivery: &Delivery) -> Result<(), PreviewError> {
        if !self.allowed_origins.iter().any(|o| *o == delivery.origin) {
            tracing::warn!("Rejected preview message from {}", delivery.origin);
            return Err(PreviewError::OriginRejected(delivery.origin.clone()));
        }

        let message = PreviewMessage::decode(&delivery.data).inspect_err(|e| {
            tracing::warn!("Rejected preview message: {}", e);
        })?;

        match message.payload {
            PreviewPayload::ConfigUpdate { config } => {
                self.config = Arc::new(config);
            }
        }

        for (_, subscriber) in &self.subscribers {
            subscriber(self.config.as_ref());
        }
        Ok(())
    }

    /// Apply every pending delivery from `inbox`. Returns how many were accepted.
    pub fn drain(&mut self, inbox: &mut InProcessInbox) -> usize {
        inbox
            .drain()
            .iter()
            .filter(|delivery| self.receive(delivery).is_ok())
            .count()
    }
}

fn config_from_query(query: &str) -> Option<ConfigDocument> {
    let mut preview = false;
    let mut config = None;

    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            "preview" => preview = value == "true",
            "config" => config = Some(value.into_owned()),
            _ => {}
        }
    }

    if !preview {
        return None;
    }

    match ConfigDocument::from_json(&config?) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Could not parse config from URL: {}", e);
            None
        }
    }
}
