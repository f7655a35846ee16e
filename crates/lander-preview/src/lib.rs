//! Live preview synchronization for the lander editor.
//!
//! The editor context and the rendering context share no memory. The editor
//! pushes whole configuration snapshots over a [`Transport`]; the rendering
//! context re-derives its state from each one. A freshly created rendering
//! context bootstraps from durable storage before any message can arrive.

pub mod channel;
pub mod client;
pub mod frame;
pub mod hub;
pub mod message;
pub mod renderer;
pub mod transport;

pub use channel::PreviewChannel;
pub use client::preview_client_script;
pub use frame::{DeviceMode, Dimensions, FrameState, ReloadDecision};
pub use hub::PreviewHub;
pub use message::{PreviewError, PreviewMessage, PreviewPayload, PROTOCOL_VERSION};
pub use renderer::{BootstrapSource, Renderer, SubscriptionId};
pub use transport::{in_process, Delivery, InProcessInbox, InProcessTransport, Transport};
