//! Rendering frame state and its reload policy.
//!
//! The rendering context is only torn down and recreated when an orthogonal
//! view parameter (the simulated device) changes after the initial mount.
//! Configuration changes never reload it; they travel as messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Simulated device the preview is rendered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

/// Frame size for a device mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub label: &'static str,
}

impl DeviceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::Desktop => "desktop",
            DeviceMode::Tablet => "tablet",
            DeviceMode::Mobile => "mobile",
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            DeviceMode::Desktop => Dimensions {
                width: 1200,
                height: 800,
                scale: 0.65,
                label: "Desktop",
            },
            DeviceMode::Tablet => Dimensions {
                width: 768,
                height: 1024,
                scale: 0.8,
                label: "Tablet (768px)",
            },
            DeviceMode::Mobile => Dimensions {
                width: 375,
                height: 812,
                scale: 1.0,
                label: "Mobile (375px)",
            },
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(DeviceMode::Desktop),
            "tablet" => Ok(DeviceMode::Tablet),
            "mobile" => Ok(DeviceMode::Mobile),
            other => Err(format!("Unknown device mode: {}", other)),
        }
    }
}

/// What the editor has to do with the rendering context after a view change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReloadDecision {
    /// Keep the current rendering context.
    Keep,
    /// Recreate the rendering context at the new generation.
    Reload { generation: u64 },
}

/// Editor-side view of the rendering frame.
#[derive(Debug, Clone, Default)]
pub struct FrameState {
    device: DeviceMode,
    generation: u64,
    mounted: bool,
    loaded: bool,
}

impl FrameState {
    pub fn new(device: DeviceMode) -> Self {
        Self {
            device,
            ..Default::default()
        }
    }

    /// Record the initial mount. Never triggers a reload.
    pub fn mount(&mut self) {
        self.mounted = true;
    }

    /// Switch device. Reloads only when mounted and the mode actually changes.
    pub fn set_device(&mut self, device: DeviceMode) -> ReloadDecision {
        if device == self.device {
            return ReloadDecision::Keep;
        }
        self.device = device;

        if !self.mounted {
            return ReloadDecision::Keep;
        }

        self.generation += 1;
        self.loaded = false;
        ReloadDecision::Reload {
            generation: self.generation,
        }
    }

    /// Record the rendering context's load signal.
    pub fn mark_loaded(&mut self) {
        self.mounted = true;
        self.loaded = true;
    }

    pub fn device(&self) -> DeviceMode {
        self.device
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// URL of the rendering context for the current device and generation.
    ///
    /// The configuration itself is never put in the URL; large documents
    /// would overflow URL length limits.
    pub fn url(&self, base: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("preview", "true")
            .append_pair("mode", self.device.as_str())
            .append_pair("ts", &self.generation.to_string())
            .finish();
        format!("{}?{}", base, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_mount_never_reloads() {
        let mut frame = FrameState::default();

        assert_eq!(frame.set_device(DeviceMode::Mobile), ReloadDecision::Keep);
        frame.mount();

        assert_eq!(frame.device(), DeviceMode::Mobile);
        assert_eq!(frame.generation(), 0);
    }

    #[test]
    fn device_change_after_mount_reloads() {
        let mut frame = FrameState::default();
        frame.mount();

        assert_eq!(
            frame.set_device(DeviceMode::Tablet),
            ReloadDecision::Reload { generation: 1 }
        );
        assert!(!frame.is_loaded());

        frame.mark_loaded();
        assert!(frame.is_loaded());
    }

    #[test]
    fn same_device_keeps_frame() {
        let mut frame = FrameState::new(DeviceMode::Tablet);
        frame.mount();

        assert_eq!(frame.set_device(DeviceMode::Tablet), ReloadDecision::Keep);
        assert_eq!(frame.generation(), 0);
    }

    #[test]
    fn url_carries_view_parameters_only() {
        let mut frame = FrameState::default();
        frame.mount();
        frame.set_device(DeviceMode::Mobile);

        assert_eq!(
            frame.url("/preview"),
            "/preview?preview=true&mode=mobile&ts=1"
        );
    }

    #[test]
    fn parses_device_modes() {
        assert_eq!("tablet".parse::<DeviceMode>(), Ok(DeviceMode::Tablet));
        assert!("watch".parse::<DeviceMode>().is_err());
        assert_eq!(DeviceMode::Mobile.dimensions().width, 375);
    }
}
