use crate::FrameId;

/// Options recognized when a router is attached to a container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RouterOptions {
    /// Frame shown when the location fragment is empty, overriding
    /// `data-default` and first-child discovery.
    pub start: Option<FrameId>,
}

impl RouterOptions {
    /// Options with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start frame.
    pub fn with_start(mut self, start: impl Into<FrameId>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Parse options from a TOML string, e.g. `start = "intro"`.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, crate::error::ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

/// Command forwarded to an attached router.
///
/// With the `serde` feature this reads the `{"action": "display", "frame": ..,
/// "context": ..}` and `{"action": "load", "frame": ..}` shapes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "action", rename_all = "lowercase"))]
pub enum Command<C> {
    /// Navigate to `frame`, handing `context` to the resulting transition.
    Display {
        frame: FrameId,
        #[cfg_attr(feature = "serde", serde(default))]
        context: Option<C>,
    },
    /// Re-fetch the content of `frame` even if it was loaded before.
    Load { frame: FrameId },
}

impl<C> Command<C> {
    /// Display command without context.
    pub fn display(frame: impl Into<FrameId>) -> Self {
        Command::Display {
            frame: frame.into(),
            context: None,
        }
    }

    /// Display command carrying a context value.
    pub fn display_with(frame: impl Into<FrameId>, context: C) -> Self {
        Command::Display {
            frame: frame.into(),
            context: Some(context),
        }
    }

    /// Force-load command.
    pub fn load(frame: impl Into<FrameId>) -> Self {
        Command::Load {
            frame: frame.into(),
        }
    }

    /// Frame the command targets.
    pub fn frame(&self) -> &FrameId {
        match self {
            Command::Display { frame, .. } | Command::Load { frame } => frame,
        }
    }
}
