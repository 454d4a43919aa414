//! Commands and types used throughout hyprscroll.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every request the switcher reacts to, and
//! [`Action`] / [`ScrollSample`] / [`DeviceId`] provide the supporting data
//! types.
//!
//! The compositor plugin forwards raw arguments; the daemon parses action
//! names (e.g. "windows", "Workspaces-Switcher") and scroll kinds
//! (e.g. "up", `{"smooth":{"dx":0,"dy":3.5}}`) leniently.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The target a scroll region switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    Windows,
    Workspaces,
}

impl Action {
    /// Both actions, in a fixed order.
    pub const ALL: [Action; 2] = [Action::Windows, Action::Workspaces];

    /// Position of the action in [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Windows => 0,
            Action::Workspaces => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Windows => write!(f, "windows"),
            Action::Workspaces => write!(f, "workspaces"),
        }
    }
}

/// Lowercase `s` and strip whitespace, `_` and `-`.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parse an action name (case-insensitive; accepts "windows",
/// "windows-switcher", "Workspace", etc.).
fn parse_action(s: &str) -> Option<Action> {
    match normalize(s).as_str() {
        "window" | "windows" | "windowsswitcher" => Some(Action::Windows),
        "workspace" | "workspaces" | "workspacesswitcher" => Some(Action::Workspaces),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_action(&s).ok_or_else(|| DeError::custom(format!("invalid action: {:?}", s)))
    }
}

/// Descriptor of the physical device an event came from.
///
/// All fields are opaque strings as reported by the input stack.  Fields
/// the reporter does not know are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceId {
    pub name: String,
    pub vendor_id: String,
    pub product_id: String,
}

impl DeviceId {
    pub fn new(
        name: impl Into<String>,
        vendor_id: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vendor_id: vendor_id.into(),
            product_id: product_id.into(),
        }
    }

    /// A device known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} [{}:{}]", self.name, self.vendor_id, self.product_id)
    }
}

/// What kind of scroll an event carries.
///
/// Discrete wheel clicks map to the four directions; continuous input
/// (touchpads, high-resolution wheels) arrives as [`Smooth`](ScrollKind::Smooth)
/// with a two-axis delta.  Anything else decodes as
/// [`Unknown`](ScrollKind::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScrollKind {
    Up,
    Down,
    Left,
    Right,
    Smooth { dx: f64, dy: f64 },
    Unknown,
}

/// Parse a discrete scroll kind; unrecognised names become `Unknown`.
fn parse_discrete_kind(s: &str) -> ScrollKind {
    match normalize(s).as_str() {
        "up" => ScrollKind::Up,
        "down" => ScrollKind::Down,
        "left" => ScrollKind::Left,
        "right" => ScrollKind::Right,
        _ => ScrollKind::Unknown,
    }
}

/// Wire payload of a smooth scroll.
#[derive(Deserialize)]
struct SmoothDelta {
    #[serde(default)]
    dx: f64,
    #[serde(default)]
    dy: f64,
}

impl<'de> Deserialize<'de> for ScrollKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = ScrollKind;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "scroll direction string or {{\"smooth\": {{dx, dy}}}}")
            }
            fn visit_str<E>(self, s: &str) -> Result<ScrollKind, E>
            where
                E: DeError,
            {
                Ok(parse_discrete_kind(s))
            }
            fn visit_map<A>(self, mut map: A) -> Result<ScrollKind, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut kind = ScrollKind::Unknown;
                while let Some(k) = map.next_key::<String>()? {
                    if normalize(&k) == "smooth" {
                        let delta: SmoothDelta = map.next_value()?;
                        kind = ScrollKind::Smooth {
                            dx: delta.dx,
                            dy: delta.dy,
                        };
                    } else {
                        let _: serde::de::IgnoredAny = map.next_value()?;
                    }
                }
                Ok(kind)
            }
            fn visit_u64<E>(self, _: u64) -> Result<ScrollKind, E>
            where
                E: DeError,
            {
                // Some compositors forward raw enum codes.
                Ok(ScrollKind::Unknown)
            }
            fn visit_i64<E>(self, _: i64) -> Result<ScrollKind, E>
            where
                E: DeError,
            {
                Ok(ScrollKind::Unknown)
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// One incoming scroll event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollSample {
    /// The physical device that produced the event.
    #[serde(default)]
    pub device: DeviceId,
    /// Direction or continuous delta.
    pub kind: ScrollKind,
    /// Synthetic event derived from touch input.  These are ignored.
    #[serde(default, alias = "is_pointer_emulated")]
    pub emulated: bool,
}

impl ScrollSample {
    /// A hardware (non-emulated) sample.
    pub fn new(device: DeviceId, kind: ScrollKind) -> Self {
        Self {
            device,
            kind,
            emulated: false,
        }
    }

    /// A smooth sample with the given deltas.
    pub fn smooth(device: DeviceId, dx: f64, dy: f64) -> Self {
        Self::new(device, ScrollKind::Smooth { dx, dy })
    }
}

/// Every request the switcher reacts to.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`ScrollSwitcher`](crate::switcher::ScrollSwitcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// A scroll event over the region bound to `action`.
    Scroll { action: Action, sample: ScrollSample },

    /// Bind the scroll region of an action.
    Bind(Action),

    /// Unbind the scroll region of an action, cancelling anything in flight.
    Unbind(Action),

    /// Re-attach an action to its region: drops accumulated scroll,
    /// cancels pending timers and discards the open feedback session.
    Rebind(Action),

    /// Re-read the configuration file.
    ///
    /// Handled by the daemon loop; the switcher only receives the parsed
    /// result through [`set_config`](crate::switcher::ScrollSwitcher::set_config).
    ReloadConfig,

    /// Bind every action enabled in the configuration.
    Enable,

    /// Tear everything down without activating deferred switches.
    Disable,
}
