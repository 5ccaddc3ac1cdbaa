//! Display-mode state machine for the renderer.
//!
//! The renderer observes local store mutations and refreshes only the visual
//! property a setting feeds. While the display is dimmed those refreshes are
//! dropped, and waking up triggers a single full resync instead of replaying
//! what was missed.
//!
//! Like the rest of this crate the machine performs no I/O: it consumes a
//! [`DisplayEvent`] and returns the next state plus the [`RenderAction`]s the
//! caller has to carry out.

use crate::registry::keys;

/// Visual property a setting feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualProperty {
    /// Background color or image.
    Background,
    /// Text fill color.
    TextColor,
    /// Typeface and weight.
    Typeface,
    /// Drop shadow under the text.
    TextShadow,
    /// Text size.
    TextSize,
    /// Text alignment on the face.
    TextPosition,
    /// Capitalization of the time phrase.
    TextCase,
}

impl VisualProperty {
    /// Property refreshed when `name` changes, if any.
    ///
    /// Both background representations and the local bookkeeping keys map to
    /// [`VisualProperty::Background`]. Font and style share the typeface.
    pub fn for_setting(name: &str) -> Option<Self> {
        match name {
            keys::BACKGROUND_COLOR
            | keys::BACKGROUND_ASSET
            | keys::BACKGROUND_TYPE
            | keys::BACKGROUND_LAST_CHANGED => Some(Self::Background),
            keys::TEXT_COLOR => Some(Self::TextColor),
            keys::TEXT_STYLE | keys::TEXT_FONT => Some(Self::Typeface),
            keys::TEXT_SHADOW => Some(Self::TextShadow),
            keys::TEXT_SIZE => Some(Self::TextSize),
            keys::TEXT_POSITION => Some(Self::TextPosition),
            keys::TEXT_CASE => Some(Self::TextCase),
            _ => None,
        }
    }
}

/// Display mode of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    /// Normal display; setting changes are applied as they arrive.
    #[default]
    Interactive,
    /// Reduced-power display; setting changes are suppressed.
    Dimmed,
}

/// Inputs to the display state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A setting was written to the local store.
    SettingChanged {
        /// Logical name of the setting.
        name: String,
    },
    /// The device entered its reduced-power display.
    Dim,
    /// The device returned to the normal display.
    Wake,
}

/// Work for the renderer, produced by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderAction {
    /// Re-read the values behind one property and apply them.
    Refresh {
        /// Setting that changed.
        name: String,
        /// Property to refresh.
        property: VisualProperty,
    },
    /// Re-read every setting and apply all properties.
    FullResync,
    /// Switch to the simplified dimmed palette.
    ApplyAmbient,
}

impl DisplayState {
    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: DisplayEvent) -> (Self, Vec<RenderAction>) {
        match (self, event) {
            (Self::Interactive, DisplayEvent::SettingChanged { name }) => {
                match VisualProperty::for_setting(&name) {
                    Some(property) => (self, vec![RenderAction::Refresh { name, property }]),
                    None => (self, vec![]),
                }
            }
            (Self::Interactive, DisplayEvent::Dim) => {
                (Self::Dimmed, vec![RenderAction::ApplyAmbient])
            }
            (Self::Dimmed, DisplayEvent::Wake) => {
                (Self::Interactive, vec![RenderAction::FullResync])
            }

            // Suppressed while dimmed; the wake-up resync picks it up.
            (Self::Dimmed, DisplayEvent::SettingChanged { .. }) => (self, vec![]),

            // Repeated dim/wake signals are no-ops
            (state, _) => (state, vec![]),
        }
    }

    /// Check if updates are currently suppressed.
    pub fn is_dimmed(&self) -> bool {
        matches!(self, Self::Dimmed)
    }
}
