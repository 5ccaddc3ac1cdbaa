//! Events delivered by a pub/sub channel.

/// A change observed on a channel path.
///
/// Delivery is at-least-once with no ordering across paths; receivers must
/// apply events idempotently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// An item was written at `path`.
    Changed {
        /// Remote path of the item
        path: String,
        /// Encoded [`DataItem`](crate::DataItem)
        payload: Vec<u8>,
    },
    /// The item at `path` was deleted.
    Deleted {
        /// Remote path of the removed item
        path: String,
    },
}

impl ChannelEvent {
    /// Path this event refers to.
    pub fn path(&self) -> &str {
        match self {
            ChannelEvent::Changed { path, .. } | ChannelEvent::Deleted { path } => path,
        }
    }
}
