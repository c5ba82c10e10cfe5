use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// How playback is suppressed while content is blocked.
///
/// `Pause` halts the element; `Mute` lets it run silently. Either way the
/// pre-block state is captured first and restored exactly on approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionMode {
    #[default]
    Pause,
    Mute,
}

/// Play/mute state of the media element at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub playing: bool,
    pub muted: bool,
}

/// The host page's native media element.
///
/// All methods are synchronous: the agent runs them to completion between
/// suspension points, so there is no window for the host page to interleave.
pub trait MediaElement: Send + Sync {
    fn is_playing(&self) -> bool;
    fn is_muted(&self) -> bool;
    fn play(&self);
    fn pause(&self);
    fn set_muted(&self, muted: bool);

    fn capture(&self) -> PlaybackState {
        PlaybackState {
            playing: self.is_playing(),
            muted: self.is_muted(),
        }
    }

    fn restore(&self, state: PlaybackState) {
        if state.playing {
            self.play();
        } else {
            self.pause();
        }
        self.set_muted(state.muted);
    }

    fn suppress(&self, mode: SuppressionMode) {
        match mode {
            SuppressionMode::Pause => self.pause(),
            SuppressionMode::Mute => self.set_muted(true),
        }
    }
}

/// What the page agent can observe and do inside its host page.
///
/// Structural mutations arrive as an opaque change-notification stream; it
/// says "something changed", nothing more. Mounting the overlay also makes
/// the host page inert behind it.
pub trait PageSurface: Send + Sync {
    /// Current address of the host document, if one is displayed.
    fn current_address(&self) -> Option<String>;

    /// Subscribe to the structural-mutation notification stream.
    fn subscribe_mutations(&self) -> broadcast::Receiver<()>;

    fn mount_overlay(&self);
    fn unmount_overlay(&self);
    fn overlay_mounted(&self) -> bool;

    /// Re-find the media element. `None` while the host page is mid-render;
    /// the supervisory loop will find it on a later pass.
    fn media(&self) -> Option<Arc<dyn MediaElement>>;
}
