use super::surface::{MediaElement, PageSurface};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// In-process media element. Backs the demo run and the state-machine tests.
#[derive(Default)]
pub struct SimulatedMedia {
    playing: AtomicBool,
    muted: AtomicBool,
}

impl SimulatedMedia {
    #[must_use]
    pub fn new(playing: bool, muted: bool) -> Arc<Self> {
        Arc::new(Self {
            playing: AtomicBool::new(playing),
            muted: AtomicBool::new(muted),
        })
    }
}

impl MediaElement for SimulatedMedia {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

/// In-process host page: an address cell, a mutation broadcast, an overlay
/// flag and a media element. `navigate` mimics SPA navigation (address swap
/// plus a structural-mutation burst, no reload).
pub struct SimulatedPage {
    address: Mutex<Option<String>>,
    mutations: broadcast::Sender<()>,
    overlay: AtomicBool,
    overlay_mounts: AtomicUsize,
    media: Mutex<Option<Arc<SimulatedMedia>>>,
}

impl SimulatedPage {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (mutations, _) = broadcast::channel(32);
        Arc::new(Self {
            address: Mutex::new(None),
            mutations,
            overlay: AtomicBool::new(false),
            overlay_mounts: AtomicUsize::new(0),
            media: Mutex::new(None),
        })
    }

    pub fn navigate(&self, address: impl Into<String>) {
        *self.address.lock().expect("address lock") = Some(address.into());
        let _ = self.mutations.send(());
    }

    /// Address swap with no mutation notification: the case only polling
    /// catches.
    pub fn set_address_silently(&self, address: impl Into<String>) {
        *self.address.lock().expect("address lock") = Some(address.into());
    }

    pub fn attach_media(&self, media: Arc<SimulatedMedia>) {
        *self.media.lock().expect("media lock") = Some(media);
        let _ = self.mutations.send(());
    }

    /// The host page fighting back: rip the overlay out and resume playback,
    /// the way a re-render can.
    pub fn host_page_interference(&self) {
        self.overlay.store(false, Ordering::SeqCst);
        if let Some(media) = self.media.lock().expect("media lock").as_ref() {
            media.play();
        }
        let _ = self.mutations.send(());
    }

    /// Total number of overlay mounts ever performed. Lets tests prove the
    /// overlay was created once, not stacked.
    #[must_use]
    pub fn overlay_mount_count(&self) -> usize {
        self.overlay_mounts.load(Ordering::SeqCst)
    }
}

impl PageSurface for SimulatedPage {
    fn current_address(&self) -> Option<String> {
        self.address.lock().expect("address lock").clone()
    }

    fn subscribe_mutations(&self) -> broadcast::Receiver<()> {
        self.mutations.subscribe()
    }

    fn mount_overlay(&self) {
        if !self.overlay.swap(true, Ordering::SeqCst) {
            self.overlay_mounts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn unmount_overlay(&self) {
        self.overlay.store(false, Ordering::SeqCst);
    }

    fn overlay_mounted(&self) -> bool {
        self.overlay.load(Ordering::SeqCst)
    }

    fn media(&self) -> Option<Arc<dyn MediaElement>> {
        self.media
            .lock()
            .expect("media lock")
            .clone()
            .map(|media| media as Arc<dyn MediaElement>)
    }
}
