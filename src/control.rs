//! A thread-safe handle for driving a [`Renderer`](crate::Renderer) from
//! outside the render loop.
//!
//! The renderer itself holds its backend handlers and stays on the render
//! thread. Other threads (a UI lifecycle callback, a settings panel) talk to
//! it through a [`RendererControl`]; requests are picked up at the next
//! `begin_frame`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::setting::RenderSetting;

type SettingEdit = Box<dyn FnOnce(&mut RenderSetting) + Send>;

#[derive(Default)]
struct Shared {
    destroy: AtomicBool,
    edits: Mutex<Vec<SettingEdit>>,
}

/// Cloneable, `Send + Sync` handle obtained from
/// [`Renderer::control`](crate::Renderer::control).
#[derive(Clone, Default)]
pub struct RendererControl {
    shared: Arc<Shared>,
}

impl fmt::Debug for RendererControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererControl")
            .field("destroy_requested", &self.is_destroy_requested())
            .finish_non_exhaustive()
    }
}

impl RendererControl {
    /// Ask the renderer to destroy itself. The next `begin_frame` tears it
    /// down and fails with a state error; a frame already in flight is not
    /// interrupted.
    pub fn request_destroy(&self) {
        self.shared.destroy.store(true, Ordering::Release);
    }

    /// Whether a destroy request is waiting.
    #[must_use]
    pub fn is_destroy_requested(&self) -> bool {
        self.shared.destroy.load(Ordering::Acquire)
    }

    /// Queue an edit of the render setting. Edits run in submission order
    /// at the next `begin_frame`, so concurrent writers to the same group
    /// resolve as last-writer-wins.
    pub fn update_setting(&self, edit: impl FnOnce(&mut RenderSetting) + Send + 'static) {
        self.shared
            .edits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(edit));
    }

    pub(crate) fn take_destroy_request(&self) -> bool {
        self.shared.destroy.swap(false, Ordering::AcqRel)
    }

    /// Run every queued edit against `setting`.
    pub(crate) fn apply_edits(&self, setting: &mut RenderSetting) {
        let edits = std::mem::take(
            &mut *self
                .shared
                .edits
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for edit in edits {
            edit(setting);
        }
    }
}
