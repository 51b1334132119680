// surfview/src/frame.rs
//
//! On-demand frame dispatch.

use crate::context::{ContextID, RenderContext};
use crate::device::Device;
use crate::surface::SurfaceID;

use euclid::default::Size2D;
use std::fmt::{self, Debug, Formatter};
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Drawing callbacks supplied by the host.
///
/// All callbacks run on the thread that owns the context, with the view's window surface
/// current.
pub trait Renderer {
    /// A window surface was bound. GL objects created by earlier surfaces survive, since the
    /// context outlives its surfaces.
    fn surface_created(&mut self, _frame: &FrameContext) {}

    /// The window surface changed size.
    fn surface_changed(&mut self, _frame: &FrameContext, _size: Size2D<i32>) {}

    /// Draws one frame. The buffers are swapped afterwards.
    fn draw_frame(&mut self, frame: &FrameContext);
}

/// What a renderer can see while a callback runs.
pub struct FrameContext<'a> {
    device: &'a Device,
    context: &'a RenderContext,
    size: Size2D<i32>,
    frame_index: u64,
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(
        device: &'a Device,
        context: &'a RenderContext,
        size: Size2D<i32>,
        frame_index: u64,
    ) -> FrameContext<'a> {
        FrameContext { device, context, size, frame_index }
    }

    /// The size of the window surface, as last reported by the host or EGL.
    #[inline]
    pub fn size(&self) -> Size2D<i32> {
        self.size
    }

    /// The number of frames presented before this one.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[inline]
    pub fn context_id(&self) -> ContextID {
        self.context.id()
    }

    pub fn surface_id(&self) -> Option<SurfaceID> {
        self.device.context_surface_id(self.context).ok()
    }

    /// Looks up a GL entry point, for loading function pointers.
    #[inline]
    pub fn get_proc_address(&self, symbol_name: &str) -> *const c_void {
        self.device.get_proc_address(self.context, symbol_name)
    }
}

/// When the view draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Only after a frame has been requested.
    #[default]
    WhenDirty,
    /// Every turn of the rendering loop.
    Continuously,
}

type Waker = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RequesterState {
    dirty: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

/// A dirty flag that any thread can set to ask the view for a new frame.
#[derive(Clone, Default)]
pub struct FrameRequester {
    state: Arc<RequesterState>,
}

impl FrameRequester {
    pub fn new() -> FrameRequester {
        FrameRequester::default()
    }

    /// Marks the view dirty and wakes the rendering loop, if one is waiting.
    pub fn request_frame(&self) {
        self.state.dirty.store(true, Ordering::SeqCst);
        let waker = match self.state.waker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(ref wake) = *waker {
            wake();
        }
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.state.dirty.load(Ordering::SeqCst)
    }

    /// Clears the flag, returning whether it was set.
    #[inline]
    pub(crate) fn take_request(&self) -> bool {
        self.state.dirty.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn set_waker<W>(&self, waker: W)
    where
        W: Fn() + Send + Sync + 'static,
    {
        let mut slot = match self.state.waker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Box::new(waker));
    }
}

impl Debug for FrameRequester {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("FrameRequester")
            .field("requested", &self.is_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FrameRequester;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_requests_from_other_threads_are_seen_once() {
        let requester = FrameRequester::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        requester.set_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let remote = requester.clone();
        thread::spawn(move || remote.request_frame()).join().unwrap();
        assert!(requester.is_requested());
        assert!(requester.take_request());
        assert!(!requester.take_request());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }
}
