// surfview/src/host.rs
//
//! A dedicated rendering thread that owns a view.
//!
//! Hosts whose windowing callbacks arrive on a UI thread forward them here as [`ViewEvent`]s;
//! the rendering thread applies them to its [`GlView`] in order and draws on demand.

use crate::frame::{FrameRequester, RenderMode};
use crate::view::{GlView, LifecycleState};
use crate::window::{NativeWindow, PlatformWindow};
use crate::Error;

use euclid::default::Size2D;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

const RENDER_THREAD_NAME: &str = "surfview-render";

/// A windowing callback forwarded to the rendering thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewEvent {
    /// The host's window was created or replaced.
    WindowAvailable(NativeWindow),
    /// The window changed size.
    WindowResized(Size2D<i32>),
    /// The window is about to go away.
    WindowDestroyed,
    /// The host wants a new frame.
    Invalidate,
}

enum Message {
    Event(ViewEvent),
    Wake,
    Shutdown,
}

/// A thread that owns a [`GlView`] and drives it from host events.
pub struct RenderThread {
    sender: Sender<Message>,
    requester: FrameRequester,
    join_handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Spawns the rendering thread, builds the view there with `factory` and creates its
    /// context. Failures to do either are returned here.
    pub fn spawn<F>(factory: F) -> Result<RenderThread, Error>
    where
        F: FnOnce() -> Result<GlView, Error> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let (ready_sender, ready_receiver) = mpsc::channel();

        let join_handle = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_owned())
            .spawn(move || {
                let mut view = match factory() {
                    Ok(view) => view,
                    Err(err) => {
                        drop(ready_sender.send(Err(err)));
                        return;
                    }
                };
                if let Err(err) = view.create_context() {
                    drop(ready_sender.send(Err(err)));
                    return;
                }
                if ready_sender.send(Ok(view.frame_requester())).is_err() {
                    return;
                }
                run(view, receiver);
            })
            .map_err(|err| {
                error!("couldn't spawn the rendering thread: {}", err);
                Error::Failed
            })?;

        let requester = match ready_receiver.recv() {
            Ok(Ok(requester)) => requester,
            Ok(Err(err)) => {
                drop(join_handle.join());
                return Err(err);
            }
            Err(_) => {
                drop(join_handle.join());
                return Err(Error::RenderThreadExited);
            }
        };

        let waker = Mutex::new(sender.clone());
        requester.set_waker(move || {
            if let Ok(sender) = waker.lock() {
                drop(sender.send(Message::Wake));
            }
        });

        Ok(RenderThread { sender, requester, join_handle: Some(join_handle) })
    }

    /// Forwards a host event to the rendering thread.
    pub fn send(&self, event: ViewEvent) -> Result<(), Error> {
        self.sender.send(Message::Event(event)).map_err(|_| Error::RenderThreadExited)
    }

    /// Marks the view dirty and wakes the rendering thread.
    pub fn request_render(&self) -> Result<(), Error> {
        if !self.is_running() {
            return Err(Error::RenderThreadExited);
        }
        self.requester.request_frame();
        Ok(())
    }

    #[inline]
    pub fn frame_requester(&self) -> FrameRequester {
        self.requester.clone()
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().map_or(false, |join_handle| !join_handle.is_finished())
    }

    /// Releases the surface, destroys the context and waits for the thread to exit.
    pub fn shutdown(mut self) -> Result<(), Error> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), Error> {
        let join_handle = match self.join_handle.take() {
            None => return Ok(()),
            Some(join_handle) => join_handle,
        };
        drop(self.sender.send(Message::Shutdown));
        join_handle.join().map_err(|_| {
            error!("the rendering thread panicked");
            Error::RenderThreadExited
        })
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        drop(self.stop());
    }
}

fn run(mut view: GlView, receiver: Receiver<Message>) {
    debug!("rendering thread started");
    loop {
        let draws_every_turn = view.render_mode() == RenderMode::Continuously
            && view.state() == LifecycleState::SurfaceReady;
        let message = if draws_every_turn {
            match receiver.try_recv() {
                Ok(message) => Some(message),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match receiver.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            }
        };

        match message {
            Some(Message::Shutdown) => break,
            Some(Message::Event(event)) => handle_event(&mut view, event),
            Some(Message::Wake) | None => {}
        }
        view.draw_frame_if_requested();
    }

    if view.state() == LifecycleState::SurfaceReady {
        view.release_surface();
    }
    view.destroy_context();
    debug!("rendering thread exiting after {} frames", view.frames_presented());
}

fn handle_event(view: &mut GlView, event: ViewEvent) {
    debug!("rendering thread received {:?}", event);
    match event {
        ViewEvent::WindowAvailable(native_window) => {
            // Failures are logged by the view; the host retries with its next window.
            let _ = view.bind_window_surface(&PlatformWindow::Surface(native_window));
        }
        ViewEvent::WindowResized(size) => view.on_surface_resized(size.width, size.height),
        ViewEvent::WindowDestroyed => view.release_surface(),
        ViewEvent::Invalidate => view.request_frame(),
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderThread, ViewEvent};
    use crate::frame::{FrameContext, Renderer};
    use crate::platform::testing::{FakeEgl, FakeFailures};
    use crate::{DisplayRegistry, Error, GlView, NativeWindow, RenderMode, ViewConfig};
    use crate::WindowingApiError;

    use euclid::default::Size2D;
    use std::os::raw::c_void;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    struct SignalingRenderer(Sender<u64>);

    impl Renderer for SignalingRenderer {
        fn draw_frame(&mut self, frame: &FrameContext) {
            let _ = self.0.send(frame.frame_index());
        }
    }

    #[test]
    fn test_render_thread_draws_on_demand_and_tears_down() {
        let egl = Arc::new(FakeEgl::new());
        let registry = DisplayRegistry::new(egl.clone());
        let (frame_sender, frame_receiver) = mpsc::channel();

        let thread_registry = registry.clone();
        let render_thread = RenderThread::spawn(move || {
            let display = thread_registry.acquire()?;
            Ok(GlView::new(display, ViewConfig::default(), SignalingRenderer(frame_sender)))
        })
        .unwrap();
        assert!(render_thread.is_running());

        let window = unsafe { NativeWindow::from_ptr(0x9000 as *mut c_void) };
        render_thread.send(ViewEvent::WindowAvailable(window)).unwrap();
        let timeout = Duration::from_secs(5);
        assert_eq!(frame_receiver.recv_timeout(timeout), Ok(0));

        render_thread.send(ViewEvent::WindowResized(Size2D::new(320, 240))).unwrap();
        assert_eq!(frame_receiver.recv_timeout(timeout), Ok(1));

        render_thread.request_render().unwrap();
        assert_eq!(frame_receiver.recv_timeout(timeout), Ok(2));

        render_thread.send(ViewEvent::WindowDestroyed).unwrap();
        render_thread.shutdown().unwrap();

        let stats = egl.stats();
        assert_eq!(stats.contexts_created, 1);
        assert_eq!(stats.contexts_destroyed, 1);
        assert_eq!(stats.buffers_swapped, 3);
        assert_eq!(egl.live_surfaces(), 0);
        assert_eq!(registry.reference_count(), 0);
    }

    struct PanickingRenderer;

    impl Renderer for PanickingRenderer {
        fn draw_frame(&mut self, _: &FrameContext) {
            panic!("renderer failed");
        }
    }

    #[test]
    fn test_continuous_render_thread_draws_without_requests() {
        let egl = Arc::new(FakeEgl::new());
        let registry = DisplayRegistry::new(egl.clone());
        let (frame_sender, frame_receiver) = mpsc::channel();

        let thread_registry = registry.clone();
        let render_thread = RenderThread::spawn(move || {
            let config = ViewConfig::default().with_render_mode(RenderMode::Continuously);
            Ok(GlView::new(thread_registry.acquire()?, config, SignalingRenderer(frame_sender)))
        })
        .unwrap();

        let window = unsafe { NativeWindow::from_ptr(0x9100 as *mut c_void) };
        render_thread.send(ViewEvent::WindowAvailable(window)).unwrap();
        let timeout = Duration::from_secs(5);
        for expected in 0..3 {
            assert_eq!(frame_receiver.recv_timeout(timeout), Ok(expected));
        }

        render_thread.shutdown().unwrap();
        assert!(egl.stats().buffers_swapped >= 3);
        assert_eq!(egl.live_surfaces(), 0);
        assert_eq!(egl.live_contexts(), 0);
        assert_eq!(registry.reference_count(), 0);
    }

    #[test]
    fn test_send_fails_once_the_thread_is_gone() {
        let egl = Arc::new(FakeEgl::new());
        let registry = DisplayRegistry::new(egl.clone());

        let mut render_thread = RenderThread::spawn(move || {
            Ok(GlView::new(registry.acquire()?, ViewConfig::default(), PanickingRenderer))
        })
        .unwrap();

        let window = unsafe { NativeWindow::from_ptr(0x9200 as *mut c_void) };
        render_thread.send(ViewEvent::WindowAvailable(window)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while render_thread.is_running() {
            assert!(Instant::now() < deadline, "the rendering thread didn't exit");
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(render_thread.send(ViewEvent::Invalidate), Err(Error::RenderThreadExited));
        assert_eq!(render_thread.request_render(), Err(Error::RenderThreadExited));
        assert_eq!(render_thread.stop(), Err(Error::RenderThreadExited));
        assert_eq!(render_thread.send(ViewEvent::WindowDestroyed), Err(Error::RenderThreadExited));
    }

    #[test]
    fn test_spawn_reports_context_creation_failure() {
        let egl = Arc::new(FakeEgl::new());
        egl.set_failures(FakeFailures { create_context: true, ..FakeFailures::default() });
        let registry = DisplayRegistry::new(egl.clone());

        let result = RenderThread::spawn(move || {
            Ok(GlView::new(registry.acquire()?, ViewConfig::default(), SignalingRenderer(
                mpsc::channel().0,
            )))
        });
        match result {
            Err(Error::ContextCreationFailed(WindowingApiError::BadMatch)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("the rendering thread should not have started"),
        }
        assert_eq!(egl.live_contexts(), 0);
    }
}
