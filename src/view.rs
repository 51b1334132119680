// surfview/src/view.rs
//
//! The host-facing view and its lifecycle state machine.
//!
//! A view moves through `Uninitialized → ContextReady → SurfaceReady ⇄ SurfaceReleased →
//! ContextReleased`. Calls that arrive in a state that doesn't permit them are host bugs: they
//! are logged, recorded as the view's last [`ContractViolation`], and otherwise ignored.

use crate::context::{ContextAttributeFlags, ContextAttributes, ContextDescriptor};
use crate::context::{RenderContext, SharedContext};
use crate::device::Device;
use crate::display::Display;
use crate::frame::{FrameContext, FrameRequester, RenderMode, Renderer};
use crate::info::GLVersion;
use crate::surface::{SurfaceID, SurfaceKind};
use crate::window::PlatformWindow;
use crate::{ContractViolation, Error};

use euclid::default::Size2D;
use std::fmt::{self, Debug, Formatter};

/// Where a view is in its context and surface lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// No context yet.
    Uninitialized,
    /// The context is current against its placeholder; no window has arrived.
    ContextReady,
    /// A window surface is bound and current.
    SurfaceReady,
    /// The window surface was released; the context is still alive.
    SurfaceReleased,
    /// The context is destroyed. Terminal.
    ContextReleased,
}

/// How a view creates its context and when it draws.
#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub attributes: ContextAttributes,
    pub render_mode: RenderMode,
    pub placeholder_size: Size2D<i32>,
    pub share_with: Option<SharedContext>,
}

impl Default for ViewConfig {
    fn default() -> ViewConfig {
        ViewConfig {
            attributes: ContextAttributes::default(),
            render_mode: RenderMode::WhenDirty,
            placeholder_size: Size2D::new(1, 1),
            share_with: None,
        }
    }
}

impl ViewConfig {
    #[inline]
    pub fn with_attributes(mut self, attributes: ContextAttributes) -> ViewConfig {
        self.attributes = attributes;
        self
    }

    #[inline]
    pub fn with_version(mut self, version: GLVersion) -> ViewConfig {
        self.attributes.version = version;
        self
    }

    #[inline]
    pub fn with_flags(mut self, flags: ContextAttributeFlags) -> ViewConfig {
        self.attributes.flags = flags;
        self
    }

    #[inline]
    pub fn with_render_mode(mut self, render_mode: RenderMode) -> ViewConfig {
        self.render_mode = render_mode;
        self
    }

    #[inline]
    pub fn with_placeholder_size(mut self, placeholder_size: Size2D<i32>) -> ViewConfig {
        self.placeholder_size = placeholder_size;
        self
    }

    /// Shares textures, buffers and programs with another view's context.
    #[inline]
    pub fn with_share_context(mut self, shared: SharedContext) -> ViewConfig {
        self.share_with = Some(shared);
        self
    }
}

/// A view that renders on demand into a host-supplied window.
///
/// A view must be used from the thread it was created on; EGL's current bindings are
/// per-thread. Dropping a view tears it down.
pub struct GlView {
    device: Device,
    config: ViewConfig,
    renderer: Box<dyn Renderer>,
    context: Option<RenderContext>,
    state: LifecycleState,
    requester: FrameRequester,
    surface_size: Option<Size2D<i32>>,
    frames_presented: u64,
    last_violation: Option<ContractViolation>,
}

impl GlView {
    pub fn new<R>(display: Display, config: ViewConfig, renderer: R) -> GlView
    where
        R: Renderer + 'static,
    {
        let device = Device::new(display).with_placeholder_size(config.placeholder_size);
        GlView {
            device,
            config,
            renderer: Box::new(renderer),
            context: None,
            state: LifecycleState::Uninitialized,
            requester: FrameRequester::new(),
            surface_size: None,
            frames_presented: 0,
            last_violation: None,
        }
    }

    /// Creates a view on the system EGL display.
    pub fn with_system_display<R>(config: ViewConfig, renderer: R) -> Result<GlView, Error>
    where
        R: Renderer + 'static,
    {
        Ok(GlView::new(Display::system()?, config, renderer))
    }

    /// Creates the context and makes it current on this thread against a placeholder surface.
    ///
    /// Errors are fatal for the view: it stays `Uninitialized`.
    pub fn create_context(&mut self) -> Result<(), Error> {
        if self.state != LifecycleState::Uninitialized {
            self.violation(ContractViolation::ContextAlreadyCreated(self.state));
            return Ok(());
        }

        let descriptor = self
            .device
            .create_context_descriptor(&self.config.attributes)
            .map_err(|err| {
                error!("couldn't choose a config for {:?}: {}", self.config.attributes, err);
                err
            })?;
        let context = self
            .device
            .create_context(&descriptor, self.config.share_with.clone())
            .map_err(|err| {
                error!("context creation failed: {}", err);
                err
            })?;

        debug!("view context {:?} ready", context.id());
        self.context = Some(context);
        self.transition(LifecycleState::ContextReady);
        Ok(())
    }

    /// Binds the host's window, replacing the placeholder or a previous window surface.
    ///
    /// A failure leaves the view in its state with its previous surface current; the host may
    /// retry with the next window it gets.
    pub fn bind_window_surface(&mut self, window: &PlatformWindow) -> Result<SurfaceID, Error> {
        let context = match (self.state, self.context.as_mut()) {
            (
                LifecycleState::ContextReady
                | LifecycleState::SurfaceReady
                | LifecycleState::SurfaceReleased,
                Some(context),
            ) => context,
            _ => {
                self.violation(ContractViolation::NoContext("bind_window_surface", self.state));
                return Err(Error::NoCurrentContext);
            }
        };

        if self.state == LifecycleState::SurfaceReleased {
            debug!("rebinding context {:?} after release", context.id());
        }

        let previous_surface_id = self.device.context_surface_id(context).ok();
        let surface_id = match self.device.bind_window_surface(context, window) {
            Ok(surface_id) => surface_id,
            Err(err) => {
                warn!("couldn't bind window {:?}: {}", window, err);
                return Err(err);
            }
        };
        if previous_surface_id == Some(surface_id) {
            return Ok(surface_id);
        }

        let size = self.device.context_surface_size(context).unwrap_or_else(|_| Size2D::zero());
        self.surface_size = Some(size);
        {
            let frame = FrameContext::new(&self.device, context, size, self.frames_presented);
            self.renderer.surface_created(&frame);
            self.renderer.surface_changed(&frame, size);
        }
        self.transition(LifecycleState::SurfaceReady);
        self.requester.request_frame();
        Ok(surface_id)
    }

    /// Draws one frame and presents it. Returns false if nothing was presented.
    pub fn draw_frame(&mut self) -> bool {
        let context = match (self.state, self.context.as_mut()) {
            (LifecycleState::SurfaceReady, Some(context)) => context,
            _ => {
                self.violation(ContractViolation::DrawWithoutSurface(self.state));
                return false;
            }
        };
        if !self.device.is_surface_current(context) {
            self.violation(ContractViolation::SurfaceNotCurrent);
            return false;
        }

        self.requester.take_request();
        let size = self.surface_size.unwrap_or_else(Size2D::zero);
        {
            let frame = FrameContext::new(&self.device, context, size, self.frames_presented);
            self.renderer.draw_frame(&frame);
        }

        match self.device.present(context) {
            Ok(()) => {
                self.frames_presented += 1;
                true
            }
            Err(err) => {
                warn!("couldn't present frame {}: {}", self.frames_presented, err);
                false
            }
        }
    }

    /// Draws if a frame was requested since the last one, or always in `Continuously` mode.
    ///
    /// Requests made while no window surface is bound stay pending.
    pub fn draw_frame_if_requested(&mut self) -> bool {
        if self.state != LifecycleState::SurfaceReady {
            return false;
        }
        match self.config.render_mode {
            RenderMode::Continuously => self.draw_frame(),
            RenderMode::WhenDirty if self.requester.is_requested() => self.draw_frame(),
            RenderMode::WhenDirty => false,
        }
    }

    /// Records a new window size and asks for a frame. The surface itself is not reallocated;
    /// EGL tracks the window's size.
    pub fn on_surface_resized(&mut self, width: i32, height: i32) {
        let context = match (self.state, self.context.as_ref()) {
            (LifecycleState::SurfaceReady, Some(context)) => context,
            _ => {
                self.violation(ContractViolation::ResizeWithoutSurface(self.state));
                return;
            }
        };

        info!("resize: {}x{}", width, height);
        let size = Size2D::new(width, height);
        self.surface_size = Some(size);
        {
            let frame = FrameContext::new(&self.device, context, size, self.frames_presented);
            self.renderer.surface_changed(&frame, size);
        }
        self.requester.request_frame();
    }

    /// Releases the window surface. The context stays alive for a later window.
    pub fn release_surface(&mut self) {
        let context = match (self.state, self.context.as_mut()) {
            (LifecycleState::SurfaceReady, Some(context)) => context,
            _ => {
                self.violation(ContractViolation::ReleaseWithoutSurface(self.state));
                return;
            }
        };

        if let Err(err) = self.device.release_surface(context) {
            error!("surface release failed: {}", err);
        }
        self.surface_size = None;
        self.transition(LifecycleState::SurfaceReleased);
    }

    /// Destroys the context. Calling this again is a no-op.
    ///
    /// If the window surface is still bound, the ordering violation is recorded and the surface
    /// is released first.
    pub fn destroy_context(&mut self) {
        match self.state {
            LifecycleState::ContextReleased => return,
            LifecycleState::Uninitialized => {
                self.violation(ContractViolation::NoContext("destroy_context", self.state));
                return;
            }
            LifecycleState::SurfaceReady => {
                self.violation(ContractViolation::DestroyBeforeRelease);
                self.release_surface();
            }
            LifecycleState::ContextReady | LifecycleState::SurfaceReleased => {}
        }
        self.teardown();
    }

    /// Makes the view's context and surface current on this thread again, e.g. after the host
    /// rendered with another context in between.
    pub fn make_current(&mut self) -> Result<(), Error> {
        match self.context {
            Some(ref context) if !context.is_destroyed() => {
                self.device.make_context_current(context)
            }
            _ => {
                self.violation(ContractViolation::NoContext("make_current", self.state));
                Err(Error::NoCurrentContext)
            }
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The most recent contract violation, if any.
    #[inline]
    pub fn last_violation(&self) -> Option<ContractViolation> {
        self.last_violation
    }

    #[inline]
    pub fn take_last_violation(&mut self) -> Option<ContractViolation> {
        self.last_violation.take()
    }

    /// A handle any thread can use to ask for a frame.
    #[inline]
    pub fn frame_requester(&self) -> FrameRequester {
        self.requester.clone()
    }

    #[inline]
    pub fn request_frame(&self) {
        self.requester.request_frame()
    }

    #[inline]
    pub fn render_mode(&self) -> RenderMode {
        self.config.render_mode
    }

    #[inline]
    pub fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.config.render_mode = render_mode;
    }

    #[inline]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// A token for creating other views that share this view's GL objects.
    pub fn shared_context(&self) -> Option<SharedContext> {
        match self.context {
            Some(ref context) if !context.is_destroyed() => Some(context.shared()),
            _ => None,
        }
    }

    pub fn surface_id(&self) -> Option<SurfaceID> {
        self.context
            .as_ref()
            .and_then(|context| self.device.context_surface_id(context).ok())
    }

    pub fn surface_kind(&self) -> Option<SurfaceKind> {
        self.context.as_ref().and_then(RenderContext::surface_kind)
    }

    /// Returns true if the view's context is current on this thread.
    pub fn is_current(&self) -> bool {
        self.context
            .as_ref()
            .map_or(false, |context| self.device.is_context_current(context))
    }

    pub fn context_descriptor(&self) -> Option<ContextDescriptor> {
        self.context.as_ref().map(|context| self.device.context_descriptor(context))
    }

    #[inline]
    pub fn surface_size(&self) -> Option<Size2D<i32>> {
        self.surface_size
    }

    #[inline]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn teardown(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(err) = self.device.destroy_context(&mut context) {
                error!("context teardown failed: {}", err);
            }
            debug!("view context {:?} destroyed", context.id());
        }
        self.surface_size = None;
        self.transition(LifecycleState::ContextReleased);
    }

    fn transition(&mut self, new_state: LifecycleState) {
        debug!("view state {:?} -> {:?}", self.state, new_state);
        self.state = new_state;
    }

    fn violation(&mut self, violation: ContractViolation) {
        self.last_violation = Some(violation.report());
    }
}

impl Drop for GlView {
    fn drop(&mut self) {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::ContextReleased => {}
            LifecycleState::SurfaceReady => {
                self.release_surface();
                self.teardown();
            }
            LifecycleState::ContextReady | LifecycleState::SurfaceReleased => self.teardown(),
        }
    }
}

impl Debug for GlView {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("GlView")
            .field("state", &self.state)
            .field("context", &self.context)
            .field("render_mode", &self.config.render_mode)
            .field("frames_presented", &self.frames_presented)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{GlView, LifecycleState, ViewConfig};
    use crate::frame::{FrameContext, Renderer};
    use crate::platform::testing::FakeEgl;
    use crate::{ContractViolation, DisplayRegistry, NativeWindow, PlatformWindow};

    use std::os::raw::c_void;
    use std::sync::Arc;

    struct NoopRenderer;

    impl Renderer for NoopRenderer {
        fn draw_frame(&mut self, _: &FrameContext) {}
    }

    fn fake_view() -> (Arc<FakeEgl>, GlView) {
        let egl = Arc::new(FakeEgl::new());
        let display = DisplayRegistry::new(egl.clone()).acquire().unwrap();
        (egl, GlView::new(display, ViewConfig::default(), NoopRenderer))
    }

    fn window(address: usize) -> PlatformWindow<'static> {
        PlatformWindow::Surface(unsafe { NativeWindow::from_ptr(address as *mut c_void) })
    }

    #[test]
    fn test_create_context_twice_is_a_violation() {
        let (_, mut view) = fake_view();
        view.create_context().unwrap();
        view.create_context().unwrap();
        assert_eq!(view.state(), LifecycleState::ContextReady);
        assert_eq!(
            view.last_violation(),
            Some(ContractViolation::ContextAlreadyCreated(LifecycleState::ContextReady))
        );
    }

    #[test]
    fn test_resize_without_surface_is_ignored() {
        let (_, mut view) = fake_view();
        view.create_context().unwrap();
        view.on_surface_resized(640, 480);
        assert_eq!(view.surface_size(), None);
        assert_eq!(
            view.take_last_violation(),
            Some(ContractViolation::ResizeWithoutSurface(LifecycleState::ContextReady))
        );
        assert_eq!(view.last_violation(), None);
    }

    #[test]
    fn test_drop_tears_down_in_order() {
        let (egl, mut view) = fake_view();
        view.create_context().unwrap();
        view.bind_window_surface(&window(0x40)).unwrap();
        drop(view);

        let stats = egl.stats();
        assert_eq!(stats.contexts_destroyed, 1);
        assert_eq!(stats.surfaces_destroyed, stats.surfaces_created);
        assert_eq!(stats.destroyed_while_current, 0);
        assert_eq!(stats.displays_terminated, 1);
    }

    #[test]
    fn test_destroy_from_surface_ready_releases_first() {
        let (egl, mut view) = fake_view();
        view.create_context().unwrap();
        view.bind_window_surface(&window(0x50)).unwrap();

        view.destroy_context();
        assert_eq!(view.state(), LifecycleState::ContextReleased);
        assert_eq!(view.last_violation(), Some(ContractViolation::DestroyBeforeRelease));
        assert_eq!(egl.live_surfaces(), 0);
        assert_eq!(egl.live_contexts(), 0);
        assert_eq!(egl.stats().destroyed_while_current, 0);
    }
}
