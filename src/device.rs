// surfview/src/device.rs
//
//! Context creation, window surface binding and teardown on one EGL display.

use crate::context::{ContextAttributeFlags, ContextAttributes, ContextDescriptor};
use crate::context::{RenderContext, SharedContext, CREATE_CONTEXT_MUTEX};
use crate::display::Display;
use crate::egl;
use crate::platform::egl::{EGLint, EglApi, EglConfig, EglContext, EglSurface, SurfaceRole};
use crate::surface::{Surface, SurfaceID, SurfaceKind};
use crate::window::PlatformWindow;
use crate::{ContractViolation, Error, GLApi, GLVersion, WindowingApiError};

use euclid::default::Size2D;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const RGB_CHANNEL_BIT_DEPTH: EGLint = 8;
const DEFAULT_PLACEHOLDER_SIZE: i32 = 1;

/// A handle to an initialized EGL display, with the context and surface operations.
///
/// All methods act on the calling thread's current bindings, so a device and the contexts
/// created from it should be used from one thread.
#[derive(Clone, Debug)]
pub struct Device {
    display: Display,
    placeholder_size: Size2D<i32>,
}

impl Device {
    #[inline]
    pub fn new(display: Display) -> Device {
        Device {
            display,
            placeholder_size: Size2D::new(DEFAULT_PLACEHOLDER_SIZE, DEFAULT_PLACEHOLDER_SIZE),
        }
    }

    /// Sets the size of the off-screen surface that new contexts are made current against.
    pub fn with_placeholder_size(mut self, size: Size2D<i32>) -> Device {
        self.placeholder_size = Size2D::new(size.width.max(1), size.height.max(1));
        self
    }

    #[inline]
    pub fn display(&self) -> &Display {
        &self.display
    }

    #[inline]
    pub fn gl_api(&self) -> GLApi {
        GLApi::GLES
    }

    #[inline]
    fn egl(&self) -> &dyn EglApi {
        self.display.egl()
    }

    /// Chooses an EGL config for the given attributes.
    ///
    /// The config renders to both windows and pbuffers, so the same context can move from its
    /// placeholder onto a window surface.
    pub fn create_context_descriptor(
        &self,
        attributes: &ContextAttributes,
    ) -> Result<ContextDescriptor, Error> {
        let flags = attributes.flags;
        let alpha_size   = if flags.contains(ContextAttributeFlags::ALPHA)   { 8  } else { 0 };
        let depth_size   = if flags.contains(ContextAttributeFlags::DEPTH)   { 24 } else { 0 };
        let stencil_size = if flags.contains(ContextAttributeFlags::STENCIL) { 8  } else { 0 };
        let renderable_type = if attributes.version.major >= 3 {
            egl::OPENGL_ES3_BIT
        } else {
            egl::OPENGL_ES2_BIT
        };

        // Create required config attributes.
        let required_config_attributes = [
            egl::RED_SIZE as EGLint,    RGB_CHANNEL_BIT_DEPTH,
            egl::GREEN_SIZE as EGLint,  RGB_CHANNEL_BIT_DEPTH,
            egl::BLUE_SIZE as EGLint,   RGB_CHANNEL_BIT_DEPTH,
            egl::ALPHA_SIZE as EGLint,  alpha_size,
        ];

        // Create config attributes.
        let mut requested_config_attributes = required_config_attributes.to_vec();
        requested_config_attributes.extend_from_slice(&[
            egl::DEPTH_SIZE as EGLint,          depth_size,
            egl::STENCIL_SIZE as EGLint,        stencil_size,
            egl::COLOR_BUFFER_TYPE as EGLint,   egl::RGB_BUFFER as EGLint,
            egl::SURFACE_TYPE as EGLint,        (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint,
            egl::RENDERABLE_TYPE as EGLint,     renderable_type as EGLint,
            egl::NONE as EGLint,                0,
            0,                                  0,
        ]);

        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let configs = egl
            .choose_configs(egl_display, &requested_config_attributes)
            .map_err(Error::PixelFormatSelectionFailed)?;
        if configs.is_empty() {
            return Err(Error::NoPixelFormatFound);
        }

        // Sanitize configs.
        let egl_config = configs.into_iter().find(|&egl_config| {
            required_config_attributes.chunks(2).all(|pair| {
                egl.config_attrib(egl_display, egl_config, pair[0]) == Ok(pair[1])
            })
        });
        let egl_config = match egl_config {
            None => return Err(Error::NoPixelFormatFound),
            Some(egl_config) => egl_config,
        };

        // Get the config ID and version.
        let egl_config_id = egl
            .config_attrib(egl_display, egl_config, egl::CONFIG_ID as EGLint)
            .map_err(Error::PixelFormatSelectionFailed)?;
        let egl_context_client_version = attributes.version.major.max(2) as EGLint;

        debug!("chose EGL config {} for {:?}", egl_config_id, attributes);
        Ok(ContextDescriptor { egl_config_id, egl_context_client_version })
    }

    /// Creates a context, optionally sharing objects with another one, and makes it current on
    /// this thread against a placeholder surface.
    ///
    /// Partially created resources are released if any step fails.
    pub fn create_context(
        &self,
        descriptor: &ContextDescriptor,
        share_with: Option<SharedContext>,
    ) -> Result<RenderContext, Error> {
        let egl = self.egl();
        let egl_display = self.display.egl_display();

        let egl_share_context = match share_with {
            None => EglContext::NONE,
            Some(ref shared) => {
                if !shared.belongs_to(self.display.registry(), egl_display) {
                    return Err(Error::IncompatibleSharedContext);
                }
                shared.egl_context
            }
        };

        if let Err(err) = egl.bind_api(GLApi::GLES) {
            warn!("eglBindAPI(EGL_OPENGL_ES_API) failed: {:?}", err);
            return Err(Error::UnsupportedGLType);
        }
        let egl_config = self.context_descriptor_to_egl_config(descriptor)?;

        let mut next_context_id = match CREATE_CONTEXT_MUTEX.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Create the EGL context.
        let egl_context_attributes = [
            egl::CONTEXT_CLIENT_VERSION as EGLint,  descriptor.egl_context_client_version,
            egl::NONE as EGLint,                    0,
            0,                                      0,
        ];
        let egl_context = egl
            .create_context(egl_display, egl_config, egl_share_context, &egl_context_attributes)
            .map_err(Error::ContextCreationFailed)?;

        // Create the placeholder surface.
        let placeholder = match self.create_placeholder(egl_config) {
            Ok(placeholder) => placeholder,
            Err(err) => {
                self.destroy_egl_context(egl_context);
                return Err(err);
            }
        };

        if let Err(err) = egl.make_current(
            egl_display,
            placeholder.egl_surface,
            placeholder.egl_surface,
            egl_context,
        ) {
            self.destroy_egl_surface(placeholder.egl_surface);
            self.destroy_egl_context(egl_context);
            return Err(Error::MakeCurrentFailed(err));
        }

        let context = RenderContext {
            egl_context,
            egl_config,
            egl_display,
            registry: Arc::downgrade(self.display.registry()),
            descriptor: descriptor.clone(),
            id: *next_context_id,
            surface: Some(placeholder),
            alive: Arc::new(AtomicBool::new(true)),
        };
        next_context_id.0 += 1;

        debug!(
            "created context {:?} ({:?}, shared with {:?}) current on placeholder {:?}",
            context.id,
            egl_context,
            share_with.map(|shared| shared.id),
            context.surface,
        );
        Ok(context)
    }

    /// Destroys a context and whatever surface is still bound to it. Calling this again is a
    /// no-op.
    ///
    /// Destroying a context whose window surface is still bound breaks the teardown order; the
    /// surface is released first and the violation is logged.
    pub fn destroy_context(&self, context: &mut RenderContext) -> Result<(), Error> {
        if context.is_destroyed() {
            return Ok(());
        }

        let mut result = Ok(());
        if context.surface.as_ref().map_or(false, Surface::is_window) {
            ContractViolation::DestroyBeforeRelease.report();
            result = self.release_surface(context);
        }

        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let egl_context = context.egl_context;

        if egl.current_context() == egl_context {
            if let Err(err) =
                egl.make_current(egl_display, EglSurface::NONE, EglSurface::NONE, EglContext::NONE)
            {
                error!("failed to make context {:?} non-current: {:?}", context.id, err);
                result = result.and(Err(Error::MakeCurrentFailed(err)));
            }
        }

        if let Some(placeholder) = context.surface.take() {
            if let Err(err) = egl.destroy_surface(egl_display, placeholder.egl_surface) {
                error!("failed to destroy surface {:?}: {:?}", placeholder, err);
                result = result.and(Err(Error::SurfaceDestructionFailed(err)));
            }
        }

        context.egl_context = EglContext::NONE;
        context.alive.store(false, Ordering::Release);
        if let Err(err) = egl.destroy_context(egl_display, egl_context) {
            error!("failed to destroy context {:?}: {:?}", context.id, err);
            result = result.and(Err(Error::ContextDestructionFailed(err)));
        }

        debug!("destroyed context {:?}", context.id);
        result
    }

    /// Creates a window surface for `window` and makes it current in place of whatever the
    /// context was rendering to.
    ///
    /// The previous surface is destroyed only once the new one is current. On failure the
    /// context keeps its previous surface, still current.
    pub fn bind_window_surface(
        &self,
        context: &mut RenderContext,
        window: &PlatformWindow,
    ) -> Result<SurfaceID, Error> {
        if context.is_destroyed() {
            return Err(Error::NoCurrentContext);
        }
        let native_window = window.resolve()?;

        if let Some(ref surface) = context.surface {
            if surface.window == Some(native_window) {
                debug!("window {:?} already bound to {:?}", native_window, surface);
                self.make_context_current(context)?;
                return Ok(surface.id());
            }
        }

        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let attributes = [egl::NONE as EGLint, 0, 0, 0];
        let egl_surface = egl
            .create_window_surface(egl_display, context.egl_config, native_window, &attributes)
            .map_err(Error::SurfaceCreationFailed)?;

        if let Err(err) = egl.make_current(egl_display, egl_surface, egl_surface, context.egl_context)
        {
            self.destroy_egl_surface(egl_surface);
            return Err(Error::MakeCurrentFailed(err));
        }

        let size = self.query_surface_size(egl_surface).unwrap_or_else(|err| {
            warn!("couldn't query the size of window surface {:?}: {:?}", egl_surface, err);
            Size2D::zero()
        });
        let new_surface = Surface::window(egl_surface, native_window, size);
        let surface_id = new_surface.id();

        if let Some(old_surface) = context.surface.replace(new_surface) {
            self.destroy_egl_surface(old_surface.egl_surface);
            debug!("replaced {:?} with window surface {}", old_surface, surface_id);
        }
        Ok(surface_id)
    }

    /// Makes nothing current, then destroys the surface bound to the context. A no-op if no
    /// surface is bound.
    pub fn release_surface(&self, context: &mut RenderContext) -> Result<(), Error> {
        let surface = match context.surface.take() {
            None => return Ok(()),
            Some(surface) => surface,
        };

        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let mut result = Ok(());

        if egl.current_context() == context.egl_context {
            if let Err(err) =
                egl.make_current(egl_display, EglSurface::NONE, EglSurface::NONE, EglContext::NONE)
            {
                error!("failed to unbind {:?} before release: {:?}", surface, err);
                result = Err(Error::MakeCurrentFailed(err));
            }
        }
        if let Err(err) = egl.destroy_surface(egl_display, surface.egl_surface) {
            error!("failed to destroy surface {:?}: {:?}", surface, err);
            result = result.and(Err(Error::SurfaceDestructionFailed(err)));
        }

        debug!("released {:?} from context {:?}", surface, context.id);
        result
    }

    /// Swaps the buffers of the context's window surface.
    pub fn present(&self, context: &mut RenderContext) -> Result<(), Error> {
        let egl_surface = match context.surface {
            Some(ref surface) if surface.is_window() => surface.egl_surface,
            _ => return Err(Error::NoWidgetAttached),
        };
        self.egl()
            .swap_buffers(self.display.egl_display(), egl_surface)
            .map_err(Error::PresentFailed)
    }

    pub fn make_context_current(&self, context: &RenderContext) -> Result<(), Error> {
        if context.is_destroyed() {
            return Err(Error::NoCurrentContext);
        }
        let egl_surface = match context.surface {
            Some(ref surface) => surface.egl_surface,
            None => return Err(Error::NoWidgetAttached),
        };
        self.egl()
            .make_current(self.display.egl_display(), egl_surface, egl_surface, context.egl_context)
            .map_err(Error::MakeCurrentFailed)
    }

    pub fn make_no_context_current(&self) -> Result<(), Error> {
        self.egl()
            .make_current(
                self.display.egl_display(),
                EglSurface::NONE,
                EglSurface::NONE,
                EglContext::NONE,
            )
            .map_err(Error::MakeCurrentFailed)
    }

    #[inline]
    pub fn is_context_current(&self, context: &RenderContext) -> bool {
        !context.is_destroyed() && self.egl().current_context() == context.egl_context
    }

    /// Returns true if the context is current on this thread and draws to its bound surface.
    pub fn is_surface_current(&self, context: &RenderContext) -> bool {
        match context.surface {
            Some(ref surface) => {
                self.is_context_current(context)
                    && self.egl().current_surface(SurfaceRole::Draw) == surface.egl_surface
            }
            None => false,
        }
    }

    pub fn context_surface_id(&self, context: &RenderContext) -> Result<SurfaceID, Error> {
        match context.surface {
            Some(ref surface) => Ok(surface.id()),
            None => Err(Error::NoWidgetAttached),
        }
    }

    #[inline]
    pub fn context_surface_kind(&self, context: &RenderContext) -> Option<SurfaceKind> {
        context.surface_kind()
    }

    /// Returns the current size of the bound surface, as EGL reports it.
    pub fn context_surface_size(&self, context: &RenderContext) -> Result<Size2D<i32>, Error> {
        match context.surface {
            Some(ref surface) => self.query_surface_size(surface.egl_surface).or_else(|err| {
                debug!("couldn't query the size of {:?}: {:?}", surface, err);
                Ok(surface.size)
            }),
            None => Err(Error::NoWidgetAttached),
        }
    }

    #[inline]
    pub fn context_descriptor(&self, context: &RenderContext) -> ContextDescriptor {
        context.descriptor.clone()
    }

    /// Reads back the buffers and version the descriptor's config actually provides.
    pub fn context_descriptor_attributes(
        &self,
        context_descriptor: &ContextDescriptor,
    ) -> Result<ContextAttributes, Error> {
        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let egl_config = self.context_descriptor_to_egl_config(context_descriptor)?;
        let config_attr = |attribute: u32| {
            egl.config_attrib(egl_display, egl_config, attribute as EGLint)
                .map_err(Error::PixelFormatSelectionFailed)
        };

        let alpha_size = config_attr(egl::ALPHA_SIZE)?;
        let depth_size = config_attr(egl::DEPTH_SIZE)?;
        let stencil_size = config_attr(egl::STENCIL_SIZE)?;

        let mut attribute_flags = ContextAttributeFlags::empty();
        attribute_flags.set(ContextAttributeFlags::ALPHA, alpha_size != 0);
        attribute_flags.set(ContextAttributeFlags::DEPTH, depth_size != 0);
        attribute_flags.set(ContextAttributeFlags::STENCIL, stencil_size != 0);

        Ok(ContextAttributes {
            flags: attribute_flags,
            version: GLVersion::new(context_descriptor.egl_context_client_version as u8, 0),
        })
    }

    #[inline]
    pub fn get_proc_address(&self, _: &RenderContext, symbol_name: &str) -> *const c_void {
        self.egl().get_proc_address(symbol_name)
    }

    pub(crate) fn context_descriptor_to_egl_config(
        &self,
        context_descriptor: &ContextDescriptor,
    ) -> Result<EglConfig, Error> {
        let config_attributes = [
            egl::CONFIG_ID as EGLint,   context_descriptor.egl_config_id,
            egl::NONE as EGLint,        0,
            0,                          0,
        ];
        let configs = self
            .egl()
            .choose_configs(self.display.egl_display(), &config_attributes)
            .map_err(Error::PixelFormatSelectionFailed)?;
        configs.into_iter().next().ok_or(Error::NoPixelFormatFound)
    }

    fn create_placeholder(&self, egl_config: EglConfig) -> Result<Surface, Error> {
        let size = self.placeholder_size;
        let attributes = [
            egl::WIDTH as EGLint,   size.width,
            egl::HEIGHT as EGLint,  size.height,
            egl::NONE as EGLint,    0,
            0,                      0,
        ];
        let egl_surface = self
            .egl()
            .create_pbuffer_surface(self.display.egl_display(), egl_config, &attributes)
            .map_err(Error::SurfaceCreationFailed)?;
        Ok(Surface::placeholder(egl_surface, size))
    }

    fn query_surface_size(
        &self,
        egl_surface: EglSurface,
    ) -> Result<Size2D<i32>, WindowingApiError> {
        let egl = self.egl();
        let egl_display = self.display.egl_display();
        let width = egl.query_surface(egl_display, egl_surface, egl::WIDTH as EGLint)?;
        let height = egl.query_surface(egl_display, egl_surface, egl::HEIGHT as EGLint)?;
        Ok(Size2D::new(width, height))
    }

    fn destroy_egl_surface(&self, egl_surface: EglSurface) {
        if let Err(err) = self.egl().destroy_surface(self.display.egl_display(), egl_surface) {
            error!("failed to destroy surface {:?}: {:?}", egl_surface, err);
        }
    }

    fn destroy_egl_context(&self, egl_context: EglContext) {
        if let Err(err) = self.egl().destroy_context(self.display.egl_display(), egl_context) {
            error!("failed to destroy context {:?}: {:?}", egl_context, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Device;
    use crate::platform::testing::{EglCall, FakeEgl, FakeFailures};
    use crate::{ContextAttributeFlags, ContextAttributes, DisplayRegistry, Error, GLVersion};
    use crate::{NativeWindow, PlatformWindow, SurfaceKind, WindowingApiError};

    use std::os::raw::c_void;
    use std::sync::Arc;

    fn fake_device() -> (Arc<FakeEgl>, Device) {
        let egl = Arc::new(FakeEgl::new());
        let display = DisplayRegistry::new(egl.clone()).acquire().unwrap();
        (egl, Device::new(display))
    }

    fn window(address: usize) -> NativeWindow {
        unsafe { NativeWindow::from_ptr(address as *mut c_void) }
    }

    #[test]
    fn test_config_selection_matches_alpha_exactly() {
        let (_, device) = fake_device();

        let with_alpha = ContextAttributes {
            version: GLVersion::new(2, 0),
            flags: ContextAttributeFlags::ALPHA | ContextAttributeFlags::DEPTH,
        };
        let descriptor = device.create_context_descriptor(&with_alpha).unwrap();
        assert_eq!(descriptor.config_id(), 2);
        let attributes = device.context_descriptor_attributes(&descriptor).unwrap();
        assert!(attributes.flags.contains(ContextAttributeFlags::ALPHA));

        let without_alpha =
            ContextAttributes { version: GLVersion::new(3, 0), flags: ContextAttributeFlags::empty() };
        let descriptor = device.create_context_descriptor(&without_alpha).unwrap();
        assert_eq!(descriptor.config_id(), 3);
        assert_eq!(descriptor.client_version(), 3);
    }

    #[test]
    fn test_config_selection_failure() {
        let (egl, device) = fake_device();
        egl.set_failures(FakeFailures { choose_config: true, ..FakeFailures::default() });
        assert_eq!(
            device.create_context_descriptor(&ContextAttributes::default()),
            Err(Error::PixelFormatSelectionFailed(WindowingApiError::BadAttribute))
        );
    }

    #[test]
    fn test_create_context_cleans_up_when_placeholder_fails() {
        let (egl, device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        egl.set_failures(FakeFailures { create_pbuffer_surface: true, ..FakeFailures::default() });

        match device.create_context(&descriptor, None) {
            Err(Error::SurfaceCreationFailed(WindowingApiError::BadAlloc)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(egl.live_contexts(), 0);
        assert_eq!(egl.live_surfaces(), 0);
    }

    #[test]
    fn test_placeholder_is_replaced_after_window_is_current() {
        let (egl, device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        let mut context = device.create_context(&descriptor, None).unwrap();
        assert_eq!(context.surface_kind(), Some(SurfaceKind::Placeholder));
        let placeholder = device.context_surface_id(&context).unwrap();
        egl.clear_calls();

        let surface_id =
            device.bind_window_surface(&mut context, &PlatformWindow::Surface(window(0x10))).unwrap();
        assert_eq!(context.surface_kind(), Some(SurfaceKind::Window));
        assert!(device.is_surface_current(&context));

        // Create, make current, and only then destroy the placeholder.
        let calls = egl.calls();
        assert_eq!(calls.len(), 3);
        match calls[1] {
            EglCall::MakeCurrent { draw, .. } => assert_eq!(draw.to_raw(), surface_id.0),
            ref other => panic!("unexpected call: {:?}", other),
        }
        match calls[2] {
            EglCall::DestroySurface(surface) => assert_eq!(surface.to_raw(), placeholder.0),
            ref other => panic!("unexpected call: {:?}", other),
        }
        assert_eq!(egl.stats().destroyed_while_current, 0);

        device.release_surface(&mut context).unwrap();
        device.destroy_context(&mut context).unwrap();
    }

    #[test]
    fn test_failed_make_current_keeps_previous_surface() {
        let (egl, device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        let mut context = device.create_context(&descriptor, None).unwrap();
        let placeholder = device.context_surface_id(&context).unwrap();

        egl.set_failures(FakeFailures { make_window_current: true, ..FakeFailures::default() });
        match device.bind_window_surface(&mut context, &PlatformWindow::Surface(window(0x20))) {
            Err(Error::MakeCurrentFailed(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(device.context_surface_id(&context), Ok(placeholder));
        assert!(device.is_surface_current(&context));
        assert!(!egl.window_in_use(window(0x20)));

        device.destroy_context(&mut context).unwrap();
        assert_eq!(egl.live_surfaces(), 0);
    }

    #[test]
    fn test_present_requires_a_window_surface() {
        let (_, device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        let mut context = device.create_context(&descriptor, None).unwrap();
        assert_eq!(device.present(&mut context), Err(Error::NoWidgetAttached));
        device.destroy_context(&mut context).unwrap();
    }

    #[test]
    fn test_destroy_before_release_still_releases_first() {
        let (egl, device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        let mut context = device.create_context(&descriptor, None).unwrap();
        device.bind_window_surface(&mut context, &PlatformWindow::Surface(window(0x30))).unwrap();
        egl.clear_calls();

        device.destroy_context(&mut context).unwrap();
        let calls = egl.calls();
        let surface_destroyed = calls
            .iter()
            .position(|call| matches!(call, EglCall::DestroySurface(_)))
            .unwrap();
        let context_destroyed = calls
            .iter()
            .position(|call| matches!(call, EglCall::DestroyContext(_)))
            .unwrap();
        assert!(surface_destroyed < context_destroyed);
        assert_eq!(egl.stats().destroyed_while_current, 0);

        // Again is a no-op.
        device.destroy_context(&mut context).unwrap();
        assert_eq!(egl.stats().contexts_destroyed, 1);
    }

    #[test]
    fn test_shared_context_must_come_from_the_same_display() {
        let (egl, device) = fake_device();
        let (_, other_device) = fake_device();
        let descriptor = device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        let mut first = device.create_context(&descriptor, None).unwrap();

        let mut second = device.create_context(&descriptor, Some(first.shared())).unwrap();
        assert!(egl.calls().iter().any(|call| match *call {
            EglCall::CreateContext { context, share } => {
                context == second.egl_context() && share == first.egl_context()
            }
            _ => false,
        }));

        let other_descriptor =
            other_device.create_context_descriptor(&ContextAttributes::default()).unwrap();
        match other_device.create_context(&other_descriptor, Some(first.shared())) {
            Err(Error::IncompatibleSharedContext) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        device.destroy_context(&mut second).unwrap();
        device.destroy_context(&mut first).unwrap();
    }
}
