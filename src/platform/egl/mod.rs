// surfview/src/platform/egl/mod.rs
//
//! The EGL entry points that the context manager and surface binder are built on.
//!
//! Each call mirrors one EGL function, with `EGL_FALSE` plus `eglGetError()` folded into a
//! `Result`. Attribute lists are `EGL_NONE`-terminated, exactly as EGL expects them.

use crate::window::NativeWindow;
use crate::{GLApi, WindowingApiError};

use std::os::raw::c_void;

pub(crate) mod error;

#[cfg(egl_platform)]
mod system;
#[cfg(egl_platform)]
pub use self::system::SystemEgl;

pub use crate::egl::types::EGLint;

macro_rules! egl_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// The null handle.
            pub const NONE: $name = $name(0);

            /// Wraps a raw handle value returned by an EGL implementation.
            #[inline]
            pub fn from_raw(raw: usize) -> $name {
                $name(raw)
            }

            /// Returns the raw handle value.
            #[inline]
            pub fn to_raw(self) -> usize {
                self.0
            }

            #[inline]
            pub fn is_none(self) -> bool {
                self.0 == 0
            }
        }
    };
}

egl_handle!(
    /// An `EGLDisplay`.
    EglDisplay
);
egl_handle!(
    /// An `EGLConfig`.
    EglConfig
);
egl_handle!(
    /// An `EGLContext`.
    EglContext
);
egl_handle!(
    /// An `EGLSurface`.
    EglSurface
);

/// Which of the two current surfaces to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceRole {
    Draw,
    Read,
}

/// The subset of EGL that a view needs.
///
/// Implementations must be callable from any thread; the thread-local nature of "current"
/// bindings is EGL's, not the implementation's.
pub trait EglApi: Send + Sync {
    /// `eglGetDisplay(EGL_DEFAULT_DISPLAY)`.
    fn get_display(&self) -> Result<EglDisplay, WindowingApiError>;

    /// `eglInitialize`, returning the EGL version.
    fn initialize(&self, display: EglDisplay) -> Result<(EGLint, EGLint), WindowingApiError>;

    /// `eglTerminate`.
    fn terminate(&self, display: EglDisplay) -> Result<(), WindowingApiError>;

    /// `eglBindAPI`.
    fn bind_api(&self, api: GLApi) -> Result<(), WindowingApiError>;

    /// `eglChooseConfig`, returning every matching config.
    fn choose_configs(
        &self,
        display: EglDisplay,
        attributes: &[EGLint],
    ) -> Result<Vec<EglConfig>, WindowingApiError>;

    /// `eglGetConfigAttrib`.
    fn config_attrib(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError>;

    /// `eglCreateContext`. Pass `EglContext::NONE` to create an unshared context.
    fn create_context(
        &self,
        display: EglDisplay,
        config: EglConfig,
        share_context: EglContext,
        attributes: &[EGLint],
    ) -> Result<EglContext, WindowingApiError>;

    /// `eglDestroyContext`.
    fn destroy_context(
        &self,
        display: EglDisplay,
        context: EglContext,
    ) -> Result<(), WindowingApiError>;

    /// `eglCreatePbufferSurface`.
    fn create_pbuffer_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attributes: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError>;

    /// `eglCreateWindowSurface`.
    fn create_window_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        window: NativeWindow,
        attributes: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError>;

    /// `eglDestroySurface`.
    fn destroy_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
    ) -> Result<(), WindowingApiError>;

    /// `eglMakeCurrent`.
    fn make_current(
        &self,
        display: EglDisplay,
        draw: EglSurface,
        read: EglSurface,
        context: EglContext,
    ) -> Result<(), WindowingApiError>;

    /// `eglGetCurrentContext`.
    fn current_context(&self) -> EglContext;

    /// `eglGetCurrentSurface`.
    fn current_surface(&self, role: SurfaceRole) -> EglSurface;

    /// `eglQuerySurface`.
    fn query_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError>;

    /// `eglSwapBuffers`.
    fn swap_buffers(&self, display: EglDisplay, surface: EglSurface)
        -> Result<(), WindowingApiError>;

    /// `eglGetProcAddress`. Returns null if the symbol is unknown.
    fn get_proc_address(&self, symbol_name: &str) -> *const c_void;
}
