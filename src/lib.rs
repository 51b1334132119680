// surfview/src/lib.rs
//
//! EGL context and window surface lifecycle for views that render on demand.
//!
//! A view's context is created before its platform window exists, so it is first made current
//! against a tiny off-screen placeholder surface. Once the host hands over a window, the
//! placeholder is atomically replaced by a window surface; frames are then drawn whenever the
//! host asks for one, and teardown releases the surface strictly before the context.
//!
//! The host-facing entry point is [`GlView`]. [`Device`] exposes the underlying context and
//! surface operations for hosts that want to drive EGL themselves, and [`host::RenderThread`]
//! runs a view on a dedicated rendering thread.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod platform;
pub use crate::platform::egl::{EglApi, EglConfig, EglContext, EglDisplay, EglSurface};
#[cfg(any(test, feature = "test-backend"))]
pub use crate::platform::testing::{EglCall, FakeEgl, FakeFailures, FakeStats};

pub mod error;
pub use crate::error::{ContractViolation, Error, WindowingApiError};

mod context;
pub use crate::context::{ContextAttributeFlags, ContextAttributes, ContextDescriptor};
pub use crate::context::{ContextID, RenderContext, SharedContext};

mod device;
pub use crate::device::Device;

mod display;
pub use crate::display::{Display, DisplayRegistry};

mod frame;
pub use crate::frame::{FrameContext, FrameRequester, RenderMode, Renderer};

pub mod host;

mod info;
pub use crate::info::{GLApi, GLVersion};

mod surface;
pub use crate::surface::{SurfaceID, SurfaceKind};

mod view;
pub use crate::view::{GlView, LifecycleState, ViewConfig};

mod window;
pub use crate::window::{NativeWindow, PlatformWindow, SurfaceHolder};

#[allow(dead_code, non_camel_case_types, non_snake_case, non_upper_case_globals, unused)]
#[allow(clippy::all)]
mod egl {
    use std::os::raw::{c_long, c_void};
    pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
    pub type khronos_uint64_t = u64;
    pub type khronos_ssize_t = c_long;
    pub type EGLint = i32;
    pub type EGLNativeDisplayType = *const c_void;
    pub type EGLNativePixmapType = *const c_void;
    pub type EGLNativeWindowType = *const c_void;
    pub type NativeDisplayType = EGLNativeDisplayType;
    pub type NativePixmapType = EGLNativePixmapType;
    pub type NativeWindowType = EGLNativeWindowType;
    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
}
