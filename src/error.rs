// surfview/src/error.rs
//
//! Various errors that methods can produce.

use crate::view::LifecycleState;

use std::error;
use std::fmt::{self, Display, Formatter};

/// Various errors that methods can produce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// The method failed for a miscellaneous reason.
    Failed,
    /// The platform doesn't support this method.
    UnsupportedOnThisPlatform,
    /// The system EGL library couldn't be located.
    NoGLLibraryFound,
    /// The default EGL display couldn't be opened.
    DeviceOpenFailed,
    /// The EGL display couldn't be initialized.
    DisplayInitializationFailed(WindowingApiError),
    /// Binding the OpenGL ES rendering API failed.
    UnsupportedGLType,
    /// Choosing an EGL config failed.
    PixelFormatSelectionFailed(WindowingApiError),
    /// The system couldn't choose an EGL config.
    NoPixelFormatFound,
    /// The system couldn't create an OpenGL ES context.
    ContextCreationFailed(WindowingApiError),
    /// The system couldn't destroy the OpenGL ES context.
    ContextDestructionFailed(WindowingApiError),
    /// The shared context is not compatible for sharing.
    IncompatibleSharedContext,
    /// The system couldn't make the context current or not current.
    MakeCurrentFailed(WindowingApiError),
    /// The system couldn't create a surface.
    SurfaceCreationFailed(WindowingApiError),
    /// The system couldn't destroy a surface.
    SurfaceDestructionFailed(WindowingApiError),
    /// The system couldn't present a window surface.
    PresentFailed(WindowingApiError),
    /// The operation requires a context and there is none.
    NoCurrentContext,
    /// The context has no window surface attached.
    NoWidgetAttached,
    /// The native window is null or absent.
    InvalidNativeWidget,
    /// The native window handle is of a kind this backend can't render to.
    IncompatibleNativeWidget,
    /// The rendering thread is no longer running.
    RenderThreadExited,
}

impl Error {
    /// Returns true if this error belongs to context creation, which leaves the view unusable.
    pub fn is_context_creation_error(&self) -> bool {
        matches!(
            *self,
            Error::UnsupportedOnThisPlatform
                | Error::NoGLLibraryFound
                | Error::DeviceOpenFailed
                | Error::DisplayInitializationFailed(_)
                | Error::UnsupportedGLType
                | Error::PixelFormatSelectionFailed(_)
                | Error::NoPixelFormatFound
                | Error::ContextCreationFailed(_)
                | Error::IncompatibleSharedContext
        )
    }

    /// Returns true if the host may retry the failed operation later, e.g. on the next
    /// window-available event.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            *self,
            Error::SurfaceCreationFailed(_)
                | Error::MakeCurrentFailed(_)
                | Error::InvalidNativeWidget
                | Error::IncompatibleNativeWidget
                | Error::PresentFailed(_)
        )
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Error::Failed => f.write_str("operation failed"),
            Error::UnsupportedOnThisPlatform => f.write_str("unsupported on this platform"),
            Error::NoGLLibraryFound => f.write_str("no EGL library found"),
            Error::DeviceOpenFailed => f.write_str("couldn't open the default EGL display"),
            Error::DisplayInitializationFailed(err) => {
                write!(f, "EGL display initialization failed: {:?}", err)
            }
            Error::UnsupportedGLType => f.write_str("OpenGL ES API unavailable"),
            Error::PixelFormatSelectionFailed(err) => {
                write!(f, "EGL config selection failed: {:?}", err)
            }
            Error::NoPixelFormatFound => f.write_str("no matching EGL config"),
            Error::ContextCreationFailed(err) => write!(f, "context creation failed: {:?}", err),
            Error::ContextDestructionFailed(err) => {
                write!(f, "context destruction failed: {:?}", err)
            }
            Error::IncompatibleSharedContext => f.write_str("shared context is incompatible"),
            Error::MakeCurrentFailed(err) => write!(f, "make current failed: {:?}", err),
            Error::SurfaceCreationFailed(err) => write!(f, "surface creation failed: {:?}", err),
            Error::SurfaceDestructionFailed(err) => {
                write!(f, "surface destruction failed: {:?}", err)
            }
            Error::PresentFailed(err) => write!(f, "buffer swap failed: {:?}", err),
            Error::NoCurrentContext => f.write_str("no context"),
            Error::NoWidgetAttached => f.write_str("no window surface attached"),
            Error::InvalidNativeWidget => f.write_str("native window is null"),
            Error::IncompatibleNativeWidget => f.write_str("unsupported native window kind"),
            Error::RenderThreadExited => f.write_str("rendering thread exited"),
        }
    }
}

impl error::Error for Error {}

/// Abstraction of the errors that EGL returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowingApiError {
    /// Miscellaneous error.
    Failed,
    /// EGL is not initialized, or could not be initialized, for the specified EGL display
    /// connection.
    NotInitialized,
    /// EGL cannot access a requested resource (for example a context is bound in another
    /// thread).
    BadAccess,
    /// EGL failed to allocate resources for the requested operation.
    BadAlloc,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    BadAttribute,
    /// An EGLConfig argument does not name a valid EGL frame buffer configuration.
    BadConfig,
    /// An EGLContext argument does not name a valid EGL rendering context.
    BadContext,
    /// The current surface of the calling thread is a window, pixel buffer or pixmap that is
    /// no longer valid.
    BadCurrentSurface,
    /// An EGLDisplay argument does not name a valid EGL display connection.
    BadDisplay,
    /// An EGLSurface argument does not name a valid surface configured for GL rendering.
    BadSurface,
    /// Arguments are inconsistent (for example, a valid context requires buffers not supplied
    /// by a valid surface).
    BadMatch,
    /// One or more argument values are invalid.
    BadParameter,
    /// A NativePixmapType argument does not refer to a valid native pixmap.
    BadNativePixmap,
    /// A NativeWindowType argument does not refer to a valid native window.
    BadNativeWindow,
    /// A power management event has occurred. The application must destroy all contexts and
    /// reinitialise OpenGL ES state and objects to continue rendering.
    ContextLost,
}

/// A host bug: an operation invoked outside the lifecycle state that permits it.
///
/// These are logged and recorded on the view, never returned as errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractViolation {
    /// `create_context` was called on a view that already went past `Uninitialized`.
    ContextAlreadyCreated(LifecycleState),
    /// An operation that needs a live context was called without one.
    NoContext(&'static str, LifecycleState),
    /// A frame was requested to be drawn without a window surface.
    DrawWithoutSurface(LifecycleState),
    /// The view's window surface is not the current draw surface on this thread.
    SurfaceNotCurrent,
    /// A resize arrived without a window surface.
    ResizeWithoutSurface(LifecycleState),
    /// `release_surface` was called without a window surface.
    ReleaseWithoutSurface(LifecycleState),
    /// The context was destroyed while its window surface was still bound.
    DestroyBeforeRelease,
}

impl ContractViolation {
    pub(crate) fn report(self) -> ContractViolation {
        error!("contract violation: {}", self);
        self
    }
}

impl Display for ContractViolation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            ContractViolation::ContextAlreadyCreated(state) => {
                write!(f, "create_context() called in state {:?}", state)
            }
            ContractViolation::NoContext(operation, state) => {
                write!(f, "{}() called without a context (state {:?})", operation, state)
            }
            ContractViolation::DrawWithoutSurface(state) => {
                write!(f, "draw_frame() called without a window surface (state {:?})", state)
            }
            ContractViolation::SurfaceNotCurrent => {
                f.write_str("the window surface is not current on this thread")
            }
            ContractViolation::ResizeWithoutSurface(state) => write!(
                f,
                "on_surface_resized() called without a window surface (state {:?})",
                state
            ),
            ContractViolation::ReleaseWithoutSurface(state) => write!(
                f,
                "release_surface() called without a window surface (state {:?})",
                state
            ),
            ContractViolation::DestroyBeforeRelease => {
                f.write_str("destroy_context() called before release_surface()")
            }
        }
    }
}
