// surfview/src/window.rs
//
//! Platform windows handed over by the host.

use crate::Error;

use std::fmt::{self, Debug, Formatter};
use std::os::raw::c_void;
use std::ptr;

#[cfg(feature = "raw-window-handle-06")]
use rwh_06::{HasWindowHandle, RawWindowHandle};

/// A native window that an EGL window surface can be created against: an `ANativeWindow*` on
/// Android, an X11 window id elsewhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindow {
    native_window: *mut c_void,
}

// The pointer is only ever handed to EGL on the rendering thread.
unsafe impl Send for NativeWindow {}

impl NativeWindow {
    /// Wraps a raw native window pointer. A null pointer is accepted here and rejected when a
    /// surface is bound.
    ///
    /// # Safety
    ///
    /// The pointer must stay valid for as long as a surface created from it is alive.
    #[inline]
    pub unsafe fn from_ptr(native_window: *mut c_void) -> NativeWindow {
        NativeWindow { native_window }
    }

    /// A null window, as a host hands over while its surface is still being set up.
    #[inline]
    pub fn null() -> NativeWindow {
        NativeWindow { native_window: ptr::null_mut() }
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.native_window
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.native_window.is_null()
    }
}

impl Debug for NativeWindow {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "NativeWindow({:p})", self.native_window)
    }
}

/// A host object that owns a native window and can hand it out, like Android's
/// `SurfaceHolder`.
pub trait SurfaceHolder {
    /// Returns the held window, or `None` if the holder has no surface yet.
    fn surface(&self) -> Option<NativeWindow>;
}

/// The window a host offers when its surface becomes available.
///
/// All spellings resolve to the same [`NativeWindow`]; the surface binder only ever sees the
/// resolved window.
#[derive(Clone, Copy)]
pub enum PlatformWindow<'a> {
    /// A direct surface handle.
    Surface(NativeWindow),
    /// A wrapper that holds the surface.
    Holder(&'a dyn SurfaceHolder),
    /// A handle from `raw-window-handle`.
    #[cfg(feature = "raw-window-handle-06")]
    Raw(RawWindowHandle),
}

impl<'a> PlatformWindow<'a> {
    /// Looks up the native window behind this handle.
    pub fn resolve(&self) -> Result<NativeWindow, Error> {
        let native_window = match *self {
            PlatformWindow::Surface(native_window) => native_window,
            PlatformWindow::Holder(holder) => holder.surface().unwrap_or_else(NativeWindow::null),
            #[cfg(feature = "raw-window-handle-06")]
            PlatformWindow::Raw(raw_handle) => resolve_raw_window_handle(raw_handle)?,
        };
        if native_window.is_null() {
            return Err(Error::InvalidNativeWidget);
        }
        Ok(native_window)
    }

    /// Creates a platform window from anything that exposes a `raw-window-handle`.
    #[cfg(feature = "raw-window-handle-06")]
    pub fn from_window_handle<W>(window: &W) -> Result<PlatformWindow<'static>, Error>
    where
        W: HasWindowHandle + ?Sized,
    {
        match window.window_handle() {
            Ok(handle) => Ok(PlatformWindow::Raw(handle.as_raw())),
            Err(err) => {
                debug!("window handle unavailable: {}", err);
                Err(Error::InvalidNativeWidget)
            }
        }
    }
}

impl<'a> From<NativeWindow> for PlatformWindow<'a> {
    #[inline]
    fn from(native_window: NativeWindow) -> PlatformWindow<'a> {
        PlatformWindow::Surface(native_window)
    }
}

impl<'a> From<&'a dyn SurfaceHolder> for PlatformWindow<'a> {
    #[inline]
    fn from(holder: &'a dyn SurfaceHolder) -> PlatformWindow<'a> {
        PlatformWindow::Holder(holder)
    }
}

impl<'a> Debug for PlatformWindow<'a> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match *self {
            PlatformWindow::Surface(native_window) => {
                formatter.debug_tuple("Surface").field(&native_window).finish()
            }
            PlatformWindow::Holder(_) => formatter.write_str("Holder(..)"),
            #[cfg(feature = "raw-window-handle-06")]
            PlatformWindow::Raw(raw_handle) => {
                formatter.debug_tuple("Raw").field(&raw_handle).finish()
            }
        }
    }
}

#[cfg(feature = "raw-window-handle-06")]
fn resolve_raw_window_handle(raw_handle: RawWindowHandle) -> Result<NativeWindow, Error> {
    match raw_handle {
        RawWindowHandle::AndroidNdk(handle) => Ok(NativeWindow {
            native_window: handle.a_native_window.as_ptr(),
        }),
        RawWindowHandle::Xlib(handle) => Ok(NativeWindow {
            native_window: handle.window as usize as *mut c_void,
        }),
        RawWindowHandle::Xcb(handle) => Ok(NativeWindow {
            native_window: handle.window.get() as usize as *mut c_void,
        }),
        _ => Err(Error::IncompatibleNativeWidget),
    }
}

#[cfg(test)]
mod tests {
    use super::{NativeWindow, PlatformWindow, SurfaceHolder};
    use crate::Error;

    use std::os::raw::c_void;

    struct Holder(Option<NativeWindow>);

    impl SurfaceHolder for Holder {
        fn surface(&self) -> Option<NativeWindow> {
            self.0
        }
    }

    fn window(address: usize) -> NativeWindow {
        unsafe { NativeWindow::from_ptr(address as *mut c_void) }
    }

    #[test]
    fn test_holder_and_surface_resolve_to_the_same_window() {
        let holder = Holder(Some(window(0x4000)));
        let from_holder = PlatformWindow::Holder(&holder).resolve().unwrap();
        let from_surface = PlatformWindow::from(window(0x4000)).resolve().unwrap();
        assert_eq!(from_holder, from_surface);
    }

    #[test]
    fn test_null_windows_are_rejected() {
        let empty_holder = Holder(None);
        assert_eq!(
            PlatformWindow::Holder(&empty_holder).resolve(),
            Err(Error::InvalidNativeWidget)
        );
        assert_eq!(
            PlatformWindow::Surface(NativeWindow::null()).resolve(),
            Err(Error::InvalidNativeWidget)
        );
    }

    #[cfg(feature = "raw-window-handle-06")]
    #[test]
    fn test_raw_window_handles() {
        use rwh_06::{AndroidNdkWindowHandle, RawWindowHandle, WebWindowHandle};
        use std::ptr::NonNull;

        let a_native_window = NonNull::new(0x5000 as *mut c_void).unwrap();
        let android = RawWindowHandle::AndroidNdk(AndroidNdkWindowHandle::new(a_native_window));
        assert_eq!(PlatformWindow::Raw(android).resolve(), Ok(window(0x5000)));

        let web = RawWindowHandle::Web(WebWindowHandle::new(1));
        assert_eq!(
            PlatformWindow::Raw(web).resolve(),
            Err(Error::IncompatibleNativeWidget)
        );
    }
}
