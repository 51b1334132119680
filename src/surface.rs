// surfview/src/surface.rs
//
//! Surfaces that a context renders to.

use crate::platform::egl::EglSurface;
use crate::window::NativeWindow;

use euclid::default::Size2D;
use std::fmt::{self, Debug, Display, Formatter};

/// Identifies a surface. This is the EGL surface handle value, so it is unique among live
/// surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceID(pub usize);

impl Display for SurfaceID {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", *self)
    }
}

/// What backs a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    /// An off-screen pbuffer that keeps a new context current until a window arrives.
    Placeholder,
    /// A platform window.
    Window,
}

pub(crate) struct Surface {
    pub(crate) egl_surface: EglSurface,
    pub(crate) kind: SurfaceKind,
    pub(crate) window: Option<NativeWindow>,
    pub(crate) size: Size2D<i32>,
}

impl Surface {
    pub(crate) fn placeholder(egl_surface: EglSurface, size: Size2D<i32>) -> Surface {
        Surface { egl_surface, kind: SurfaceKind::Placeholder, window: None, size }
    }

    pub(crate) fn window(
        egl_surface: EglSurface,
        window: NativeWindow,
        size: Size2D<i32>,
    ) -> Surface {
        Surface { egl_surface, kind: SurfaceKind::Window, window: Some(window), size }
    }

    #[inline]
    pub(crate) fn id(&self) -> SurfaceID {
        SurfaceID(self.egl_surface.to_raw())
    }

    #[inline]
    pub(crate) fn is_window(&self) -> bool {
        self.kind == SurfaceKind::Window
    }
}

impl Debug for Surface {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Surface({:?}, {:x})", self.kind, self.id().0)
    }
}
