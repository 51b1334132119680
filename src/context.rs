// surfview/src/context.rs
//
//! Declarations common to all rendering contexts.

use crate::display::DisplayRegistry;
use crate::info::GLVersion;
use crate::platform::egl::{EGLint, EglConfig, EglContext, EglDisplay};
use crate::surface::{Surface, SurfaceKind};

use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread;

/// A process-unique identifier for a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextID(pub u64);

lazy_static! {
    pub(crate) static ref CREATE_CONTEXT_MUTEX: Mutex<ContextID> = Mutex::new(ContextID(0));
}

bitflags! {
    /// Optional buffers a context's config must provide.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ContextAttributeFlags: u8 {
        const ALPHA   = 0x01;
        const DEPTH   = 0x02;
        const STENCIL = 0x04;
    }
}

/// The OpenGL ES version and buffers that a context is requested with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextAttributes {
    pub version: GLVersion,
    pub flags: ContextAttributeFlags,
}

impl Default for ContextAttributes {
    fn default() -> ContextAttributes {
        ContextAttributes {
            version: GLVersion::new(2, 0),
            flags: ContextAttributeFlags::ALPHA | ContextAttributeFlags::STENCIL,
        }
    }
}

/// The chosen EGL config and client version, ready for context creation.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextDescriptor {
    pub(crate) egl_config_id: EGLint,
    pub(crate) egl_context_client_version: EGLint,
}

impl ContextDescriptor {
    #[inline]
    pub fn config_id(&self) -> EGLint {
        self.egl_config_id
    }

    #[inline]
    pub fn client_version(&self) -> EGLint {
        self.egl_context_client_version
    }
}

/// An OpenGL ES context and the surface bound to it.
///
/// Contexts must be destroyed explicitly with `Device::destroy_context`; dropping a live one
/// panics.
pub struct RenderContext {
    pub(crate) egl_context: EglContext,
    pub(crate) egl_config: EglConfig,
    pub(crate) egl_display: EglDisplay,
    pub(crate) registry: Weak<DisplayRegistry>,
    pub(crate) descriptor: ContextDescriptor,
    pub(crate) id: ContextID,
    pub(crate) surface: Option<Surface>,
    pub(crate) alive: Arc<AtomicBool>,
}

impl RenderContext {
    #[inline]
    pub fn id(&self) -> ContextID {
        self.id
    }

    #[inline]
    pub fn egl_context(&self) -> EglContext {
        self.egl_context
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.egl_context.is_none()
    }

    /// Returns the kind of the surface currently bound to this context, if any.
    pub fn surface_kind(&self) -> Option<SurfaceKind> {
        self.surface.as_ref().map(|surface| surface.kind)
    }

    /// Returns a token that lets another context on the same display share this one's objects.
    pub fn shared(&self) -> SharedContext {
        SharedContext {
            egl_context: self.egl_context,
            egl_display: self.egl_display,
            registry: self.registry.clone(),
            id: self.id,
            alive: Arc::downgrade(&self.alive),
        }
    }
}

impl Drop for RenderContext {
    #[inline]
    fn drop(&mut self) {
        if !self.is_destroyed() && !thread::panicking() {
            panic!("Contexts must be destroyed explicitly with `destroy_context`!")
        }
    }
}

impl Debug for RenderContext {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("RenderContext")
            .field("id", &self.id)
            .field("egl_context", &self.egl_context)
            .field("surface", &self.surface)
            .finish()
    }
}

/// A context to share textures, buffers and programs with.
///
/// The context behind the token must outlive every context created with it. A token whose
/// context has been destroyed is rejected.
#[derive(Clone)]
pub struct SharedContext {
    pub(crate) egl_context: EglContext,
    pub(crate) egl_display: EglDisplay,
    pub(crate) registry: Weak<DisplayRegistry>,
    pub(crate) id: ContextID,
    pub(crate) alive: Weak<AtomicBool>,
}

impl SharedContext {
    #[inline]
    pub fn context_id(&self) -> ContextID {
        self.id
    }

    /// Returns true while the context behind this token hasn't been destroyed.
    pub fn is_alive(&self) -> bool {
        self.alive.upgrade().map_or(false, |alive| alive.load(Ordering::Acquire))
    }

    pub(crate) fn belongs_to(&self, registry: &Arc<DisplayRegistry>, egl_display: EglDisplay) -> bool {
        !self.egl_context.is_none()
            && self.is_alive()
            && self.egl_display == egl_display
            && Weak::ptr_eq(&self.registry, &Arc::downgrade(registry))
    }
}

impl Debug for SharedContext {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "SharedContext({:?}, {:?})", self.id, self.egl_context)
    }
}
