// surfview/src/display.rs
//
//! The process-wide EGL display, shared by reference count.
//!
//! The first `acquire()` opens and initializes the default display; the last release
//! terminates it. Views receive a [`Display`] handle instead of reaching for a global.

use crate::platform::egl::{EGLint, EglApi, EglDisplay};
use crate::Error;

use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(egl_platform)]
use crate::platform::egl::SystemEgl;

/// Owns the EGL display of one EGL implementation and counts its users.
pub struct DisplayRegistry {
    egl: Arc<dyn EglApi>,
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    egl_display: EglDisplay,
    version: (EGLint, EGLint),
    references: usize,
}

/// A counted reference to an initialized EGL display.
///
/// Cloning acquires another reference; dropping releases it.
pub struct Display {
    registry: Arc<DisplayRegistry>,
    egl_display: EglDisplay,
}

impl DisplayRegistry {
    /// Creates a registry over the given EGL implementation.
    pub fn new(egl: Arc<dyn EglApi>) -> Arc<DisplayRegistry> {
        Arc::new(DisplayRegistry {
            egl,
            state: Mutex::new(RegistryState::default()),
        })
    }

    /// Returns the registry over the system EGL library, loading it on first use.
    #[cfg(egl_platform)]
    pub fn system() -> Result<Arc<DisplayRegistry>, Error> {
        lazy_static! {
            static ref SYSTEM_REGISTRY: Mutex<Option<Arc<DisplayRegistry>>> = Mutex::new(None);
        }

        let mut system_registry = match SYSTEM_REGISTRY.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(ref registry) = *system_registry {
            return Ok(registry.clone());
        }
        let registry = DisplayRegistry::new(Arc::new(SystemEgl::load()?));
        *system_registry = Some(registry.clone());
        Ok(registry)
    }

    /// Returns the registry over the system EGL library, loading it on first use.
    #[cfg(not(egl_platform))]
    pub fn system() -> Result<Arc<DisplayRegistry>, Error> {
        Err(Error::UnsupportedOnThisPlatform)
    }

    /// Acquires a reference to the display, opening and initializing it if nobody holds one.
    pub fn acquire(self: &Arc<Self>) -> Result<Display, Error> {
        let mut state = self.lock_state();
        if state.references == 0 {
            let egl_display = self.egl.get_display().map_err(|err| {
                error!("couldn't open the default EGL display: {:?}", err);
                Error::DeviceOpenFailed
            })?;
            let version = self
                .egl
                .initialize(egl_display)
                .map_err(Error::DisplayInitializationFailed)?;
            info!("initialized EGL {}.{} display {:?}", version.0, version.1, egl_display);
            state.egl_display = egl_display;
            state.version = version;
        }
        state.references += 1;
        debug!("acquired display {:?} ({} references)", state.egl_display, state.references);

        Ok(Display {
            registry: self.clone(),
            egl_display: state.egl_display,
        })
    }

    /// Returns the number of live `Display` handles.
    pub fn reference_count(&self) -> usize {
        self.lock_state().references
    }

    #[inline]
    pub fn egl(&self) -> &Arc<dyn EglApi> {
        &self.egl
    }

    fn release(&self) {
        let mut state = self.lock_state();
        debug_assert!(state.references > 0);
        state.references = state.references.saturating_sub(1);
        if state.references > 0 {
            return;
        }

        let egl_display = state.egl_display;
        state.egl_display = EglDisplay::NONE;
        match self.egl.terminate(egl_display) {
            Ok(()) => info!("terminated EGL display {:?}", egl_display),
            Err(err) => error!("failed to terminate EGL display {:?}: {:?}", egl_display, err),
        }
    }

    fn lock_state(&self) -> MutexGuard<RegistryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Debug for DisplayRegistry {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let state = self.lock_state();
        formatter
            .debug_struct("DisplayRegistry")
            .field("egl_display", &state.egl_display)
            .field("references", &state.references)
            .finish()
    }
}

impl Display {
    /// Acquires a reference to the system EGL display.
    pub fn system() -> Result<Display, Error> {
        DisplayRegistry::system()?.acquire()
    }

    #[inline]
    pub fn egl_display(&self) -> EglDisplay {
        self.egl_display
    }

    #[inline]
    pub fn egl(&self) -> &dyn EglApi {
        &*self.registry.egl
    }

    #[inline]
    pub fn registry(&self) -> &Arc<DisplayRegistry> {
        &self.registry
    }

    /// The EGL version reported when the display was initialized.
    pub fn version(&self) -> (EGLint, EGLint) {
        self.registry.lock_state().version
    }

    /// Releases this reference explicitly. Equivalent to dropping it.
    #[inline]
    pub fn release(self) {}
}

impl Clone for Display {
    fn clone(&self) -> Display {
        let mut state = self.registry.lock_state();
        state.references += 1;
        Display {
            registry: self.registry.clone(),
            egl_display: self.egl_display,
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.registry.release();
    }
}

impl Debug for Display {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "Display({:?})", self.egl_display)
    }
}

#[cfg(test)]
mod tests {
    use super::DisplayRegistry;
    use crate::platform::testing::{FakeEgl, FakeFailures};
    use crate::{Error, WindowingApiError};

    use std::sync::Arc;

    #[test]
    fn test_display_is_shared_and_terminated_on_last_release() {
        let egl = Arc::new(FakeEgl::new());
        let registry = DisplayRegistry::new(egl.clone());

        let first = registry.acquire().unwrap();
        let second = registry.acquire().unwrap();
        let third = first.clone();
        assert_eq!(registry.reference_count(), 3);
        assert_eq!(first.egl_display(), second.egl_display());
        assert_eq!(egl.stats().displays_initialized, 1);

        drop(first);
        second.release();
        assert_eq!(egl.stats().displays_terminated, 0);
        drop(third);
        assert_eq!(registry.reference_count(), 0);
        assert_eq!(egl.stats().displays_terminated, 1);

        // A later acquisition starts over.
        let again = registry.acquire().unwrap();
        assert_eq!(egl.stats().displays_initialized, 2);
        drop(again);
    }

    #[test]
    fn test_initialization_failure_is_reported() {
        let egl = Arc::new(FakeEgl::new());
        egl.set_failures(FakeFailures { initialize: true, ..FakeFailures::default() });
        let registry = DisplayRegistry::new(egl);
        match registry.acquire() {
            Err(Error::DisplayInitializationFailed(WindowingApiError::NotInitialized)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(registry.reference_count(), 0);
    }
}
