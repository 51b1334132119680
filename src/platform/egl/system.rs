// surfview/src/platform/egl/system.rs
//
//! The system EGL library, loaded at runtime.

use super::error::ToWindowingApiError;
use super::{EGLint, EglApi, EglConfig, EglContext, EglDisplay, EglSurface, SurfaceRole};
use crate::egl::types::{EGLConfig, EGLContext, EGLDisplay, EGLNativeWindowType, EGLSurface};
use crate::egl::{self, Egl};
use crate::window::NativeWindow;
use crate::{Error, GLApi, WindowingApiError};

use libc::{dlclose, dlopen, dlsym, RTLD_LAZY, RTLD_LOCAL};
use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::ptr;

#[cfg(android)]
static EGL_LIBRARY_NAMES: [&[u8]; 1] = [b"libEGL.so\0"];
#[cfg(not(android))]
static EGL_LIBRARY_NAMES: [&[u8]; 2] = [b"libEGL.so.1\0", b"libEGL.so\0"];

/// EGL entry points resolved from the system `libEGL`.
pub struct SystemEgl {
    egl: Egl,
    library: *mut c_void,
}

// The EGL entry points themselves are thread-safe; per-thread state lives inside the driver.
unsafe impl Send for SystemEgl {}
unsafe impl Sync for SystemEgl {}

impl SystemEgl {
    /// Opens `libEGL` and resolves its entry points.
    pub fn load() -> Result<SystemEgl, Error> {
        unsafe {
            let library = EGL_LIBRARY_NAMES
                .iter()
                .map(|name| dlopen(name.as_ptr() as *const c_char, RTLD_LAZY | RTLD_LOCAL))
                .find(|library| !library.is_null());
            let library = match library {
                Some(library) => library,
                None => return Err(Error::NoGLLibraryFound),
            };

            let egl = Egl::load_with(|symbol_name| lookup_symbol(library, symbol_name));
            if !egl.GetDisplay.is_loaded() || !egl.MakeCurrent.is_loaded() {
                dlclose(library);
                return Err(Error::NoGLLibraryFound);
            }

            debug!("loaded system EGL library at {:?}", library);
            Ok(SystemEgl { egl, library })
        }
    }

    fn last_error(&self) -> WindowingApiError {
        unsafe { self.egl.GetError().to_windowing_api_error() }
    }

    fn check(&self, result: egl::types::EGLBoolean) -> Result<(), WindowingApiError> {
        if result == egl::FALSE {
            Err(self.last_error())
        } else {
            Ok(())
        }
    }
}

impl Drop for SystemEgl {
    fn drop(&mut self) {
        unsafe {
            dlclose(self.library);
        }
    }
}

impl EglApi for SystemEgl {
    fn get_display(&self) -> Result<EglDisplay, WindowingApiError> {
        unsafe {
            let egl_display = self.egl.GetDisplay(egl::DEFAULT_DISPLAY);
            if egl_display == egl::NO_DISPLAY {
                return Err(WindowingApiError::BadDisplay);
            }
            Ok(EglDisplay(egl_display as usize))
        }
    }

    fn initialize(&self, display: EglDisplay) -> Result<(EGLint, EGLint), WindowingApiError> {
        unsafe {
            let (mut major_version, mut minor_version) = (0, 0);
            let result =
                self.egl.Initialize(raw_display(display), &mut major_version, &mut minor_version);
            self.check(result)?;
            Ok((major_version, minor_version))
        }
    }

    fn terminate(&self, display: EglDisplay) -> Result<(), WindowingApiError> {
        unsafe { self.check(self.egl.Terminate(raw_display(display))) }
    }

    fn bind_api(&self, api: GLApi) -> Result<(), WindowingApiError> {
        let api = match api {
            GLApi::GL => egl::OPENGL_API,
            GLApi::GLES => egl::OPENGL_ES_API,
        };
        unsafe { self.check(self.egl.BindAPI(api)) }
    }

    fn choose_configs(
        &self,
        display: EglDisplay,
        attributes: &[EGLint],
    ) -> Result<Vec<EglConfig>, WindowingApiError> {
        unsafe {
            // See how many applicable configs there are.
            let mut config_count = 0;
            let result = self.egl.ChooseConfig(
                raw_display(display),
                attributes.as_ptr(),
                ptr::null_mut(),
                0,
                &mut config_count,
            );
            self.check(result)?;
            if config_count == 0 {
                return Ok(vec![]);
            }

            // Enumerate all those configs.
            let mut configs: Vec<EGLConfig> = vec![ptr::null(); config_count as usize];
            let mut real_config_count = config_count;
            let result = self.egl.ChooseConfig(
                raw_display(display),
                attributes.as_ptr(),
                configs.as_mut_ptr(),
                config_count,
                &mut real_config_count,
            );
            self.check(result)?;
            configs.truncate(real_config_count.max(0) as usize);

            Ok(configs.into_iter().map(|config| EglConfig(config as usize)).collect())
        }
    }

    fn config_attrib(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError> {
        unsafe {
            let mut value = 0;
            let result = self.egl.GetConfigAttrib(
                raw_display(display),
                config.0 as EGLConfig,
                attribute,
                &mut value,
            );
            self.check(result)?;
            Ok(value)
        }
    }

    fn create_context(
        &self,
        display: EglDisplay,
        config: EglConfig,
        share_context: EglContext,
        attributes: &[EGLint],
    ) -> Result<EglContext, WindowingApiError> {
        unsafe {
            let egl_context = self.egl.CreateContext(
                raw_display(display),
                config.0 as EGLConfig,
                share_context.0 as EGLContext,
                attributes.as_ptr(),
            );
            if egl_context == egl::NO_CONTEXT {
                return Err(self.last_error());
            }
            Ok(EglContext(egl_context as usize))
        }
    }

    fn destroy_context(
        &self,
        display: EglDisplay,
        context: EglContext,
    ) -> Result<(), WindowingApiError> {
        unsafe {
            self.check(self.egl.DestroyContext(raw_display(display), context.0 as EGLContext))
        }
    }

    fn create_pbuffer_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attributes: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError> {
        unsafe {
            let egl_surface = self.egl.CreatePbufferSurface(
                raw_display(display),
                config.0 as EGLConfig,
                attributes.as_ptr(),
            );
            if egl_surface == egl::NO_SURFACE {
                return Err(self.last_error());
            }
            Ok(EglSurface(egl_surface as usize))
        }
    }

    fn create_window_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        window: NativeWindow,
        attributes: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError> {
        unsafe {
            let egl_surface = self.egl.CreateWindowSurface(
                raw_display(display),
                config.0 as EGLConfig,
                window.as_ptr() as EGLNativeWindowType,
                attributes.as_ptr(),
            );
            if egl_surface == egl::NO_SURFACE {
                return Err(self.last_error());
            }
            Ok(EglSurface(egl_surface as usize))
        }
    }

    fn destroy_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
    ) -> Result<(), WindowingApiError> {
        unsafe {
            self.check(self.egl.DestroySurface(raw_display(display), surface.0 as EGLSurface))
        }
    }

    fn make_current(
        &self,
        display: EglDisplay,
        draw: EglSurface,
        read: EglSurface,
        context: EglContext,
    ) -> Result<(), WindowingApiError> {
        unsafe {
            let result = self.egl.MakeCurrent(
                raw_display(display),
                draw.0 as EGLSurface,
                read.0 as EGLSurface,
                context.0 as EGLContext,
            );
            self.check(result)
        }
    }

    fn current_context(&self) -> EglContext {
        unsafe { EglContext(self.egl.GetCurrentContext() as usize) }
    }

    fn current_surface(&self, role: SurfaceRole) -> EglSurface {
        let readdraw = match role {
            SurfaceRole::Draw => egl::DRAW,
            SurfaceRole::Read => egl::READ,
        };
        unsafe { EglSurface(self.egl.GetCurrentSurface(readdraw as EGLint) as usize) }
    }

    fn query_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError> {
        unsafe {
            let mut value = 0;
            let result = self.egl.QuerySurface(
                raw_display(display),
                surface.0 as EGLSurface,
                attribute,
                &mut value,
            );
            self.check(result)?;
            Ok(value)
        }
    }

    fn swap_buffers(
        &self,
        display: EglDisplay,
        surface: EglSurface,
    ) -> Result<(), WindowingApiError> {
        unsafe { self.check(self.egl.SwapBuffers(raw_display(display), surface.0 as EGLSurface)) }
    }

    fn get_proc_address(&self, symbol_name: &str) -> *const c_void {
        let symbol_name = match CString::new(symbol_name) {
            Ok(symbol_name) => symbol_name,
            Err(_) => return ptr::null(),
        };
        unsafe { self.egl.GetProcAddress(symbol_name.as_ptr()) as *const c_void }
    }
}

#[inline]
fn raw_display(display: EglDisplay) -> EGLDisplay {
    display.0 as EGLDisplay
}

fn lookup_symbol(library: *mut c_void, symbol_name: &str) -> *const c_void {
    let symbol_name = match CString::new(symbol_name) {
        Ok(symbol_name) => symbol_name,
        Err(_) => return ptr::null(),
    };
    unsafe { dlsym(library, symbol_name.as_ptr()) as *const c_void }
}
