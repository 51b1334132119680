// surfview/src/platform/testing.rs
//
//! An in-process EGL implementation that models EGL's binding rules and records every call.
//!
//! `FakeEgl` needs no driver, so lifecycle sequences can be checked on any machine. It enforces
//! the rules a real driver enforces: a context current on one thread can't be made current on
//! another, a context can't be current without a surface (no surfaceless extension), a window
//! can back at most one live surface, and swaps need the surface to be current.

use super::egl::{EGLint, EglApi, EglConfig, EglContext, EglDisplay, EglSurface, SurfaceRole};
use crate::egl;
use crate::window::NativeWindow;
use crate::{GLApi, WindowingApiError};

use euclid::default::Size2D;
use std::collections::{HashMap, HashSet};
use std::os::raw::c_void;
use std::ptr;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

const FAKE_DISPLAY: EglDisplay = EglDisplay(0xd15);
const FIRST_HANDLE: usize = 0x1000;
const CONFIG_HANDLE_BASE: usize = 0x100;
const DEFAULT_WINDOW_WIDTH: i32 = 800;
const DEFAULT_WINDOW_HEIGHT: i32 = 600;

/// Calls that should fail the next time (and every time after) they are made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FakeFailures {
    pub initialize: bool,
    pub choose_config: bool,
    pub create_context: bool,
    pub create_pbuffer_surface: bool,
    pub create_window_surface: bool,
    /// `eglMakeCurrent` fails whenever a window surface is involved.
    pub make_window_current: bool,
    pub swap_buffers: bool,
}

/// Counters of what the fake has been asked to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FakeStats {
    pub displays_initialized: usize,
    pub displays_terminated: usize,
    pub contexts_created: usize,
    pub contexts_destroyed: usize,
    pub surfaces_created: usize,
    pub surfaces_destroyed: usize,
    pub buffers_swapped: usize,
    /// Contexts or surfaces destroyed while still bound on some thread.
    pub destroyed_while_current: usize,
}

/// One successful EGL call, in the order it was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EglCall {
    Initialize,
    Terminate,
    CreateContext { context: EglContext, share: EglContext },
    DestroyContext(EglContext),
    CreatePbufferSurface(EglSurface),
    CreateWindowSurface { surface: EglSurface, window: NativeWindow },
    DestroySurface(EglSurface),
    MakeCurrent { draw: EglSurface, read: EglSurface, context: EglContext },
    SwapBuffers(EglSurface),
}

#[derive(Clone, Copy, Debug)]
struct FakeConfig {
    id: EGLint,
    red: EGLint,
    green: EGLint,
    blue: EGLint,
    alpha: EGLint,
    depth: EGLint,
    stencil: EGLint,
    surface_type: EGLint,
    renderable_type: EGLint,
}

impl FakeConfig {
    fn handle(&self) -> EglConfig {
        EglConfig(CONFIG_HANDLE_BASE + self.id as usize)
    }

    fn attrib(&self, attribute: EGLint) -> Option<EGLint> {
        match attribute as u32 {
            egl::CONFIG_ID => Some(self.id),
            egl::RED_SIZE => Some(self.red),
            egl::GREEN_SIZE => Some(self.green),
            egl::BLUE_SIZE => Some(self.blue),
            egl::ALPHA_SIZE => Some(self.alpha),
            egl::DEPTH_SIZE => Some(self.depth),
            egl::STENCIL_SIZE => Some(self.stencil),
            egl::SURFACE_TYPE => Some(self.surface_type),
            egl::RENDERABLE_TYPE => Some(self.renderable_type),
            egl::COLOR_BUFFER_TYPE => Some(egl::RGB_BUFFER as EGLint),
            _ => None,
        }
    }

    fn matches(&self, attribute: EGLint, value: EGLint) -> Result<bool, WindowingApiError> {
        if value == egl::DONT_CARE as EGLint {
            return Ok(true);
        }
        let actual = match self.attrib(attribute) {
            Some(actual) => actual,
            None => return Err(WindowingApiError::BadAttribute),
        };
        Ok(match attribute as u32 {
            egl::CONFIG_ID | egl::COLOR_BUFFER_TYPE => actual == value,
            egl::SURFACE_TYPE | egl::RENDERABLE_TYPE => actual & value == value,
            _ => actual >= value,
        })
    }
}

fn default_configs() -> Vec<FakeConfig> {
    let window_and_pbuffer = (egl::WINDOW_BIT | egl::PBUFFER_BIT) as EGLint;
    let es2_and_es3 = (egl::OPENGL_ES2_BIT | egl::OPENGL_ES3_BIT) as EGLint;
    vec![
        FakeConfig {
            id: 1,
            red: 5,
            green: 6,
            blue: 5,
            alpha: 0,
            depth: 16,
            stencil: 0,
            surface_type: window_and_pbuffer,
            renderable_type: egl::OPENGL_ES2_BIT as EGLint,
        },
        FakeConfig {
            id: 2,
            red: 8,
            green: 8,
            blue: 8,
            alpha: 8,
            depth: 24,
            stencil: 8,
            surface_type: window_and_pbuffer,
            renderable_type: es2_and_es3,
        },
        FakeConfig {
            id: 3,
            red: 8,
            green: 8,
            blue: 8,
            alpha: 0,
            depth: 24,
            stencil: 8,
            surface_type: window_and_pbuffer,
            renderable_type: es2_and_es3,
        },
        FakeConfig {
            id: 4,
            red: 8,
            green: 8,
            blue: 8,
            alpha: 8,
            depth: 0,
            stencil: 0,
            surface_type: egl::PBUFFER_BIT as EGLint,
            renderable_type: egl::OPENGL_ES2_BIT as EGLint,
        },
    ]
}

struct FakeSurface {
    config: EglConfig,
    size: Size2D<i32>,
    window: Option<NativeWindow>,
}

#[derive(Clone, Copy)]
struct Binding {
    draw: EglSurface,
    read: EglSurface,
    context: EglContext,
}

struct FakeState {
    initialized: bool,
    api: Option<GLApi>,
    next_handle: usize,
    configs: Vec<FakeConfig>,
    contexts: HashMap<EglContext, EglConfig>,
    surfaces: HashMap<EglSurface, FakeSurface>,
    bindings: HashMap<ThreadId, Binding>,
    window_sizes: HashMap<NativeWindow, Size2D<i32>>,
    rejected_windows: HashSet<NativeWindow>,
    failures: FakeFailures,
    stats: FakeStats,
    calls: Vec<EglCall>,
}

impl FakeState {
    fn check_display(&self, display: EglDisplay) -> Result<(), WindowingApiError> {
        if display != FAKE_DISPLAY {
            return Err(WindowingApiError::BadDisplay);
        }
        if !self.initialized {
            return Err(WindowingApiError::NotInitialized);
        }
        Ok(())
    }

    fn config(&self, config: EglConfig) -> Result<FakeConfig, WindowingApiError> {
        self.configs
            .iter()
            .find(|candidate| candidate.handle() == config)
            .copied()
            .ok_or(WindowingApiError::BadConfig)
    }

    fn allocate_handle(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn is_bound_anywhere(&self, predicate: impl Fn(&Binding) -> bool) -> bool {
        self.bindings.values().any(predicate)
    }
}

/// An in-process EGL implementation for tests.
pub struct FakeEgl {
    state: Mutex<FakeState>,
}

impl Default for FakeEgl {
    fn default() -> FakeEgl {
        FakeEgl::new()
    }
}

impl FakeEgl {
    pub fn new() -> FakeEgl {
        FakeEgl {
            state: Mutex::new(FakeState {
                initialized: false,
                api: None,
                next_handle: FIRST_HANDLE,
                configs: default_configs(),
                contexts: HashMap::new(),
                surfaces: HashMap::new(),
                bindings: HashMap::new(),
                window_sizes: HashMap::new(),
                rejected_windows: HashSet::new(),
                failures: FakeFailures::default(),
                stats: FakeStats::default(),
                calls: vec![],
            }),
        }
    }

    pub fn set_failures(&self, failures: FakeFailures) {
        self.lock().failures = failures;
    }

    /// Makes window surface creation against `window` fail with `BadNativeWindow`.
    pub fn reject_window(&self, window: NativeWindow) {
        self.lock().rejected_windows.insert(window);
    }

    /// Sets the size that surfaces created against `window` report.
    pub fn set_window_size(&self, window: NativeWindow, size: Size2D<i32>) {
        self.lock().window_sizes.insert(window, size);
    }

    pub fn stats(&self) -> FakeStats {
        self.lock().stats
    }

    pub fn calls(&self) -> Vec<EglCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn live_contexts(&self) -> usize {
        self.lock().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.lock().surfaces.len()
    }

    /// Returns the number of threads that currently have a context bound.
    pub fn bound_threads(&self) -> usize {
        self.lock().bindings.len()
    }

    /// Returns true if `window` backs a live surface.
    pub fn window_in_use(&self, window: NativeWindow) -> bool {
        self.lock().surfaces.values().any(|surface| surface.window == Some(window))
    }

    fn lock(&self) -> MutexGuard<FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl EglApi for FakeEgl {
    fn get_display(&self) -> Result<EglDisplay, WindowingApiError> {
        Ok(FAKE_DISPLAY)
    }

    fn initialize(&self, display: EglDisplay) -> Result<(EGLint, EGLint), WindowingApiError> {
        let mut state = self.lock();
        if display != FAKE_DISPLAY {
            return Err(WindowingApiError::BadDisplay);
        }
        if state.failures.initialize {
            return Err(WindowingApiError::NotInitialized);
        }
        if !state.initialized {
            state.initialized = true;
            state.stats.displays_initialized += 1;
            state.calls.push(EglCall::Initialize);
        }
        Ok((1, 5))
    }

    fn terminate(&self, display: EglDisplay) -> Result<(), WindowingApiError> {
        let mut state = self.lock();
        if display != FAKE_DISPLAY {
            return Err(WindowingApiError::BadDisplay);
        }
        if state.initialized {
            state.initialized = false;
            state.stats.displays_terminated += 1;
            state.calls.push(EglCall::Terminate);
        }
        Ok(())
    }

    fn bind_api(&self, api: GLApi) -> Result<(), WindowingApiError> {
        self.lock().api = Some(api);
        Ok(())
    }

    fn choose_configs(
        &self,
        display: EglDisplay,
        attributes: &[EGLint],
    ) -> Result<Vec<EglConfig>, WindowingApiError> {
        let state = self.lock();
        state.check_display(display)?;
        if state.failures.choose_config {
            return Err(WindowingApiError::BadAttribute);
        }

        let mut matching = vec![];
        'configs: for config in &state.configs {
            for pair in attributes.chunks(2) {
                if pair[0] == egl::NONE as EGLint || pair.len() < 2 {
                    break;
                }
                if !config.matches(pair[0], pair[1])? {
                    continue 'configs;
                }
            }
            matching.push(config.handle());
        }
        Ok(matching)
    }

    fn config_attrib(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError> {
        let state = self.lock();
        state.check_display(display)?;
        state.config(config)?.attrib(attribute).ok_or(WindowingApiError::BadAttribute)
    }

    fn create_context(
        &self,
        display: EglDisplay,
        config: EglConfig,
        share_context: EglContext,
        attributes: &[EGLint],
    ) -> Result<EglContext, WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        let fake_config = state.config(config)?;
        if state.failures.create_context {
            return Err(WindowingApiError::BadMatch);
        }
        if !share_context.is_none() && !state.contexts.contains_key(&share_context) {
            return Err(WindowingApiError::BadContext);
        }

        let client_version = attributes
            .chunks(2)
            .take_while(|pair| pair.len() == 2 && pair[0] != egl::NONE as EGLint)
            .find(|pair| pair[0] == egl::CONTEXT_CLIENT_VERSION as EGLint)
            .map_or(1, |pair| pair[1]);
        let required_bit = match client_version {
            3 => egl::OPENGL_ES3_BIT as EGLint,
            2 => egl::OPENGL_ES2_BIT as EGLint,
            _ => egl::OPENGL_ES_BIT as EGLint,
        };
        if required_bit != egl::OPENGL_ES_BIT as EGLint
            && fake_config.renderable_type & required_bit == 0
        {
            return Err(WindowingApiError::BadMatch);
        }

        let context = EglContext(state.allocate_handle());
        state.contexts.insert(context, config);
        state.stats.contexts_created += 1;
        state.calls.push(EglCall::CreateContext { context, share: share_context });
        Ok(context)
    }

    fn destroy_context(
        &self,
        display: EglDisplay,
        context: EglContext,
    ) -> Result<(), WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        if state.contexts.remove(&context).is_none() {
            return Err(WindowingApiError::BadContext);
        }
        if state.is_bound_anywhere(|binding| binding.context == context) {
            state.stats.destroyed_while_current += 1;
        }
        state.stats.contexts_destroyed += 1;
        state.calls.push(EglCall::DestroyContext(context));
        Ok(())
    }

    fn create_pbuffer_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        attributes: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        let fake_config = state.config(config)?;
        if state.failures.create_pbuffer_surface {
            return Err(WindowingApiError::BadAlloc);
        }
        if fake_config.surface_type & egl::PBUFFER_BIT as EGLint == 0 {
            return Err(WindowingApiError::BadMatch);
        }

        let mut size = Size2D::new(0, 0);
        for pair in attributes.chunks(2) {
            if pair.len() < 2 || pair[0] == egl::NONE as EGLint {
                break;
            }
            match pair[0] as u32 {
                egl::WIDTH => size.width = pair[1],
                egl::HEIGHT => size.height = pair[1],
                _ => {}
            }
        }

        let surface = EglSurface(state.allocate_handle());
        state.surfaces.insert(surface, FakeSurface { config, size, window: None });
        state.stats.surfaces_created += 1;
        state.calls.push(EglCall::CreatePbufferSurface(surface));
        Ok(surface)
    }

    fn create_window_surface(
        &self,
        display: EglDisplay,
        config: EglConfig,
        window: NativeWindow,
        _: &[EGLint],
    ) -> Result<EglSurface, WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        let fake_config = state.config(config)?;
        if window.is_null() || state.rejected_windows.contains(&window) {
            return Err(WindowingApiError::BadNativeWindow);
        }
        if state.failures.create_window_surface {
            return Err(WindowingApiError::BadAlloc);
        }
        if fake_config.surface_type & egl::WINDOW_BIT as EGLint == 0 {
            return Err(WindowingApiError::BadMatch);
        }
        if state.surfaces.values().any(|surface| surface.window == Some(window)) {
            return Err(WindowingApiError::BadAlloc);
        }

        let size = state
            .window_sizes
            .get(&window)
            .copied()
            .unwrap_or_else(|| Size2D::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT));
        let surface = EglSurface(state.allocate_handle());
        state.surfaces.insert(surface, FakeSurface { config, size, window: Some(window) });
        state.stats.surfaces_created += 1;
        state.calls.push(EglCall::CreateWindowSurface { surface, window });
        Ok(surface)
    }

    fn destroy_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
    ) -> Result<(), WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        if state.surfaces.remove(&surface).is_none() {
            return Err(WindowingApiError::BadSurface);
        }
        if state.is_bound_anywhere(|binding| binding.draw == surface || binding.read == surface) {
            state.stats.destroyed_while_current += 1;
        }
        state.stats.surfaces_destroyed += 1;
        state.calls.push(EglCall::DestroySurface(surface));
        Ok(())
    }

    fn make_current(
        &self,
        display: EglDisplay,
        draw: EglSurface,
        read: EglSurface,
        context: EglContext,
    ) -> Result<(), WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        let this_thread = thread::current().id();

        if context.is_none() {
            if !draw.is_none() || !read.is_none() {
                return Err(WindowingApiError::BadMatch);
            }
            state.bindings.remove(&this_thread);
            state.calls.push(EglCall::MakeCurrent { draw, read, context });
            return Ok(());
        }

        if !state.contexts.contains_key(&context) {
            return Err(WindowingApiError::BadContext);
        }
        if draw.is_none() || read.is_none() {
            return Err(WindowingApiError::BadMatch);
        }
        for surface in [draw, read] {
            match state.surfaces.get(&surface) {
                None => return Err(WindowingApiError::BadSurface),
                Some(fake_surface) => {
                    if fake_surface.window.is_some() && state.failures.make_window_current {
                        return Err(WindowingApiError::BadNativeWindow);
                    }
                }
            }
        }
        let taken_elsewhere = state.bindings.iter().any(|(thread_id, binding)| {
            *thread_id != this_thread
                && (binding.context == context
                    || binding.draw == draw
                    || binding.read == read
                    || binding.draw == read
                    || binding.read == draw)
        });
        if taken_elsewhere {
            return Err(WindowingApiError::BadAccess);
        }

        state.bindings.insert(this_thread, Binding { draw, read, context });
        state.calls.push(EglCall::MakeCurrent { draw, read, context });
        Ok(())
    }

    fn current_context(&self) -> EglContext {
        let state = self.lock();
        state
            .bindings
            .get(&thread::current().id())
            .map_or(EglContext::NONE, |binding| binding.context)
    }

    fn current_surface(&self, role: SurfaceRole) -> EglSurface {
        let state = self.lock();
        state
            .bindings
            .get(&thread::current().id())
            .map_or(EglSurface::NONE, |binding| match role {
                SurfaceRole::Draw => binding.draw,
                SurfaceRole::Read => binding.read,
            })
    }

    fn query_surface(
        &self,
        display: EglDisplay,
        surface: EglSurface,
        attribute: EGLint,
    ) -> Result<EGLint, WindowingApiError> {
        let state = self.lock();
        state.check_display(display)?;
        let fake_surface = state.surfaces.get(&surface).ok_or(WindowingApiError::BadSurface)?;
        match attribute as u32 {
            egl::WIDTH => Ok(fake_surface.size.width),
            egl::HEIGHT => Ok(fake_surface.size.height),
            egl::CONFIG_ID => Ok(state.config(fake_surface.config)?.id),
            _ => Err(WindowingApiError::BadAttribute),
        }
    }

    fn swap_buffers(
        &self,
        display: EglDisplay,
        surface: EglSurface,
    ) -> Result<(), WindowingApiError> {
        let mut state = self.lock();
        state.check_display(display)?;
        let is_window = match state.surfaces.get(&surface) {
            None => return Err(WindowingApiError::BadSurface),
            Some(fake_surface) => fake_surface.window.is_some(),
        };
        let is_current = state
            .bindings
            .get(&thread::current().id())
            .map_or(false, |binding| binding.draw == surface);
        if !is_current {
            return Err(WindowingApiError::BadSurface);
        }
        if state.failures.swap_buffers {
            return Err(WindowingApiError::ContextLost);
        }

        // Swapping a pbuffer has no effect.
        if is_window {
            state.stats.buffers_swapped += 1;
            state.calls.push(EglCall::SwapBuffers(surface));
        }
        Ok(())
    }

    fn get_proc_address(&self, _: &str) -> *const c_void {
        ptr::null()
    }
}

#[cfg(test)]
mod tests {
    use super::{EglCall, FakeEgl};
    use crate::egl;
    use crate::platform::egl::{EGLint, EglApi, EglContext, EglSurface, SurfaceRole};
    use crate::window::NativeWindow;
    use crate::WindowingApiError;

    use std::os::raw::c_void;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_context_cannot_be_current_on_two_threads() {
        let egl = Arc::new(FakeEgl::new());
        let display = egl.get_display().unwrap();
        egl.initialize(display).unwrap();

        let attributes = [egl::RED_SIZE as EGLint, 8, egl::NONE as EGLint, 0];
        let config = egl.choose_configs(display, &attributes).unwrap()[0];
        let pbuffer_attributes = [
            egl::WIDTH as EGLint, 1,
            egl::HEIGHT as EGLint, 1,
            egl::NONE as EGLint, 0,
        ];
        let context_attributes = [
            egl::CONTEXT_CLIENT_VERSION as EGLint, 2,
            egl::NONE as EGLint, 0,
        ];
        let context = egl
            .create_context(display, config, EglContext::NONE, &context_attributes)
            .unwrap();
        let pbuffer = egl.create_pbuffer_surface(display, config, &pbuffer_attributes).unwrap();
        egl.make_current(display, pbuffer, pbuffer, context).unwrap();
        assert_eq!(egl.current_surface(SurfaceRole::Draw), pbuffer);

        let other = egl.clone();
        let result = thread::spawn(move || {
            let second = other.create_pbuffer_surface(display, config, &pbuffer_attributes);
            other.make_current(display, second.unwrap(), second.unwrap(), context)
        })
        .join()
        .unwrap();
        assert_eq!(result, Err(WindowingApiError::BadAccess));
    }

    #[test]
    fn test_window_backs_at_most_one_surface() {
        let egl = FakeEgl::new();
        let display = egl.get_display().unwrap();
        egl.initialize(display).unwrap();
        let config = egl.choose_configs(display, &[egl::NONE as EGLint, 0]).unwrap()[1];
        let window = unsafe { NativeWindow::from_ptr(0x7000 as *mut c_void) };

        let surface = egl.create_window_surface(display, config, window, &[]).unwrap();
        assert_eq!(
            egl.create_window_surface(display, config, window, &[]),
            Err(WindowingApiError::BadAlloc)
        );
        egl.destroy_surface(display, surface).unwrap();
        assert!(!egl.window_in_use(window));
        assert_eq!(egl.calls().last(), Some(&EglCall::DestroySurface(surface)));
        assert_ne!(surface, EglSurface::NONE);
    }
}
