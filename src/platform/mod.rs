// surfview/src/platform/mod.rs
//
//! Backends implementing the EGL entry points that surfview drives.

pub mod egl;

#[cfg(any(test, feature = "test-backend"))]
pub mod testing;
