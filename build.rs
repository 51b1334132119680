// surfview/build.rs
//
//! The `surfview` build script.

use cfg_aliases::cfg_aliases;
use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::PathBuf;

fn main() {
    // Setup aliases for #[cfg] checks
    cfg_aliases! {
        // Platforms
        android: { target_os = "android" },
        macos: { target_os = "macos" },
        linux: { all(unix, not(any(macos, android))) },

        // Platforms where a system libEGL can be loaded at runtime.
        egl_platform: { any(android, linux) },
    }

    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    // The EGL bindings are generated everywhere: the constants are shared by the system
    // backend and the recording backend used in tests.
    let mut file = File::create(dest.join("egl_bindings.rs")).unwrap();
    let registry = Registry::new(Api::Egl, (1, 5), Profile::Core, Fallbacks::All, []);
    registry.write_bindings(StructGenerator, &mut file).unwrap();
}
