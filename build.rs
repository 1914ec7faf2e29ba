fn main() {
    // libclang lookup for the opencv bindings, only needed when that feature is on
    if std::env::var_os("CARGO_FEATURE_OPENCV").is_some() && cfg!(target_os = "macos") {
        std::env::set_var("LIBCLANG_PATH", "/Library/Developer/CommandLineTools/usr/lib");
        std::env::set_var("DYLD_FALLBACK_LIBRARY_PATH", "/Library/Developer/CommandLineTools/usr/lib");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
