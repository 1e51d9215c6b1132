// Licensed under the Apache-2.0 license

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=memory.x");

    // Only the on-target demo is linked with the cortex-m-rt script.
    if env::var_os("CARGO_FEATURE_RT").is_none() {
        return;
    }

    let out = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::copy("memory.x", Path::new(&out).join("memory.x")).expect("copy memory.x");
    println!("cargo:rustc-link-search={out}");
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
}
