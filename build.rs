use std::env;

/// Lane widths the crate has kernels for.
const WIDTHS: [&str; 5] = ["0", "8", "16", "32", "64"];

fn main() {
    println!("cargo:rerun-if-env-changed=ACONV_LANES");
    println!("cargo::rustc-check-cfg=cfg(aconv_lanes, values(\"0\", \"8\", \"16\", \"32\", \"64\"))");

    let lanes = match env::var("ACONV_LANES") {
        Ok(forced) => {
            let forced = forced.trim().to_string();
            if !WIDTHS.contains(&forced.as_str()) {
                panic!(
                    "ACONV_LANES must be one of {:?}, got '{}'",
                    WIDTHS, forced
                );
            }
            forced
        }
        Err(_) => lanes_from_target().to_string(),
    };

    if lanes == "0" {
        println!("cargo:warning=aconv: no vector extensions enabled for this target — using scalar kernel");
    }
    println!("cargo:rustc-cfg=aconv_lanes=\"{}\"", lanes);
}

/// Widest width whose instructions the target is compiled to assume.
fn lanes_from_target() -> &'static str {
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let features = env::var("CARGO_CFG_TARGET_FEATURE").unwrap_or_default();
    let has = |name: &str| features.split(',').any(|f| f == name);

    match target_arch.as_str() {
        "x86_64" if has("avx512bw") => "64",
        "x86_64" if has("avx2") => "32",
        "x86_64" if has("sse4.1") => "16",
        "aarch64" if has("neon") => "16",
        _ => "0",
    }
}
