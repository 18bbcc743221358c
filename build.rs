/// tucan-loader build script.
///
/// Embeds the application manifest (Common Controls v6 + per-monitor DPI
/// awareness) into the Windows executable.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=tucan-loader.rc");
    println!("cargo:rerun-if-changed=tucan-loader.manifest");

    // The loader window only exists on Windows. Other hosts still build the
    // crate so the process monitor can be tested, but the binary is inert.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=tucan-loader only shows its window on Windows \
             (CARGO_CFG_TARGET_OS = {target_os:?})"
        );
        return;
    }

    // Without the manifest the progress bar falls back to the classic
    // (unthemed) control; the launcher still works.
    let _ = embed_resource::compile("tucan-loader.rc", embed_resource::NONE);
}
