fn main() {
    // Plans written by the binary carry this stamp in their header
    let stamp = chrono::Utc::now().format("%Y%m%d").to_string();
    println!("cargo:rustc-env=CHASSISCUT_BUILD_STAMP={}", stamp);
    println!("cargo:rerun-if-changed=build.rs");
}
