// build.rs
fn main() {
    // Build timestamp and git SHA for the landing page and build_info metric.
    // A source tarball without .git still builds; the binary then reports "unknown".
    if let Err(e) = vergen::EmitBuilder::builder()
        .all_build()
        .all_git()
        .emit()
    {
        println!("cargo:warning=Unable to generate build info: {}", e);
    }
}
