//! Build script for appblock
//!
//! Embeds build-time information (git commit, dirty status, build timestamp)
//! written to the log at startup.

fn main() {
    shadow_rs::ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build info");
}
