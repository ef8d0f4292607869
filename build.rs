//! Embeds the compile time and cargo profile so `bohm_status` can report
//! which binary is serving.

fn main() {
    println!("cargo:rerun-if-changed=src");

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=BOHM_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=BOHM_BUILD_PROFILE={}", profile);
}
