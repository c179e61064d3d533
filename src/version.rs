// Version information for the Activity Search Service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-two-stage-grounding-2026-08-23";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-08-23";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "two-stage-generation",
    "search-grounding",
    "sliding-window-rate-limiting",
    "app-check-attestation",
    "ip-allowlist",
    "secret-manager-credentials",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Activity Search Service {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
