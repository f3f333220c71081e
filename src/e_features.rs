/// Returns a vector of feature flag strings.
/// Enabled features are listed as-is while disabled ones are prefixed with "!".
pub fn get_feature_flags() -> Vec<&'static str> {
    [if cfg!(feature = "concurrent") {
        "concurrent"
    } else {
        "!concurrent"
    }]
    .to_vec()
}

/// Returns a JSON string representation of the feature flags.
pub fn get_feature_flags_json() -> String {
    serde_json::to_string(&get_feature_flags()).unwrap_or_else(|_| "[]".to_string())
}

/// Print the version and the JSON array of feature flags.
pub fn print_version_and_features() {
    println!("diag-e {}", env!("CARGO_PKG_VERSION"));
    println!("{}", get_feature_flags_json());
}
