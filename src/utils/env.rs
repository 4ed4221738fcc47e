/// Get environment variable with EXECUTRY_ prefix, falling back to unprefixed version
///
/// This helper function checks for `EXECUTRY_{key}` first, then falls back to `{key}`
/// for compatibility with standard environment variable naming.
///
/// # Examples
///
/// ```rust
/// use executry::utils::get_env_with_prefix;
///
/// // Checks EXECUTRY_PORT first, then PORT
/// let port = get_env_with_prefix("PORT");
///
/// // Checks EXECUTRY_WEBHOOK_SECRET first, then WEBHOOK_SECRET
/// let secret = get_env_with_prefix("WEBHOOK_SECRET");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("EXECUTRY_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}
