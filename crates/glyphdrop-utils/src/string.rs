/// Lowercases `s` and drops every character that is not ASCII alphanumeric.
///
/// # Examples
///
/// ```
/// use glyphdrop_utils::string::normalize_token;
///
/// assert_eq!(normalize_token("35-NF lg_Bold"), "35nflgbold");
/// ```
pub fn normalize_token(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
