/// Rewrites a name into a valid VHDL basic identifier.
///
/// Characters outside `[A-Za-z0-9_]` become underscores, runs of
/// underscores collapse, and leading/trailing underscores or leading
/// digits are stripped.
pub(crate) fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
        } else if !result.ends_with('_') && !result.is_empty() {
            result.push('_');
        }
    }
    let result = result.trim_end_matches('_');
    result.trim_start_matches(|c: char| c.is_ascii_digit()).to_string()
}
