use std::collections::HashSet;

/// Parse a hosts-format blocklist into a set of bare host names.
///
/// The source file is a standard hosts file (`0.0.0.0 badhost.example`
/// entries): the `0.0.0.0 ` prefix is stripped, blank lines and `#`
/// comments are dropped.
pub fn parse_blocklist(content: &str) -> HashSet<String> {
    content
        .replace("0.0.0.0 ", "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect()
}
