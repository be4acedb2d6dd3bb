/// Parse a label file: one label per line, blank lines ignored.
pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
