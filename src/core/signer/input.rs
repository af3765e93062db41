//! Parsing source values from text.

use crate::error::InputError;
use std::fs;
use std::path::Path;

/// Parse integers separated by whitespace and/or commas.
///
/// Blank lines and anything after a `#` on a line are ignored.
pub fn parse_values(text: &str) -> Result<Vec<i64>, InputError> {
    let mut values = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();
        for token in content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value = token.parse::<i64>().map_err(|_| InputError::InvalidValue {
                value: token.to_string(),
                line: index + 1,
            })?;
            values.push(value);
        }
    }

    Ok(values)
}

/// Read and parse the values stored in `path`
pub fn read_values(path: &Path) -> Result<Vec<i64>, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_values(&text)
}
