//! Common utilities for output formatters

use serde::Serialize;

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output as JSON: {}", e),
    }
}

/// Print a value as YAML
pub fn print_yaml<T: Serialize + ?Sized>(value: &T) {
    match serde_yml::to_string(value) {
        Ok(yaml) => print!("{}", yaml),
        Err(e) => eprintln!("Failed to serialize output as YAML: {}", e),
    }
}

/// Display value for optional fields
pub fn or_not_set(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("<not set>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_not_set() {
        assert_eq!(or_not_set(Some("t1")), "t1");
        assert_eq!(or_not_set(Some("")), "<not set>");
        assert_eq!(or_not_set(None), "<not set>");
    }
}
