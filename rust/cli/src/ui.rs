//! Terminal output helpers shared by the commands.

use std::io::Write;

pub fn write_error(err: &mut dyn Write, msg: &str) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}

/// Display a warning message to stderr with "WARNING:" prefix
pub fn display_warning(err: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(err, "WARNING: {}", message)
}

/// Formats a percentage with one decimal place.
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_errors_and_warnings() {
        let mut buf = Vec::new();
        write_error(&mut buf, "boom").unwrap();
        display_warning(&mut buf, "careful").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Error: boom\nWARNING: careful\n");
    }

    #[test]
    fn percent_rounds_to_one_place() {
        assert_eq!(percent(33.333), "33.3%");
        assert_eq!(percent(100.0), "100.0%");
    }
}
