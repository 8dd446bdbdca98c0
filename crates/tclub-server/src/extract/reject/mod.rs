//! Extractors whose rejections render as [`Error`] responses.
//!
//! [`Error`]: crate::handler::Error

mod json;
mod path;
mod validated_json;

pub use self::json::Json;
pub use self::path::Path;
pub use self::validated_json::ValidateJson;

/// Trims rejection messages to a short single line.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    let lines = message.lines().take(2).collect::<Vec<_>>();
    lines.join(" ").chars().take(150).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_limits_lines_and_length() {
        let message = format!("first\nsecond\nthird {}", "x".repeat(400));
        let sanitized = sanitize_error_message(&message);
        assert_eq!(sanitized, "first second");

        let long = "y".repeat(400);
        assert_eq!(sanitize_error_message(&long).len(), 150);
    }
}
