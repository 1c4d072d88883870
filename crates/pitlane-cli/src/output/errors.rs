//! Error message formatting with actionable suggestions.

use super::colors::ColorSupport;
use pitlane_core::error::PitlaneError;
use std::error::Error;

/// Renders errors with their cause chain and a help line
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error, its sources, and a suggestion if one applies
    pub fn format_error(&self, error: &PitlaneError) -> String {
        let mut output = format!("{}: {}", self.colors.red("error"), error);

        let mut source = error.source();
        while let Some(cause) = source {
            output.push('\n');
            output.push_str(&format!("  {}: {}", self.colors.dim("caused by"), cause));
            source = cause.source();
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str("\n\n");
            output.push_str(&format!("{}: {}", self.colors.cyan("help"), suggestion));
        }

        output
    }

    /// Format a warning message
    pub fn format_warning(&self, message: &str) -> String {
        format!("{}: {}", self.colors.yellow("warning"), message)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitlane_core::AssetKind;

    fn formatter() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn includes_cause_chain() {
        let err = PitlaneError::build_failed(
            AssetKind::Car,
            "ferrari_f40",
            "Failed to create cache/cars".to_string(),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        );

        let rendered = formatter().format_error(&err);
        assert!(rendered.starts_with("error: Failed to build archive for cars item 'ferrari_f40'"));
        assert!(rendered.contains("caused by: permission denied"));
        assert!(rendered.contains("help: Check that cache_root is writable"));
    }

    #[test]
    fn omits_help_without_suggestion() {
        let err = PitlaneError::io(
            "Failed to bind 0.0.0.0:8772".to_string(),
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        );

        let rendered = formatter().format_error(&err);
        assert!(!rendered.contains("help:"));
        assert!(rendered.contains("caused by: address in use"));
    }

    #[test]
    fn formats_warnings() {
        assert_eq!(formatter().format_warning("slow disk"), "warning: slow disk");
    }
}
