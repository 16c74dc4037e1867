/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Tty,
    Json,
}

/// Detect the appropriate output mode.
pub fn detect_output_mode(json_flag: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    OutputMode::Tty
}

/// Serialize any serializable value to pretty JSON string.
pub fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
