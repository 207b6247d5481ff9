use std::fmt;

/// Malformed input text, or a formula outside the fragment a logic admits.
/// Recoverable: the caller re-enters text. Never raised once a proof is underway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub message: String,
}

impl ParsingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParsingError {}

/// A line fails rule application, scope, or a side condition. The checker
/// rolls back the offending edit and surfaces the first such error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceError {
    pub message: String,
}

impl InferenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// "Line N: <detail>" — the error message shape external callers rely on.
    pub fn on_line(line_number: usize, detail: impl fmt::Display) -> Self {
        Self { message: format!("Line {}: {}", line_number, detail) }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InferenceError {}

/// The argument is invalid (with a countermodel) or the prover could not
/// find a proof within its time budget. Callers surface the message verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverError {
    pub message: String,
}

impl ProverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for ProverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProverError {}
