//! Request headers that steer an invocation.

/// Name of the function to invoke. Required.
pub const X_FUNCTION_NAME: &str = "x-functionname";
/// Region to invoke in.
pub const X_REGION: &str = "x-region";
/// Function version or alias.
pub const X_QUALIFIER: &str = "x-qualifier";
/// `None` or `Tail`.
pub const X_LOG_TYPE: &str = "x-logtype";
/// Rendering mode, `default` or `simple`.
pub const X_VIEW_TYPE: &str = "x-viewtype";
