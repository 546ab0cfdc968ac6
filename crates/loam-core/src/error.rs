use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur while seeding
/// content. It uses the `thiserror` crate for ergonomic error handling and
/// automatic conversion from underlying library errors.
///
/// # Error Conversion
///
/// Some errors automatically convert from their source types using the
/// `#[from]` attribute:
/// - `serde_json::Error` → `SeedError::Serialization`
/// - `std::io::Error` → `SeedError::Io`
///
/// # Examples
///
/// ```no_run
/// use loam_core::error::SeedError;
///
/// fn example() -> Result<(), SeedError> {
///     // Errors automatically convert
///     Err(SeedError::Data("record has no key".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum SeedError {
    /// Required configuration is missing or unusable.
    ///
    /// This error is fatal and aborts the run before any remote call,
    /// typically when the endpoint or access token is absent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The content API endpoint URL is malformed.
    ///
    /// This error occurs when the configured endpoint cannot be parsed
    /// into a valid URL for the GraphQL service.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Network or connection error.
    ///
    /// This error occurs when a request fails due to connectivity issues,
    /// DNS resolution failures, or the remote server being unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timeout.
    ///
    /// This error occurs when a request takes longer than the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    ///
    /// This error occurs when too many requests are made in a short period.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimited,

    /// The content API answered with a non-success HTTP status.
    #[error("HTTP {0} from content API")]
    Http(u16),

    /// The content API returned GraphQL-level errors.
    ///
    /// The transport succeeded and the response was well formed, but the
    /// service rejected the operation. Carries the first error message
    /// reported by the API.
    #[error("Content API error: {0}")]
    Service(String),

    /// JSON serialization or deserialization failed.
    ///
    /// This error occurs when converting between Rust types and JSON,
    /// typically when parsing API responses or reading dataset files.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Dataset file or directory could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API response was missing expected data.
    ///
    /// This error occurs when an operation succeeds at the transport level
    /// but the response lacks the payload the operation should return.
    #[error("Response missing expected data: {0}")]
    MissingData(String),

    /// A natural key matched more than one draft entry.
    ///
    /// Writing against an ambiguous key could converge the wrong entry,
    /// so the record is refused rather than guessed at.
    #[error("Natural key '{key}' matched {matches} draft entries")]
    AmbiguousKey { key: String, matches: usize },

    /// A record descriptor is malformed.
    ///
    /// This error occurs before any remote call, e.g. when a record has a
    /// blank natural key or references a relation the collection binding
    /// does not declare.
    #[error("Invalid record data: {0}")]
    Data(String),

    /// The bindings file could not be parsed or fails validation.
    #[error("Invalid bindings file: {0}")]
    Bindings(String),
}

impl SeedError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            SeedError::Configuration(msg) => {
                format!(
                    "Configuration error: {}\n   Set LOAM_ENDPOINT and LOAM_TOKEN in the environment or a .env file.",
                    msg
                )
            }
            SeedError::InvalidEndpoint(url) => {
                format!(
                    "Invalid endpoint URL: {}\n   Example: https://api.example.com/v2/<project>/master",
                    url
                )
            }
            SeedError::Network(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            SeedError::Timeout(secs) => {
                format!("Request timed out after {} seconds.\n   The content API may be overloaded. Try again later.", secs)
            }
            SeedError::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            SeedError::Service(msg) => {
                if msg.contains("401") || msg.contains("Unauthorized") {
                    "The content API rejected the access token.\n   Check your LOAM_TOKEN environment variable.".to_string()
                } else {
                    format!("Content API error: {}", msg)
                }
            }
            SeedError::MissingData(what) => {
                format!("The API returned no data for {}. The service may be temporarily unavailable.", what)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error happened below the GraphQL layer.
    ///
    /// Transport errors mean the operation may never have reached the
    /// service; service errors mean it did and was rejected.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SeedError::Network(_)
                | SeedError::Timeout(_)
                | SeedError::RateLimited
                | SeedError::Http(_)
        )
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use loam_core::error::SeedError;
    ///
    /// // Network errors are retryable
    /// let err = SeedError::Network("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// // Rate limits are retryable (after a delay)
    /// let err = SeedError::RateLimited;
    /// assert!(err.is_retryable());
    ///
    /// // Malformed record data is NOT retryable
    /// let err = SeedError::Data("blank key".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            SeedError::Network(_) | SeedError::Timeout(_) | SeedError::RateLimited => true,
            SeedError::Http(status) => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SeedError::Data("record has no key".to_string());
        assert_eq!(err.to_string(), "Invalid record data: record has no key");
    }

    #[test]
    fn test_ambiguous_key_display() {
        let err = SeedError::AmbiguousKey {
            key: "healthcare".to_string(),
            matches: 2,
        };
        assert_eq!(
            err.to_string(),
            "Natural key 'healthcare' matched 2 draft entries"
        );
    }

    #[test]
    fn test_timeout_error() {
        let err = SeedError::Timeout(30);
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let err: SeedError = serde_err.into();
        assert!(matches!(err, SeedError::Serialization(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: SeedError = io_err.into();
        assert!(matches!(err, SeedError::Io(_)));
    }

    #[test]
    fn test_user_message_configuration() {
        let err = SeedError::Configuration("LOAM_TOKEN not set".to_string());
        let msg = err.user_message();
        assert!(msg.contains("LOAM_TOKEN"));
    }

    #[test]
    fn test_user_message_unauthorized() {
        let err = SeedError::Service("401 Unauthorized".to_string());
        let msg = err.user_message();
        assert!(msg.contains("rejected the access token"));
    }

    #[test]
    fn test_is_transport() {
        assert!(SeedError::Network("reset".to_string()).is_transport());
        assert!(SeedError::Timeout(30).is_transport());
        assert!(SeedError::RateLimited.is_transport());
        assert!(SeedError::Http(503).is_transport());
        assert!(!SeedError::Service("bad input".to_string()).is_transport());
        assert!(!SeedError::Data("blank key".to_string()).is_transport());
    }

    #[test]
    fn test_is_retryable() {
        assert!(SeedError::Network("timeout".to_string()).is_retryable());
        assert!(SeedError::Timeout(30).is_retryable());
        assert!(SeedError::RateLimited.is_retryable());
        assert!(SeedError::Http(502).is_retryable());
        assert!(!SeedError::Http(404).is_retryable());
        assert!(!SeedError::Service("bad input".to_string()).is_retryable());
        assert!(!SeedError::InvalidEndpoint("bad".to_string()).is_retryable());
    }
}
