use thiserror::Error;

use crate::character::display_name;

/// Outcome classification for a failed character lookup.
///
/// `Permanent` means the API explicitly reported it cannot serve this
/// slug; retrying is futile. `Transient` covers recoverable faults and is
/// observed per attempt; a lookup that keeps failing transiently
/// terminates as `RetryExhausted`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("api cannot provide build data for `{slug}`")]
    Permanent { slug: String },
    #[error("transient lookup failure for `{slug}`: {message}")]
    Transient { slug: String, message: String },
    #[error("lookup for `{slug}` failed after {attempts} attempts")]
    RetryExhausted { slug: String, attempts: u32 },
}

impl LookupError {
    /// User-safe reply text for a terminal lookup failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Permanent { slug } => format!(
                "Failed to retrieve data for {}: The API could not find information for this resonator.",
                display_name(slug)
            ),
            Self::RetryExhausted { slug, .. } => format!(
                "Failed to retrieve data for {} after multiple attempts. \
                 The API may be busy or the character data may not be available yet.",
                display_name(slug)
            ),
            Self::Transient { slug, .. } => {
                format!(
                    "Failed to retrieve data for {}. Please try again later.",
                    display_name(slug)
                )
            }
        }
    }
}
