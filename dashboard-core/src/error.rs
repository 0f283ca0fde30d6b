//! Error taxonomy shared by the upstream client and the view model.
//!
//! `Input` and `NotFound` are user-correctable and carry the text shown to
//! the user verbatim. `Upstream` and `MalformedResponse` carry diagnostic
//! detail that is logged, while the user only sees a generic message.

use thiserror::Error;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

const GENERIC_FAILURE: &str = "Could not load weather data. Please try again later.";
const INCOMPLETE_DATA: &str = "Received incomplete data from the server.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// Missing or empty city, invalid coordinates. Rejected before any request.
    #[error("{0}")]
    Input(String),

    /// City or coordinates could not be resolved by the provider.
    #[error("Could not find weather for \"{0}\". Please check the spelling and try again.")]
    NotFound(String),

    /// Non-2xx status other than not-found, or a transport failure.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The response was received but lacks required fields.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Cannot summarize an empty day group for {0}")]
    EmptyDayGroup(String),

    #[error("No forecast day {0} in the current grouping")]
    UnknownDay(String),
}

impl WeatherError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// True when the message should be shown to the user as corrective guidance.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input(_) | Self::NotFound(_))
    }

    /// Text suitable for a toast or status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(_) | Self::NotFound(_) => self.to_string(),
            Self::MalformedResponse(_) => INCOMPLETE_DATA.to_string(),
            Self::Upstream(_) => GENERIC_FAILURE.to_string(),
            // Precondition violations only surface through programming errors.
            Self::EmptyDayGroup(_) | Self::UnknownDay(_) => self.to_string(),
        }
    }
}

/// Why the device location could not be obtained.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Permission denied. Please enable location in your settings.")]
    PermissionDenied,
    #[error("Geolocation is not supported on this device.")]
    Unsupported,
    #[error("Could not get location: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
