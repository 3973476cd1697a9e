use crate::fetch::{FetchError, FetchResult};
use core::fmt;

/// The two-way classification every processed item ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// The fetch returned a status in `[200, 300)`.
    Success,
    /// Any other status, or a transport failure.
    Failure,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::Failure => write!(f, "failure"),
        }
    }
}

/// What the aggregator hands to an [`crate::OutcomeSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Identifier of the processed [`crate::WorkItem`].
    pub id: String,
    /// Which outcome channel the identifier arrived on.
    pub kind: OutcomeKind,
}

/// Richer reason behind a failure, used for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The remote end answered outside the success range.
    Status(u16),
    /// The request never produced a status.
    Transport(FetchError),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Status(code) => write!(f, "status {code}"),
            FailureCause::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// Classifies a fetch result into success or a failure with its cause.
pub fn classify(result: FetchResult) -> Result<u16, FailureCause> {
    match result {
        Ok(status) if (200..300).contains(&status) => Ok(status),
        Ok(status) => Err(FailureCause::Status(status)),
        Err(e) => Err(FailureCause::Transport(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_half_open() {
        assert_eq!(classify(Ok(200)), Ok(200));
        assert_eq!(classify(Ok(201)), Ok(201));
        assert_eq!(classify(Ok(299)), Ok(299));
        assert_eq!(classify(Ok(300)), Err(FailureCause::Status(300)));
        assert_eq!(classify(Ok(199)), Err(FailureCause::Status(199)));
    }

    #[test]
    fn client_and_server_errors_fail() {
        assert_eq!(classify(Ok(301)), Err(FailureCause::Status(301)));
        assert_eq!(classify(Ok(404)), Err(FailureCause::Status(404)));
        assert_eq!(classify(Ok(500)), Err(FailureCause::Status(500)));
    }

    #[test]
    fn transport_errors_fail() {
        assert_eq!(
            classify(Err(FetchError::Timeout)),
            Err(FailureCause::Transport(FetchError::Timeout))
        );
        assert_eq!(
            classify(Err(FetchError::Connect {
                reason: "refused".into()
            })),
            Err(FailureCause::Transport(FetchError::Connect {
                reason: "refused".into()
            }))
        );
    }

    #[test]
    fn classify_keeps_the_cause() {
        assert_eq!(classify(Ok(204)), Ok(204));
        assert_eq!(classify(Ok(500)), Err(FailureCause::Status(500)));
        assert_eq!(FailureCause::Status(404).to_string(), "status 404");
    }
}
