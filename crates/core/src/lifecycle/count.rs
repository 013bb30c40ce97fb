use crate::types::CountStatus;

use super::TransitionError;

impl CountStatus {
    /// Begin counting a planned count.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` unless the count is still planned.
    pub fn start(self) -> Result<Self, TransitionError> {
        match self {
            Self::Planned => Ok(Self::InProgress),
            Self::InProgress => Err(TransitionError::Invalid {
                from: self.label(),
                to: Self::InProgress.label(),
            }),
            Self::Completed => Err(TransitionError::Final {
                state: self.label(),
            }),
        }
    }

    /// Complete a count. A planned count may be completed directly.
    ///
    /// # Errors
    ///
    /// Returns `Final` when the count is already completed.
    pub fn complete(self) -> Result<Self, TransitionError> {
        match self {
            Self::Planned | Self::InProgress => Ok(Self::Completed),
            Self::Completed => Err(TransitionError::Final {
                state: self.label(),
            }),
        }
    }
}
