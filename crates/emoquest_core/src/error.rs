use thiserror::Error;

/// Failures from the emotion classifier collaborator.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier returned no usable label")]
    NoLabel,
}

impl ClassifierError {
    /// Transport failures, rate limits and server errors may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ClassifierError::Request(_) => true,
            ClassifierError::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            ClassifierError::EmptyInput | ClassifierError::NoLabel => false,
        }
    }
}

/// Failures from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum QuestError {
    #[error(transparent)]
    Classification(#[from] ClassifierError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QuestError {
    pub fn is_retryable(&self) -> bool {
        match self {
            QuestError::Classification(e) => e.is_transient(),
            QuestError::Store(StoreError::Unavailable(_)) => true,
            QuestError::Store(StoreError::Corrupt(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(QuestError::from(ClassifierError::Request("timeout".into())).is_retryable());
        assert!(QuestError::from(ClassifierError::Status { status: 503, body: String::new() }).is_retryable());
        assert!(!QuestError::from(ClassifierError::Status { status: 401, body: String::new() }).is_retryable());
        assert!(!QuestError::from(ClassifierError::NoLabel).is_retryable());
        assert!(!QuestError::from(ClassifierError::EmptyInput).is_retryable());
    }

    #[test]
    fn test_retryable_store() {
        assert!(QuestError::from(StoreError::Unavailable("locked".into())).is_retryable());
        assert!(!QuestError::from(StoreError::Corrupt("negative exp".into())).is_retryable());
    }

    #[test]
    fn test_messages() {
        let e = QuestError::from(ClassifierError::NoLabel);
        assert_eq!(e.to_string(), "classifier returned no usable label");
        let e = QuestError::from(StoreError::Unavailable("disk I/O".into()));
        assert_eq!(e.to_string(), "store unavailable: disk I/O");
    }
}
