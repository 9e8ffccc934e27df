/// Every failure a study workflow can surface to the presentation layer.
///
/// The `Display` text is the human-readable cause shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudyError {
    #[error("Insufficient credits: {required} needed, {available} available")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("Question generation failed: {0}")]
    Generation(String),

    #[error("Could not save your progress: {0}")]
    Persistence(String),

    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("No quiz is in progress")]
    NoActiveQuiz,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl StudyError {
    pub fn generation(msg: impl Into<String>) -> Self {
        StudyError::Generation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        StudyError::Persistence(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        StudyError::Validation(msg.into())
    }
}

pub type StudyResult<T> = Result<T, StudyError>;
