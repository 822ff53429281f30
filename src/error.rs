use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{stage} unavailable: {reason}")]
    CollaboratorUnavailable { stage: Stage, reason: String },

    #[error("malformed state document: {0}")]
    MalformedState(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn unavailable(stage: Stage, reason: impl Into<String>) -> Self {
        EngineError::CollaboratorUnavailable {
            stage,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Pipeline step that talks to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Article,
    Script,
    Media,
    Render,
    Caption,
    Hashtags,
    Publish,
    PostLog,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Article => "article fetch",
            Stage::Script => "script generation",
            Stage::Media => "media sourcing",
            Stage::Render => "video render",
            Stage::Caption => "caption generation",
            Stage::Hashtags => "hashtag generation",
            Stage::Publish => "publishing",
            Stage::PostLog => "post log",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
