use crate::event::EventKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a valid points value: {0:?}")]
    Validation(String),

    #[error("{kind} event has not been set up in this server")]
    ConfigurationMissing { kind: EventKind },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing permission: {0}")]
    Permission(String),

    #[error("Invalid signup step: {0}")]
    InvalidTransition(&'static str),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Error::Discord(Box::new(err))
    }
}

impl Error {
    pub fn user_message(&self) -> String {
        match self {
            Error::Discord(_) => "Failed to communicate with Discord. Please try again.".into(),
            Error::Config(msg) => msg.clone(),
            Error::Io(_) | Error::Json(_) => {
                "Could not save event data. Please try again later.".into()
            }
            Error::Validation(_) => {
                "⚠️ Please enter your points as a number, e.g. 250000 or 250,000.".into()
            }
            Error::ConfigurationMissing { kind } => format!(
                "❌ The {kind} event is not set up yet. An administrator has to run `{}` first.",
                kind.setup_command()
            ),
            Error::NotFound(what) => format!("❌ {what} could not be found. It may have been deleted."),
            Error::Permission(_) => {
                "I don't have permission to do that. Please check my role position.".into()
            }
            Error::InvalidTransition(_) => {
                "This signup has expired. Please press a tier button again.".into()
            }
        }
    }
}
