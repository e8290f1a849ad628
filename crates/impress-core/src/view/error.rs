use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Attachment point '#{0}' not found in host document")]
    AttachmentPointNotFound(String),

    #[error("Attachment point '#{target}' already holds view '{view}'")]
    AlreadyMounted { target: String, view: String },

    #[error("Invalid attachment point id '{0}'")]
    InvalidAttachmentPoint(String),

    /// A view referenced a component tag no installed plugin provides
    #[error("Component '{0}' is not registered")]
    ComponentNotFound(String),

    #[error("View '{view}' failed to render: {message}")]
    RenderFailed { view: String, message: String },
}
