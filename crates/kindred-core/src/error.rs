use thiserror::Error;

use crate::model::MemberId;

/// A mutation that would break a structural invariant. The snapshot the
/// operation was applied to stays untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("The root of the tree cannot be deleted")]
    RootDeletion,
    #[error("The root of the tree cannot have a sibling; add a clan instead")]
    RootSibling,
    #[error("Member id '{0}' is already used elsewhere in the tree")]
    DuplicateId(MemberId),
}

/// An interchange document that cannot become a graph.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document root must be a JSON object")]
    NotAnObject,
    #[error("Document root has neither an \"id\" nor a \"name\" field")]
    MissingIdentity,
    #[error("Document does not describe a family tree: {0}")]
    Shape(String),
    #[error("Member id '{0}' appears more than once")]
    DuplicateId(String),
    #[error("Member id '{0}' is reserved")]
    ReservedId(String),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Invalid tree name '{0}'")]
    InvalidName(String),
    #[error("Tree '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
}
