use thiserror::Error;

use crate::models::FieldType;

/// User input rejected by validation.
///
/// `Display` is exactly the token printed back to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("** class name missing **")]
    ClassNameMissing,

    #[error("** class doesn't exist **")]
    ClassDoesNotExist,

    #[error("** instance id missing **")]
    InstanceIdMissing,

    #[error("** no instance found **")]
    NoInstanceFound,

    #[error("** attribute name missing **")]
    AttributeNameMissing,

    #[error("** value missing **")]
    ValueMissing,

    #[error("*** Unknown syntax: {0}")]
    UnknownSyntax(String),
}

/// A value that cannot take the type its field is cataloged with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {} value for {field}: {value:?}", .expected.as_str())]
pub struct CoercionError {
    pub field: String,
    pub value: String,
    pub expected: FieldType,
}

/// Everything a single dispatched command can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
