#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrozenError {
    #[error("field of frozen record may not be assigned: {field} <= {value} (record: {record})")]
    Assignment {
        field: String,
        value: String,
        record: String,
    },
    #[error("frozen record has no field `{0}`")]
    MissingField(String),
}
