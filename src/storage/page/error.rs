use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("not enough space in page")]
    InsufficientSpace,
    #[error("slot {0} out of range")]
    SlotOutOfRange(u32),
    #[error("tuple was deleted")]
    TupleDeleted,
    #[error("tuple encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}
