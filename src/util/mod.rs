pub mod bytes;
pub(crate) mod lock;
