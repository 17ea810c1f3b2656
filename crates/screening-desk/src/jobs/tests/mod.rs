pub(crate) mod common;
mod slot;
