mod backend;
mod index;

pub use backend::BackendKind;
pub use index::{DB_FILE, IndexConfig, IndexConfigError};

#[cfg(test)]
mod tests;
