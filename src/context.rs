pub mod mutation;
pub mod query;
pub mod views;

use std::sync::Arc;

use crate::repository::interface::Repository;

/// The main entrypoint for interacting with a grid store: all queries and
/// mutations go through methods on this struct (implemented in the
/// `query`, `mutation` and `views` submodules).
#[derive(Debug, Clone)]
pub struct GridContext {
    pub repository: Arc<dyn Repository>,
}

impl GridContext {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }
}
