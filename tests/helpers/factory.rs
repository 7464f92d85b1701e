pub use super::factories::{DocumentFactory, MergeParamsFactory, RemoteCursorFactory};

pub struct Factory;

impl Factory {
    pub fn remote_cursor() -> RemoteCursorFactory {
        RemoteCursorFactory::new()
    }

    pub fn merge_params() -> MergeParamsFactory {
        MergeParamsFactory::new()
    }

    pub fn documents() -> DocumentFactory {
        DocumentFactory::new()
    }
}
