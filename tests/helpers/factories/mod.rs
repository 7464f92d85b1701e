pub mod document_factory;
pub mod merge_params_factory;
pub mod remote_cursor_factory;

pub use document_factory::DocumentFactory;
pub use merge_params_factory::MergeParamsFactory;
pub use remote_cursor_factory::RemoteCursorFactory;
