use tokio::runtime::Handle;

use crate::engine::errors::MergeError;
use crate::engine::types::OpId;

/// The ambient execution context a pipeline runs under: the operation it
/// belongs to and the runtime remote requests are spawned on.
#[derive(Debug, Clone)]
pub struct OperationContext {
    op_id: OpId,
    runtime: Handle,
}

impl OperationContext {
    pub fn new(op_id: OpId, runtime: Handle) -> Self {
        Self { op_id, runtime }
    }

    /// Builds a context on the runtime the caller is running in.
    pub fn current(op_id: OpId) -> Result<Self, MergeError> {
        let runtime = Handle::try_current().map_err(|_| MergeError::NoRuntime)?;
        Ok(Self::new(op_id, runtime))
    }

    pub fn op_id(&self) -> OpId {
        self.op_id
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }
}
