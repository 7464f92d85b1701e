use std::any::Any;
use std::mem;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::spec::{parse_stage, serialize_stage};
use crate::engine::errors::MergeError;
use crate::engine::executor::{KillCursorsHandle, OperationContext, TaskExecutor};
use crate::engine::merger::{MergeParams, PullResult, RemoteStreamMerger};
use crate::engine::pipeline::{
    DiskUseRequirement, DocumentSource, FacetRequirement, GetNextResult, HostTypeRequirement,
    LimitStage, PositionRequirement, SortStage, StageConstraints, StageInput,
    TransactionRequirement,
};
use crate::shared::config::MergerConfig;

pub const STAGE_NAME: &str = "$mergeCursors";

const LOG_TARGET: &str = "cursor_merge::stage";

/// Who is responsible for the remote cursors right now.
enum CursorOwnership {
    /// The stage holds the descriptors; nothing has been fetched.
    Unclaimed(MergeParams),
    /// The merger owns the cursors and kills them when disposed.
    Claimed(RemoteStreamMerger),
    /// The descriptors were handed to another host.
    Transferred,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Configured,
    Active,
    Detached,
    Transferred,
    Disposed,
}

/// First stage of a merging pipeline: yields the union of several remote
/// cursors' results, merge-sorted when a sort is set.
///
/// Ownership of the cursors moves from the stage to a [`RemoteStreamMerger`]
/// on the first pull. A stage disposed before that never kills anything.
pub struct MergeCursorsStage {
    ownership: CursorOwnership,
    executor: Arc<dyn TaskExecutor>,
    ctx: Option<OperationContext>,
    config: MergerConfig,
}

impl MergeCursorsStage {
    pub fn create(
        params: MergeParams,
        executor: Arc<dyn TaskExecutor>,
        ctx: OperationContext,
        config: MergerConfig,
    ) -> Result<Self, MergeError> {
        params.validate()?;
        debug!(
            target: LOG_TARGET,
            op_id = %ctx.op_id(),
            nss = %params.nss,
            remotes = params.remotes.len(),
            "Created {} stage",
            STAGE_NAME
        );

        Ok(Self {
            ownership: CursorOwnership::Unclaimed(params),
            executor,
            ctx: Some(ctx),
            config,
        })
    }

    /// Rebuilds a stage from its serialized form.
    pub fn create_from_json(
        value: &Value,
        executor: Arc<dyn TaskExecutor>,
        ctx: OperationContext,
        config: MergerConfig,
    ) -> Result<Self, MergeError> {
        Self::create(parse_stage(value)?, executor, ctx, config)
    }

    pub fn boxed(self) -> Box<dyn DocumentSource> {
        Box::new(self)
    }

    pub fn state(&self) -> StageState {
        match &self.ownership {
            CursorOwnership::Unclaimed(_) if self.ctx.is_none() => StageState::Detached,
            CursorOwnership::Unclaimed(_) => StageState::Configured,
            CursorOwnership::Claimed(merger) if merger.is_detached() => StageState::Detached,
            CursorOwnership::Claimed(_) => StageState::Active,
            CursorOwnership::Transferred => StageState::Transferred,
            CursorOwnership::Disposed => StageState::Disposed,
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self.ownership, CursorOwnership::Claimed(_))
    }

    /// The stored parameters, until the merger claims them.
    pub fn params(&self) -> Option<&MergeParams> {
        match &self.ownership {
            CursorOwnership::Unclaimed(params) => Some(params),
            _ => None,
        }
    }

    pub fn merger(&self) -> Option<&RemoteStreamMerger> {
        match &self.ownership {
            CursorOwnership::Claimed(merger) => Some(merger),
            _ => None,
        }
    }

    /// Serializes the stage for another host and gives up the cursors
    /// without killing them; the receiver becomes their owner.
    pub fn forward(&mut self) -> Result<Vec<Value>, MergeError> {
        match &self.ownership {
            CursorOwnership::Unclaimed(_) => {}
            CursorOwnership::Claimed(_) => {
                return Err(MergeError::OwnershipInvariant(
                    "claimed cursors cannot be forwarded",
                ));
            }
            CursorOwnership::Transferred => return Err(MergeError::Transferred),
            CursorOwnership::Disposed => return Err(MergeError::Disposed),
        }

        let serialized = self.serialize_to_array()?;
        self.ownership = CursorOwnership::Transferred;
        info!(target: LOG_TARGET, "Remote cursors forwarded");
        Ok(serialized)
    }

    /// Releases the cursors. A claimed stage kills the ones still open;
    /// otherwise the descriptors are dropped. Disposing twice is a no-op.
    pub fn dispose_cursors(&mut self) -> KillCursorsHandle {
        match mem::replace(&mut self.ownership, CursorOwnership::Disposed) {
            CursorOwnership::Claimed(mut merger) => merger.kill(),
            CursorOwnership::Unclaimed(params) => {
                debug!(
                    target: LOG_TARGET,
                    nss = %params.nss,
                    remotes = params.remotes.len(),
                    "Disposed before first pull, releasing descriptors"
                );
                KillCursorsHandle::none()
            }
            CursorOwnership::Transferred | CursorOwnership::Disposed => KillCursorsHandle::none(),
        }
    }

    fn claim(&mut self) -> Result<&mut RemoteStreamMerger, MergeError> {
        if let CursorOwnership::Unclaimed(_) = self.ownership {
            let ctx = self.ctx.clone().ok_or(MergeError::Detached)?;
            if let CursorOwnership::Unclaimed(params) =
                mem::replace(&mut self.ownership, CursorOwnership::Disposed)
            {
                debug!(
                    target: LOG_TARGET,
                    op_id = %ctx.op_id(),
                    remotes = params.remotes.len(),
                    "Merger claimed remote cursors"
                );
                let merger =
                    RemoteStreamMerger::new(ctx, Arc::clone(&self.executor), params, &self.config);
                self.ownership = CursorOwnership::Claimed(merger);
            }
        }

        match &mut self.ownership {
            CursorOwnership::Claimed(merger) => Ok(merger),
            CursorOwnership::Transferred => Err(MergeError::Transferred),
            CursorOwnership::Disposed => Err(MergeError::Disposed),
            CursorOwnership::Unclaimed(_) => {
                Err(MergeError::OwnershipInvariant("cursors still unclaimed after claim"))
            }
        }
    }
}

impl DocumentSource for MergeCursorsStage {
    fn source_name(&self) -> &'static str {
        STAGE_NAME
    }

    fn get_next(&mut self, _input: StageInput<'_>) -> Result<GetNextResult, MergeError> {
        let merger = self.claim()?;
        Ok(match merger.pull()? {
            PullResult::Advanced(doc) => GetNextResult::Advanced(doc),
            PullResult::NotReady => GetNextResult::PauseExecution,
            PullResult::Exhausted => GetNextResult::Eof,
        })
    }

    fn constraints(&self) -> StageConstraints {
        StageConstraints {
            streaming: true,
            position: PositionRequirement::First,
            host_type: HostTypeRequirement::AnyShard,
            disk_use: DiskUseRequirement::NoDiskUse,
            facet: FacetRequirement::NotAllowed,
            transaction: TransactionRequirement::NotAllowed,
            requires_input_source: false,
        }
    }

    /// Drops a directly following `$sort` that repeats this stage's own sort:
    /// the remote streams already arrive in that order, so the merge yields
    /// it for free. A limit carried by the `$sort` stays behind as `$limit`.
    fn optimize_at(&mut self, position: usize, container: &mut Vec<Box<dyn DocumentSource>>) {
        let CursorOwnership::Unclaimed(params) = &self.ownership else {
            return;
        };
        let Some(sort) = container
            .get(position)
            .and_then(|next| next.as_any().downcast_ref::<SortStage>())
        else {
            return;
        };
        if params.sort.as_ref() != Some(sort.spec()) {
            return;
        }

        let limit = sort.limit();
        container.remove(position);
        if let Some(limit) = limit {
            container.insert(position, Box::new(LimitStage::new(limit)));
        }
        debug!(
            target: LOG_TARGET,
            sort = %sort_json(params),
            limit = ?limit,
            "Absorbed following $sort"
        );
    }

    fn serialize(&self) -> Result<Value, MergeError> {
        Err(MergeError::SerializeMisuse(STAGE_NAME))
    }

    /// Before the first pull this is the stage's exact configuration. Once
    /// claimed it describes the merger's current cursors and buffers for
    /// explain output only: a getMore still in flight is left out and the
    /// cursors stay owned by the local merger.
    fn serialize_to_array(&self) -> Result<Vec<Value>, MergeError> {
        let stage = match &self.ownership {
            CursorOwnership::Unclaimed(params) => serialize_stage(params)?,
            CursorOwnership::Claimed(merger) => serialize_stage(&merger.params_snapshot())?,
            CursorOwnership::Transferred => return Err(MergeError::Transferred),
            CursorOwnership::Disposed => return Err(MergeError::Disposed),
        };
        Ok(vec![stage])
    }

    fn detach_from_operation_context(&mut self) {
        self.ctx = None;
        if let CursorOwnership::Claimed(merger) = &mut self.ownership {
            merger.detach_from_operation_context();
        }
    }

    fn reattach_to_operation_context(&mut self, ctx: OperationContext) {
        if let CursorOwnership::Claimed(merger) = &mut self.ownership {
            merger.reattach_to_operation_context(ctx.clone());
        }
        self.ctx = Some(ctx);
    }

    fn dispose(&mut self) {
        let _ = self.dispose_cursors();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn sort_json(params: &MergeParams) -> Value {
    params
        .sort
        .as_ref()
        .map(|spec| spec.to_json())
        .unwrap_or_default()
}
