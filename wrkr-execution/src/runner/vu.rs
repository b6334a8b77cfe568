use std::future::Future;
use std::sync::Arc;

use crate::execution::ExecutionState;
use crate::vu::{IterationContext, VuId};

/// Creates the script runtime of one VU.
///
/// Runs in the init context: no iteration is in progress, so stats queries made
/// by init code fail.
pub trait VuFactory: Send + Sync + 'static {
    type Vu: VuRuntime;
    type Error: std::error::Error + Send + Sync + 'static;

    fn new_vu(
        &self,
        id: VuId,
        execution: &Arc<ExecutionState>,
    ) -> impl Future<Output = Result<Self::Vu, Self::Error>> + Send;
}

/// An initialized VU able to run iterations.
pub trait VuRuntime: Send + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the script function `exec` once. `ctx` is the ambient context for
    /// every stats query made during the call.
    fn run_iteration(
        &mut self,
        exec: &str,
        ctx: &IterationContext,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
