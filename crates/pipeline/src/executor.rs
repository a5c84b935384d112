//! The bounded-parallel execution engine.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

/// Concurrency options for [`execute`].
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    /// Maximum number of workers in flight at once. Must be at least 1.
    pub parallel: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self { parallel: 1 }
    }
}

/// The initializer's output: the items to iterate plus state shared by all
/// workers for the duration of the run.
pub struct ExecutionPlan<I, S> {
    /// Work items, processed in order of dispatch.
    pub items: Vec<I>,
    /// Shared state handed to every worker as an `Arc`.
    pub state: S,
}

/// Run `worker` over the items produced by `init` with a concurrency cap.
///
/// At most `options.parallel` workers are in flight at any time. The first
/// worker failure stops further dispatch; items already in flight still run
/// to completion before the failure is returned (there is no hard
/// cancellation). A worker panic is reported as a failure rather than
/// aborting the caller. An initializer failure is returned directly.
pub async fn execute<Init, InitFut, I, S, W, WFut>(
    init: Init,
    worker: W,
    options: ExecuteOptions,
) -> anyhow::Result<()>
where
    Init: FnOnce() -> InitFut,
    InitFut: Future<Output = anyhow::Result<ExecutionPlan<I, S>>>,
    I: Send + 'static,
    S: Send + Sync + 'static,
    W: Fn(I, Arc<S>) -> WFut,
    WFut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    if options.parallel == 0 {
        anyhow::bail!("parallel must be at least 1");
    }

    let plan = init().await?;
    let state = Arc::new(plan.state);
    let mut items = plan.items.into_iter();
    let mut in_flight = JoinSet::new();
    let mut first_error: Option<anyhow::Error> = None;

    loop {
        // Top up the in-flight set unless a failure already stopped dispatch.
        while first_error.is_none() && in_flight.len() < options.parallel {
            match items.next() {
                Some(item) => {
                    in_flight.spawn(worker(item, Arc::clone(&state)));
                }
                None => break,
            }
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };

        let outcome = match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(anyhow::anyhow!(
                "worker panicked: {}",
                panic_text(err.into_panic())
            )),
            Err(err) => Err(anyhow::anyhow!(err)),
        };

        if let Err(err) = outcome {
            if first_error.is_none() {
                tracing::error!(error = %err, "Worker failed, stopping dispatch");
                first_error = Some(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Best-effort extraction of a panic payload message.
fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
