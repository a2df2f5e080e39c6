//! LazySink - process-wide sink, created on first use

use contracts::ContractError;
use tokio::sync::OnceCell;
use tracing::info;

type SinkFactory<S> = Box<dyn Fn() -> Result<S, ContractError> + Send + Sync>;

/// Sink cell shared by every request
///
/// The factory runs at most once per successful initialization. Concurrent
/// first requests wait for the same initialization; a failed initialization
/// leaves the cell empty and the next request tries again.
pub struct LazySink<S> {
    cell: OnceCell<S>,
    factory: SinkFactory<S>,
}

impl<S> LazySink<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<S, ContractError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Get the sink, creating it on first call
    pub async fn get(&self) -> Result<&S, ContractError> {
        self.cell
            .get_or_try_init(|| async {
                let sink = (self.factory)()?;
                info!("warehouse sink initialized");
                Ok(sink)
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl<S> std::fmt::Debug for LazySink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySink")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
