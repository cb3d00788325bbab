use tokio::task::JoinError;

/// Runs file and network reads on the runtime's blocking pool so the window
/// keeps repainting while they are outstanding.
pub async fn run_blocking<F, T>(f: F) -> Result<T, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await
}
