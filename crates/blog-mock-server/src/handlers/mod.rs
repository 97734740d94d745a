pub mod comments;
pub mod likes;
pub mod posts;

use crate::db::Route;
use crate::error::AppError;
use crate::routes::AppState;

/// Count the request, apply injected faults and delays.
async fn enter(state: &AppState, route: Route) -> Result<(), AppError> {
    let delay = state.db.lock().record(route)?;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Ok(())
}
