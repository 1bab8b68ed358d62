use std::path::PathBuf;
use std::sync::Arc;

use forge_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Root directory for uploaded media; avatars live under `avatars/`.
    pub upload_dir: PathBuf,
    /// Prefix stored relative media paths resolve against, e.g. `/media`.
    pub media_base: String,
}
