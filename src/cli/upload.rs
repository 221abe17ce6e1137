use std::path::Path;

use anyhow::{Result, bail};
use serde_json::json;

use crate::backend::{SharedBackend, UploadFile};
use crate::orchestrator::{UploadOrchestrator, UploadOutcome};
use crate::session::Session;

pub async fn run(backend: SharedBackend, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    let uploads = UploadOrchestrator::new(Session::new(), backend);

    match uploads.submit_upload(file).await {
        UploadOutcome::Succeeded(document) => {
            println!("{}", json!(document));
            Ok(())
        }
        UploadOutcome::Rejected(err) => bail!("{}: {}", path.display(), err),
        UploadOutcome::Failed(message) => bail!("{}", message),
        UploadOutcome::Ignored => bail!("Upload was not started"),
    }
}
