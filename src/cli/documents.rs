use anyhow::Result;
use serde_json::json;

use crate::backend::SharedBackend;

pub async fn list(backend: SharedBackend) -> Result<()> {
    let documents = backend.list_documents().await?;
    println!("{}", json!({ "documents": documents }));
    Ok(())
}

pub async fn get(backend: SharedBackend, id: &str) -> Result<()> {
    let document = backend.get_document(id).await?;
    println!("{}", json!(document));
    Ok(())
}

pub async fn delete(backend: SharedBackend, id: &str) -> Result<()> {
    let confirmation = backend.delete_document(id).await?;
    println!("{}", confirmation);
    Ok(())
}
