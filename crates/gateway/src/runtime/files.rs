//! `get-file-contents`: read a stored object back as text.

use serde::{Deserialize, Serialize};

use wv_domain::error::Result;
use wv_platform::ObjectUri;

use super::PipelineContext;

#[derive(Debug, Deserialize)]
pub struct FileInput {
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutput {
    pub file_uri: String,
    pub content: String,
}

pub async fn get_file_contents(ctx: &PipelineContext, input: FileInput) -> Result<FileOutput> {
    let uri = ObjectUri::parse(&input.file_uri)?;
    let bytes = ctx.objects.get(&uri).await?;
    Ok(FileOutput {
        file_uri: input.file_uri,
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
