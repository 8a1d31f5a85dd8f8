//! `wave stage …`: run one stage in-process.

use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use wv_domain::config::Config;

use crate::bootstrap;
use crate::runtime::{self, Stage};

pub async fn invoke(
    config: Arc<Config>,
    stage: &str,
    input_path: Option<&str>,
    remaining_ms: Option<u64>,
) -> anyhow::Result<()> {
    let stage: Stage = stage.parse()?;
    let raw = match input_path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    let input: serde_json::Value = serde_json::from_str(&raw).context("parsing stage input")?;

    let budget = remaining_ms.unwrap_or(config.server.stage_timeout_ms);
    let deadline = Instant::now() + Duration::from_millis(budget);

    let state = bootstrap::build_app_state(config)?;
    let result = runtime::invoke(&state.pipeline, stage, input, deadline).await;
    state.flush();

    let output = result.with_context(|| format!("stage {stage} failed"))?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn list() {
    for stage in Stage::ALL {
        println!("{stage}");
    }
}
