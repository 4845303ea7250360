//! Deletion interception and cascade cleanup.
//!
//! Deleting a code or extraction file would strand every forward link
//! pointing at it, so deletion runs through an explicit pre-delete hook:
//! the environment registers a [DeleteInterceptor] and guarantees the
//! handler completes before the real delete executes. Cleanup must run
//! first because the metadata needed to find the backlinks, the file's own
//! embed list, becomes unavailable once the file is gone.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    context::EngineContext, error::QualiError, link, reference, report::OpReport, store::TextStore,
};

/// Pre-delete extension point. The environment must invoke `before_delete`
/// and await its completion before issuing the underlying delete.
#[async_trait]
pub trait DeleteInterceptor: Send + Sync {
    async fn before_delete(&self, path: &str) -> OpReport;
}

/// `(data file, anchor)` pairs enumerated from the embed list of `path`.
fn backlink_pairs(ctx: &EngineContext<'_>, path: &str, content: &str) -> BTreeSet<(String, String)> {
    link::parse_wikilinks(content)
        .into_iter()
        .filter(|l| l.embed)
        .filter_map(|l| {
            let anchor = l.anchor.clone()?;
            if !anchor.starts_with('^') {
                return None;
            }
            let data_path = ctx
                .index
                .resolve_link(path, &l.target)
                .unwrap_or_else(|| format!("{}.md", reference::strip_md(&l.target)));
            Some((data_path, anchor))
        })
        .collect()
}

/// Removes every forward link pointing at `path` before it disappears.
///
/// Only the data-file side of each Reference is cleaned; the target side is
/// about to be deleted anyway. Data files themselves need no cascade, since
/// nothing points at a data file through this system; their deletion is
/// only counted for progress tracking.
pub async fn cleanup_references(ctx: &EngineContext<'_>, path: &str) -> OpReport {
    let mut report = OpReport::new();
    if ctx.settings.is_data_path(path) {
        tracing::info!("Data file deleted: {path}");
        return report;
    }
    let content = match ctx.store.read(path).await {
        Ok(content) => content,
        Err(e) => {
            report.fail(format!("could not read {path} for cascade cleanup: {e}"));
            return report;
        }
    };
    for (data_path, anchor) in backlink_pairs(ctx, path, &content) {
        match reference::remove_forward_link(ctx, &data_path, path, &anchor).await {
            Ok(()) => report.note_change(),
            Err(e) => report.fail(e.to_string()),
        }
    }
    tracing::info!(
        "{} reference(s) to {path} deleted, {} failure(s)",
        report.changed,
        report.failures.len()
    );
    report
}

/// [DeleteInterceptor] wired to an [EngineContext]'s settings, store, and
/// index snapshot.
pub struct CascadeCleaner<'a> {
    ctx: EngineContext<'a>,
}

impl<'a> CascadeCleaner<'a> {
    pub fn new(ctx: EngineContext<'a>) -> Self {
        CascadeCleaner { ctx }
    }
}

#[async_trait]
impl DeleteInterceptor for CascadeCleaner<'_> {
    async fn before_delete(&self, path: &str) -> OpReport {
        cleanup_references(&self.ctx, path).await
    }
}

/// Convenience for environments without their own delete pipeline: cascade
/// cleanup, then the underlying delete.
pub async fn cascade_delete(
    ctx: &EngineContext<'_>,
    store: &dyn TextStore,
    path: &str,
) -> Result<OpReport, QualiError> {
    let report = cleanup_references(ctx, path).await;
    store.delete(path).await?;
    Ok(report)
}
