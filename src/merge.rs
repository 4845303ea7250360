//! Merging two code/extraction files and splitting backlinks between codes.

use std::fmt::{Display, Formatter};

use serde_yaml::Value;

use crate::{
    anchor,
    context::EngineContext,
    editor::LineBuffer,
    error::QualiError,
    frontmatter, link,
    reference::{self, TargetKind},
    report::OpReport,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub files_updated: usize,
    pub links_redirected: usize,
    pub discarded_properties: usize,
    pub backups: Vec<String>,
    pub failures: Vec<String>,
}

impl Display for MergeReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Merged: {} file(s) updated, {} link(s) redirected. Backups: {}",
            self.files_updated,
            self.links_redirected,
            self.backups.join(", ")
        )?;
        if self.discarded_properties > 0 {
            write!(
                f,
                "; {} conflicting propert(ies) recorded in the merged note",
                self.discarded_properties
            )?;
        }
        for failure in &self.failures {
            write!(f, "\n- {failure}")?;
        }
        Ok(())
    }
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_blank = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && last_blank {
            continue;
        }
        out.push_str(line);
        out.push('\n');
        last_blank = blank;
    }
    out
}

fn strip_marker(text: &str, marker: &str) -> String {
    text.lines()
        .filter(|line| line.trim() != marker)
        .map(|line| format!("{line}\n"))
        .collect()
}

fn discarded_section(discarded: &[(String, Value)]) -> String {
    let mut out = String::from("\n#### Discarded properties\n");
    for (key, value) in discarded {
        let rendered = serde_yaml::to_string(value).unwrap_or_default();
        out.push_str(&format!("- {key}: {}\n", rendered.trim()));
    }
    out
}

async fn backup(
    ctx: &EngineContext<'_>,
    path: &str,
    timestamp: &str,
) -> Result<String, QualiError> {
    let base = reference::file_basename(path);
    let mut backup_path = format!("{}/{base} {timestamp}.md", ctx.settings.backup_folder);
    let mut n = 1;
    while ctx.store.exists(&backup_path).await {
        n += 1;
        backup_path = format!("{}/{base} {timestamp} {n}.md", ctx.settings.backup_folder);
    }
    ctx.store.copy(path, &backup_path).await?;
    Ok(backup_path)
}

/// Merges `away_path` into `keep_path`: frontmatter key-by-key with a
/// discarded-properties sidecar for scalar conflicts, body concatenation
/// (boilerplate markers stripped, blank runs collapsed), vault-wide
/// backlink redirection, then direct deletion of `away_path`.
///
/// Both inputs are copied to the backup folder before anything mutates;
/// this operation is destructive and must be recoverable.
pub async fn merge_files(
    ctx: &EngineContext<'_>,
    keep_path: &str,
    away_path: &str,
    kind: TargetKind,
) -> Result<MergeReport, QualiError> {
    if keep_path == away_path {
        return Err(QualiError::Custom(
            "cannot merge a file into itself".to_string(),
        ));
    }
    let mut report = MergeReport::default();
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H-%M-%S").to_string();
    report.backups.push(backup(ctx, keep_path, &timestamp).await?);
    report.backups.push(backup(ctx, away_path, &timestamp).await?);

    let keep_content = ctx.store.read(keep_path).await?;
    let away_content = ctx.store.read(away_path).await?;
    let (mut keep_fm, keep_body) = frontmatter::parse(&keep_content)?;
    let (away_fm, away_body) = frontmatter::parse(&away_content)?;
    let discarded = frontmatter::merge(&mut keep_fm, &away_fm, &ctx.settings.merge_ignore_keys);
    report.discarded_properties = discarded.len();

    let marker = &ctx.settings.boilerplate_marker;
    let mut body = collapse_blank_runs(&format!(
        "{}\n{}",
        strip_marker(&keep_body, marker).trim_end(),
        strip_marker(&away_body, marker).trim_end()
    ));
    if !discarded.is_empty() {
        body.push_str(&discarded_section(&discarded));
    }
    ctx.store
        .write(keep_path, &frontmatter::render(&keep_fm, &body)?)
        .await?;

    let redirect = reference::redirect_references(ctx, away_path, keep_path, kind).await;
    report.files_updated = redirect.files_updated;
    report.links_redirected = redirect.links_redirected;
    report.failures.extend(redirect.failures);

    // Direct delete, not the cascading path: backlinks were redirected above
    // and a backup already exists.
    ctx.store.delete(away_path).await?;
    tracing::info!("{report}");
    Ok(report)
}

/// Repoints the forward link on the paragraph carrying `anchor` in
/// `data_path` from `source_path` to `target_path`. Ok(false) when the link
/// already points at the target.
async fn retarget_forward_link(
    ctx: &EngineContext<'_>,
    data_path: &str,
    anchor: &str,
    source_path: &str,
    target_path: &str,
) -> Result<bool, QualiError> {
    let content = ctx.store.read(data_path).await?;
    let mut buffer = LineBuffer::from_text(&content);
    let line_idx = (0..buffer.line_count())
        .find(|i| {
            anchor::split_block_anchor(buffer.get_line(*i).unwrap_or_default())
                .1
                .as_deref()
                == Some(anchor)
        })
        .ok_or_else(|| {
            QualiError::MissingAnchor(format!("no paragraph with {anchor} in {data_path}"))
        })?;
    let line = buffer.get_line(line_idx).unwrap_or_default().to_string();
    let links = link::parse_wikilinks(&line);
    if links
        .iter()
        .any(|l| reference::points_at(ctx, data_path, l, target_path))
    {
        return Ok(false);
    }
    let old = links
        .into_iter()
        .find(|l| reference::points_at(ctx, data_path, l, source_path))
        .ok_or_else(|| {
            QualiError::NotFound(format!(
                "no link to {source_path} on the anchored line in {data_path}"
            ))
        })?;
    let replacement = link::Wikilink::render(
        old.embed,
        reference::strip_md(target_path),
        old.anchor.as_deref(),
        Some(&reference::code_name(ctx, target_path)),
    );
    let (new_line, _) = link::rewrite_links(&line, |l| *l == old, |_| replacement.clone());
    buffer.set_line(line_idx, new_line)?;
    ctx.store.write(data_path, &buffer.text()).await?;
    Ok(true)
}

/// Moves a subset of a code file's embed-backlinks to another code file,
/// repointing each data file's forward link accordingly.
///
/// Every sub-step checks current state before acting, so a partially
/// completed split can be safely re-run.
pub async fn move_backlinks(
    ctx: &EngineContext<'_>,
    source_path: &str,
    target_path: &str,
    selected: &[(String, String)],
) -> OpReport {
    let mut report = OpReport::new();
    for (data_path, anchor) in selected {
        match reference::remove_embed_line(ctx, source_path, data_path, anchor).await {
            Ok(()) => report.note_change(),
            Err(QualiError::NotFound(_)) => {
                tracing::debug!("embed of {data_path}#{anchor} already absent from {source_path}")
            }
            Err(e) => report.fail(e.to_string()),
        }
        match reference::append_backlink(ctx, target_path, data_path, anchor).await {
            Ok(true) => report.note_change(),
            Ok(false) => {
                tracing::debug!("embed of {data_path}#{anchor} already present in {target_path}")
            }
            Err(e) => report.fail(e.to_string()),
        }
        match retarget_forward_link(ctx, data_path, anchor, source_path, target_path).await {
            Ok(true) => report.note_change(),
            Ok(false) => tracing::debug!("{data_path}#{anchor} already points at {target_path}"),
            Err(e) => report.fail(e.to_string()),
        }
    }
    report
}
