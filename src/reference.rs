//! Reference graph maintenance.
//!
//! A Reference is a matched pair: a forward wikilink in a data-file
//! paragraph (always followed on the same line by that paragraph's block
//! anchor) and a backlink embed line `![[data#^anchor]]` in the code or
//! extraction file. The two sides live in independent text files with no
//! transactional store underneath, so every operation here batches its
//! edits per file into a single in-memory rewrite before the one write
//! call, and any half-reference it cannot repair is reported rather than
//! silently left behind.

use crate::{
    anchor,
    context::EngineContext,
    editor::LineBuffer,
    error::QualiError,
    link::{self, Wikilink},
    report::OpReport,
};

/// What kind of file a link target is, deciding alias policy on rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Code,
    Extraction,
}

/// `path` without its `.md` extension.
pub fn strip_md(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}

/// Final path segment without extension.
pub fn file_basename(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    strip_md(name)
}

/// The hierarchical code name of a code file: its path relative to the
/// coding folder, extension dropped. `Codes/Theme/Joy.md` -> `Theme/Joy`.
pub fn code_name(ctx: &EngineContext<'_>, code_path: &str) -> String {
    let prefix = format!("{}/", ctx.settings.coding_folder);
    strip_md(code_path.strip_prefix(&prefix).unwrap_or(code_path)).to_string()
}

/// Whether `wikilink`, found in `source`, points at `target_path`.
///
/// Resolution goes through the link index first; literal path and basename
/// comparison is only the fallback for files the index has not seen yet,
/// since aliasing and renames make literal text matching unsafe.
pub fn points_at(
    ctx: &EngineContext<'_>,
    source: &str,
    wikilink: &Wikilink,
    target_path: &str,
) -> bool {
    if let Some(resolved) = ctx.index.resolve_link(source, &wikilink.target) {
        return resolved == target_path;
    }
    let literal = strip_md(&wikilink.target);
    literal == strip_md(target_path) || file_basename(literal) == file_basename(target_path)
}

/// Whether `wikilink` points into the coding or extraction folder.
fn is_special_link(ctx: &EngineContext<'_>, source: &str, wikilink: &Wikilink) -> bool {
    match ctx.index.resolve_link(source, &wikilink.target) {
        Some(resolved) => {
            ctx.settings.is_code_path(&resolved) || ctx.settings.is_extraction_path(&resolved)
        }
        None => {
            wikilink
                .target
                .starts_with(&format!("{}/", ctx.settings.coding_folder))
                || wikilink
                    .target
                    .starts_with(&format!("{}/", ctx.settings.extraction_folder))
        }
    }
}

/// Creates the matched pair: anchors the paragraph at `line_idx` of
/// `data_path`, appends ` [[label]] ^anchor` to it, then appends the embed
/// backlink to `target_path`. Returns the anchor. Fails with
/// [QualiError::AlreadyExists] when the paragraph already links to
/// `target_path`.
///
/// The data-file side commits first because the anchor must exist before it
/// is referenced. If the backlink append then fails, the data file is left
/// with a forward link whose target has no backlink; that inconsistency is
/// reported through the returned error, never swallowed.
pub async fn create_reference(
    ctx: &EngineContext<'_>,
    data_path: &str,
    line_idx: usize,
    target_path: &str,
    label: &str,
) -> Result<String, QualiError> {
    let content = ctx.store.read(data_path).await?;
    let mut buffer = LineBuffer::from_text(&content);
    let line = buffer
        .get_line(line_idx)
        .ok_or_else(|| QualiError::NotFound(format!("line {line_idx} in {data_path}")))?
        .to_string();
    // A second forward link would be unpaired: the embed side no-ops on
    // duplicates, and removal later takes the single embed plus one link,
    // stranding the other.
    if link::parse_wikilinks(&line)
        .iter()
        .any(|l| !l.embed && points_at(ctx, data_path, l, target_path))
    {
        return Err(QualiError::AlreadyExists(format!(
            "{target_path} is already assigned to this paragraph in {data_path}"
        )));
    }
    let (anchor, bare) = anchor::ensure_block_anchor(&content, &line);
    buffer.set_line(line_idx, link::insert_link(&bare, label, &anchor))?;
    ctx.store.write(data_path, &buffer.text()).await?;
    tracing::debug!("Forward link to {target_path} committed in {data_path} at {anchor}");

    if let Err(e) = append_backlink(ctx, target_path, data_path, &anchor).await {
        return Err(QualiError::Custom(format!(
            "forward link committed in {data_path} but backlink append to {target_path} \
             failed: {e}"
        )));
    }
    Ok(anchor)
}

/// Appends the `![[data#^anchor]]` embed line to `target_path`. No-op if
/// the exact embed is already present (keeps split re-runs idempotent).
pub async fn append_backlink(
    ctx: &EngineContext<'_>,
    target_path: &str,
    data_path: &str,
    anchor: &str,
) -> Result<bool, QualiError> {
    let embed = Wikilink::render(true, strip_md(data_path), Some(anchor), None);
    let content = ctx.store.read(target_path).await?;
    if content.lines().any(|line| line.trim() == embed) {
        return Ok(false);
    }
    let mut updated = content;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&embed);
    updated.push('\n');
    ctx.store.write(target_path, &updated).await?;
    Ok(true)
}

/// Removes the embed line in `target_path` whose path and anchor resolve to
/// `data_path`, plus a directly following blank line.
pub async fn remove_embed_line(
    ctx: &EngineContext<'_>,
    target_path: &str,
    data_path: &str,
    anchor: &str,
) -> Result<(), QualiError> {
    let content = ctx.store.read(target_path).await?;
    let mut buffer = LineBuffer::from_text(&content);
    let line_idx = (0..buffer.line_count())
        .find(|i| {
            let line = buffer.get_line(*i).unwrap_or_default();
            link::parse_wikilinks(line).iter().any(|l| {
                l.embed
                    && l.anchor.as_deref() == Some(anchor)
                    && points_at(ctx, target_path, l, data_path)
            })
        })
        .ok_or_else(|| {
            QualiError::NotFound(format!(
                "nothing to remove: no embed of {data_path}#{anchor} in {target_path}"
            ))
        })?;
    buffer.remove_line(line_idx)?;
    if buffer
        .get_line(line_idx)
        .is_some_and(|l| l.trim().is_empty())
    {
        buffer.remove_line(line_idx)?;
    }
    ctx.store.write(target_path, &buffer.text()).await?;
    Ok(())
}

/// Removes the forward link to `target_path` from the paragraph carrying
/// `anchor` in `data_path`. The anchor itself is only removed when no link
/// to a code or extraction file remains on the line, since a paragraph
/// anchor is needed exactly while at least one reference exists.
pub async fn remove_forward_link(
    ctx: &EngineContext<'_>,
    data_path: &str,
    target_path: &str,
    anchor: &str,
) -> Result<(), QualiError> {
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
    let target_link = link::parse_wikilinks(&line)
        .into_iter()
        .find(|l| !l.embed && points_at(ctx, data_path, l, target_path))
        .ok_or_else(|| {
            QualiError::NotFound(format!(
                "no link to {target_path} on the anchored line in {data_path}"
            ))
        })?;
    let stripped = link::remove_link(&line, &target_link.raw)?;
    let remaining = link::parse_wikilinks(&stripped)
        .iter()
        .filter(|l| is_special_link(ctx, data_path, l))
        .count();
    let new_line = if remaining == 0 {
        anchor::split_block_anchor(&stripped).0
    } else {
        stripped
    };
    buffer.set_line(line_idx, new_line)?;
    ctx.store.write(data_path, &buffer.text()).await?;
    Ok(())
}

/// Destroys a Reference: both the backlink embed and the forward link.
///
/// Each side is attempted independently; a failure on one side is reported
/// but does not block the other side's update. A partially broken reference
/// is preferable to blocking the user's unassign action entirely.
pub async fn remove_reference(
    ctx: &EngineContext<'_>,
    data_path: &str,
    target_path: &str,
    anchor: &str,
) -> OpReport {
    let mut report = OpReport::new();
    match remove_embed_line(ctx, target_path, data_path, anchor).await {
        Ok(()) => report.note_change(),
        Err(e) => report.fail(e.to_string()),
    }
    match remove_forward_link(ctx, data_path, target_path, anchor).await {
        Ok(()) => report.note_change(),
        Err(e) => report.fail(e.to_string()),
    }
    report
}

fn redirect_replacement(
    ctx: &EngineContext<'_>,
    kind: TargetKind,
    new_path: &str,
    wikilink: &Wikilink,
) -> String {
    match kind {
        // Codes keep their full hierarchical name visible as the alias.
        TargetKind::Code => Wikilink::render(
            wikilink.embed,
            strip_md(new_path),
            wikilink.anchor.as_deref(),
            Some(&code_name(ctx, new_path)),
        ),
        TargetKind::Extraction => Wikilink::render(
            wikilink.embed,
            strip_md(new_path),
            wikilink.anchor.as_deref(),
            None,
        ),
    }
}

/// Outcome of a vault-wide link redirect, counted per file actually
/// rewritten. A source the index knew about but whose rewrite failed (or
/// that no longer contains the link) counts as a failure, not an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectOutcome {
    pub files_updated: usize,
    pub links_redirected: usize,
    pub failures: Vec<String>,
}

impl RedirectOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        tracing::warn!("{msg}");
        self.failures.push(msg);
    }
}

/// Rewrites every resolved link to `old_path`, vault-wide, to point at
/// `new_path`. Used by merge and rename. Edits inside each file are applied
/// back to front so earlier replacements do not invalidate later offsets.
pub async fn redirect_references(
    ctx: &EngineContext<'_>,
    old_path: &str,
    new_path: &str,
    kind: TargetKind,
) -> RedirectOutcome {
    let mut outcome = RedirectOutcome::default();
    for (source, _count) in ctx.index.backlinks_of(old_path) {
        if source == old_path {
            continue;
        }
        let content = match ctx.store.read(&source).await {
            Ok(content) => content,
            Err(e) => {
                outcome.fail(format!("could not read {source}: {e}"));
                continue;
            }
        };
        let (rewritten, n) = link::rewrite_links(
            &content,
            |l| points_at(ctx, &source, l, old_path),
            |l| redirect_replacement(ctx, kind, new_path, l),
        );
        if n == 0 {
            outcome.fail(format!("reference not found: {source} -> {old_path}"));
            continue;
        }
        match ctx.store.write(&source, &rewritten).await {
            Ok(()) => {
                outcome.files_updated += 1;
                outcome.links_redirected += n;
            }
            Err(e) => outcome.fail(format!("could not write {source}: {e}")),
        }
    }
    outcome
}
