//! Coding commands: assign a code to a paragraph, unassign one, create code
//! files, count assignments.

use crate::{
    anchor,
    context::EngineContext,
    editor::{self, LineBuffer},
    error::QualiError,
    frontmatter, link, reference,
    report::OpReport,
    ui::Picker,
};

/// Every code file currently in the vault, sorted by hierarchical name.
pub fn code_files(ctx: &EngineContext<'_>) -> Vec<String> {
    let prefix = format!("{}/", ctx.settings.coding_folder);
    ctx.index
        .files()
        .filter(|p| p.starts_with(&prefix))
        .map(str::to_string)
        .collect()
}

/// Link label for a forward link to `code_path`: the bare basename when it
/// is unambiguous in the vault, otherwise the full path aliased with the
/// hierarchical code name.
pub fn code_label(ctx: &EngineContext<'_>, code_path: &str) -> String {
    let base = reference::file_basename(code_path);
    match ctx.index.resolve_link("", base) {
        Some(resolved) if resolved == code_path => base.to_string(),
        _ => format!(
            "{}|{}",
            reference::strip_md(code_path),
            reference::code_name(ctx, code_path)
        ),
    }
}

/// Creates a new code file under the coding folder. `name` is the
/// hierarchical code name (`/` groups). Fails with
/// [QualiError::AlreadyExists] when the code is already present.
pub async fn create_code_file(
    ctx: &EngineContext<'_>,
    name: &str,
    description: &str,
) -> Result<String, QualiError> {
    let name = name.trim_matches('/');
    if name.is_empty() {
        return Err(QualiError::Custom("code name is empty".to_string()));
    }
    let path = format!("{}/{name}.md", ctx.settings.coding_folder);
    let mut fm = serde_yaml::Mapping::new();
    fm.insert("description".into(), description.into());
    let body = format!("{}\n", ctx.settings.boilerplate_marker);
    ctx.store
        .create(&path, &frontmatter::render(&fm, &body)?)
        .await?;
    tracing::info!("Created code file {path}");
    Ok(path)
}

/// Resolved links from any data file pointing at `code_path`. Links from
/// inside the coding or extraction folders do not count as assignments.
pub fn assignment_count(ctx: &EngineContext<'_>, code_path: &str) -> usize {
    ctx.index
        .backlinks_of(code_path)
        .iter()
        .filter(|(source, _)| ctx.settings.is_data_path(source))
        .map(|(_, count)| count)
        .sum()
}

/// The line index an anchor for the cursor's paragraph belongs on: the
/// final physical line, not crossing a list-item boundary.
fn anchor_line(buffer: &LineBuffer) -> Result<usize, QualiError> {
    editor::paragraph_range(buffer)?;
    Ok(editor::last_line_of_paragraph(buffer, buffer.cursor().line))
}

/// Assigns a code to the paragraph under the cursor in `data_path`.
///
/// The picker chooses among existing codes by hierarchical name; closing it
/// cancels the whole command with nothing committed. Returns the chosen
/// code path and the paragraph anchor.
pub async fn assign_code(
    ctx: &EngineContext<'_>,
    data_path: &str,
    buffer: &LineBuffer,
    picker: &dyn Picker,
) -> Result<(String, String), QualiError> {
    let line_idx = anchor_line(buffer)?;
    let codes = code_files(ctx);
    if codes.is_empty() {
        return Err(QualiError::NotFound(
            "no code files exist yet; create one first".to_string(),
        ));
    }
    let names: Vec<String> = codes
        .iter()
        .map(|path| reference::code_name(ctx, path))
        .collect();
    let chosen = picker
        .pick("Assign code", &names)
        .ok_or(QualiError::OperationCancelled)?;
    let code_path = codes
        .get(chosen)
        .ok_or_else(|| QualiError::NotFound(format!("picker index {chosen} out of range")))?
        .clone();
    let label = code_label(ctx, &code_path);
    let anchor =
        reference::create_reference(ctx, data_path, line_idx, &code_path, &label).await?;
    Ok((code_path, anchor))
}

/// Unassigns one of the codes on the paragraph under the cursor.
pub async fn unassign_code(
    ctx: &EngineContext<'_>,
    data_path: &str,
    buffer: &LineBuffer,
    picker: &dyn Picker,
) -> Result<(String, OpReport), QualiError> {
    let line_idx = anchor_line(buffer)?;
    let line = buffer
        .get_line(line_idx)
        .ok_or_else(|| QualiError::NotFound(format!("line {line_idx} in {data_path}")))?;
    let (_, maybe_anchor) = anchor::split_block_anchor(line);
    let anchor = maybe_anchor.ok_or_else(|| {
        QualiError::MissingAnchor(format!(
            "the paragraph in {data_path} carries no block anchor"
        ))
    })?;
    let assigned: Vec<String> = link::parse_wikilinks(line)
        .iter()
        .filter_map(|l| ctx.index.resolve_link(data_path, &l.target))
        .filter(|resolved| ctx.settings.is_code_path(resolved))
        .collect();
    if assigned.is_empty() {
        return Err(QualiError::NotFound(format!(
            "no codes assigned to this paragraph in {data_path}"
        )));
    }
    let names: Vec<String> = assigned
        .iter()
        .map(|path| reference::code_name(ctx, path))
        .collect();
    let chosen = picker
        .pick("Unassign code", &names)
        .ok_or(QualiError::OperationCancelled)?;
    let code_path = assigned
        .get(chosen)
        .ok_or_else(|| QualiError::NotFound(format!("picker index {chosen} out of range")))?
        .clone();
    let report = reference::remove_reference(ctx, data_path, &code_path, &anchor).await;
    Ok((code_path, report))
}
