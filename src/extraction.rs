//! Extraction types and extraction commands.
//!
//! An extraction type is a folder under the extraction root holding a
//! template file whose frontmatter keys define the type's schema. Each
//! extraction file is one structured data point: frontmatter matching the
//! schema, an `extraction-source` back-pointer list, a creation timestamp,
//! and the source paragraph embedded below.

use serde_yaml::{Mapping, Value};

use crate::{
    anchor,
    context::EngineContext,
    editor::{self, LineBuffer},
    error::QualiError,
    frontmatter, link, reference,
    report::OpReport,
};

pub const EXTRACTION_SOURCE_KEY: &str = "extraction-source";
pub const EXTRACTION_DATE_KEY: &str = "extraction-date";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionType {
    /// Folder name under the extraction root.
    pub name: String,
    /// Vault path of the type's folder.
    pub folder: String,
    pub template_path: String,
    /// Frontmatter keys every extraction of this type carries.
    pub keys: Vec<String>,
}

/// Loads one extraction type by folder name, validating its template.
pub async fn load_extraction_type(
    ctx: &EngineContext<'_>,
    type_name: &str,
) -> Result<ExtractionType, QualiError> {
    let folder = format!("{}/{type_name}", ctx.settings.extraction_folder);
    let template_path = format!("{folder}/{}", ctx.settings.template_filename);
    let content = ctx.store.read(&template_path).await.map_err(|e| {
        QualiError::Template(format!(
            "extraction type '{type_name}' has no readable template: {e}"
        ))
    })?;
    let (fm, _body) = frontmatter::parse(&content)?;
    if fm.is_empty() {
        return Err(QualiError::Template(format!(
            "template of extraction type '{type_name}' defines no frontmatter keys"
        )));
    }
    let keys = fm
        .keys()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect();
    Ok(ExtractionType {
        name: type_name.to_string(),
        folder,
        template_path,
        keys,
    })
}

/// All extraction types with a valid template. Types with a broken template
/// are skipped with a warning; creating against them fails instead.
pub async fn extraction_types(ctx: &EngineContext<'_>) -> Vec<ExtractionType> {
    let prefix = format!("{}/", ctx.settings.extraction_folder);
    let mut names: Vec<String> = ctx
        .index
        .files()
        .filter_map(|p| {
            let rest = p.strip_prefix(&prefix)?;
            let (folder, file) = rest.split_once('/')?;
            (file == ctx.settings.template_filename).then(|| folder.to_string())
        })
        .collect();
    names.dedup();
    let mut types = Vec::new();
    for name in names.drain(..) {
        match load_extraction_type(ctx, &name).await {
            Ok(etype) => types.push(etype),
            Err(e) => tracing::warn!("Skipping extraction type '{name}': {e}"),
        }
    }
    types
}

fn existing_count(ctx: &EngineContext<'_>, etype: &ExtractionType) -> usize {
    let prefix = format!("{}/", etype.folder);
    ctx.index
        .files()
        .filter(|p| p.starts_with(&prefix) && **p != etype.template_path)
        .count()
}

/// Extracts the paragraph under the cursor into a new file of `etype`.
///
/// The data-file line commits first (the anchor must exist before the
/// extraction file references it); a failure creating the extraction file
/// afterwards is a reported inconsistency, not a silent rollback.
pub async fn extract_paragraph(
    ctx: &EngineContext<'_>,
    data_path: &str,
    buffer: &LineBuffer,
    etype: &ExtractionType,
) -> Result<String, QualiError> {
    editor::paragraph_range(buffer)?;
    let line_idx = editor::last_line_of_paragraph(buffer, buffer.cursor().line);

    let count = existing_count(ctx, etype);
    let name = format!("{} {}", etype.name, count + 1);
    let new_path = format!("{}/{name}.md", etype.folder);
    if ctx.store.exists(&new_path).await {
        return Err(QualiError::AlreadyExists(new_path));
    }

    let content = ctx.store.read(data_path).await?;
    let mut data_buffer = LineBuffer::from_text(&content);
    let line = data_buffer
        .get_line(line_idx)
        .ok_or_else(|| QualiError::NotFound(format!("line {line_idx} in {data_path}")))?
        .to_string();
    let (anchor, bare) = anchor::ensure_block_anchor(&content, &line);
    data_buffer.set_line(line_idx, link::insert_link(&bare, &name, &anchor))?;
    ctx.store.write(data_path, &data_buffer.text()).await?;

    let source_link = link::Wikilink::render(
        false,
        reference::strip_md(data_path),
        Some(&anchor),
        None,
    );
    let mut fm = Mapping::new();
    for key in &etype.keys {
        fm.insert(key.as_str().into(), Value::Null);
    }
    fm.insert(
        EXTRACTION_DATE_KEY.into(),
        chrono::Local::now().format("%Y-%m-%dT%H:%M").to_string().into(),
    );
    fm.insert(
        EXTRACTION_SOURCE_KEY.into(),
        Value::Sequence(vec![source_link.into()]),
    );
    // The embed below doubles as the Reference's backlink.
    let body = format!(
        "**Paragraph extracted from:**\n{}\n",
        link::Wikilink::render(true, reference::strip_md(data_path), Some(&anchor), None)
    );
    if let Err(e) = ctx
        .store
        .create(&new_path, &frontmatter::render(&fm, &body)?)
        .await
    {
        return Err(QualiError::Custom(format!(
            "forward link committed in {data_path} but extraction file {new_path} could not \
             be created: {e}"
        )));
    }
    tracing::info!("Extracted {data_path}#{anchor} into {new_path}");
    Ok(new_path)
}

/// Destroys the Reference between a data paragraph and an extraction file,
/// including the `extraction-source` back-pointer in its frontmatter.
pub async fn remove_extraction_reference(
    ctx: &EngineContext<'_>,
    data_path: &str,
    extraction_path: &str,
    anchor: &str,
) -> OpReport {
    let mut report = reference::remove_reference(ctx, data_path, extraction_path, anchor).await;
    match prune_extraction_source(ctx, extraction_path, data_path, anchor).await {
        Ok(true) => report.note_change(),
        Ok(false) => {}
        Err(e) => report.fail(e.to_string()),
    }
    report
}

async fn prune_extraction_source(
    ctx: &EngineContext<'_>,
    extraction_path: &str,
    data_path: &str,
    anchor: &str,
) -> Result<bool, QualiError> {
    let content = ctx.store.read(extraction_path).await?;
    let (mut fm, body) = frontmatter::parse(&content)?;
    let Some(Value::Sequence(sources)) = fm.get_mut(EXTRACTION_SOURCE_KEY) else {
        return Ok(false);
    };
    let before = sources.len();
    sources.retain(|value| {
        let Some(text) = value.as_str() else {
            return true;
        };
        !link::parse_wikilinks(text).iter().any(|l| {
            l.anchor.as_deref() == Some(anchor)
                && reference::points_at(ctx, extraction_path, l, data_path)
        })
    });
    if sources.len() == before {
        return Ok(false);
    }
    ctx.store
        .write(extraction_path, &frontmatter::render(&fm, &body)?)
        .await?;
    Ok(true)
}
