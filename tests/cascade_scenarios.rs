//! Deletion cascade scenarios over an on-disk vault.

mod common;

use common::{assert_paired, TestVault};
use quali_core::{
    context::EngineContext,
    store::TextStore,
    watcher::{CascadeCleaner, DeleteInterceptor},
};

#[tokio::test(flavor = "current_thread")]
async fn deleting_a_code_cleans_every_data_file_first() {
    let vault = TestVault::new(&[
        (
            "Codes/C.md",
            "---\ndescription: doomed\n---\n\
             Paragraphs coded with this code:\n\
             ![[Interviews/D1#^id-111111]]\n![[D2#^id-222222]]\n",
        ),
        ("Interviews/D1.md", "alpha paragraph [[C]] ^id-111111\n"),
        ("D2.md", "beta paragraph [[C]] ^id-222222\n"),
    ])
    .await;
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    // Pre-delete hook first, as a host's delete pipeline would run it.
    let cleaner = CascadeCleaner::new(ctx);
    let report = cleaner.before_delete("Codes/C.md").await;
    assert_eq!(report.changed, 2);
    assert!(report.is_clean(), "{report}");
    vault.store.delete("Codes/C.md").await.unwrap();

    // Both forward links and their now-unreferenced anchors are gone.
    assert_eq!(vault.read("Interviews/D1.md").await, "alpha paragraph\n");
    assert_eq!(vault.read("D2.md").await, "beta paragraph\n");
    assert!(!vault.store.exists("Codes/C.md").await);
}

#[tokio::test(flavor = "current_thread")]
async fn shared_anchors_survive_the_cascade() {
    let vault = TestVault::new(&[
        (
            "Codes/C.md",
            "![[D1#^id-111111]]\n",
        ),
        ("Codes/Keeper.md", "![[D1#^id-111111]]\n"),
        ("D1.md", "dual-coded paragraph [[C]] [[Keeper]] ^id-111111\n"),
    ])
    .await;
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    let report = quali_core::watcher::cascade_delete(&ctx, &vault.store, "Codes/C.md")
        .await
        .unwrap();
    assert_eq!(report.changed, 1);
    assert!(report.is_clean(), "{report}");

    // The other code still references the paragraph, so the anchor stays
    // and its Reference remains intact.
    assert_eq!(
        vault.read("D1.md").await,
        "dual-coded paragraph [[Keeper]] ^id-111111\n"
    );
    assert_paired(&vault, "D1.md", "Codes/Keeper.md", "^id-111111").await;
}

#[tokio::test(flavor = "current_thread")]
async fn deleting_an_extraction_cleans_its_source_paragraph() {
    let vault = TestVault::new(&[
        (
            "Extraction/Insight/Insight 1.md",
            "---\nclaim: something\nextraction-source:\n- '[[D1#^id-111111]]'\n---\n\
             **Paragraph extracted from:**\n![[D1#^id-111111]]\n",
        ),
        ("D1.md", "an observation [[Insight 1]] ^id-111111\n"),
    ])
    .await;
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    let report = quali_core::watcher::cascade_delete(
        &ctx,
        &vault.store,
        "Extraction/Insight/Insight 1.md",
    )
    .await
    .unwrap();
    assert_eq!(report.changed, 1);
    assert!(report.is_clean(), "{report}");
    assert_eq!(vault.read("D1.md").await, "an observation\n");
    assert!(!vault.store.exists("Extraction/Insight/Insight 1.md").await);
}
