//! Merge and split scenarios over an on-disk vault.

mod common;

use common::{assert_paired, TestVault};
use quali_core::{
    context::EngineContext,
    frontmatter,
    merge,
    reference::TargetKind,
    store::TextStore,
};

const KEEP: &str = "Codes/B.md";
const AWAY: &str = "Codes/A.md";

#[tokio::test(flavor = "current_thread")]
async fn merging_two_codes_redirects_every_backlink() {
    let vault = TestVault::new(&[
        (
            AWAY,
            "---\ndescription: first take\ntags:\n- grief\n---\n\
             Paragraphs coded with this code:\n\
             ![[D1#^id-111111]]\n![[D2#^id-222222]]\n![[D3#^id-333333]]\n",
        ),
        (
            KEEP,
            "---\ndescription: settled wording\ntags:\n- loss\n---\n\
             Paragraphs coded with this code:\n\
             ![[D4#^id-444444]]\n![[D5#^id-555555]]\n",
        ),
        ("D1.md", "one [[A]] ^id-111111\n"),
        ("D2.md", "two [[A]] ^id-222222\n"),
        ("D3.md", "three [[A]] ^id-333333\n"),
        ("D4.md", "four [[B]] ^id-444444\n"),
        ("D5.md", "five [[B]] ^id-555555\n"),
    ])
    .await;
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    let report = merge::merge_files(&ctx, KEEP, AWAY, TargetKind::Code)
        .await
        .unwrap();
    assert!(report.failures.is_empty(), "{report}");
    assert_eq!(report.files_updated, 3);
    assert_eq!(report.links_redirected, 3);
    assert_eq!(report.backups.len(), 2);
    for path in &report.backups {
        assert!(vault.store.exists(path).await, "missing backup {path}");
    }
    assert!(!vault.store.exists(AWAY).await);

    // Frontmatter union: keep's scalar wins, sequences union, the losing
    // scalar lands in the discarded-properties section.
    let merged = vault.read(KEEP).await;
    let (fm, body) = frontmatter::parse(&merged).unwrap();
    assert_eq!(
        fm.get("description").unwrap().as_str(),
        Some("settled wording")
    );
    let tags: Vec<&str> = fm
        .get("tags")
        .unwrap()
        .as_sequence()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["loss", "grief"]);
    assert!(body.contains("#### Discarded properties"));
    assert!(body.contains("description: first take"));

    // Body concatenation keeps every embed, keep's content first.
    let d4 = body.find("![[D4#^id-444444]]").unwrap();
    let d1 = body.find("![[D1#^id-111111]]").unwrap();
    assert!(d4 < d1);

    // All five references now pair against the surviving code.
    for (data, anchor) in [
        ("D1.md", "^id-111111"),
        ("D2.md", "^id-222222"),
        ("D3.md", "^id-333333"),
        ("D4.md", "^id-444444"),
        ("D5.md", "^id-555555"),
    ] {
        assert_paired(&vault, data, KEEP, anchor).await;
    }
    assert_eq!(vault.read("D1.md").await, "one [[Codes/B|B]] ^id-111111\n");
}

#[tokio::test(flavor = "current_thread")]
async fn interrupted_split_can_be_resumed() {
    let vault = TestVault::new(&[
        (
            "Codes/Big.md",
            "![[D1#^id-111111]]\n![[D2#^id-222222]]\n![[D3#^id-333333]]\n",
        ),
        // D1 was already moved by an earlier, interrupted run: its embed is
        // gone from Big, present in Small, and its forward link repointed.
        ("Codes/Small.md", "![[D1#^id-111111]]\n"),
        ("D1.md", "one [[Codes/Small|Small]] ^id-111111\n"),
        ("D2.md", "two [[Big]] ^id-222222\n"),
        ("D3.md", "three [[Big]] ^id-333333\n"),
    ])
    .await;
    // The stale embed of D1 still sits in Big from before the interruption.
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    let selected = vec![
        ("D1.md".to_string(), "^id-111111".to_string()),
        ("D2.md".to_string(), "^id-222222".to_string()),
    ];
    let report = merge::move_backlinks(&ctx, "Codes/Big.md", "Codes/Small.md", &selected).await;
    assert!(report.is_clean(), "{report}");
    // D1 needed only its leftover embed removed from Big; D2 needed all
    // three sub-steps.
    assert_eq!(report.changed, 4);

    assert_eq!(vault.read("Codes/Big.md").await, "![[D3#^id-333333]]\n");
    let small = vault.read("Codes/Small.md").await;
    assert!(small.contains("![[D1#^id-111111]]"));
    assert!(small.contains("![[D2#^id-222222]]"));
    assert_paired(&vault, "D1.md", "Codes/Small.md", "^id-111111").await;
    assert_paired(&vault, "D2.md", "Codes/Small.md", "^id-222222").await;
    assert_paired(&vault, "D3.md", "Codes/Big.md", "^id-333333").await;
}
