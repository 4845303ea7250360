//! End-to-end coding scenarios over an on-disk vault.

mod common;

use common::{assert_paired, TestVault};
use quali_core::{
    coding,
    context::EngineContext,
    editor::{CursorPos, LineBuffer},
    reference,
    ui::FixedPicker,
};
use regex::Regex;

const JOY: &str = "Codes/Theme/Joy.md";
const GRIEF: &str = "Codes/Grief.md";

fn buffer_at(text: &str, line: usize) -> LineBuffer {
    let mut buf = LineBuffer::from_text(text);
    buf.set_cursor(CursorPos { line, ch: 0 });
    buf
}

#[tokio::test(flavor = "current_thread")]
async fn assigning_a_code_creates_the_matched_pair() {
    let vault = TestVault::new(&[
        (JOY, "---\ndescription: \"\"\n---\nParagraphs coded with this code:\n"),
        ("Data.md", "Some text here\n"),
    ])
    .await;
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);

    let buffer = buffer_at("Some text here\n", 0);
    let (code_path, anchor) =
        coding::assign_code(&ctx, "Data.md", &buffer, &FixedPicker::choose("Theme/Joy"))
            .await
            .unwrap();
    assert_eq!(code_path, JOY);

    let line_pattern = Regex::new(r"^Some text here \[\[Joy\]\] \^id-\d{6}$").unwrap();
    let data = vault.read("Data.md").await;
    assert!(
        line_pattern.is_match(data.lines().next().unwrap()),
        "unexpected data line: {data}"
    );
    let code = vault.read(JOY).await;
    assert!(code.ends_with(&format!("![[Data#{anchor}]]\n")));
    assert_paired(&vault, "Data.md", JOY, &anchor).await;
}

#[tokio::test(flavor = "current_thread")]
async fn two_codes_share_one_anchor_and_unassign_one_at_a_time() {
    let vault = TestVault::new(&[
        (JOY, "\n"),
        (GRIEF, "\n"),
        ("Data.md", "Mixed feelings paragraph\n"),
    ])
    .await;

    // Assign both codes; the second assignment reuses the first's anchor.
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let buffer = buffer_at(&vault.read("Data.md").await, 0);
    let (_, first_anchor) =
        coding::assign_code(&ctx, "Data.md", &buffer, &FixedPicker::choose("Theme/Joy"))
            .await
            .unwrap();

    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let buffer = buffer_at(&vault.read("Data.md").await, 0);
    let (_, second_anchor) =
        coding::assign_code(&ctx, "Data.md", &buffer, &FixedPicker::choose("Grief"))
            .await
            .unwrap();
    assert_eq!(first_anchor, second_anchor);

    // Unassigning one code keeps the shared anchor and the other embed.
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let buffer = buffer_at(&vault.read("Data.md").await, 0);
    let (removed, report) =
        coding::unassign_code(&ctx, "Data.md", &buffer, &FixedPicker::choose("Theme/Joy"))
            .await
            .unwrap();
    assert_eq!(removed, JOY);
    assert!(report.is_clean(), "{report}");

    let data = vault.read("Data.md").await;
    assert!(!data.contains("[[Joy]]"));
    assert!(data.contains("[[Grief]]"));
    assert!(data.contains(&first_anchor));
    assert!(!vault.read(JOY).await.contains("![[Data#"));
    assert_paired(&vault, "Data.md", GRIEF, &first_anchor).await;

    // Unassigning the last code removes link and anchor both.
    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let buffer = buffer_at(&vault.read("Data.md").await, 0);
    let (_, report) =
        coding::unassign_code(&ctx, "Data.md", &buffer, &FixedPicker::choose("Grief"))
            .await
            .unwrap();
    assert!(report.is_clean(), "{report}");
    assert_eq!(vault.read("Data.md").await, "Mixed feelings paragraph\n");
}

#[tokio::test(flavor = "current_thread")]
async fn create_then_remove_round_trips_both_files() {
    let initial_data = "First paragraph\n\nSecond paragraph\n";
    let initial_code = "---\ndescription: joy\n---\n";
    let vault = TestVault::new(&[("Data.md", initial_data), (JOY, initial_code)]).await;

    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let anchor = reference::create_reference(&ctx, "Data.md", 2, JOY, "Joy")
        .await
        .unwrap();
    assert_paired(&vault, "Data.md", JOY, &anchor).await;

    let index = vault.index().await;
    let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
    let report = reference::remove_reference(&ctx, "Data.md", JOY, &anchor).await;
    assert!(report.is_clean(), "{report}");
    assert_eq!(vault.read("Data.md").await, initial_data);
    assert_eq!(vault.read(JOY).await, initial_code);
}

#[tokio::test(flavor = "current_thread")]
async fn pairing_holds_after_every_step_of_a_mixed_sequence() {
    let vault = TestVault::new(&[
        (JOY, "\n"),
        (GRIEF, "\n"),
        ("A.md", "alpha paragraph\n\nbeta paragraph\n"),
        ("B.md", "gamma paragraph\n"),
    ])
    .await;

    // (data file, line, code, label)
    let assignments = [
        ("A.md", 0, JOY, "Theme/Joy"),
        ("A.md", 2, GRIEF, "Grief"),
        ("B.md", 0, JOY, "Theme/Joy"),
        ("A.md", 0, GRIEF, "Grief"),
    ];
    let mut created: Vec<(&str, &str, String)> = Vec::new();
    for (data, line, code, label) in assignments {
        let index = vault.index().await;
        let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
        let anchor = reference::create_reference(&ctx, data, line, code, label)
            .await
            .unwrap();
        created.push((data, code, anchor));
        for (d, c, a) in &created {
            assert_paired(&vault, d, c, a).await;
        }
    }

    // Tear down in interleaved order; pairing holds after each removal.
    for victim in [1usize, 0, 1, 0] {
        let (data, code, anchor) = created.remove(victim);
        let index = vault.index().await;
        let ctx = EngineContext::new(&vault.settings, &vault.store, &index);
        let report = reference::remove_reference(&ctx, data, code, &anchor).await;
        assert!(report.is_clean(), "{report}");
        assert_paired(&vault, data, code, &anchor).await;
        for (d, c, a) in &created {
            assert_paired(&vault, d, c, a).await;
        }
    }
    assert_eq!(
        vault.read("A.md").await,
        "alpha paragraph\n\nbeta paragraph\n"
    );
    assert_eq!(vault.read("B.md").await, "gamma paragraph\n");
}
