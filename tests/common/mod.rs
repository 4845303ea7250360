//! Shared helpers for integration tests: an on-disk vault plus logging.

use quali_core::{
    config::Settings,
    index::VaultIndex,
    store::{FsStore, TextStore},
};
use tempfile::TempDir;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub struct TestVault {
    // Held so the directory outlives the store.
    _dir: TempDir,
    pub store: FsStore,
    pub settings: Settings,
}

impl TestVault {
    pub async fn new(files: &[(&str, &str)]) -> Self {
        init_logging();
        let dir = TempDir::new().expect("temp vault dir");
        let store = FsStore::new(dir.path());
        for (path, content) in files {
            store.write(path, content).await.expect("seed vault file");
        }
        TestVault {
            _dir: dir,
            store,
            settings: Settings::default(),
        }
    }

    pub async fn index(&self) -> VaultIndex {
        VaultIndex::scan(&self.store).await.expect("vault scan")
    }

    pub async fn read(&self, path: &str) -> String {
        self.store.read(path).await.expect("read vault file")
    }
}

/// Asserts the matched-pair invariant for one Reference: the forward link
/// with a trailing anchor exists in the data file iff the matching embed
/// line exists in the target file.
pub async fn assert_paired(vault: &TestVault, data_path: &str, target_path: &str, anchor: &str) {
    let data = vault.read(data_path).await;
    let target = vault.read(target_path).await;
    let data_no_ext = data_path.strip_suffix(".md").unwrap_or(data_path);
    let embed = format!("![[{data_no_ext}#{anchor}]]");
    let stem = |p: &str| -> String {
        let name = p.rsplit('/').next().unwrap_or(p);
        name.strip_suffix(".md").unwrap_or(name).to_string()
    };
    let target_stem = stem(target_path);
    let forward = data.lines().any(|l| {
        l.trim_end().ends_with(anchor)
            && quali_core::link::parse_wikilinks(l)
                .iter()
                .any(|w| !w.embed && stem(&w.target) == target_stem)
    });
    let backlink = target.lines().any(|l| l.trim() == embed);
    assert_eq!(
        forward, backlink,
        "dangling half-reference for {data_path}#{anchor} -> {target_path}"
    );
}
