//! Integration tests for the RSCM toolkit
//!
//! These tests verify that the store, providers, resolver, and watcher work
//! together correctly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rscm_core::{ProjectState, Settings, SymbolStore, VirtualDocuments};
use rscm_resolver::{
    FileProvider, GamevalProvider, Provider, ProviderRegistry, Reference, ReferenceResolver, Target,
};
use rscm_watcher::{FileWatcher, ReloadService};
use tempfile::TempDir;
use tokio::time::sleep;

fn dat_bytes(tables: &[(&str, &[&str])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(tables.len() as i32).to_be_bytes());
    for (name, items) in tables {
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&(items.len() as i32).to_be_bytes());
        for item in *items {
            out.extend_from_slice(&(item.len() as u16).to_be_bytes());
            out.extend_from_slice(item.as_bytes());
        }
    }
    out
}

fn settings_for(dirs: &[&Path]) -> Arc<Settings> {
    let mut state = ProjectState::new();
    state.mappings_paths = dirs.iter().map(|d| d.display().to_string()).collect();
    Arc::new(Settings::new(state))
}

fn resolver_for(settings: Arc<Settings>) -> (Arc<SymbolStore>, ReferenceResolver) {
    let store = Arc::new(SymbolStore::new(Arc::clone(&settings)));
    store.reload();
    let docs = Arc::new(VirtualDocuments::new(Arc::clone(&store)));
    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(FileProvider::new(Arc::clone(&settings))),
        Arc::new(GamevalProvider::new(Arc::clone(&store), docs)),
    ];
    let registry = Arc::new(ProviderRegistry::new(settings, providers));
    (store, ReferenceResolver::new(registry))
}

/// End-to-end: binary table -> snapshot -> resolver targets.
#[test]
fn binary_table_end_to_end() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("item.dat"),
        dat_bytes(&[("item", &["2=Sword", "5=Shield"])]),
    )
    .unwrap();

    let (store, resolver) = resolver_for(settings_for(&[dir.path()]));
    let snapshot = store.current_snapshot();
    assert_eq!(snapshot.tables["item"]["2"], "Sword");
    assert_eq!(snapshot.tables["item"]["5"], "Shield");

    let targets = resolver.resolve(&Reference::parse("item:5").unwrap());
    match &targets[..] {
        [Target::BinaryView { path, prefix, key }] => {
            assert_eq!(path, &dir.path().join("item.dat"));
            assert_eq!(prefix, "item");
            assert_eq!(key, "5");
        }
        other => panic!("expected one binary view target, got {other:?}"),
    }
    assert!(resolver.resolve(&Reference::parse("item:9").unwrap()).is_empty());
}

/// A reader racing a reload sees one whole generation, never a mix of two.
#[test]
fn snapshot_visibility_is_atomic() {
    let dir = TempDir::new().unwrap();
    let write_generation = |value: &str| {
        std::fs::write(
            dir.path().join("gamevals.toml"),
            format!("[gamevals.item]\nv = {value}\n[gamevals.object]\nv = {value}\n"),
        )
        .unwrap();
    };
    write_generation("0");

    let settings = settings_for(&[dir.path()]);
    let store = Arc::new(SymbolStore::new(settings));
    store.reload();

    let reader_store = Arc::clone(&store);
    let reader = std::thread::spawn(move || {
        for _ in 0..2000 {
            let snapshot = reader_store.current_snapshot();
            // Both prefixes were always written together; a torn snapshot
            // would disagree between them.
            assert_eq!(snapshot.tables["item"]["v"], snapshot.tables["object"]["v"]);
        }
    });

    for generation in 1..50 {
        write_generation(&generation.to_string());
        store.reload();
    }
    reader.join().unwrap();
}

/// The watcher triggers a background reload that flows through to resolver
/// results and regenerated virtual documents.
#[tokio::test(flavor = "multi_thread")]
async fn watcher_reload_updates_resolution() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("gamevals.toml"), "[gamevals.npc]\ngoblin = 1\n").unwrap();

    let settings = settings_for(&[dir.path()]);
    let store = Arc::new(SymbolStore::new(Arc::clone(&settings)));
    store.reload();
    let docs = Arc::new(VirtualDocuments::new(Arc::clone(&store)));

    let before = docs.get("npc").unwrap();
    assert_eq!(before.text, "goblin=1");

    let watcher = FileWatcher::new(vec![dir.path().to_path_buf()]).unwrap();
    let service = ReloadService::new(Arc::clone(&store), Arc::clone(&docs))
        .with_debounce(Duration::from_millis(50));
    let handle = tokio::spawn(async move { service.run(watcher).await });

    sleep(Duration::from_millis(200)).await;
    std::fs::write(dir.path().join("gamevals.toml"), "[gamevals.npc]\ngoblin = 2\n").unwrap();

    let mut updated = false;
    for _ in 0..50 {
        sleep(Duration::from_millis(100)).await;
        if store.current_snapshot().tables["npc"]["goblin"] == "2" {
            updated = true;
            break;
        }
    }
    assert!(updated, "reload never happened");

    // Virtual document was invalidated and regenerated from the new snapshot.
    let after = docs.get("npc").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.text, "goblin=2");
    handle.abort();
}

/// Settings file precedence end-to-end: the host state's directories are
/// ignored entirely once an external settings file parses.
#[test]
fn settings_file_redirects_resolution() {
    let host_dir = TempDir::new().unwrap();
    std::fs::write(host_dir.path().join("gamevals.toml"), "[gamevals.item]\nsword = host\n")
        .unwrap();

    let external_dir = TempDir::new().unwrap();
    std::fs::create_dir(external_dir.path().join("mappings")).unwrap();
    std::fs::write(
        external_dir.path().join("mappings/gamevals.toml"),
        "[gamevals.item]\nsword = external\n",
    )
    .unwrap();
    let settings_path = external_dir.path().join("settings.toml");
    std::fs::write(&settings_path, "[rscm]\nmappings_directories = [\"mappings\"]\n").unwrap();

    let mut state = ProjectState::new();
    state.mappings_paths = vec![host_dir.path().display().to_string()];
    state.settings_file_path = settings_path.display().to_string();

    let (store, _) = resolver_for(Arc::new(Settings::new(state)));
    assert_eq!(store.current_snapshot().tables["item"]["sword"], "external");
}

/// Merging across directories with mixed sources, exercised through the
/// resolver: TOML-provenanced keys navigate to their file, binary keys to the
/// dat view.
#[test]
fn mixed_sources_resolve_by_provenance() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("npc.dat"), dat_bytes(&[("npc", &["imp=7"])])).unwrap();
    std::fs::write(dir.path().join("gamevals.toml"), "[gamevals.npc]\ngoblin = 100\n").unwrap();

    let (_, resolver) = resolver_for(settings_for(&[dir.path()]));

    match &resolver.resolve(&Reference::parse("npc:goblin").unwrap())[..] {
        [Target::RealFile { path, line, .. }] => {
            assert_eq!(path, &dir.path().join("gamevals.toml"));
            assert_eq!(*line, 1);
        }
        other => panic!("expected real file target, got {other:?}"),
    }
    match &resolver.resolve(&Reference::parse("npc:imp").unwrap())[..] {
        [Target::BinaryView { path, .. }] => {
            assert_eq!(path, &dir.path().join("npc.dat"));
        }
        other => panic!("expected binary view target, got {other:?}"),
    }
}
