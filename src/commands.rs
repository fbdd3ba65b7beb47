//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rscm_core::{ProjectState, Settings, SymbolStore, VirtualDocuments};
use rscm_resolver::{
    FileProvider, GamevalProvider, Provider, ProviderRegistry, Reference, ReferenceResolver,
    ResolveError, Target,
};
use rscm_watcher::{FileWatcher, ReloadService};

/// Build the settings resolver from CLI flags: explicit directories beat the
/// state file, and an explicit settings file beats whatever the state file
/// configures.
pub fn load_settings(
    state_file: Option<PathBuf>,
    settings_file: Option<PathBuf>,
    dirs: Vec<PathBuf>,
) -> anyhow::Result<Arc<Settings>> {
    let mut state = match state_file {
        Some(path) => ProjectState::load(&path)
            .with_context(|| format!("loading state file {}", path.display()))?,
        None => ProjectState::new(),
    };
    if !dirs.is_empty() {
        state.mappings_paths = dirs.iter().map(|d| d.display().to_string()).collect();
    }
    if let Some(path) = settings_file {
        state.settings_file_path = path.display().to_string();
    }
    Ok(Arc::new(Settings::new(state)))
}

struct AppContext {
    store: Arc<SymbolStore>,
    docs: Arc<VirtualDocuments>,
    resolver: ReferenceResolver,
}

fn build(settings: Arc<Settings>) -> AppContext {
    let store = Arc::new(SymbolStore::new(Arc::clone(&settings)));
    store.reload();
    let docs = Arc::new(VirtualDocuments::new(Arc::clone(&store)));

    let providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(FileProvider::new(Arc::clone(&settings))),
        Arc::new(GamevalProvider::new(Arc::clone(&store), Arc::clone(&docs))),
    ];
    let registry = Arc::new(ProviderRegistry::new(settings, providers));
    AppContext {
        store,
        docs,
        resolver: ReferenceResolver::new(registry),
    }
}

pub fn list(settings: Arc<Settings>, prefix: &str) -> anyhow::Result<()> {
    let ctx = build(settings);
    let reference = Reference {
        prefix: prefix.to_string(),
        key: String::new(),
    };
    let candidates = ctx.resolver.complete(&reference);
    if candidates.is_empty() {
        println!("no entries for prefix '{prefix}'");
        return Ok(());
    }
    for candidate in candidates {
        println!("{}={}\t[{}]", candidate.key, candidate.value, candidate.source);
    }
    Ok(())
}

pub fn resolve(settings: Arc<Settings>, reference: &str, json: bool) -> anyhow::Result<()> {
    let ctx = build(settings);
    let reference = Reference::parse(reference)
        .with_context(|| format!("'{reference}' is not a prefix:key reference"))?;

    let targets = ctx.resolver.resolve(&reference);
    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }
    match ctx.resolver.resolve_single(&reference) {
        Ok(None) => println!("no match"),
        Ok(Some(target)) => print_target(&target),
        Err(ResolveError::Ambiguous(targets)) => {
            println!("ambiguous ({} targets):", targets.len());
            for target in &targets {
                print_target(target);
            }
        }
    }
    Ok(())
}

fn print_target(target: &Target) {
    match target {
        Target::RealFile { path, line, column } => {
            println!("{}:{}:{}", path.display(), line + 1, column + 1);
        }
        Target::BinaryView { path, prefix, key } => {
            println!("{} (table {prefix}, key {key})", path.display());
        }
        Target::Listing { prefix, entries } => {
            println!("{prefix} (no backing file):");
            for (key, value) in entries {
                println!("  {key}={value}");
            }
        }
    }
}

pub fn complete(settings: Arc<Settings>, reference: &str) -> anyhow::Result<()> {
    let ctx = build(settings);
    let reference = Reference::parse(reference)
        .with_context(|| format!("'{reference}' is not a prefix:key reference"))?;
    for candidate in ctx.resolver.complete(&reference) {
        println!("{}={}\t[{}]", candidate.key, candidate.value, candidate.source);
    }
    Ok(())
}

pub fn dump(file: &PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let tables = rscm_core::decode_dat(&bytes)?;
    for (name, entries) in &tables {
        println!("[{name}] ({} entries)", entries.len());
        for (key, value) in entries {
            println!("  {key}={value}");
        }
    }
    Ok(())
}

pub async fn watch(settings: Arc<Settings>) -> anyhow::Result<()> {
    let ctx = build(settings);
    let store = Arc::clone(&ctx.store);
    let docs = Arc::clone(&ctx.docs);

    let directories = store.settings().effective().mapping_directories;
    anyhow::ensure!(!directories.is_empty(), "no mapping directories configured");

    let watcher = FileWatcher::new(directories)?;
    let service = ReloadService::new(store, docs);
    tracing::info!("watching for mapping changes, Ctrl-C to stop");
    service.run(watcher).await
}
