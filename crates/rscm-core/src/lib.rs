//! RSCM Core — gameval table decoding, merged symbol store, and settings

pub mod dat;
pub mod error;
pub mod gamevals;
pub mod model;
pub mod settings;
pub mod store;
pub mod virtualdoc;


pub use dat::{decode_dat, encode_dat};
pub use error::Error;
pub use gamevals::{GamevalScan, ScannedEntry, find_gamevals_files, scan_gamevals};
pub use model::{MAPPING_EXTENSION, Snapshot, provenance_key};
pub use settings::{EffectiveSettings, ProjectState, Settings, parse_pair_list};
pub use store::SymbolStore;
pub use virtualdoc::{VirtualDocument, VirtualDocuments};
