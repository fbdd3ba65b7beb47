//! RSCM Resolver — provider registry and reference resolution

pub mod file;
pub mod gameval;
pub mod provider;
pub mod registry;
pub mod resolve;


pub use file::FileProvider;
pub use gameval::GamevalProvider;
pub use provider::{Entry, EntrySource, Provider};
pub use registry::ProviderRegistry;
pub use resolve::{Candidate, Reference, ReferenceResolver, ResolveError, Target};
