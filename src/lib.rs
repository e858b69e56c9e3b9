pub mod config;
pub mod error;
pub mod association;
pub mod cache;
pub mod graph;
pub mod traversal;
pub mod monarch;
pub mod secondary;
pub mod export;
pub mod pipeline;

pub use config::{Config, Vocabulary};
pub use error::{BiokgError, Result};
pub use association::AssociationRecord;
pub use graph::{Edge, KnowledgeGraph, Node, SharedKnowledgeGraph};
pub use traversal::{AssociationSource, CancellationToken, FetchOptions, Traversal};
