pub mod job;
pub mod object;
pub mod rag;
pub mod vector;

pub use job::{Job, JobId, JobStatus, IndexingStats};
pub use object::{Bucket, ObjectMeta};
pub use rag::{ChatChoice, ChatMessageOut, ChatResponse, ContextBundle, ContextDocument, TokenUsage};
pub use vector::{ScoredVector, VectorRecord};
