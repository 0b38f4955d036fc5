pub mod health;
pub mod indexing;
pub mod rag;
pub mod s3;
pub mod vectors;
