//! RAG (Retrieval-Augmented Generation) for question answering.
//!
//! The [`Retriever`] turns a transcript into a [`VectorIndex`](crate::vector_store::VectorIndex)
//! and pulls context back out of it. The [`AnswerSynthesizer`] turns that
//! context and a question into an [`Answer`].

pub mod context;
mod response;

pub use context::{format_context, Retriever, CONTEXT_SEPARATOR, DEFAULT_TOP_K};
pub use response::{Answer, AnswerSynthesizer, FALLBACK_ANSWER};
