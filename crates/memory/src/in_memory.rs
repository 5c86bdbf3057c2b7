//! In-memory vector store: useful for tests and small corpora.
//!
//! Without an embedding model the store ranks documents by keyword overlap.
//! With one, it embeds every document on insert and fuses keyword and
//! embedding rankings with RRF at query time.

use async_trait::async_trait;
use agentry_core::error::MemoryError;
use agentry_core::memory::{Document, VectorStore};
use agentry_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use crate::vector;

struct StoredDocument {
    document: Document,
    embedding: Option<Vec<f32>>,
}

struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, MemoryError> {
        let expected = inputs.len();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs,
            })
            .await
            .map_err(|e| MemoryError::EmbeddingFailed(e.to_string()))?;
        if response.embeddings.len() != expected {
            return Err(MemoryError::EmbeddingFailed(format!(
                "expected {expected} embeddings, got {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

/// A vector store that keeps its documents in a Vec.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<StoredDocument>>,
    embedder: Option<Embedder>,
}

impl InMemoryVectorStore {
    /// A keyword-ranked store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            embedder: None,
        }
    }

    /// A store that embeds documents with the given provider and model.
    pub fn with_embeddings(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            embedder: Some(Embedder {
                provider,
                model: model.into(),
            }),
        }
    }

    /// Add documents, returning the new document count.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, MemoryError> {
        let embeddings: Vec<Option<Vec<f32>>> = match &self.embedder {
            Some(embedder) if !documents.is_empty() => {
                let inputs = documents.iter().map(|d| d.content.clone()).collect();
                embedder.embed(inputs).await?.into_iter().map(Some).collect()
            }
            _ => vec![None; documents.len()],
        };

        let mut entries = self.entries.write().await;
        for (document, embedding) in documents.into_iter().zip(embeddings) {
            entries.push(StoredDocument { document, embedding });
        }
        debug!(count = entries.len(), "InMemoryVectorStore documents added");
        Ok(entries.len())
    }

    /// Add plain texts as documents without metadata.
    pub async fn add_texts<I, S>(&self, texts: I) -> Result<usize, MemoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_documents(texts.into_iter().map(Document::new).collect())
            .await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>, MemoryError> {
        let query_embedding = match &self.embedder {
            Some(embedder) => embedder.embed(vec![query.to_string()]).await?.pop(),
            None => None,
        };

        let entries = self.entries.read().await;
        let query_terms = vector::terms(query);
        let keyword_scores: Vec<f32> = entries
            .iter()
            .map(|e| vector::keyword_score(&query_terms, &e.document.content))
            .collect();
        let keyword_ranked = vector::rank(&keyword_scores, k);

        let ranked = match query_embedding {
            Some(q) => {
                let vector_scores: Vec<f32> = entries
                    .iter()
                    .map(|e| {
                        e.embedding
                            .as_deref()
                            .map(|emb| vector::cosine_similarity(emb, &q))
                            .unwrap_or(0.0)
                    })
                    .collect();
                let vector_ranked = vector::rank(&vector_scores, k);
                vector::reciprocal_rank_fusion(&keyword_ranked, &vector_ranked, 60, k)
            }
            None => keyword_ranked,
        };

        Ok(ranked
            .into_iter()
            .map(|i| entries[i].document.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentry_core::error::ProviderError;
    use agentry_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// Embeds text as [mentions of "cat", mentions of "dog"].
    struct PetEmbedder;

    #[async_trait]
    impl Provider for PetEmbedder {
        fn name(&self) -> &str {
            "pets"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            let embeddings = request
                .inputs
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![t.matches("cat").count() as f32, t.matches("dog").count() as f32]
                })
                .collect();
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
            })
        }
    }

    #[tokio::test]
    async fn keyword_search_ranks_matches() {
        let store = InMemoryVectorStore::new();
        store
            .add_texts([
                "The state of the union address covered the economy.",
                "Ketanji Brown Jackson was nominated to the Supreme Court.",
                "The economy grew while the union stayed strong.",
            ])
            .await
            .unwrap();

        let docs = store.similarity_search("union economy", 2).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.content.contains("union")));
    }

    #[tokio::test]
    async fn keyword_search_without_matches_is_empty() {
        let store = InMemoryVectorStore::new();
        store.add_texts(["alpha beta"]).await.unwrap();
        let docs = store.similarity_search("gamma", 4).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn embedding_search_finds_semantic_match() {
        let store = InMemoryVectorStore::with_embeddings(Arc::new(PetEmbedder), "pets-v1");
        store
            .add_documents(vec![
                Document::new("A dog barked at the mailman").with_source("dogs.txt"),
                Document::new("My cat sleeps all day").with_source("cats.txt"),
            ])
            .await
            .unwrap();

        let docs = store.similarity_search("cat", 1).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source(), Some("cats.txt"));
        assert_eq!(store.len().await, 2);
    }
}
