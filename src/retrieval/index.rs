//! Cosine-similarity chunk index

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (0.0-1.0, higher is better)
    pub similarity: f32,
}

#[derive(Debug)]
struct IndexEntry {
    chunk: Chunk,
    norm: f32,
}

/// Immutable in-memory index over the embeddings of one document's chunks
///
/// Built once per document and shared read-only between searches; nothing is
/// ever inserted after construction, so a brute-force scan with precomputed
/// norms is sufficient at single-document scale.
#[derive(Debug)]
pub struct ChunkIndex {
    document_id: Uuid,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl ChunkIndex {
    /// Build an index from embedded chunks
    ///
    /// Fails if any chunk is missing an embedding or the dimensions disagree;
    /// a partially embedded document never produces a usable index.
    pub fn build(document_id: Uuid, chunks: Vec<Chunk>) -> Result<Self> {
        let dimensions = chunks
            .first()
            .map(|c| c.embedding.len())
            .ok_or_else(|| Error::Index("Cannot build an index from zero chunks".to_string()))?;

        if dimensions == 0 {
            return Err(Error::Index("Chunk has no embedding".to_string()));
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.embedding.len() != dimensions {
                return Err(Error::Index(format!(
                    "Chunk {} has {} dimensions, expected {}",
                    chunk.chunk_index,
                    chunk.embedding.len(),
                    dimensions
                )));
            }
            let norm = l2_norm(&chunk.embedding);
            if norm == 0.0 {
                return Err(Error::Index(format!(
                    "Chunk {} has a zero embedding",
                    chunk.chunk_index
                )));
            }
            entries.push(IndexEntry { chunk, norm });
        }

        Ok(Self {
            document_id,
            dimensions,
            entries,
        })
    }

    /// Document this index was built from
    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    /// Embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `top_k` chunks most similar to the query embedding
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if query_embedding.len() != self.dimensions {
            return Err(Error::Index(format!(
                "Query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let query_norm = l2_norm(query_embedding);
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(
                    query_embedding,
                    &entry.chunk.embedding,
                    query_norm,
                    entry.norm,
                ),
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;

    fn chunk(index: u32, embedding: Vec<f32>) -> Chunk {
        let mut c = Chunk::new(
            Uuid::nil(),
            format!("chunk {}", index),
            ChunkSource {
                filename: "a.pdf".to_string(),
                page_number: Some(1),
                page_count: Some(1),
            },
            0,
            0,
            index,
        );
        c.embedding = embedding;
        c
    }

    #[test]
    fn search_ranks_by_similarity() {
        let index = ChunkIndex::build(
            Uuid::nil(),
            vec![
                chunk(0, vec![1.0, 0.0]),
                chunk(1, vec![0.0, 1.0]),
                chunk(2, vec![0.7, 0.7]),
            ],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.1], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.chunk_index, 0);
        assert_eq!(results[1].chunk.chunk_index, 2);
        assert_eq!(results[2].chunk.chunk_index, 1);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn search_truncates_to_top_k() {
        let chunks = (0..10).map(|i| chunk(i, vec![1.0, i as f32])).collect();
        let index = ChunkIndex::build(Uuid::nil(), chunks).unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn build_rejects_mismatched_dimensions() {
        let err = ChunkIndex::build(
            Uuid::nil(),
            vec![chunk(0, vec![1.0, 0.0]), chunk(1, vec![1.0, 0.0, 0.0])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn build_rejects_empty_input() {
        assert!(ChunkIndex::build(Uuid::nil(), Vec::new()).is_err());
    }

    #[test]
    fn search_rejects_wrong_query_dimensions() {
        let index = ChunkIndex::build(Uuid::nil(), vec![chunk(0, vec![1.0, 0.0])]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0], 1).is_err());
    }
}
