//! Prompt templates for retrieval-grounded answers

use crate::retrieval::ScoredChunk;

/// Prompt builder for document Q&A
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved chunks
    pub fn build_context(results: &[ScoredChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                result.chunk.source.format_citation(),
                result.chunk.content
            ));
        }

        context
    }

    /// Build the fixed instruction template embedding the question
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are an assistant answering questions about an uploaded document. Use only the excerpts below; if they do not contain the answer, say so. Start the answer directly, no small talk.

EXCERPTS:
{context}

QUESTION: {question}

Answer:"#,
            context = context,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource};
    use uuid::Uuid;

    fn scored(content: &str, page: u32, similarity: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(
                Uuid::nil(),
                content.to_string(),
                ChunkSource {
                    filename: "report.pdf".to_string(),
                    page_number: Some(page),
                    page_count: Some(3),
                },
                0,
                0,
                0,
            ),
            similarity,
        }
    }

    #[test]
    fn context_numbers_sources_in_order() {
        let context = PromptBuilder::build_context(&[
            scored("first passage", 1, 0.9),
            scored("second passage", 2, 0.8),
        ]);

        assert!(context.contains("[1] report.pdf, Page 1"));
        assert!(context.contains("[2] report.pdf, Page 2"));
        let first = context.find("first passage").unwrap();
        let second = context.find("second passage").unwrap();
        assert!(first < second);
    }

    #[test]
    fn prompt_embeds_question_and_context() {
        let prompt = PromptBuilder::build_qa_prompt("What is this?", "some context");
        assert!(prompt.contains("QUESTION: What is this?"));
        assert!(prompt.contains("some context"));
    }
}
