use std::sync::{Arc, Mutex};

use clap::Parser;
use pretty_assertions::assert_eq;

use pyfaq_rag::loader::RegionExtractor;
use pyfaq_rag::{
    Embedder, LlmProvider, QuestionAnswerer, RagArgs, RagConfig, RagError, RagPipeline, Result,
    SourceDocument,
};

const VOCABULARY: [&str; 6] = ["python", "language", "install", "windows", "tkinter", "freeze"];

/// Counts vocabulary words; the trailing bias keeps every vector non-zero.
struct BagOfWords;

impl Embedder for BagOfWords {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lowered.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }

    fn batch_size(&self) -> usize {
        4
    }
}

#[derive(Default)]
struct RecordingLlm {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl LlmProvider for RecordingLlm {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(RagError::GenerationService("503 Service Unavailable".to_string()));
        }
        Ok("Python is a programming language. Thanks for asking!".to_string())
    }
}

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    rag: RagArgs,
}

fn config(extra: &[&str]) -> RagConfig {
    let mut argv = vec!["pyfaq", "--hf-api-token", "fake", "--url", "https://example.com/faq"];
    argv.extend_from_slice(extra);
    TestCli::try_parse_from(argv)
        .unwrap()
        .rag
        .build_config()
        .unwrap()
}

fn pipeline(docs: &[SourceDocument], llm: Arc<RecordingLlm>, extra: &[&str]) -> RagPipeline {
    RagPipeline::build(&config(extra), docs, Arc::new(BagOfWords), llm).unwrap()
}

#[test]
fn single_document_answer_uses_its_only_chunk() {
    let docs = vec![SourceDocument::new(
        "https://example.com/faq",
        "Python is a programming language. It is widely used.",
    )];
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(&docs, llm.clone(), &[]);

    let answer = pipeline.answer("What is Python?").unwrap();

    assert_eq!(pipeline.index().len(), 1);
    assert_eq!(answer.sources.len(), 1);
    assert_eq!(
        answer.text,
        "Python is a programming language. Thanks for asking!"
    );
    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Python is a programming language. It is widely used."));
    assert!(prompts[0].contains("Question: What is Python?"));
    assert!(prompts[0].contains("thanks for asking!"));
}

#[test]
fn extracted_pages_rank_the_matching_chunk_first() {
    let extractor = RegionExtractor::new(".body").unwrap();
    let gui = extractor.extract(
        "https://example.com/gui.html",
        r#"<html><head><title>GUI FAQ</title></head><body>
            <nav>Navigation python python python</nav>
            <div class="body">
              <h1>Graphic User Interface FAQ</h1>
              <p>How do I freeze Tkinter applications? Freeze tools bundle tkinter.</p>
            </div></body></html>"#,
    );
    let install = extractor.extract(
        "https://example.com/windows.html",
        r#"<html><body><div class="body">
              <h1>Python on Windows FAQ</h1>
              <p>How do I install Python on Windows? Use the Windows installer.</p>
            </div></body></html>"#,
    );
    assert_eq!(gui.metadata.title.as_deref(), Some("GUI FAQ"));
    assert!(!gui.text.contains("Navigation"));

    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(&[gui, install], llm, &["--top-k", "1"]);
    let hits = pipeline
        .retrieve("How do I freeze Tkinter applications?")
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.metadata.source_url, "https://example.com/gui.html");
}

#[test]
fn long_document_is_split_before_indexing() {
    let paragraph = "Python is a language. ".repeat(20);
    let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
    let docs = vec![SourceDocument::new("https://example.com/long", text)];
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(
        &docs,
        llm,
        &["--chunk-size", "500", "--chunk-overlap", "100", "--top-k", "2"],
    );

    assert!(pipeline.index().len() > 1);
    for entry in pipeline.index().entries() {
        assert!(entry.chunk.char_len() <= 500);
    }
    assert_eq!(pipeline.retrieve("python").unwrap().len(), 2);
}

#[test]
fn generation_failure_surfaces_as_service_error() {
    let docs = vec![SourceDocument::new(
        "https://example.com/faq",
        "Python is a programming language.",
    )];
    let llm = Arc::new(RecordingLlm {
        fail: true,
        ..RecordingLlm::default()
    });
    let pipeline = pipeline(&docs, llm.clone(), &[]);

    let err = pipeline.answer("What is Python?").unwrap_err();

    assert!(matches!(err, RagError::GenerationService(_)));
    assert_eq!(llm.prompts.lock().unwrap().len(), 1);
}

#[test]
fn empty_index_still_answers_with_empty_context() {
    let docs = vec![SourceDocument::new("https://example.com/blank", "  \n\n  ")];
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(&docs, llm.clone(), &[]);

    assert!(pipeline.index().is_empty());
    assert!(pipeline.retrieve("What is Python?").unwrap().is_empty());

    let answer = pipeline.answer("What is Python?").unwrap();

    assert!(answer.sources.is_empty());
    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("end of the answer.\n\n\n\nQuestion: What is Python?"));
}
