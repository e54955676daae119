//! Benchmarks for request building
//!
//! This benchmark measures:
//! - Shaping a generate request into a provider request
//! - Wire body construction for both protocols
//! - Failure classification on typical provider messages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use pen2pdf_ai::adapters::{ChatCompletionsAdapter, GeminiAdapter, ProviderAdapter};
use pen2pdf_ai::catalog::{Backend, ModelDescriptor};
use pen2pdf_ai::config::HttpConfig;
use pen2pdf_ai::fallback::classify_failure;
use pen2pdf_ai::request::{HistoryMode, RequestBuilder};
use pen2pdf_ai::transport::HttpTransport;
use pen2pdf_ai::{Attachment, ContextNote, ConversationTurn, GenerateRequest, Task};

fn conversation(turns: usize) -> Vec<ConversationTurn> {
    (0..turns)
        .map(|i| {
            if i % 2 == 0 {
                ConversationTurn::user(format!("Question number {}", i))
            } else {
                ConversationTurn::assistant(format!("Answer number {}", i))
            }
        })
        .collect()
}

fn chat_request(turns: usize) -> GenerateRequest {
    GenerateRequest::new(Task::Chat, "Summarize what we discussed")
        .with_history(conversation(turns))
        .with_context_notes(vec![
            ContextNote::new("Thermodynamics", "Entropy never decreases in an isolated system."),
            ContextNote::new("Kinetics", "Rate laws are determined experimentally."),
        ])
}

fn bench_request_shaping(c: &mut Criterion) {
    let builder = RequestBuilder::default();
    let model = ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0);
    let mut group = c.benchmark_group("request_shaping");

    for turns in [0usize, 20, 100] {
        let request = chat_request(turns);
        group.throughput(Throughput::Elements(turns as u64));
        group.bench_with_input(BenchmarkId::new("build", turns), &request, |b, req| {
            b.iter(|| builder.build(black_box(&model), black_box(req)).unwrap())
        });
    }

    let upload = GenerateRequest::new(Task::TextExtraction, "")
        .with_attachment(Attachment::new("page.png", "image/png", vec![7u8; 256 * 1024]));
    group.bench_function("build_with_256k_image", |b| {
        b.iter(|| builder.build(black_box(&model), black_box(&upload)).unwrap())
    });

    group.finish();
}

fn bench_wire_bodies(c: &mut Criterion) {
    let transport = Arc::new(HttpTransport::new(&HttpConfig::default()).unwrap());
    let gemini = GeminiAdapter::new(transport.clone(), Some("bench".into()))
        .with_history_mode(HistoryMode::Structured);
    let longcat = ChatCompletionsAdapter::longcat(transport, Some("bench".into()));

    let builder = RequestBuilder::default();
    let gemini_model = ModelDescriptor::from_id("gemini-2.5-flash", Backend::Gemini, 0);
    let longcat_model = ModelDescriptor::from_id("LongCat-Flash-Chat", Backend::Longcat, 0);
    let request = chat_request(20);
    let gemini_req = builder.build(&gemini_model, &request).unwrap();
    let longcat_req = builder.build(&longcat_model, &request).unwrap();

    let mut group = c.benchmark_group("wire_bodies");
    group.bench_function("gemini_structured", |b| {
        b.iter(|| gemini.build_body(black_box(&gemini_model), black_box(&gemini_req)))
    });
    group.bench_function("longcat_flattened", |b| {
        b.iter(|| longcat.build_body(black_box(&longcat_model), black_box(&longcat_req)))
    });
    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let messages = [
        (Some(503u16), "The model is overloaded. Please try again later."),
        (Some(400), "models/gemini-9 is not found for API version v1beta"),
        (None, "Resource has been exhausted (e.g. check quota)."),
        (Some(500), "Internal error encountered."),
    ];
    c.bench_function("classify_failure", |b| {
        b.iter(|| {
            for (status, msg) in &messages {
                black_box(classify_failure(*status, msg));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_request_shaping,
    bench_wire_bodies,
    bench_classification,
);
criterion_main!(benches);
