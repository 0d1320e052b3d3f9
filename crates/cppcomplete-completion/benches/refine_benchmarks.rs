use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cppcomplete_completion::{
    BufferSnapshot, CandidateSource, ContextClassifier, ContextTag, CppContextClassifier,
    KeywordCandidateSource, PrefixFilter, QueryController, QueryKind, TextSnapshot,
};
use std::sync::Arc;

// ============================================================================
// Benchmark 1: Refine over a cached session
// ============================================================================
// Every keystroke after the trigger; must stay well under a frame

fn benchmark_refine(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine");
    group.sample_size(100);

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let controller = QueryController::builtin();
    let snapshot = Arc::new(TextSnapshot::cpp("int main() {\n    "));
    let anchor = runtime
        .block_on(controller.trigger(snapshot.clone(), 17, QueryKind::Basic))
        .expect("completion offered");

    for typed in ["", "c", "co", "con", "const_"].iter() {
        let (buffer, _) = snapshot.edit(anchor, 0, typed);
        let caret = anchor + typed.len() as u32;

        group.bench_with_input(BenchmarkId::from_parameter(typed), &caret, |b, caret| {
            b.iter(|| controller.refine(black_box(&buffer), black_box(*caret)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark 2: Prefix filter over the built-in table
// ============================================================================

fn benchmark_prefix_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_filter");
    let candidates = KeywordCandidateSource::builtin().produce(ContextTag::PreprocessorDefine);

    for (name, case_sensitive) in [("case_sensitive", true), ("case_insensitive", false)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                PrefixFilter::filter(
                    black_box(&candidates),
                    black_box(Some("Co")),
                    case_sensitive,
                    true,
                )
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark 3: Classification on a realistic buffer
// ============================================================================

fn benchmark_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(
            "#define MACRO_{i}(x) ((x) + {i})\nstatic int value_{i} = obj->field_{i}.get();\n"
        ));
    }
    source.push_str("int main() {\n    re");
    let snapshot = TextSnapshot::cpp(source.as_str());
    let caret = snapshot.len();

    group.bench_function("end_of_buffer", |b| {
        b.iter(|| {
            let mut cursor = snapshot.token_cursor();
            CppContextClassifier.classify(cursor.as_mut(), black_box(caret))
        });
    });

    group.bench_function("lex_and_classify", |b| {
        b.iter(|| {
            let snapshot = TextSnapshot::cpp(black_box(source.as_str()));
            let mut cursor = snapshot.token_cursor();
            CppContextClassifier.classify(cursor.as_mut(), caret)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_refine,
    benchmark_prefix_filter,
    benchmark_classify
);
criterion_main!(benches);
