use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mocktest_core::engine::TestSession;
use mocktest_core::evaluator::score;
use mocktest_core::model::{AnswerMap, Question};

fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question::new(&format!("Q{i}"), ["a", "b", "c", "d"], i % 4))
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    let ten = questions(10);
    let all_correct: AnswerMap = (0..10).map(|i| (i, i % 4)).collect();
    let partial: AnswerMap = (0..7).map(|i| (i, (i + 1) % 4)).collect();

    group.bench_function("all_correct", |b| {
        b.iter(|| score(black_box(&ten), black_box(&all_correct)))
    });

    group.bench_function("partial_wrong", |b| {
        b.iter(|| score(black_box(&ten), black_box(&partial)))
    });

    group.bench_function("unanswered", |b| {
        let empty = AnswerMap::new();
        b.iter(|| score(black_box(&ten), black_box(&empty)))
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    group.bench_function("timeout_300_ticks", |b| {
        b.iter(|| {
            let mut session = TestSession::start(questions(10)).unwrap();
            for _ in 0..300 {
                black_box(session.tick());
            }
            session.last_result()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_score, bench_session);
criterion_main!(benches);
