use box_predictor_core::{encode, ForestModel, Node, Predictor, Schema, Tree};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

const TREES: usize = 100;

/// Forest of depth-3 trees splitting on the derived features and one category slot
fn bench_forest(schema: &Schema) -> ForestModel {
    let width = schema.output_len();
    let trees = (0..TREES)
        .map(|i| {
            let t = i as f64;
            Tree::new(vec![
                Node::split(0, 5.0 + t % 7.0, 1, 4),
                Node::split(1, 2.0, 2, 3),
                Node::leaf(vec![0.5; width]),
                Node::leaf(vec![1.5; width]),
                Node::split(3 + (i % 11) as i32, 1.0, 5, 6),
                Node::leaf(vec![2.0; width]),
                Node::leaf(vec![3.0; width]),
            ])
        })
        .collect();
    ForestModel::new(schema.feature_len(), width, trees)
}

fn bench_predict(c: &mut Criterion) {
    let schema = Schema::global();
    let predictor = Predictor::new(schema.clone(), Arc::new(bench_forest(&schema)))
        .expect("bench forest matches schema");

    let categories = [
        "Category_100cc",
        "Category_500G",
        "Category_5lbs",
        "Category_unknown",
        "Category_100cc",
    ];
    let quantities = [Some(2), Some(3), Some(10), Some(1), None];

    c.bench_function("encode_feature_row", |b| {
        b.iter(|| encode(&schema, black_box(&categories), black_box(&quantities)))
    });

    c.bench_function("predict_boxes_100_trees", |b| {
        b.iter(|| predictor.predict_boxes(black_box(&categories), black_box(&quantities)))
    });
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
