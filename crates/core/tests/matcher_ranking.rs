use sleuth_core::matcher::{cosine_distance, rank, Distance};
use sleuth_core::model::{Corpus, FunctionRecord, VECTOR_DIM};

fn record_with_vector(function: &str, vector: Vec<f32>) -> FunctionRecord {
    let mut record = FunctionRecord::new("bin", function, vec!["code".to_string()]);
    record.vector = Some(vector);
    record
}

fn padded(head: &[f32]) -> Vec<f32> {
    let mut v = head.to_vec();
    v.resize(VECTOR_DIM, 0.0);
    v
}

#[test]
fn identical_direction_is_distance_zero() {
    let a = padded(&[1.0, 2.0, 3.0]);
    let b = padded(&[2.0, 4.0, 6.0]);
    match cosine_distance(&a, &b) {
        Distance::Finite(d) => assert!(d.abs() < 1e-6, "distance was {d}"),
        Distance::Indeterminate => panic!("unexpected indeterminate"),
    }
}

#[test]
fn opposite_direction_is_distance_two() {
    let a = padded(&[1.0, 0.0]);
    let b = padded(&[-1.0, 0.0]);
    match cosine_distance(&a, &b) {
        Distance::Finite(d) => assert!((d - 2.0).abs() < 1e-6),
        Distance::Indeterminate => panic!("unexpected indeterminate"),
    }
}

#[test]
fn zero_norm_is_flagged_indeterminate_not_nan() {
    let zero = vec![0.0; VECTOR_DIM];
    let other = padded(&[1.0]);

    let d = cosine_distance(&zero, &other);
    assert!(d.is_indeterminate());
    assert_eq!(d.value(), 1.0);
    assert!(!d.value().is_nan());

    assert!(cosine_distance(&other, &zero).is_indeterminate());
    assert!(cosine_distance(&zero, &zero).is_indeterminate());
}

#[test]
fn rank_returns_every_record_ordered_by_ascending_distance() {
    let corpus = Corpus {
        records: vec![
            record_with_vector("far", padded(&[-1.0, 0.5])),
            record_with_vector("near", padded(&[1.0, 0.0])),
            record_with_vector("middling", padded(&[1.0, 4.0])),
        ],
    };
    let target = padded(&[1.0, 0.0]);

    let ranked = rank(&corpus, &target);
    assert_eq!(ranked.len(), corpus.len());
    for pair in ranked.windows(2) {
        assert!(pair[0].distance.value() <= pair[1].distance.value());
    }
    for scored in &ranked {
        assert!(scored.distance.value() >= 0.0);
    }
    assert_eq!(ranked[0].record.function_name, "near");
}

/// Equal distances keep corpus insertion order (stable sort).
#[test]
fn rank_breaks_ties_by_corpus_order() {
    let corpus = Corpus {
        records: vec![
            record_with_vector("first", padded(&[3.0, 0.0])),
            record_with_vector("second", padded(&[5.0, 0.0])),
            record_with_vector("third", padded(&[7.0, 0.0])),
        ],
    };
    let target = padded(&[1.0, 0.0]);

    let ranked = rank(&corpus, &target);
    let names: Vec<&str> = ranked.iter().map(|s| s.record.function_name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn rank_of_empty_corpus_is_empty() {
    let ranked = rank(&Corpus::new(), &padded(&[1.0]));
    assert!(ranked.is_empty());
}
