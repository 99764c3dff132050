use chunking_store::{IndexError, VectorIndex};
use proptest::prelude::*;

fn index_with(rows: &[[f32; 2]]) -> VectorIndex {
    let mut index = VectorIndex::new(2);
    let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.to_vec()).collect();
    index.append(&vectors).expect("dimensions match");
    index
}

#[test]
fn new_index_is_empty_and_search_returns_nothing() {
    let index = VectorIndex::new(3);
    assert_eq!(index.dimension(), 3);
    assert!(index.is_empty());
    assert!(index.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
}

#[test]
fn search_orders_by_squared_distance() {
    let index = index_with(&[[3.0, 0.0], [1.0, 0.0], [0.0, 2.0]]);
    let hits = index.search(&[0.0, 0.0], 3).unwrap();
    assert_eq!(hits, vec![(1, 1.0), (2, 4.0), (0, 9.0)]);
}

#[test]
fn search_truncates_to_k_and_returns_all_when_fewer_rows() {
    let index = index_with(&[[0.0, 0.0], [1.0, 1.0]]);
    assert_eq!(index.search(&[0.0, 0.0], 1).unwrap().len(), 1);
    assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 2);
    assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn ties_keep_row_order() {
    let index = index_with(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]]);
    let rows: Vec<usize> = index.search(&[0.0, 0.0], 3).unwrap().into_iter().map(|(r, _)| r).collect();
    assert_eq!(rows, vec![0, 1, 2]);
}

#[test]
fn wrong_query_dimension_is_rejected() {
    let index = index_with(&[[0.0, 0.0]]);
    let err = index.search(&[0.0, 0.0, 0.0], 1).unwrap_err();
    assert_eq!(err, IndexError::DimensionMismatch { expected: 2, actual: 3 });
}

#[test]
fn failing_append_leaves_index_unchanged() {
    let mut index = index_with(&[[0.0, 0.0]]);
    let err = index
        .append(&[vec![1.0, 1.0], vec![1.0, 2.0, 3.0]])
        .unwrap_err();
    assert_eq!(err, IndexError::DimensionMismatch { expected: 2, actual: 3 });
    assert_eq!(index.len(), 1);
    assert_eq!(index.row(0), Some(vec![0.0, 0.0]));
}

#[test]
fn rebuild_returns_new_index_and_keeps_old() {
    let index = index_with(&[[0.0, 0.0], [5.0, 5.0]]);
    let rebuilt = index.rebuild(&[vec![9.0, 9.0]]).unwrap();

    assert_eq!(rebuilt.dimension(), 2);
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt.row(0), Some(vec![9.0, 9.0]));
    assert_eq!(index.len(), 2);

    assert!(index.rebuild(&[vec![1.0]]).is_err());
}

proptest! {
    #[test]
    fn search_results_are_sorted_and_bounded(
        rows in prop::collection::vec(prop::array::uniform2(-10.0f32..10.0), 0..30),
        query in prop::array::uniform2(-10.0f32..10.0),
        k in 0usize..40,
    ) {
        let mut index = VectorIndex::new(2);
        let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.to_vec()).collect();
        index.append(&vectors).unwrap();

        let hits = index.search(&query, k).unwrap();
        prop_assert_eq!(hits.len(), k.min(rows.len()));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].1);
        }
        for (row, _) in &hits {
            prop_assert!(*row < rows.len());
        }
    }
}
