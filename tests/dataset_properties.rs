use ndarray::{Array1, Array2, array};
use tabmodel::data::{Axis, Cell, DataError, Dataset, reshape::stack};

fn named_page() -> Dataset {
    let mut page = Dataset::alloc(3, 3, 2).expect("alloc");
    page.fill(&[1.0, 2.0, 3.0, 10.0, 11.0, 20.0, 21.0, 30.0, 31.0]).expect("fill");
    page.names.vector = Some("y".to_string());
    for name in ["a", "b", "c"] {
        page.names.add(name, Axis::Rows);
    }
    for name in ["x1", "x2"] {
        page.names.add(name, Axis::Columns);
    }
    page
}

#[test]
fn pack_then_unpack_reproduces_the_page() {
    let page = named_page();
    let packed = page.pack();
    assert_eq!(packed.len(), 9);
    let rebuilt = Dataset::unpack(packed.view(), 3, 3, 2).expect("unpack");
    assert_eq!(rebuilt.vector, page.vector);
    assert_eq!(rebuilt.matrix, page.matrix);
}

#[test]
fn copies_are_deep_and_equal() {
    let mut page = named_page();
    page.text_alloc(3, 1);
    page.text_add(1, 0, Some("kept")).expect("text");
    page.add_page(Dataset::from(array![9.0]), "Info");

    let copy = page.clone();
    assert_eq!(copy, page);
    page.set(0, 0, -1.0).expect("set");
    page.get_page_mut("Info").expect("info").set(0, -1, -9.0).expect("set");
    assert_eq!(copy.get(0, 0).expect("get"), 10.0);
    assert_eq!(copy.get_on_page(Some("Info"), Cell::Index(0, -1)).expect("get"), 9.0);
    assert_eq!(copy.text_column(0), Some(vec!["", "kept", ""]));
}

#[test]
fn split_then_stack_is_the_identity_on_rows() {
    let page = named_page();
    for point in 0..=3 {
        let (top, bottom) = page.split(point, Axis::Rows).expect("split");
        let joined = stack(Some(&top), Some(&bottom), Axis::Rows).expect("stack");
        assert_eq!(joined.matrix, page.matrix, "split at {point}");
        assert_eq!(joined.vector, page.vector, "split at {point}");
        assert_eq!(joined.names.rows, page.names.rows, "split at {point}");
    }
}

#[test]
fn split_then_stack_is_the_identity_on_columns() {
    let page = named_page();
    let (left, right) = page.split(1, Axis::Columns).expect("split");
    assert_eq!(left.matrix, Some(array![[10.0], [20.0], [30.0]]));
    assert_eq!(right.matrix, Some(array![[11.0], [21.0], [31.0]]));
    assert_eq!(left.vector, page.vector);
    assert!(right.vector.is_none());
    let joined = stack(Some(&left), Some(&right), Axis::Columns).expect("stack");
    assert_eq!(joined.matrix, page.matrix);
    assert_eq!(joined.names.columns, page.names.columns);
}

#[test]
fn stacking_mismatched_pages_is_refused() {
    let tall = Dataset::from(Array2::<f64>::zeros((3, 2)));
    let wide = Dataset::from(Array2::<f64>::zeros((2, 3)));
    assert!(matches!(
        stack(Some(&tall), Some(&wide), Axis::Rows),
        Err(DataError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        stack(Some(&tall), Some(&wide), Axis::Text),
        Err(DataError::InvalidAxis(_))
    ));
    let alone = stack(Some(&tall), None, Axis::Rows).expect("stack one");
    assert_eq!(alone.matrix, tall.matrix);
}

#[test]
fn dropping_columns_keeps_names_aligned() {
    let mut page = Dataset::from(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    for name in ["keep", "drop", "also"] {
        page.names.add(name, Axis::Columns);
    }
    page.remove_columns(&[false, true, false]);
    assert_eq!(page.matrix, Some(array![[1.0, 3.0], [4.0, 6.0]]));
    assert_eq!(page.names.columns, vec!["keep", "also"]);
    assert_eq!(page.get_cell(Cell::ColumnNamed(1, "also")).expect("named"), 6.0);
}

#[test]
fn pruning_keeps_only_matching_columns() {
    let mut page = named_page();
    page.prune_columns(&["X2"]);
    assert_eq!(page.names.columns, vec!["x2"]);
    assert_eq!(page.matrix, Some(array![[11.0], [21.0], [31.0]]));
}

#[test]
fn dropping_rows_moves_every_row_aligned_part() {
    let mut page = named_page();
    page.weights = Some(Array1::from(vec![0.1, 0.2, 0.3]));
    page.remove_rows(&[true, false, false]);
    assert_eq!(page.vector, Some(array![2.0, 3.0]));
    assert_eq!(page.weights, Some(array![0.2, 0.3]));
    assert_eq!(page.names.rows, vec!["b", "c"]);
    assert_eq!(page.get_cell(Cell::Named("c", "x1")).expect("named"), 30.0);
}

#[test]
fn named_access_falls_back_to_the_vector() {
    let page = named_page();
    assert_eq!(page.get_cell(Cell::Named("b", "y")).expect("vector"), 2.0);
    assert!(matches!(
        page.get_cell(Cell::Named("b", "zz")),
        Err(DataError::NameNotFound { .. })
    ));
    assert!(matches!(page.get(5, 0), Err(DataError::OutOfBounds { .. })));
}

#[test]
fn long_chains_clone_and_drop() {
    let mut head = Dataset::blank();
    for i in 0..5_000 {
        head.add_page(Dataset::from(array![i as f64]), "page");
    }
    let copy = head.clone();
    assert_eq!(copy.pages().count(), 5_001);
    drop(head);
    assert_eq!(copy.pages().last().and_then(|p| p.vector.clone()), Some(array![4_999.0]));
}
