use meshstat_data_stats::{
    ArrayStatistics, Bounds, DatasetStatistics, Extent, MAX_CATEGORICAL_VALUES,
};
use meshstat_format::{DataObjectType, FieldAssociation, MessageReader};
use meshstat_model::{
    Block, CompositeDataSet, DataArray, DataObject, DataSet, DataSetAttributes, PipelineMetadata,
};
use meshstat_testkit::data_gen::{
    categorical_array, composite_tree, line_points, poly_data_with_range,
};

fn temperature(values: Vec<f64>) -> ArrayStatistics {
    ArrayStatistics::from_array(&DataArray::from_f64("Temperature", 2, values)).unwrap()
}

#[test]
fn test_range_merge_is_associative() {
    let a = temperature(vec![1.0, -4.0, 3.0, 8.0]);
    let b = temperature(vec![-2.0, 0.0]);
    let c = temperature(vec![7.0, 2.0, 5.0, 11.0, 0.5, 0.5]);

    let mut left = a.clone();
    left.add_information(&b);
    left.add_information(&c);

    let mut bc = b.clone();
    bc.add_information(&c);
    let mut right = a.clone();
    right.add_information(&bc);

    let mut swapped = c.clone();
    swapped.add_information(&a);
    swapped.add_information(&b);

    assert_eq!(left.ranges(), right.ranges());
    assert_eq!(left.ranges(), swapped.ranges());
    assert_eq!(left.component_range(0), [-2.0, 7.0]);
    assert_eq!(left.component_range(1), [-4.0, 11.0]);
    assert_eq!(left.num_tuples(), 6);
    assert_eq!(right.num_tuples(), 6);
    assert_eq!(swapped.num_tuples(), 6);
}

#[test]
fn test_bounds_sentinel_law() {
    let boxes = [
        Bounds::new([0.0, 1.0, -2.0, 2.0, 5.0, 5.0]),
        Bounds::new([3.0, 1.0, 0.0, 1.0, 0.0, 1.0]),
        Bounds::EMPTY,
    ];
    for x in boxes {
        let expected = if x.is_valid() { x } else { Bounds::EMPTY };
        assert_eq!(Bounds::EMPTY.union(&x), expected);
        assert_eq!(x.union(&Bounds::EMPTY), expected);
        assert_eq!(x.union(&x), expected);
    }
}

#[test]
fn test_categorical_cap_drops_component() {
    let over = ArrayStatistics::from_array(&categorical_array("Material", 10_000, 33, 42)).unwrap();
    assert_eq!(over.unique_component_values_if_discrete(0), None);
    assert!(!over.is_discrete(0));

    let at_cap = ArrayStatistics::from_array(&categorical_array(
        "Material",
        10_000,
        MAX_CATEGORICAL_VALUES as u32 - 1,
        42,
    ))
    .unwrap();
    assert_eq!(
        at_cap.unique_component_values_if_discrete(0).map(|v| v.len()),
        Some(MAX_CATEGORICAL_VALUES - 1)
    );
}

#[test]
fn test_array_round_trip_with_unusual_names() {
    let mut unnamed = DataArray::from_f64("x", 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .with_component_name(1, "Ψ");
    unnamed.set_name(None);
    for array in [
        unnamed,
        DataArray::from_i32("température ℃", 1, vec![3, 1, 4, 1, 5]),
        DataArray::from_strings("名前", ["a", "b", "a"]),
    ] {
        let info = ArrayStatistics::from_array(&array).unwrap();
        assert_eq!(ArrayStatistics::from_bytes(&info.to_bytes()).unwrap(), info);
    }
}

#[test]
fn test_dataset_round_trip_with_deep_tree() {
    let mut tree = composite_tree(3, 2, "Blöcke ");
    if let meshstat_model::DataBody::Composite(composite) = &mut tree.body {
        composite.push(Block::new(None, None));
        let extra = poly_data_with_range(3, "Temperature", [0.0, 2.0]);
        composite.push(Block::new(Some("extra"), Some(extra.into())));
    }
    let tree = tree.with_field_data(
        DataSetAttributes::new().with_array(DataArray::from_strings("Source", ["run-7"])),
    );
    let info = DatasetStatistics::from_object(&tree);
    assert!(info.is_composite());
    assert_eq!(info.num_data_sets(), 9);

    let decoded = DatasetStatistics::from_bytes(&info.to_bytes()).unwrap();
    assert_eq!(decoded, info);
    let level_one = decoded.composite_info().unwrap().child(0).unwrap();
    let level_two = level_one.composite_info().unwrap().child(1).unwrap();
    assert_eq!(level_two.composite_block_name(), Some("Blöcke 1.1"));
    assert!(level_two.composite_info().is_some());
    assert_eq!(decoded.composite_info().unwrap().child_name(3), Some("extra"));
}

#[test]
fn test_empty_message_is_a_no_op() {
    let baseline =
        DatasetStatistics::from_object(&poly_data_with_range(10, "Temperature", [0.0, 1.0]).into());
    let empty = DatasetStatistics::from_bytes(&DatasetStatistics::new().to_bytes()).unwrap();
    assert_eq!(empty.num_data_sets(), 0);

    for adding_parts in [false, true] {
        let mut merged = baseline.clone();
        merged.add_information(&empty, adding_parts);
        assert_eq!(merged, baseline);
        assert_eq!(merged.to_bytes(), baseline.to_bytes());
    }

    let mut garbage = DatasetStatistics::new();
    assert!(garbage.copy_from_stream(&mut MessageReader::new(&[1, 2])).is_err());
    let mut merged = baseline.clone();
    merged.add_information(&garbage, false);
    assert_eq!(merged, baseline);
}

#[test]
fn test_merge_into_fresh_summary_copies() {
    let object: DataObject = poly_data_with_range(25, "Temperature", [-1.0, 1.0]).into();
    let source = DatasetStatistics::from_object(&object);
    for adding_parts in [false, true] {
        let mut fresh = DatasetStatistics::new();
        fresh.add_information(&source, adding_parts);
        assert_eq!(fresh, source);
    }

    let composite = DatasetStatistics::from_object(&composite_tree(2, 3, "b"));
    let mut fresh = DatasetStatistics::new();
    fresh.add_information(&composite, false);
    assert_eq!(fresh, composite);
}

fn rectilinear() -> DatasetStatistics {
    let grid = DataSet::rectilinear_grid(
        DataArray::from_f64("x", 1, vec![0.0, 1.0, 2.0]),
        DataArray::from_f64("y", 1, vec![0.0, 1.0]),
        DataArray::from_f64("z", 1, vec![0.0]),
    );
    DatasetStatistics::from_data_set(&grid)
}

fn unstructured() -> DatasetStatistics {
    DatasetStatistics::from_data_set(&DataSet::unstructured_grid(Some(line_points(4)), 2))
}

#[test]
fn test_type_promotion() {
    let mut merged = rectilinear();
    assert_eq!(merged.data_set_type(), Some(DataObjectType::RectilinearGrid));
    merged.add_information(&unstructured(), false);
    assert_eq!(merged.data_set_type(), Some(DataObjectType::DataSet));
    assert_eq!(merged.data_class_name(), Some("DataSet"));

    let mut same = unstructured();
    same.add_information(&unstructured(), false);
    assert_eq!(same.data_set_type(), Some(DataObjectType::UnstructuredGrid));
    assert_eq!(same.data_class_name(), Some("UnstructuredGrid"));

    let mut point_sets = unstructured();
    point_sets.add_information(
        &DatasetStatistics::from_data_set(&DataSet::poly_data(Some(line_points(2)), 1)),
        false,
    );
    assert_eq!(point_sets.data_set_type(), Some(DataObjectType::PointSet));
}

#[test]
fn test_adding_parts_versus_reduce() {
    let leaf =
        DatasetStatistics::from_object(&poly_data_with_range(8, "Temperature", [0.0, 4.0]).into());
    assert_eq!(leaf.num_data_sets(), 1);

    let mut parts = leaf.clone();
    parts.add_information(&leaf, true);
    assert_eq!(parts.num_data_sets(), 2);

    let mut reduced = leaf.clone();
    reduced.add_information(&leaf, false);
    assert_eq!(reduced.num_data_sets(), 1);

    assert_eq!(parts.num_points(), 16);
    assert_eq!(reduced.num_points(), 16);
    assert!(
        reduced
            .array_information(FieldAssociation::Points, "Temperature")
            .is_some_and(|a| a.component_range(0) == [0.0, 4.0])
    );
}

#[test]
fn test_composite_reduce_sums_data_sets() {
    let blocks = vec![
        Block::new(Some("a"), Some(poly_data_with_range(3, "Temperature", [0.0, 1.0]).into())),
        Block::new(Some("b"), None),
    ];
    let rank_one = DatasetStatistics::from_object(&CompositeDataSet::multi_block(blocks).into());
    let blocks = vec![
        Block::new(Some("a"), None),
        Block::new(Some("b"), Some(poly_data_with_range(5, "Temperature", [2.0, 3.0]).into())),
    ];
    let rank_two = DatasetStatistics::from_object(&CompositeDataSet::multi_block(blocks).into());

    let mut merged = DatasetStatistics::new();
    merged.add_information(&rank_one, false);
    merged.add_information(&rank_two, false);
    assert_eq!(merged.num_data_sets(), 2);
    assert_eq!(merged.num_points(), 8);
    let tree = merged.composite_info().unwrap();
    assert_eq!(tree.num_children(), 2);
    assert_eq!(tree.child(0).map(DatasetStatistics::num_points), Some(3));
    assert_eq!(tree.child(1).map(DatasetStatistics::num_points), Some(5));
    assert_eq!(tree.child_name(1), Some("b"));
}

fn image(extent: [i32; 6]) -> DatasetStatistics {
    DatasetStatistics::from_data_set(&DataSet::image_data(extent, [0.0; 3], [1.0; 3]))
}

#[test]
fn test_extent_replace_and_union() {
    for adding_parts in [false, true] {
        let mut grids = image([0, 9, 0, 4, 0, 0]);
        grids.add_information(&image([5, 19, 0, 6, 0, 0]), adding_parts);
        assert_eq!(grids.extent(), Extent([0, 19, 0, 6, 0, 0]));

        // A side without an extent adopts the other's extent as is.
        let mut mixed =
            DatasetStatistics::from_data_set(&DataSet::poly_data(Some(line_points(4)), 4));
        assert!(!mixed.extent().is_valid());
        mixed.add_information(&image([2, 3, 2, 3, 2, 3]), adding_parts);
        assert_eq!(mixed.extent(), Extent([2, 3, 2, 3, 2, 3]));

        let mut kept = image([0, 9, 0, 4, 0, 0]);
        let mut inverted = image([0, 1, 0, 1, 0, 1]);
        inverted.set_extent(Extent([0, 3, 5, 1, 0, 0]));
        kept.add_information(&inverted, adding_parts);
        kept.add_information(
            &DatasetStatistics::from_data_set(&DataSet::poly_data(Some(line_points(2)), 1)),
            adding_parts,
        );
        assert_eq!(kept.extent(), Extent([0, 9, 0, 4, 0, 0]));
    }
}

fn timed(metadata: PipelineMetadata) -> DatasetStatistics {
    let object: DataObject = poly_data_with_range(5, "Temperature", [0.0, 1.0]).into();
    DatasetStatistics::from_object(&object.with_metadata(metadata))
}

fn first_run() -> DatasetStatistics {
    timed(PipelineMetadata {
        time_steps: vec![0.0, 1.0, 2.0],
        time_range: None,
        current_time: Some(1.0),
        time_label: Some("A".to_string()),
    })
}

fn second_run() -> DatasetStatistics {
    timed(PipelineMetadata {
        time_steps: vec![0.5, 1.5],
        time_range: Some([-1.0, 1.5]),
        current_time: Some(7.0),
        time_label: Some("B".to_string()),
    })
}

#[test]
fn test_time_merge_rules() {
    for adding_parts in [false, true] {
        let mut merged = first_run();
        merged.add_information(&second_run(), adding_parts);
        assert_eq!(merged.time_span(), [-1.0, 2.0]);
        assert_eq!(merged.num_time_steps(), 3);
        assert_eq!(merged.time(), Some(1.0));
        assert_eq!(merged.time_label(), Some("B"));

        // The label is taken from the last merged summary even when it has none.
        let untimed = timed(PipelineMetadata::default());
        let mut merged = first_run();
        merged.add_information(&untimed, adding_parts);
        assert_eq!(merged.time_span(), [0.0, 2.0]);
        assert_eq!(merged.num_time_steps(), 3);
        assert_eq!(merged.time(), Some(1.0));
        assert_eq!(merged.time_label(), None);

        let mut merged = untimed.clone();
        merged.add_information(&first_run(), adding_parts);
        assert_eq!(merged.time_span(), [0.0, 2.0]);
        assert_eq!(merged.time(), Some(1.0));
        assert_eq!(merged.time_label(), Some("A"));

        let mut fresh = DatasetStatistics::new();
        fresh.add_information(&second_run(), adding_parts);
        assert_eq!(fresh.time_span(), [-1.0, 1.5]);
        assert_eq!(fresh.num_time_steps(), 2);
        assert_eq!(fresh.time(), Some(7.0));
        assert_eq!(fresh.time_label(), Some("B"));
    }
}
