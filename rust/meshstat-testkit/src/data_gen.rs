//! Data generation utilities for testing.

use meshstat_model::{Block, CompositeDataSet, DataArray, DataObject, DataSet, DataSetAttributes};

/// Float32 points spread along the x axis.
pub fn line_points(count: usize) -> DataArray {
    let coords = (0..count)
        .flat_map(|i| [i as f32, 0.0, 0.0])
        .collect::<Vec<_>>();
    DataArray::from_f32("Points", 3, coords)
}

/// Values from `min` to `max` in `count` even steps. A single value is `min`.
pub fn linear_values(count: usize, min: f64, max: f64) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

/// Poly data with `num_points` points, one vertex cell per point, and a float64
/// point array named `array_name` spanning exactly `range`.
pub fn poly_data_with_range(num_points: usize, array_name: &str, range: [f64; 2]) -> DataSet {
    let values = linear_values(num_points, range[0], range[1]);
    DataSet::poly_data(Some(line_points(num_points)), num_points as u64).with_point_data(
        DataSetAttributes::new().with_array(DataArray::from_f64(array_name, 1, values)),
    )
}

/// Poly data without points, cells or arrays.
pub fn empty_poly_data() -> DataSet {
    DataSet::poly_data(None, 0)
}

/// An int32 array of `num_tuples` values drawn from `distinct` categories.
///
/// The first `distinct` tuples are the categories in order, so every category
/// occurs when `num_tuples >= distinct`; the rest are drawn with a seeded
/// generator.
pub fn categorical_array(name: &str, num_tuples: usize, distinct: u32, seed: u64) -> DataArray {
    assert_ne!(distinct, 0);
    let mut rng = fastrand::Rng::with_seed(seed);
    let values = (0..num_tuples)
        .map(|i| {
            if i < distinct as usize {
                i as i32
            } else {
                rng.u32(0..distinct) as i32
            }
        })
        .collect();
    DataArray::from_i32(name, 1, values)
}

/// A multi-block tree `depth` levels deep with `fanout` children per level.
/// Leaves are small poly data sets; blocks are named `"{prefix}{level}.{index}"`.
pub fn composite_tree(depth: usize, fanout: usize, prefix: &str) -> DataObject {
    build_level(depth, fanout, prefix, 0)
}

fn build_level(depth: usize, fanout: usize, prefix: &str, level: usize) -> DataObject {
    if depth == 0 {
        return poly_data_with_range(4, "Temperature", [level as f64, level as f64 + 1.0]).into();
    }
    let blocks = (0..fanout)
        .map(|index| {
            let child = build_level(depth - 1, fanout, prefix, level + 1);
            Block::new(Some(&format!("{prefix}{level}.{index}")), Some(child))
        })
        .collect();
    CompositeDataSet::multi_block(blocks).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_values_hit_both_ends() {
        let values = linear_values(5, 10.0, 90.0);
        assert_eq!(values.first(), Some(&10.0));
        assert_eq!(values.last(), Some(&90.0));
        assert_eq!(linear_values(1, 3.0, 4.0), vec![3.0]);
        assert!(linear_values(0, 3.0, 4.0).is_empty());
    }

    #[test]
    fn test_poly_data_shape() {
        let data_set = poly_data_with_range(100, "Temperature", [5.0, 95.0]);
        assert_eq!(data_set.num_points(), 100);
        assert_eq!(data_set.num_cells(), 100);
        assert_eq!(
            data_set.point_data.array("Temperature").unwrap().component_ranges(),
            vec![[5.0, 95.0]]
        );
    }

    #[test]
    fn test_categorical_array_covers_categories() {
        let array = categorical_array("Material", 1000, 33, 7);
        assert_eq!(array.num_tuples(), 1000);
        assert_eq!(array.component_ranges(), vec![[0.0, 32.0]]);
    }

    #[test]
    fn test_composite_tree_leaves() {
        let tree = composite_tree(3, 2, "b");
        assert_eq!(tree.as_composite().unwrap().leaves().len(), 8);
    }
}
