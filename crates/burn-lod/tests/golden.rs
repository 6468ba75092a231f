use burn_lod::kernel::sequence_concat;
use burn_lod::{JoinLevel, Lod, LodTensor, RowShape, SequenceConcatConfig, Shape};
use rstest::rstest;

fn lod(levels: &[&[usize]]) -> Lod {
    Lod::from_levels(levels.iter().copied()).unwrap()
}

/// A tensor whose values encode their input, row and position in the row.
fn tensor(input: usize, dims: [usize; 3], lod: Lod) -> LodTensor<f32> {
    let num_elements = dims.iter().product::<usize>();
    let values = (0..num_elements)
        .map(|i| (input * 10_000 + i) as f32)
        .collect();

    LodTensor::from_vec(values, dims, lod).unwrap()
}

/// Gathers whole rows of the inputs, in order.
fn gather_rows(inputs: &[&LodTensor<f32>], rows: &[(usize, usize)]) -> Vec<f32> {
    rows.iter()
        .flat_map(|&(input, row)| {
            let width = inputs[input].shape().row_width();
            let values = inputs[input].to_vec();
            values[row * width..(row + 1) * width].to_vec()
        })
        .collect()
}

#[test]
fn scenario_axis_1_level_1() {
    let x0 = tensor(0, [4, 3, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let x1 = tensor(1, [4, 4, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let config = SequenceConcatConfig::new()
        .with_axis(1)
        .with_level(JoinLevel::Inner);

    let out = sequence_concat(&[&x0, &x1], &config).unwrap();

    assert_eq!(out.lod, lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    assert_eq!(out.shape(), Shape::new([4, 7, 4]));

    let expected: Vec<f32> = (0..4)
        .flat_map(|row| gather_rows(&[&x0, &x1], &[(0, row), (1, row)]))
        .collect();
    assert_eq!(out.to_vec(), expected);
}

#[test]
fn scenario_axis_0_level_0() {
    let x0 = tensor(0, [4, 3, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let x1 = tensor(1, [5, 3, 4], lod(&[&[0, 3, 5], &[0, 1, 2, 3, 5]]));
    let config = SequenceConcatConfig::new()
        .with_axis(0)
        .with_level(JoinLevel::Outer);

    let out = sequence_concat(&[&x0, &x1], &config).unwrap();

    assert_eq!(out.lod, lod(&[&[0, 5, 9], &[0, 1, 2, 3, 4, 5, 6, 7, 9]]));
    assert_eq!(out.shape(), Shape::new([9, 3, 4]));

    let expected = gather_rows(
        &[&x0, &x1],
        &[
            (0, 0),
            (0, 1),
            (1, 0),
            (1, 1),
            (1, 2),
            (0, 2),
            (0, 3),
            (1, 3),
            (1, 4),
        ],
    );
    assert_eq!(out.to_vec(), expected);
}

#[test]
fn scenario_axis_0_level_1() {
    let x0 = tensor(0, [4, 3, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let x1 = tensor(1, [5, 3, 4], lod(&[&[0, 3, 5], &[0, 1, 3, 4, 5]]));
    let config = SequenceConcatConfig::new()
        .with_axis(0)
        .with_level(JoinLevel::Inner);

    let out = sequence_concat(&[&x0, &x1], &config).unwrap();

    assert_eq!(out.lod, lod(&[&[0, 5, 9], &[0, 2, 5, 7, 9]]));
    assert_eq!(out.shape(), Shape::new([9, 3, 4]));

    let expected = gather_rows(
        &[&x0, &x1],
        &[
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (1, 2),
            (0, 2),
            (1, 3),
            (0, 3),
            (1, 4),
        ],
    );
    assert_eq!(out.to_vec(), expected);
}

#[rstest]
#[case::outer_first_axis(0, JoinLevel::Outer)]
#[case::inner_first_axis(0, JoinLevel::Inner)]
#[case::outer_second_axis(1, JoinLevel::Outer)]
#[case::inner_last_axis(2, JoinLevel::Inner)]
fn single_input_should_be_identity(#[case] axis: usize, #[case] level: JoinLevel) {
    let x0 = tensor(0, [4, 3, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let config = SequenceConcatConfig::new()
        .with_axis(axis)
        .with_level(level);

    let out = sequence_concat(&[&x0], &config).unwrap();

    assert_eq!(out.lod, x0.lod);
    assert_eq!(out.shape(), x0.shape());
    assert_eq!(out.to_vec(), x0.to_vec());
}

#[test]
fn output_should_contain_every_input_element_once() {
    let x0 = tensor(0, [4, 3, 4], lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]));
    let x1 = tensor(1, [5, 3, 4], lod(&[&[0, 3, 5], &[0, 1, 2, 3, 5]]));
    let x2 = tensor(2, [3, 3, 4], lod(&[&[0, 1, 3], &[0, 1, 2, 3]]));
    let config = SequenceConcatConfig::new();

    let out = sequence_concat(&[&x0, &x1, &x2], &config).unwrap();

    let mut actual = out.to_vec();
    let mut expected: Vec<f32> = [&x0, &x1, &x2]
        .iter()
        .flat_map(|input| input.to_vec())
        .collect();
    actual.sort_by(|a, b| a.total_cmp(b));
    expected.sort_by(|a, b| a.total_cmp(b));

    assert_eq!(
        out.lod,
        lod(&[&[0, 6, 12], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12]])
    );
    assert_eq!(actual, expected);
}
