// End-to-end recovery of a rolled two-dimensional sheet.

use ltsa::LocalTangentSpaceAlignment;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

const ROLL_RADIUS: f64 = 10.0;

/// Samples a flat rectangular sheet rolled around half of a cylinder.
/// Returns the ambient 3-D samples together with the intrinsic
/// (unrolled) coordinates used to generate them. The intrinsic patch is
/// square, so the recovered aspect ratio is comparable to the original.
fn rolled_sheet(n_samples: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut samples = Array2::<f64>::zeros((n_samples, 3));
    let mut intrinsic = Array2::<f64>::zeros((n_samples, 2));
    for i in 0..n_samples {
        let angle: f64 = rng.gen::<f64>() * PI;
        let height: f64 = rng.gen::<f64>() * PI * ROLL_RADIUS;
        samples[[i, 0]] = ROLL_RADIUS * angle.sin();
        samples[[i, 1]] = height;
        samples[[i, 2]] = ROLL_RADIUS * (1.0 - angle.cos());
        intrinsic[[i, 0]] = ROLL_RADIUS * angle;
        intrinsic[[i, 1]] = height;
    }
    (samples, intrinsic)
}

fn pairwise_distances(points: &Array2<f64>) -> Vec<f64> {
    let n = points.nrows();
    let mut distances = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let squared: f64 = points
                .row(i)
                .iter()
                .zip(points.row(j).iter())
                .map(|(&a, &b)| (a - b) * (a - b))
                .sum();
            distances.push(squared.sqrt());
        }
    }
    distances
}

fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_unstable_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
    let mut result = vec![0.0; values.len()];
    for (rank, &index) in order.iter().enumerate() {
        result[index] = rank as f64;
    }
    result
}

fn pearson(left: &[f64], right: &[f64]) -> f64 {
    let n = left.len() as f64;
    let mean_left = left.iter().sum::<f64>() / n;
    let mean_right = right.iter().sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut var_left = 0.0;
    let mut var_right = 0.0;
    for (&a, &b) in left.iter().zip(right.iter()) {
        covariance += (a - mean_left) * (b - mean_right);
        var_left += (a - mean_left).powi(2);
        var_right += (b - mean_right).powi(2);
    }
    covariance / (var_left.sqrt() * var_right.sqrt())
}

fn spearman(left: &[f64], right: &[f64]) -> f64 {
    pearson(&ranks(left), &ranks(right))
}

#[test]
fn unrolling_a_rolled_sheet_preserves_intrinsic_distances() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (samples, intrinsic) = rolled_sheet(200, 42);
    let mut model = LocalTangentSpaceAlignment::new(2, 20);
    let embedding = model.fit_transform(&samples).unwrap().to_matrix();
    assert_eq!(embedding.shape(), &[200, 2]);
    assert!(embedding.iter().all(|value| value.is_finite()));

    let correlation = spearman(
        &pairwise_distances(&embedding),
        &pairwise_distances(&intrinsic),
    );
    println!("Spearman correlation between embedded and intrinsic distances: {correlation:.4}");
    assert!(
        correlation > 0.9,
        "embedding does not preserve intrinsic geometry (Spearman {correlation:.4})"
    );
}

#[test]
fn held_out_points_land_inside_the_training_embedding() {
    let (samples, _) = rolled_sheet(200, 42);
    let (held_out, _) = rolled_sheet(50, 1337);

    let mut model = LocalTangentSpaceAlignment::new(2, 20);
    model.fit(&samples).unwrap();

    let training = model.embedding().unwrap().to_matrix();
    let projected = model.transform(&held_out).unwrap().to_matrix();
    assert_eq!(projected.shape(), &[50, 2]);
    assert!(projected.iter().all(|value| value.is_finite()));

    // Projections are weighted combinations of training embedding rows,
    // so they stay near the training point cloud.
    for column in 0..2 {
        let training_column = training.column(column);
        let low = training_column.iter().cloned().fold(f64::INFINITY, f64::min);
        let high = training_column
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let margin = 0.25 * (high - low);
        assert!(projected
            .column(column)
            .iter()
            .all(|&value| value > low - margin && value < high + margin));
    }
}
