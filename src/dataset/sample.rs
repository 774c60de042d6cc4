// src/dataset/sample.rs
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use super::{Cell, Dataset};

pub const SAMPLE_COLUMNS: [&str; 9] = [
    "id", "region", "margin", "test_score", "income", "spending", "latitude", "longitude", "house_price",
];

/// Synthetic dataset that every analysis page accepts: a score with a jump
/// at 0 on the running variable, three separable clusters, a grouping column
/// and coordinates with a spatial trend.
pub fn generate(rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let running = Uniform::new(-10.0, 10.0);
    let lat = Uniform::new(40.0, 41.0);
    let lon = Uniform::new(-74.5, -73.5);
    let regions = ["North", "South", "East"];
    let centers = [(20.0, 5.0), (55.0, 30.0), (90.0, 12.0)];

    let z = |rng: &mut StdRng| -> f64 { StandardNormal.sample(rng) };

    let data = (0..rows)
        .map(|i| {
            let group = i % regions.len();
            let x: f64 = running.sample(&mut rng);
            let jump = if x >= 0.0 { 4.0 } else { 0.0 };
            let score = 50.0 + 0.8 * x + jump + 2.0 * z(&mut rng);
            let (cx, cy) = centers[group];
            let income = cx + 4.0 * z(&mut rng);
            let spending = cy + 2.5 * z(&mut rng);
            let latitude: f64 = lat.sample(&mut rng);
            let longitude: f64 = lon.sample(&mut rng);
            let price = 250.0 + 120.0 * (latitude - 40.0) + 1.5 * income + 10.0 * z(&mut rng);

            vec![
                Cell::Number((i + 1) as f64),
                Cell::Text(regions[group].to_string()),
                Cell::Number(x),
                Cell::Number(score),
                Cell::Number(income),
                Cell::Number(spending),
                Cell::Number(latitude),
                Cell::Number(longitude),
                Cell::Number(price),
            ]
        })
        .collect();

    Dataset::new(
        format!("sample_{}", seed),
        SAMPLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        data,
    )
}
