use rand::distr::{weighted::WeightedIndex, Distribution};
use rand::Rng;
use tracing::debug;

pub type Point = [f64; 3];

#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    pub k: usize,
    pub n_init: usize,
    pub max_iterations: usize,
    /// Relative to the mean per-channel variance of the data.
    pub tolerance: f64,
}

/// Result of the best k-means run.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub centers: Vec<Point>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

/// Lloyd's k-means with k-means++ seeding and several restarts.
pub struct KMeans {
    params: KMeansParams,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    /// Runs `n_init` seeded restarts and keeps the lowest inertia (earliest run on ties).
    ///
    /// Callers must supply at least `k` points.
    pub fn fit<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R) -> KMeansFit {
        let shift_limit = self.params.tolerance * mean_variance(points);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.params.n_init.max(1) {
            let fit = self.lloyd(points, rng, shift_limit);
            debug!(
                "k-means run {} finished after {} iterations with inertia {:.3}",
                run, fit.iterations, fit.inertia
            );
            match &best {
                Some(current) if fit.inertia >= current.inertia => {}
                _ => best = Some(fit),
            }
        }

        best.unwrap_or_else(|| KMeansFit {
            centers: Vec::new(),
            labels: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        })
    }

    fn lloyd<R: Rng + ?Sized>(&self, points: &[Point], rng: &mut R, shift_limit: f64) -> KMeansFit {
        let k = self.params.k;
        let mut centers = plus_plus_init(points, k, rng);
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        while iterations < self.params.max_iterations {
            iterations += 1;
            assign_into(points, &centers, &mut labels);
            let updated = update_centers(points, &labels, &centers);
            let shift: f64 = centers
                .iter()
                .zip(&updated)
                .map(|(a, b)| distance_squared(a, b))
                .sum();
            centers = updated;
            if shift <= shift_limit {
                break;
            }
        }

        // Labels must describe the final centers.
        let inertia = assign_into(points, &centers, &mut labels);
        KMeansFit {
            centers,
            labels,
            inertia,
            iterations,
        }
    }
}

/// Assigns every point to its nearest center (lowest index on ties).
pub fn predict(points: &[Point], centers: &[Point]) -> Vec<usize> {
    let mut labels = vec![0usize; points.len()];
    assign_into(points, centers, &mut labels);
    labels
}

/// Returns the inertia of the assignment.
fn assign_into(points: &[Point], centers: &[Point], labels: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let (index, dist) = nearest(point, centers);
        *label = index;
        inertia += dist;
    }
    inertia
}

fn nearest(point: &Point, centers: &[Point]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, center) in centers.iter().enumerate() {
        let d = distance_squared(point, center);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn update_centers(points: &[Point], labels: &[usize], previous: &[Point]) -> Vec<Point> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];

    for (point, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for c in 0..3 {
            sums[label][c] += point[c];
        }
    }

    let mut centers: Vec<Point> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                [0.0; 3]
            } else {
                let n = count as f64;
                [sum[0] / n, sum[1] / n, sum[2] / n]
            }
        })
        .collect();

    let empty: Vec<usize> = (0..k).filter(|&i| counts[i] == 0).collect();
    if !empty.is_empty() {
        // Re-seed empty clusters with the points worst served by their current center.
        let mut by_distance: Vec<(usize, f64)> = points
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (point, &label))| (i, distance_squared(point, &previous[label])))
            .collect();
        by_distance.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (slot, (point_index, _)) in empty.into_iter().zip(by_distance) {
            centers[slot] = points[point_index];
        }
    }

    centers
}

/// k-means++ seeding: the first center uniformly, the rest proportional to squared distance.
fn plus_plus_init<R: Rng + ?Sized>(points: &[Point], k: usize, rng: &mut R) -> Vec<Point> {
    let mut centers = Vec::with_capacity(k);
    if points.is_empty() {
        return centers;
    }
    centers.push(points[rng.random_range(0..points.len())]);

    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| distance_squared(p, &centers[0]))
        .collect();

    while centers.len() < k {
        let next = match WeightedIndex::new(&closest) {
            Ok(dist) => dist.sample(rng),
            // Every point already coincides with a center.
            Err(_) => rng.random_range(0..points.len()),
        };
        let center = points[next];
        for (d, p) in closest.iter_mut().zip(points) {
            *d = d.min(distance_squared(p, &center));
        }
        centers.push(center);
    }
    centers
}

fn mean_variance(points: &[Point]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as f64;
    let mut mean = [0.0f64; 3];
    for p in points {
        for c in 0..3 {
            mean[c] += p[c];
        }
    }
    for m in &mut mean {
        *m /= n;
    }
    let mut var = 0.0;
    for p in points {
        for c in 0..3 {
            let d = p[c] - mean[c];
            var += d * d;
        }
    }
    var / (n * 3.0)
}

pub fn distance_squared(a: &Point, b: &Point) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            k,
            n_init: 4,
            max_iterations: 100,
            tolerance: 1e-4,
        }
    }

    fn two_blobs() -> Vec<Point> {
        let mut points = Vec::new();
        for i in 0..30 {
            let jitter = (i % 3) as f64;
            points.push([10.0 + jitter, 10.0, 10.0]);
        }
        for i in 0..20 {
            let jitter = (i % 2) as f64;
            points.push([200.0, 220.0 + jitter, 240.0]);
        }
        points
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let points = two_blobs();
        let mut rng = StdRng::seed_from_u64(42);
        let fit = KMeans::new(params(2)).fit(&points, &mut rng);

        assert_eq!(fit.centers.len(), 2);
        let first = fit.labels[0];
        assert!(fit.labels[..30].iter().all(|&l| l == first));
        assert!(fit.labels[30..].iter().all(|&l| l != first));

        let dark = fit.centers[first];
        assert!((dark[0] - 11.0).abs() < 1e-9);
        assert!((dark[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_gives_same_fit() {
        let points = two_blobs();
        let a = KMeans::new(params(3)).fit(&points, &mut StdRng::seed_from_u64(9));
        let b = KMeans::new(params(3)).fit(&points, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.centers, b.centers);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn labels_match_final_centers() {
        let points = two_blobs();
        let fit = KMeans::new(params(3)).fit(&points, &mut StdRng::seed_from_u64(1));
        assert_eq!(predict(&points, &fit.centers), fit.labels);
    }

    #[test]
    fn nearest_prefers_lowest_index_on_ties() {
        let centers = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(nearest(&[1.0, 0.0, 0.0], &centers).0, 0);
    }

    #[test]
    fn empty_cluster_is_reseeded_with_farthest_point() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [9.0, 0.0, 0.0]];
        let previous = [[0.0, 0.0, 0.0], [100.0, 100.0, 100.0]];
        let labels = [0, 0, 0];
        let centers = update_centers(&points, &labels, &previous);
        assert_eq!(centers[1], [9.0, 0.0, 0.0]);
    }
}
