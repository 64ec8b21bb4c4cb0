//! Batch evaluation on the rayon thread pool.

use super::NurbsCurve;
use crate::error::Result;
use crate::primitives::{Point3, Vec3};
use num_traits::Float;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

impl<F: Float + Send + Sync> NurbsCurve<F> {
    /// Evaluates [`point_at`](Self::point_at) for every parameter in parallel.
    ///
    /// Results are in the order of `parameters`.
    pub fn points_at_par(&self, parameters: &[F]) -> Vec<Result<Point3<F>>> {
        parameters.par_iter().map(|&t| self.point_at(t)).collect()
    }

    /// Evaluates [`derivative_at`](Self::derivative_at) for every parameter in
    /// parallel.
    pub fn derivatives_at_par(&self, parameters: &[F], order: usize) -> Vec<Result<Vec<Vec3<F>>>> {
        parameters
            .par_iter()
            .map(|&t| self.derivative_at(t, order))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parallel_matches_sequential() {
        let curve = NurbsCurve::<f64>::create_from_points(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 0.0, 1.0],
                [3.0, -1.0, 0.0],
                [4.0, 0.0, 0.0],
            ],
            3,
        )
        .unwrap();
        let parameters: Vec<f64> = (0..=200).map(|i| i as f64 / 200.0).collect();

        let points = curve.points_at_par(&parameters);
        let ders = curve.derivatives_at_par(&parameters, 2);
        for (i, &t) in parameters.iter().enumerate() {
            assert_eq!(points[i].as_ref().unwrap(), &curve.point_at(t).unwrap());
            assert_eq!(ders[i].as_ref().unwrap(), &curve.derivative_at(t, 2).unwrap());
        }
    }

    #[test]
    fn test_parallel_reports_out_of_domain_per_parameter() {
        let curve = NurbsCurve::<f64>::create_from_points(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 1.0, 0.0]],
            2,
        )
        .unwrap();
        let results = curve.points_at_par(&[0.5, 1.5, 0.25]);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::OutOfDomain
        );
        assert!(results[2].is_ok());
    }
}
