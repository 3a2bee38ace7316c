//! Local Regression Kriging (LRK)
//!
//! Hybrid estimator that decomposes the field into
//! ```text
//! Z(s) = m(f(s)) + ε(s)
//! ```
//! where m is any trained [`Regressor`] applied to the covariates f(s) of
//! a location, and ε is the regression residual. Unlike global regression
//! kriging, ε is kriged from the `num_points` known locations nearest to
//! each target only, with a variogram fitted to that neighborhood.
//!
//! Steps:
//! 1. `fit`: train m on the known samples and store εᵢ = zᵢ - m(fᵢ),
//!    index-aligned with the coordinates given at construction.
//! 2. `predict`: look up the nearest known coordinates in a k-d tree,
//!    krige their residuals at the target, and add that correction to
//!    m(f(s)).
//!
//! Coordinates are `(x, y)` throughout: the tree is built on x then y,
//! queried with the target's x then y, and the kriging engine receives
//! the same order.
//!
//! Reference:
//! Hengl, T. et al. (2007). About regression-kriging. Computers & Geosciences.

use localkrige_core::{Coordinate, Error, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::engine::{KrigingMethod, PointKriging};
use super::kdtree::KdTree;
use super::kriging::PointEstimate;
use super::variogram::VariogramModel;
use crate::maybe_rayon::*;
use crate::regression::Regressor;

/// Parameters for Local Regression Kriging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRegressionKrigingParams {
    /// Kriging flavour for the residual correction (default ordinary)
    pub kriging_method: KrigingMethod,
    /// Variogram model fitted to each neighborhood (default linear)
    pub variogram_model: VariogramModel,
    /// Number of nearest known locations per correction (default 16).
    /// Must not exceed the number of coordinates.
    pub num_points: usize,
}

impl Default for LocalRegressionKrigingParams {
    fn default() -> Self {
        Self {
            kriging_method: KrigingMethod::Ordinary,
            variogram_model: VariogramModel::Linear,
            num_points: 16,
        }
    }
}

impl LocalRegressionKrigingParams {
    /// Build parameters from textual identifiers, e.g.
    /// `("ordinary", "spherical", 8)`.
    ///
    /// # Errors
    /// `Configuration` if either identifier is not recognized.
    pub fn parse(kriging_method: &str, variogram_model: &str, num_points: usize) -> Result<Self> {
        Ok(Self {
            kriging_method: kriging_method.parse()?,
            variogram_model: variogram_model.parse()?,
            num_points,
        })
    }
}

/// Corrected prediction together with the residual kriging details
#[derive(Debug, Clone)]
pub struct LocalPrediction {
    /// Base prediction plus `correction`, one value per feature row
    pub values: Array1<f64>,
    /// Kriged residual at the target, shared by every row
    pub correction: f64,
    /// Kriging variance of `correction`
    pub variance: f64,
    /// Indices of the neighbors used, nearest first
    pub neighbors: Vec<usize>,
}

/// Regression model with a local kriging correction of its residuals.
///
/// `fit` takes `&mut self` and every prediction method takes `&self`, so
/// predictions never alter the trained state and cannot overlap a refit.
#[derive(Debug)]
pub struct LocalRegressionKriging<R> {
    regressor: R,
    params: LocalRegressionKrigingParams,
    /// Frozen snapshot of the known coordinates
    tree: KdTree,
    /// `targets - regressor.predict(features)`, aligned with `tree.points()`
    residuals: Vec<f64>,
    trained: bool,
}

impl<R: Regressor> LocalRegressionKriging<R> {
    /// Create an untrained model over `coordinates`.
    ///
    /// The coordinates are copied into a k-d tree immediately; the i-th
    /// coordinate must be the location of the i-th training sample later
    /// passed to [`fit`](Self::fit).
    ///
    /// # Errors
    /// - `Configuration` if `num_points` is zero or smaller than the
    ///   kriging method can solve
    /// - `NeighborCount` if `num_points` exceeds the number of coordinates
    pub fn new(
        coordinates: &[Coordinate],
        regressor: R,
        params: LocalRegressionKrigingParams,
    ) -> Result<Self> {
        if params.num_points == 0 {
            return Err(Error::Configuration("num_points must be positive".into()));
        }
        if params.num_points > coordinates.len() {
            return Err(Error::NeighborCount {
                requested: params.num_points,
                available: coordinates.len(),
            });
        }
        let min_points = params.kriging_method.min_points();
        if params.num_points < min_points {
            return Err(Error::Configuration(format!(
                "{} kriging needs num_points >= {}, got {}",
                params.kriging_method, min_points, params.num_points
            )));
        }

        Ok(Self {
            regressor,
            params,
            tree: KdTree::build(coordinates),
            residuals: vec![0.0; coordinates.len()],
            trained: false,
        })
    }

    /// Train the base regressor and store its residuals.
    ///
    /// Repeated calls replace the previous residuals and regressor state.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `targets` does not have one entry per
    ///   coordinate, or `features` does not have one row per target.
    ///   Nothing is modified in that case.
    /// - Any error of the regressor, unchanged. If the regressor trained
    ///   but then failed to predict, the model is left untrained.
    pub fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        if targets.len() != self.tree.len() {
            return Err(Error::DimensionMismatch {
                what: "targets vs coordinates",
                expected: self.tree.len(),
                actual: targets.len(),
            });
        }
        if features.nrows() != targets.len() {
            return Err(Error::DimensionMismatch {
                what: "feature rows vs targets",
                expected: targets.len(),
                actual: features.nrows(),
            });
        }

        debug!(
            n_samples = targets.len(),
            n_features = features.ncols(),
            method = %self.params.kriging_method,
            variogram = %self.params.variogram_model,
            num_points = self.params.num_points,
            "fitting local regression kriging"
        );

        self.regressor.fit(features, targets)?;

        let predictions = match self.regressor.predict(features) {
            Ok(p) => p,
            Err(e) => {
                // The regressor no longer matches the stored residuals
                self.trained = false;
                return Err(e);
            }
        };
        if predictions.len() != targets.len() {
            self.trained = false;
            return Err(Error::DimensionMismatch {
                what: "regressor predictions",
                expected: targets.len(),
                actual: predictions.len(),
            });
        }

        self.residuals = (&targets - &predictions).to_vec();
        self.trained = true;

        debug!(
            mean_abs_residual =
                self.residuals.iter().map(|r| r.abs()).sum::<f64>() / self.residuals.len() as f64,
            "residuals stored"
        );
        Ok(())
    }

    /// Predict at one target location.
    ///
    /// Every row of `features` receives the same kriged correction, since
    /// there is a single target. Use [`predict_points`](Self::predict_points)
    /// for one location per row.
    ///
    /// # Errors
    /// `NotTrained` before a successful `fit`; regressor and kriging
    /// errors are returned unchanged.
    pub fn predict(&self, features: ArrayView2<f64>, target: Coordinate) -> Result<Array1<f64>> {
        self.predict_with_variance(features, target).map(|p| p.values)
    }

    /// Like [`predict`](Self::predict), also returning the kriged
    /// correction, its variance and the neighbors it was built from.
    pub fn predict_with_variance(
        &self,
        features: ArrayView2<f64>,
        target: Coordinate,
    ) -> Result<LocalPrediction> {
        self.ensure_trained()?;

        let base = self.regressor.predict(features)?;
        let (kriged, neighbors) = self.local_correction(target)?;

        Ok(LocalPrediction {
            values: base + kriged.estimate,
            correction: kriged.estimate,
            variance: kriged.variance,
            neighbors,
        })
    }

    /// Kriged residual alone at `target`.
    pub fn correction_at(&self, target: Coordinate) -> Result<PointEstimate> {
        self.ensure_trained()?;
        self.local_correction(target).map(|(kriged, _)| kriged)
    }

    /// Predict one value per feature row, each at its own target location.
    ///
    /// Neighborhoods are kriged in parallel when the `parallel` feature is
    /// enabled.
    ///
    /// # Errors
    /// `DimensionMismatch` if `targets` does not have one entry per row,
    /// otherwise as [`predict`](Self::predict).
    pub fn predict_points(
        &self,
        features: ArrayView2<f64>,
        targets: &[Coordinate],
    ) -> Result<Array1<f64>>
    where
        R: Sync,
    {
        self.ensure_trained()?;
        if targets.len() != features.nrows() {
            return Err(Error::DimensionMismatch {
                what: "target locations vs feature rows",
                expected: features.nrows(),
                actual: targets.len(),
            });
        }

        let base = self.regressor.predict(features)?;
        if base.len() != targets.len() {
            return Err(Error::DimensionMismatch {
                what: "regressor predictions",
                expected: targets.len(),
                actual: base.len(),
            });
        }

        let corrections: Vec<f64> = targets
            .into_par_iter()
            .map(|target| self.local_correction(*target).map(|(kriged, _)| kriged.estimate))
            .collect::<Result<Vec<f64>>>()?;

        Ok(base + &Array1::from(corrections))
    }

    /// Whether `fit` has completed successfully.
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Stored residuals, aligned with [`coordinates`](Self::coordinates).
    /// All zeros before training.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// The coordinates the spatial index was built from.
    pub fn coordinates(&self) -> &[Coordinate] {
        self.tree.points()
    }

    /// Parameters the model was built with.
    pub fn params(&self) -> &LocalRegressionKrigingParams {
        &self.params
    }

    /// The base regression model.
    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    fn ensure_trained(&self) -> Result<()> {
        if self.trained {
            Ok(())
        } else {
            Err(Error::NotTrained)
        }
    }

    /// Krige the stored residuals of the neighborhood of `target`.
    fn local_correction(&self, target: Coordinate) -> Result<(PointEstimate, Vec<usize>)> {
        let k = self.params.num_points;
        let (_, neighbors) = self.tree.query(target, k);
        if neighbors.len() < k {
            return Err(Error::NeighborCount {
                requested: k,
                available: neighbors.len(),
            });
        }

        let points = self.tree.points();
        let xs: Vec<f64> = neighbors.iter().map(|&i| points[i].x).collect();
        let ys: Vec<f64> = neighbors.iter().map(|&i| points[i].y).collect();
        let zs: Vec<f64> = neighbors.iter().map(|&i| self.residuals[i]).collect();

        let engine = PointKriging::new(
            self.params.kriging_method,
            &xs,
            &ys,
            &zs,
            self.params.variogram_model,
        )?;
        let kriged = engine.execute_point(target.x, target.y)?;

        trace!(
            target = %target,
            nearest = neighbors[0],
            correction = kriged.estimate,
            variance = kriged.variance,
            "local residual correction"
        );

        Ok((kriged, neighbors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::{LinearRegression, MeanRegressor};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Array2};

    /// Base model that always predicts zero, so residuals equal targets.
    #[derive(Debug, Default)]
    struct ZeroRegressor {
        fits: usize,
    }

    impl Regressor for ZeroRegressor {
        fn fit(&mut self, _: ArrayView2<f64>, _: ArrayView1<f64>) -> Result<()> {
            self.fits += 1;
            Ok(())
        }

        fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
            Ok(Array1::zeros(features.nrows()))
        }
    }

    /// Trains fine, then refuses to predict.
    #[derive(Debug, Default)]
    struct BrokenPredictor {
        broken: bool,
    }

    impl Regressor for BrokenPredictor {
        fn fit(&mut self, _: ArrayView2<f64>, _: ArrayView1<f64>) -> Result<()> {
            Ok(())
        }

        fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
            if self.broken {
                Err(Error::Algorithm("predict failed".into()))
            } else {
                Ok(Array1::zeros(features.nrows()))
            }
        }
    }

    fn corners() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
        ]
    }

    fn ordinary_corners(num_points: usize) -> Result<LocalRegressionKriging<ZeroRegressor>> {
        LocalRegressionKriging::new(
            &corners(),
            ZeroRegressor::default(),
            params(KrigingMethod::Ordinary, num_points),
        )
    }

    fn params(method: KrigingMethod, num_points: usize) -> LocalRegressionKrigingParams {
        LocalRegressionKrigingParams {
            kriging_method: method,
            variogram_model: VariogramModel::Linear,
            num_points,
        }
    }

    /// Scattered sites with one covariate: z = 3·elev + 5 + smooth spatial term
    fn scattered(n: usize) -> (Vec<Coordinate>, Array2<f64>, Array1<f64>) {
        let mut coords = Vec::with_capacity(n);
        let mut elev = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        let mut rng = 7_u64;
        for _ in 0..n {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let x = (rng >> 33) as f64 / (1u64 << 31) as f64 * 50.0;
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let y = (rng >> 33) as f64 / (1u64 << 31) as f64 * 50.0;
            let e = 100.0 + 0.8 * x - 0.4 * y + (x * y / 300.0).cos() * 5.0;
            coords.push(Coordinate::new(x, y));
            elev.push(e);
            z.push(3.0 * e + 5.0 + 4.0 * (x / 10.0).sin() * (y / 12.0).cos());
        }
        let features = Array2::from_shape_vec((n, 1), elev).unwrap();
        (coords, features, Array1::from(z))
    }

    #[test]
    fn test_default_params() {
        let p = LocalRegressionKrigingParams::default();
        assert_eq!(p.kriging_method, KrigingMethod::Ordinary);
        assert_eq!(p.variogram_model, VariogramModel::Linear);
        assert_eq!(p.num_points, 16);
    }

    #[test]
    fn test_parse_params() {
        let p = LocalRegressionKrigingParams::parse("universal", "spherical", 8).unwrap();
        assert_eq!(p.kriging_method, KrigingMethod::Universal);
        assert_eq!(p.variogram_model, VariogramModel::Spherical);

        let err = LocalRegressionKrigingParams::parse("indicator", "linear", 8).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        let err = LocalRegressionKrigingParams::parse("ordinary", "cubic", 8).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_starts_untrained_with_zero_residuals() {
        let model = ordinary_corners(4).unwrap();
        assert!(!model.is_trained());
        assert_eq!(model.residuals(), &[0.0; 4]);
        assert_eq!(model.coordinates(), corners().as_slice());
        assert_eq!(model.params(), &params(KrigingMethod::Ordinary, 4));
    }

    #[test]
    fn test_residuals_are_target_minus_prediction() {
        let (coords, x, z) = scattered(40);
        let mut model = LocalRegressionKriging::new(
            &coords,
            LinearRegression::new(),
            params(KrigingMethod::Ordinary, 8),
        )
        .unwrap();
        model.fit(x.view(), z.view()).unwrap();

        let pred = model.regressor().predict(x.view()).unwrap();
        for i in 0..z.len() {
            assert_abs_diff_eq!(model.residuals()[i], z[i] - pred[i], epsilon = 1e-12);
        }
        assert!(model.is_trained());
    }

    #[test]
    fn test_target_length_mismatch_keeps_state() {
        let mut model = ordinary_corners(4).unwrap();
        let err = model
            .fit(Array2::<f64>::zeros((3, 1)).view(), array![1.0, 2.0, 3.0].view())
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3, .. }));
        assert!(!model.is_trained());
        assert_eq!(model.regressor().fits, 0);

        // Also after a successful fit
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        let err = model
            .fit(Array2::<f64>::zeros((5, 1)).view(), array![9.0, 9.0, 9.0, 9.0, 9.0].view())
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert!(model.is_trained());
        assert_eq!(model.residuals(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_feature_rows_mismatch() {
        let mut model = ordinary_corners(4).unwrap();
        let err = model
            .fit(Array2::<f64>::zeros((2, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 2, .. }));
        assert!(!model.is_trained());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = ordinary_corners(4).unwrap();
        let x = Array2::<f64>::zeros((1, 1));
        let target = Coordinate::new(0.5, 0.5);
        assert!(matches!(model.predict(x.view(), target).unwrap_err(), Error::NotTrained));
        assert!(matches!(model.correction_at(target).unwrap_err(), Error::NotTrained));
        assert!(matches!(
            model.predict_points(x.view(), &[target]).unwrap_err(),
            Error::NotTrained
        ));
    }

    #[test]
    fn test_too_many_neighbors_at_construction() {
        let err = LocalRegressionKriging::new(
            &corners(),
            ZeroRegressor::default(),
            params(KrigingMethod::Ordinary, 5),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NeighborCount { requested: 5, available: 4 }));
    }

    #[test]
    fn test_too_many_neighbors_at_query_time() {
        let mut model = ordinary_corners(4).unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        model.params.num_points = 6;
        let err = model
            .predict(Array2::<f64>::zeros((1, 1)).view(), Coordinate::new(0.2, 0.2))
            .unwrap_err();
        assert!(matches!(err, Error::NeighborCount { requested: 6, available: 4 }));
    }

    #[test]
    fn test_neighbor_count_below_method_minimum() {
        for (method, k) in [(KrigingMethod::Ordinary, 1), (KrigingMethod::Universal, 3)] {
            let err =
                LocalRegressionKriging::new(&corners(), ZeroRegressor::default(), params(method, k))
                    .unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{}: {}", method, err);
        }
        let err = ordinary_corners(0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_exact_match_recovers_observation() {
        let (coords, x, z) = scattered(60);
        for method in [KrigingMethod::Ordinary, KrigingMethod::Universal] {
            let mut model =
                LocalRegressionKriging::new(&coords, LinearRegression::new(), params(method, 10))
                    .unwrap();
            model.fit(x.view(), z.view()).unwrap();

            for i in [0, 17, 42] {
                let row = x.slice(ndarray::s![i..i + 1, ..]);
                let pred = model.predict(row, coords[i]).unwrap();
                assert_abs_diff_eq!(pred[0], z[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_refit_is_idempotent() {
        let (coords, x, z) = scattered(30);
        let mut model = LocalRegressionKriging::new(
            &coords,
            LinearRegression::new(),
            params(KrigingMethod::Ordinary, 6),
        )
        .unwrap();
        let target = Coordinate::new(20.0, 31.5);
        let row = array![[140.0]];

        model.fit(x.view(), z.view()).unwrap();
        let residuals = model.residuals().to_vec();
        let first = model.predict(row.view(), target).unwrap();

        model.fit(x.view(), z.view()).unwrap();
        assert_eq!(model.residuals(), residuals.as_slice());
        assert_eq!(model.predict(row.view(), target).unwrap(), first);
    }

    #[test]
    fn test_four_corner_scenario() {
        for method in [KrigingMethod::Ordinary, KrigingMethod::Universal] {
            let mut model =
                LocalRegressionKriging::new(&corners(), ZeroRegressor::default(), params(method, 4))
                    .unwrap();
            model
                .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
                .unwrap();
            assert_eq!(model.residuals(), &[1.0, 2.0, 3.0, 4.0]);

            let pred = model
                .predict(Array2::<f64>::zeros((1, 1)).view(), Coordinate::new(0.0, 0.0))
                .unwrap();
            assert_abs_diff_eq!(pred[0], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_correction_scales_with_residual_magnitude() {
        let mut coords = corners();
        coords.push(Coordinate::new(0.5, 2.0));
        coords.push(Coordinate::new(2.0, 0.7));
        let base = array![1.0, 2.0, 3.0, 4.0, 2.5, 3.3];
        let target = Coordinate::new(0.3, 0.4);
        let x = Array2::<f64>::zeros((6, 1));

        let predict_scaled = |method, variogram_model, factor: f64| {
            let params = LocalRegressionKrigingParams {
                kriging_method: method,
                variogram_model,
                num_points: 6,
            };
            let mut model =
                LocalRegressionKriging::new(&coords, ZeroRegressor::default(), params).unwrap();
            model.fit(x.view(), (&base * factor).view()).unwrap();
            model.correction_at(target).unwrap()
        };

        for method in [KrigingMethod::Ordinary, KrigingMethod::Universal] {
            for variogram_model in [VariogramModel::Linear, VariogramModel::Spherical] {
                let unit = predict_scaled(method, variogram_model, 1.0);
                for factor in [1e-9, 1e-6, 1e3, 1e4, 1e6] {
                    let scaled = predict_scaled(method, variogram_model, factor);
                    assert_relative_eq!(
                        scaled.estimate,
                        unit.estimate * factor,
                        max_relative = 1e-6
                    );
                    assert_relative_eq!(
                        scaled.variance,
                        unit.variance * factor * factor,
                        max_relative = 1e-6
                    );
                }
            }
        }
    }

    #[test]
    fn test_axis_order_is_x_then_y() {
        // (0, 1) carries 2 and (1, 0) carries 3; swapping axes would flip them.
        let mut model = LocalRegressionKriging::new(
            &corners(),
            ZeroRegressor::default(),
            params(KrigingMethod::Ordinary, 4),
        )
        .unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        let x = Array2::<f64>::zeros((1, 1));

        let at_01 = model.predict(x.view(), Coordinate::new(0.0, 1.0)).unwrap();
        let at_10 = model.predict(x.view(), Coordinate::new(1.0, 0.0)).unwrap();
        assert_abs_diff_eq!(at_01[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(at_10[0], 3.0, epsilon = 1e-9);

        // Off-grid: closer to (1, 0) than to (0, 1)
        let near_10 = model.predict(x.view(), Coordinate::new(0.9, 0.2)).unwrap();
        assert!(near_10[0] > 2.5, "expected pull towards 3, got {}", near_10[0]);
    }

    #[test]
    fn test_single_correction_is_broadcast() {
        let (coords, x, z) = scattered(40);
        let mut model = LocalRegressionKriging::new(
            &coords,
            LinearRegression::new(),
            params(KrigingMethod::Ordinary, 8),
        )
        .unwrap();
        model.fit(x.view(), z.view()).unwrap();

        let rows = array![[110.0], [125.0], [140.0]];
        let target = Coordinate::new(12.5, 30.0);
        let result = model.predict_with_variance(rows.view(), target).unwrap();
        let base = model.regressor().predict(rows.view()).unwrap();

        let shifts: Vec<f64> = (0..3).map(|i| result.values[i] - base[i]).collect();
        for s in &shifts {
            assert_abs_diff_eq!(*s, result.correction, epsilon = 1e-9);
        }
        assert!(result.variance >= 0.0);
        assert_eq!(result.neighbors.len(), 8);

        let direct = model.correction_at(target).unwrap();
        assert_abs_diff_eq!(direct.estimate, result.correction, epsilon = 1e-12);
    }

    #[test]
    fn test_neighbors_are_nearest_first() {
        let mut model = LocalRegressionKriging::new(
            &corners(),
            ZeroRegressor::default(),
            params(KrigingMethod::Ordinary, 3),
        )
        .unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        let r = model
            .predict_with_variance(Array2::<f64>::zeros((1, 1)).view(), Coordinate::new(0.9, 0.95))
            .unwrap();
        assert_eq!(r.neighbors[0], 3);
        assert!(!r.neighbors.contains(&0));
    }

    #[test]
    fn test_predict_points_matches_single_predictions() {
        let (coords, x, z) = scattered(50);
        let mut model = LocalRegressionKriging::new(
            &coords,
            LinearRegression::new(),
            params(KrigingMethod::Ordinary, 8),
        )
        .unwrap();
        model.fit(x.view(), z.view()).unwrap();

        let rows = array![[105.0], [120.0], [133.0]];
        let targets = [
            Coordinate::new(5.0, 5.0),
            Coordinate::new(25.0, 40.0),
            Coordinate::new(45.0, 12.0),
        ];
        let batch = model.predict_points(rows.view(), &targets).unwrap();
        for i in 0..3 {
            let single = model
                .predict(rows.slice(ndarray::s![i..i + 1, ..]), targets[i])
                .unwrap();
            assert_abs_diff_eq!(batch[i], single[0], epsilon = 1e-12);
        }

        let err = model.predict_points(rows.view(), &targets[..2]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_local_correction_improves_on_regression() {
        let (coords, x, z) = scattered(120);
        let (train, test) = (0..100, 100..120);

        let mut model = LocalRegressionKriging::new(
            &coords[train.clone()],
            LinearRegression::new(),
            params(KrigingMethod::Ordinary, 12),
        )
        .unwrap();
        model
            .fit(
                x.slice(ndarray::s![train.clone(), ..]),
                z.slice(ndarray::s![train]),
            )
            .unwrap();

        let x_test = x.slice(ndarray::s![test.clone(), ..]);
        let corrected = model.predict_points(x_test, &coords[test.clone()]).unwrap();
        let base = model.regressor().predict(x_test).unwrap();

        let truth = z.slice(ndarray::s![test]);
        let sse = |p: &Array1<f64>| (&truth - p).mapv(|e| e * e).sum();
        assert!(
            sse(&corrected) < sse(&base),
            "corrected {:.3} vs base {:.3}",
            sse(&corrected),
            sse(&base)
        );
    }

    #[test]
    fn test_failed_predict_leaves_state() {
        let mut model = ordinary_corners(4).unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        model.params.num_points = 6;
        let x = Array2::<f64>::zeros((1, 1));
        assert!(model.predict(x.view(), Coordinate::new(0.5, 0.5)).is_err());
        assert!(model.is_trained());
        assert_eq!(model.residuals(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(model.regressor().fits, 1);
    }

    #[test]
    fn test_regressor_predict_failure_untrains() {
        let mut model = LocalRegressionKriging::new(
            &corners(),
            BrokenPredictor::default(),
            params(KrigingMethod::Ordinary, 4),
        )
        .unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        assert!(model.is_trained());

        model.regressor.broken = true;
        let err = model
            .fit(Array2::<f64>::zeros((4, 1)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap_err();
        assert!(matches!(err, Error::Algorithm(_)));
        assert!(!model.is_trained());
    }

    #[test]
    fn test_boxed_regressor() {
        let boxed: Box<dyn Regressor + Send + Sync> = Box::new(MeanRegressor::new());
        let mut model =
            LocalRegressionKriging::new(&corners(), boxed, params(KrigingMethod::Ordinary, 4))
                .unwrap();
        model
            .fit(Array2::<f64>::zeros((4, 0)).view(), array![1.0, 2.0, 3.0, 4.0].view())
            .unwrap();
        assert_eq!(model.residuals(), &[-1.5, -0.5, 0.5, 1.5]);
        let pred = model
            .predict_points(Array2::<f64>::zeros((1, 0)).view(), &[Coordinate::new(1.0, 1.0)])
            .unwrap();
        assert_abs_diff_eq!(pred[0], 4.0, epsilon = 1e-9);
    }
}
