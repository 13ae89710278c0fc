//! Multidirectional pattern search (Dennis and Torczon).
//!
//! The search keeps a simplex sorted by objective value with the best vertex
//! first. Each step reflects the simplex through the best vertex; if no
//! reflected point improves, the simplex is contracted toward the best vertex
//! and the step size halved. Expansion and coordinate search are optional
//! extras, off by default since most objectives here are bounded.

use crate::search_pattern::square;
use crate::traits::OptimizationController;
use anyhow::{bail, Context, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchSettings {
    pub initial_step: f64,
    pub use_expansion: bool,
    pub use_coordinate_search: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            initial_step: 0.5,
            use_expansion: false,
            use_coordinate_search: false,
        }
    }
}

/// Counters describing how each step of a search was resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    pub step_count: usize,
    pub reflection_acceptance: usize,
    pub expansion_acceptance: usize,
    pub coordinate_acceptance: usize,
    pub reduction_fallback: usize,
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultidirectionalSearch[step_count={}, reflection_acceptance={}, \
             expansion_acceptance={}, coordinate_acceptance={}, reduction_fallback={}]",
            self.step_count,
            self.reflection_acceptance,
            self.expansion_acceptance,
            self.coordinate_acceptance,
            self.reduction_fallback
        )
    }
}

/// Outcome of a single search step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStep {
    pub previous_point: Vec<f64>,
    pub previous_value: f64,
    pub best_point: Vec<f64>,
    pub best_value: f64,
    pub step_size: f64,
}

/// Memoised objective values keyed by the exact bit pattern of each point.
#[derive(Debug, Clone, Default)]
pub struct FunctionCache {
    values: HashMap<Vec<u64>, f64>,
    evaluations: usize,
}

impl FunctionCache {
    pub fn get(&self, point: &DVector<f64>) -> Option<f64> {
        self.values.get(&cache_key(point)).copied()
    }

    /// Number of objective calls made through this cache.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn value<F>(&mut self, point: &DVector<f64>, objective: &mut F) -> Result<f64>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        let key = cache_key(point);
        if let Some(value) = self.values.get(&key) {
            return Ok(*value);
        }
        let value = objective(point.as_slice())
            .with_context(|| format!("Objective evaluation failed at {:?}.", point.as_slice()))?;
        self.evaluations += 1;
        self.values.insert(key, value);
        Ok(value)
    }
}

fn cache_key(point: &DVector<f64>) -> Vec<u64> {
    point.iter().map(|v| v.to_bits()).collect()
}

pub struct MultidirectionalSearch {
    settings: SearchSettings,
    pattern: Vec<DVector<f64>>,
    simplex: Vec<DVector<f64>>,
    step: f64,
    simplex_computed: bool,
    cache: FunctionCache,
    statistics: SearchStatistics,
}

impl MultidirectionalSearch {
    pub fn new(initial: &[f64], settings: SearchSettings) -> Result<Self> {
        if initial.is_empty() {
            bail!("Initial point must have at least one dimension.");
        }
        if initial.iter().any(|v| !v.is_finite()) {
            bail!("Initial point must be finite.");
        }
        if !(settings.initial_step > 0.0 && settings.initial_step.is_finite()) {
            bail!("initial_step must be positive.");
        }

        let pattern = square(initial.len())?;
        let start = DVector::from_column_slice(initial);
        let simplex = build_simplex(&start, &pattern, settings.initial_step);
        info!(
            dim = initial.len(),
            step = settings.initial_step,
            "starting multidirectional search"
        );

        Ok(Self {
            settings,
            pattern,
            simplex,
            step: settings.initial_step,
            simplex_computed: false,
            cache: FunctionCache::default(),
            statistics: SearchStatistics::default(),
        })
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    pub fn simplex(&self) -> &[DVector<f64>] {
        &self.simplex
    }

    /// Best vertex found so far.
    pub fn optimum_point(&self) -> &DVector<f64> {
        &self.simplex[0]
    }

    /// Objective value at [`Self::optimum_point`], once evaluated.
    pub fn optimum_value(&self) -> Option<f64> {
        self.cache.get(self.optimum_point())
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.statistics
    }

    pub fn reset_statistics(&mut self) {
        self.statistics = SearchStatistics::default();
    }

    pub fn cache(&self) -> &FunctionCache {
        &self.cache
    }

    /// Performs one reflect/expand/contract step.
    pub fn step<F>(&mut self, objective: &mut F) -> Result<SearchStep>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        self.statistics.step_count += 1;

        if !self.simplex_computed {
            self.sort_simplex(objective)?;
            self.simplex_computed = true;
        }

        let current = self.simplex[0].clone();
        let current_value = self.cache.value(&current, objective)?;

        let reflection = reflect(&self.simplex);
        if self.accept(&reflection, current_value, objective)? {
            let expansion = self.settings.use_expansion.then(|| expand(&self.simplex));
            self.replace_simplex(&current, reflection, objective)?;

            let mut expanded = false;
            if let Some(expansion) = expansion {
                if self.accept(&expansion, current_value, objective)? {
                    debug!("expansion accepted");
                    self.replace_simplex(&current, expansion, objective)?;
                    self.step *= 2.0;
                    self.statistics.expansion_acceptance += 1;
                    expanded = true;
                }
            }
            if !expanded {
                debug!("reflection accepted");
                self.statistics.reflection_acceptance += 1;
            }
        } else {
            halve(&mut self.simplex);
            self.simplex_computed = false;

            let coordinate_hit = if self.settings.use_coordinate_search {
                let directions = coordinate_search(&current, self.step);
                self.accept(&directions, current_value, objective)?
            } else {
                false
            };

            if coordinate_hit {
                debug!("coordinate search accepted, resetting simplex");
                self.simplex = build_simplex(&current, &self.pattern, self.step);
                self.statistics.coordinate_acceptance += 1;
            } else {
                debug!(step = self.step / 2.0, "reflection failed, halving step");
                self.step /= 2.0;
                self.statistics.reduction_fallback += 1;
            }
        }

        let best = self.simplex[0].clone();
        let best_value = self.cache.value(&best, objective)?;

        Ok(SearchStep {
            previous_point: current.as_slice().to_vec(),
            previous_value: current_value,
            best_point: best.as_slice().to_vec(),
            best_value,
            step_size: self.step,
        })
    }

    /// Steps until the controller asks to stop.
    pub fn optimize<F, C>(&mut self, objective: &mut F, controller: &mut C) -> Result<()>
    where
        F: FnMut(&[f64]) -> Result<f64>,
        C: OptimizationController,
    {
        loop {
            let step = self.step(objective)?;
            let keep_going = controller.step_taken(
                &DVector::from_column_slice(&step.previous_point),
                step.previous_value,
                &DVector::from_column_slice(&step.best_point),
                step.best_value,
                step.step_size,
            );
            if !keep_going {
                break;
            }
        }

        info!(
            point = ?self.optimum_point().as_slice(),
            value = ?self.optimum_value(),
            statistics = %self.statistics,
            "finished multidirectional search"
        );
        Ok(())
    }

    fn accept<F>(
        &mut self,
        points: &[DVector<f64>],
        current_value: f64,
        objective: &mut F,
    ) -> Result<bool>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        for point in points {
            if self.cache.value(point, objective)? < current_value {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn replace_simplex<F>(
        &mut self,
        current: &DVector<f64>,
        others: Vec<DVector<f64>>,
        objective: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        let mut candidate = Vec::with_capacity(others.len() + 1);
        candidate.push(current.clone());
        candidate.extend(others);
        self.simplex = self.sorted_by_value(candidate, objective)?;
        Ok(())
    }

    fn sort_simplex<F>(&mut self, objective: &mut F) -> Result<()>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        self.simplex = self.sorted_by_value(self.simplex.clone(), objective)?;
        Ok(())
    }

    /// Orders points best first. The simplex is left untouched on error.
    fn sorted_by_value<F>(
        &mut self,
        points: Vec<DVector<f64>>,
        objective: &mut F,
    ) -> Result<Vec<DVector<f64>>>
    where
        F: FnMut(&[f64]) -> Result<f64>,
    {
        let mut values = Vec::with_capacity(points.len());
        for point in &points {
            values.push(self.cache.value(point, objective)?);
        }
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let mut slots: Vec<Option<DVector<f64>>> = points.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }
}

fn build_simplex(center: &DVector<f64>, pattern: &[DVector<f64>], step: f64) -> Vec<DVector<f64>> {
    let mut simplex = Vec::with_capacity(pattern.len() + 1);
    simplex.push(center.clone());
    simplex.extend(pattern.iter().map(|p| center + p * step));
    simplex
}

/// 2c - p for every non-best vertex p.
fn reflect(simplex: &[DVector<f64>]) -> Vec<DVector<f64>> {
    let current = &simplex[0];
    simplex[1..].iter().map(|p| current * 2.0 - p).collect()
}

/// 3c - 2p for every non-best vertex p.
fn expand(simplex: &[DVector<f64>]) -> Vec<DVector<f64>> {
    let current = &simplex[0];
    simplex[1..].iter().map(|p| current * 3.0 - p * 2.0).collect()
}

fn halve(simplex: &mut [DVector<f64>]) {
    let current = simplex[0].clone();
    for p in simplex[1..].iter_mut() {
        *p = (&*p + &current) * 0.5;
    }
}

fn coordinate_search(current: &DVector<f64>, step: f64) -> Vec<DVector<f64>> {
    let mut points = Vec::with_capacity(current.len() * 2);
    for i in 0..current.len() {
        let mut offset = DVector::zeros(current.len());
        offset[i] = step;
        points.push(current + &offset);
        points.push(current - &offset);
    }
    points
}

/// Stops after a fixed number of steps or once the step size is small enough.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepLimitController {
    pub max_steps: usize,
    pub min_step_size: f64,
    #[serde(skip)]
    steps: usize,
}

impl StepLimitController {
    pub fn new(max_steps: usize, min_step_size: f64) -> Self {
        Self {
            max_steps,
            min_step_size,
            steps: 0,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Default for StepLimitController {
    fn default() -> Self {
        Self::new(1000, 1e-6)
    }
}

impl OptimizationController for StepLimitController {
    fn step_taken(
        &mut self,
        _old_point: &DVector<f64>,
        _old_value: f64,
        _new_point: &DVector<f64>,
        _new_value: f64,
        step_size: f64,
    ) -> bool {
        self.steps += 1;
        self.steps < self.max_steps && step_size >= self.min_step_size
    }
}
