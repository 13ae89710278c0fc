//! Stepped multidirectional search runner driven by a JS objective.

use fintab_core::optimization::{
    MultidirectionalSearch, SearchSettings, SearchStatistics, StepLimitController,
};
use fintab_core::traits::OptimizationController;
use js_sys::{Float64Array, Function};
use nalgebra::DVector;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct SearchProgress {
    done: bool,
    steps: usize,
    step_size: f64,
    best_value: Option<f64>,
}

#[derive(Serialize)]
struct SearchResult {
    point: Vec<f64>,
    value: Option<f64>,
    evaluations: usize,
    statistics: SearchStatistics,
}

/// WASM-exported optimizer that runs a batch of steps per call so the UI can
/// report progress between batches.
#[wasm_bindgen]
pub struct WasmSearchRunner {
    search: Option<MultidirectionalSearch>,
    objective: Function,
    controller: StepLimitController,
    done: bool,
}

#[wasm_bindgen]
impl WasmSearchRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial_point: Vec<f64>,
        settings_val: JsValue,
        max_steps: u32,
        min_step_size: f64,
        objective: Function,
    ) -> Result<WasmSearchRunner, JsValue> {
        console_error_panic_hook::set_once();

        let settings: SearchSettings = if settings_val.is_undefined() || settings_val.is_null() {
            SearchSettings::default()
        } else {
            from_value(settings_val)
                .map_err(|e| JsValue::from_str(&format!("Invalid search settings: {}", e)))?
        };

        let search = MultidirectionalSearch::new(&initial_point, settings)
            .map_err(|e| JsValue::from_str(&format!("{}", e)))?;

        Ok(WasmSearchRunner {
            search: Some(search),
            objective,
            controller: StepLimitController::new(max_steps as usize, min_step_size),
            done: false,
        })
    }

    pub fn is_done(&self) -> bool {
        self.search.is_none() || self.done
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let search = self
            .search
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        let function = &self.objective;
        let mut objective = |x: &[f64]| -> anyhow::Result<f64> {
            let arg = JsValue::from(Float64Array::from(x));
            let value = function
                .call1(&JsValue::NULL, &arg)
                .map_err(|e| anyhow::anyhow!("Objective threw: {:?}", e))?;
            value
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("Objective must return a number."))
        };

        for _ in 0..batch_size {
            if self.done {
                break;
            }
            let step = match search.step(&mut objective) {
                Ok(step) => step,
                Err(e) => {
                    self.done = true;
                    return Err(JsValue::from_str(&format!("Search step failed: {:#}", e)));
                }
            };
            let keep_going = self.controller.step_taken(
                &DVector::from_column_slice(&step.previous_point),
                step.previous_value,
                &DVector::from_column_slice(&step.best_point),
                step.best_value,
                step.step_size,
            );
            self.done = !keep_going;
        }

        self.get_progress()
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let search = self
            .search
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;

        let progress = SearchProgress {
            done: self.done,
            steps: self.controller.steps(),
            step_size: search.step_size(),
            best_value: search.optimum_value(),
        };

        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        let search = self
            .search
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;

        let result = SearchResult {
            point: search.optimum_point().as_slice().to_vec(),
            value: search.optimum_value(),
            evaluations: search.cache().evaluations(),
            statistics: search.statistics(),
        };

        to_value(&result).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
