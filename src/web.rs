//! WebAssembly binding for the browser front end
//!
//! The page owns the animation loop, sliders and canvas. It calls `tick`
//! from `requestAnimationFrame` and draws the returned JSON frame.

use wasm_bindgen::prelude::*;

use crate::params::ParameterSet;
use crate::sim::{Orchestrator, RunConfig, RunMode, WorldBounds};
use crate::stats::AggregateStats;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser-facing simulation handle
#[wasm_bindgen]
pub struct WasmCoinToss {
    inner: Orchestrator,
}

#[wasm_bindgen]
impl WasmCoinToss {
    /// Create a simulator for a world of `width` x `height` meters
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WasmCoinToss {
        console_error_panic_hook::set_once();
        // Already initialised when a second handle is created
        let _ = console_log::init_with_level(log::Level::Info);

        let config = RunConfig {
            bounds: WorldBounds { width, height },
            ..Default::default()
        };
        log::info!("Coin toss simulator ready ({}m x {}m)", width, height);
        Self {
            inner: Orchestrator::new(config),
        }
    }

    fn start(&mut self, mode: RunMode, params_json: &str) -> Result<u64, JsValue> {
        let params = ParameterSet::from_json(params_json).map_err(js_err)?;
        let handle = self.inner.start_run(mode, params).map_err(js_err)?;
        Ok(handle.0)
    }

    /// Start one toss. Returns the run id.
    pub fn start_single(&mut self, params_json: &str) -> Result<u64, JsValue> {
        self.start(RunMode::Single, params_json)
    }

    /// Start `count` tosses in sequence
    pub fn start_batch(&mut self, params_json: &str, count: u32) -> Result<u64, JsValue> {
        self.start(RunMode::BatchOf(count), params_json)
    }

    /// Start a divergence ensemble
    pub fn start_divergence(
        &mut self,
        params_json: &str,
        count: u32,
        perturbation: f32,
    ) -> Result<u64, JsValue> {
        self.start(
            RunMode::Divergence {
                count,
                perturbation,
            },
            params_json,
        )
    }

    /// Advance by the frame's elapsed seconds. Returns the frame as JSON.
    pub fn tick(&mut self, dt: f32) -> Result<String, JsValue> {
        let frame = self.inner.tick(dt);
        serde_json::to_string(&frame).map_err(js_err)
    }

    /// Events emitted since the last call, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.drain_events()).map_err(js_err)
    }

    pub fn abort(&mut self) -> bool {
        self.inner.abort()
    }

    pub fn is_running(&self) -> bool {
        self.inner.phase() == crate::sim::RunPhase::Running
    }

    pub fn stats(&self) -> Result<String, JsValue> {
        self.inner.aggregate_stats().to_json().map_err(js_err)
    }

    /// Restore counters the page saved earlier (e.g. in LocalStorage)
    pub fn restore_stats(&mut self, stats_json: &str) -> Result<(), JsValue> {
        let stats = AggregateStats::from_json(stats_json).map_err(js_err)?;
        self.inner.restore_aggregate_stats(stats);
        Ok(())
    }

    pub fn clear_stats(&mut self) {
        self.inner.clear_aggregate_stats();
    }

    /// Slider ranges and defaults as JSON
    pub fn parameter_ranges() -> Result<String, JsValue> {
        serde_json::to_string(&ParameterSet::ranges()).map_err(js_err)
    }
}
