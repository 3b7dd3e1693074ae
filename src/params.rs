// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::DEFAULT_WEIGHTS;
use crate::fsrs::Weights;
use crate::fsrs::interval;

/// Tunable scheduler configuration. Every key is optional in the TOML form;
/// missing keys take the default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// The model weights.
    pub weights: Weights,
    /// The recall probability intervals are chosen to hit.
    pub target_recall: f64,
    /// The minimum review interval in days.
    pub min_interval: u32,
    /// The maximum review interval in days.
    pub max_interval: u32,
    /// Learning short steps, in minutes.
    pub learning_steps: Vec<u32>,
    /// The relearning short step, in minutes.
    pub relearning_step: u32,
    /// Upper bound on the ratio of new to old stability after a lapse.
    pub max_lapse_factor: f64,
    /// Whether to spread review intervals by a few percent.
    pub fuzz: bool,
    /// The relative magnitude of the fuzz.
    pub fuzz_factor: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            target_recall: 0.9,
            min_interval: 1,
            max_interval: 3650,
            learning_steps: vec![1, 10],
            relearning_step: 10,
            max_lapse_factor: 0.9,
            fuzz: true,
            fuzz_factor: 0.05,
        }
    }
}

impl Parameters {
    /// Parse and validate parameters from TOML text.
    pub fn from_toml(text: &str) -> Fallible<Self> {
        let params: Parameters = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate parameters from a TOML file.
    pub fn load(path: &Path) -> Fallible<Self> {
        log::debug!("Loading parameters from {}", path.display());
        let text = read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Fallible<()> {
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite()) {
            return fail(format!("weights must be finite, found {w}"));
        }
        if self.weights[..4].iter().any(|w| *w <= 0.0) {
            return fail("the first four weights (initial stabilities) must be positive");
        }
        if !(self.target_recall > 0.0 && self.target_recall < 1.0) {
            return fail(format!(
                "target_recall must be between 0 and 1, found {}",
                self.target_recall
            ));
        }
        if self.min_interval == 0 {
            return fail("min_interval must be at least one day");
        }
        if self.min_interval > self.max_interval {
            return fail(format!(
                "min_interval ({}) exceeds max_interval ({})",
                self.min_interval, self.max_interval
            ));
        }
        if self.learning_steps.is_empty() {
            return fail("learning_steps must not be empty");
        }
        if self.learning_steps.contains(&0) {
            return fail("learning_steps must be positive");
        }
        if self.relearning_step == 0 {
            return fail("relearning_step must be positive");
        }
        if !(self.max_lapse_factor > 0.0 && self.max_lapse_factor < 1.0) {
            return fail(format!(
                "max_lapse_factor must be between 0 and 1, found {}",
                self.max_lapse_factor
            ));
        }
        if !(0.0..0.5).contains(&self.fuzz_factor) {
            return fail(format!(
                "fuzz_factor must be in [0, 0.5), found {}",
                self.fuzz_factor
            ));
        }
        Ok(())
    }

    /// Days per unit of stability at the target recall. Exactly 1 at 90%.
    pub fn interval_factor(&self) -> f64 {
        interval(self.target_recall, 1.0)
    }
}
