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

//! The memory model: forgetting curve, stability and difficulty updates.
//!
//! Everything here is a plain function of its arguments. The weights are
//! passed in rather than read from a global so a caller can tune them.

use crate::types::rating::Rating;

pub type Recall = f64;
pub type Stability = f64;
pub type Difficulty = f64;
/// An interval in days, possibly fractional.
pub type Interval = f64;
pub type Weights = [f64; WEIGHT_COUNT];

pub const WEIGHT_COUNT: usize = 19;

pub const D_MIN: Difficulty = 1.0;
pub const D_MAX: Difficulty = 10.0;

pub const S_MIN: Stability = 0.01;
pub const S_MAX: Stability = 36500.0;

const F: f64 = 19.0 / 81.0;
const C: f64 = -0.5;

pub const DEFAULT_WEIGHTS: Weights = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

/// Probability of recall after `t` days for a card with stability `s`.
pub fn retrievability(t: Interval, s: Stability) -> Recall {
    (1.0 + F * (t / s)).powf(C)
}

/// The number of days after which recall drops to `r_d`.
pub fn interval(r_d: Recall, s: Stability) -> Interval {
    (s / F) * (r_d.powf(1.0 / C) - 1.0)
}

pub fn initial_stability(w: &Weights, rating: Rating) -> Stability {
    let s = match rating {
        Rating::Again => w[0],
        Rating::Hard => w[1],
        Rating::Good => w[2],
        Rating::Easy => w[3],
    };
    clamp_s(s)
}

pub fn initial_difficulty(w: &Weights, rating: Rating) -> Difficulty {
    let g: f64 = rating.into();
    clamp_d(w[4] - f64::exp(w[5] * (g - 1.0)) + 1.0)
}

/// Stability after a successful recall. Never less than `s`.
pub fn recall_stability(
    w: &Weights,
    d: Difficulty,
    s: Stability,
    r: Recall,
    rating: Rating,
) -> Stability {
    let t_d = 11.0 - d;
    let t_s = s.powf(-w[9]);
    let t_r = f64::exp(w[10] * (1.0 - r)) - 1.0;
    let h = if rating == Rating::Hard { w[15] } else { 1.0 };
    let b = if rating == Rating::Easy { w[16] } else { 1.0 };
    let c = f64::exp(w[8]);
    let alpha = 1.0 + t_d * t_s * t_r * h * b * c;
    let next = s * alpha;
    if next.is_finite() {
        next.clamp(s, S_MAX.max(s))
    } else {
        S_MAX.max(s)
    }
}

/// Stability after a lapse. Harder cards, and cards forgotten at lower
/// recall, lose less. The result is at most `s * max_factor`, and is floored
/// at `S_MIN` only when that ceiling allows it.
pub fn lapse_stability(
    w: &Weights,
    d: Difficulty,
    s: Stability,
    r: Recall,
    max_factor: f64,
) -> Stability {
    let d_f = d.powf(w[12]);
    let s_f = (s + 1.0).powf(w[13]) - 1.0;
    let r_f = f64::exp(w[14] * (1.0 - r));
    let next = w[11] * d_f * s_f * r_f;
    let ceiling = s * max_factor;
    if next.is_finite() && next > 0.0 {
        next.min(ceiling).max(S_MIN.min(ceiling))
    } else {
        ceiling
    }
}

/// Stability after a same-day review during the short steps.
pub fn short_term_stability(w: &Weights, s: Stability, rating: Rating) -> Stability {
    let g: f64 = rating.into();
    clamp_s(s * f64::exp(w[17] * (g - 3.0 + w[18])))
}

fn delta_d(w: &Weights, rating: Rating) -> f64 {
    let g: f64 = rating.into();
    -w[6] * (g - 3.0)
}

/// Linear damping: the closer to the maximum, the smaller the step.
fn damped(w: &Weights, d: Difficulty, rating: Rating) -> Difficulty {
    d + delta_d(w, rating) * ((D_MAX - d) / 9.0)
}

/// Difficulty after a review, reverted towards the difficulty of a fresh
/// card rated Good.
pub fn new_difficulty(w: &Weights, d: Difficulty, rating: Rating) -> Difficulty {
    let target = initial_difficulty(w, Rating::Good);
    clamp_d(w[7] * target + (1.0 - w[7]) * clamp_d(damped(w, d, rating)))
}

pub fn clamp_d(d: Difficulty) -> Difficulty {
    if d.is_nan() { D_MAX } else { d.clamp(D_MIN, D_MAX) }
}

pub fn clamp_s(s: Stability) -> Stability {
    if s.is_nan() { S_MIN } else { s.clamp(S_MIN, S_MAX) }
}
