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

//! spaced: a deterministic spaced-repetition review scheduler.
//!
//! The crate provides:
//! - The FSRS memory model (forgetting curve, stability, difficulty)
//! - A four-state review scheduler (New, Learning, Review, Relearning)
//! - Card snapshots and review logs with serde and rusqlite codecs
//! - Tunable parameters loaded from TOML

pub mod cli;
pub mod cmd;
pub mod error;
pub mod fsrs;
pub mod fuzz;
pub mod params;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorReport, Fallible, fail};
pub use params::Parameters;
pub use scheduler::{Scheduler, next_state};
pub use types::card::Card;
pub use types::card_id::CardId;
pub use types::rating::Rating;
pub use types::review::{Preview, ReviewLog, ReviewOutcome};
pub use types::state::State;
pub use types::timestamp::Timestamp;
