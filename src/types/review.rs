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

use serde::Deserialize;
use serde::Serialize;

use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::rating::Rating;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

/// A record of a single review, suitable for appending to a history table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub card_id: CardId,
    pub rating: Rating,
    /// The card's state before the review.
    pub state: State,
    pub elapsed_days: u32,
    pub scheduled_days: u32,
    pub scheduled_minutes: u32,
    pub reviewed_at: Timestamp,
}

/// The result of reviewing a card: the next snapshot and the log entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card: Card,
    pub log: ReviewLog,
}

/// What each rating would do to a card. Used to label the rating buttons.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Preview {
    pub again: Card,
    pub hard: Card,
    pub good: Card,
    pub easy: Card,
}

impl Preview {
    pub fn get(&self, rating: Rating) -> &Card {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}
