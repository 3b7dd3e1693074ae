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

use crate::fsrs::DEFAULT_WEIGHTS;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::fsrs::initial_difficulty;
use crate::fsrs::initial_stability;
use crate::types::card_id::CardId;
use crate::types::rating::Rating;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

/// A card's memory-model snapshot. The scheduler never mutates one; it
/// returns the next snapshot and the caller persists it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub state: State,
    /// Days until recall probability decays to 90%.
    pub stability: Stability,
    /// In `[1, 10]`.
    pub difficulty: Difficulty,
    /// Days since the review before the last one, as of the last review.
    pub elapsed_days: u32,
    /// The interval in days chosen at the last review. Zero while the card
    /// is on a short step.
    pub scheduled_days: u32,
    /// The short step in minutes chosen at the last review. Zero once the
    /// card is in Review.
    #[serde(default)]
    pub scheduled_minutes: u32,
    /// Successful (non-Again) reviews. Never decremented.
    pub reps: u32,
    /// Times the card was forgotten while in Review.
    #[serde(default)]
    pub lapses: u32,
    /// Index of the current learning step.
    #[serde(default)]
    pub step: u32,
    pub last_review: Option<Timestamp>,
}

impl Card {
    /// A card that has never been reviewed. Stability and difficulty hold
    /// seed values; the first review replaces them.
    pub fn new(id: CardId) -> Self {
        Self {
            id,
            state: State::New,
            stability: initial_stability(&DEFAULT_WEIGHTS, Rating::Good),
            difficulty: initial_difficulty(&DEFAULT_WEIGHTS, Rating::Good),
            elapsed_days: 0,
            scheduled_days: 0,
            scheduled_minutes: 0,
            reps: 0,
            lapses: 0,
            step: 0,
            last_review: None,
        }
    }

    /// When the card should next be shown. `None` for a card that has never
    /// been reviewed, which is due immediately.
    pub fn due(&self) -> Option<Timestamp> {
        let last_review = self.last_review?;
        if self.scheduled_minutes > 0 {
            Some(last_review.plus_minutes(self.scheduled_minutes))
        } else {
            Some(last_review.plus_days(self.scheduled_days))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_new_card() {
        let card = Card::new(CardId::from_content("Q: capital of France?"));
        assert_eq!(card.state, State::New);
        assert!(card.stability > 0.0);
        assert!((1.0..=10.0).contains(&card.difficulty));
        assert_eq!(card.reps, 0);
        assert_eq!(card.last_review, None);
        assert_eq!(card.due(), None);
    }

    #[test]
    fn test_due() -> Fallible<()> {
        let now = Timestamp::parse("2025-06-01T08:00:00Z")?;
        let mut card = Card::new(CardId::from_content("due"));
        card.last_review = Some(now);
        card.scheduled_minutes = 10;
        assert_eq!(card.due(), Some(Timestamp::parse("2025-06-01T08:10:00Z")?));
        card.scheduled_minutes = 0;
        card.scheduled_days = 3;
        assert_eq!(card.due(), Some(Timestamp::parse("2025-06-04T08:00:00Z")?));
        Ok(())
    }

    #[test]
    fn test_json() -> Fallible<()> {
        let json = r#"{
            "id": "4878ca0425c739fa427f7eda20fe845f6b2e46ba5fe2a14df5b1e32f50603215",
            "state": 2,
            "stability": 10.0,
            "difficulty": 5.0,
            "elapsedDays": 10,
            "scheduledDays": 10,
            "reps": 3,
            "lastReview": "2025-01-01T00:00:00Z"
        }"#;
        let card: Card = serde_json::from_str(json)?;
        assert_eq!(card.state, State::Review);
        assert_eq!(card.lapses, 0);
        assert_eq!(card.scheduled_minutes, 0);
        let out = serde_json::to_value(&card)?;
        assert_eq!(out["state"], "review");
        assert_eq!(out["elapsedDays"], 10);
        Ok(())
    }

    #[test]
    fn test_json_rejects_unknown_state() {
        let json = r#"{
            "id": "4878ca0425c739fa427f7eda20fe845f6b2e46ba5fe2a14df5b1e32f50603215",
            "state": 9,
            "stability": 10.0,
            "difficulty": 5.0,
            "elapsedDays": 0,
            "scheduledDays": 0,
            "reps": 0,
            "lastReview": null
        }"#;
        assert!(serde_json::from_str::<Card>(json).is_err());
    }
}
