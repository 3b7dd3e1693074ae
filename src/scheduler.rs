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

//! The review scheduler.
//!
//! A review takes a card snapshot, a rating and the current time, and
//! returns the next snapshot. There is no I/O and no shared state, so a
//! `Scheduler` can be used from any number of threads at once. Callers must
//! serialise the load-review-store cycle for a given card themselves (a
//! transaction or a version check), otherwise two concurrent reviews of the
//! same card will race.

use crate::error::Fallible;
use crate::error::fail;
use crate::fsrs::D_MAX;
use crate::fsrs::D_MIN;
use crate::fsrs::Recall;
use crate::fsrs::S_MAX;
use crate::fsrs::initial_difficulty;
use crate::fsrs::initial_stability;
use crate::fsrs::lapse_stability;
use crate::fsrs::new_difficulty;
use crate::fsrs::recall_stability;
use crate::fsrs::retrievability;
use crate::fsrs::short_term_stability;
use crate::fuzz::fuzz_interval;
use crate::params::Parameters;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::review::Preview;
use crate::types::review::ReviewLog;
use crate::types::review::ReviewOutcome;
use crate::types::state::State;
use crate::types::timestamp::Timestamp;

/// Review a card with the default parameters.
pub fn next_state(card: &Card, rating: Rating, now: Timestamp) -> Fallible<Card> {
    Scheduler::default().next_state(card, rating, now)
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    params: Parameters,
}

impl Scheduler {
    pub fn new(params: Parameters) -> Fallible<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// The card's snapshot after being reviewed with `rating` at `now`.
    pub fn next_state(&self, card: &Card, rating: Rating, now: Timestamp) -> Fallible<Card> {
        Ok(self.review(card, rating, now)?.card)
    }

    /// Like [`Scheduler::next_state`], but also returns the log entry.
    pub fn review(&self, card: &Card, rating: Rating, now: Timestamp) -> Fallible<ReviewOutcome> {
        let elapsed_days = self.validate(card, now)?;
        let w = &self.params.weights;

        let mut next = card.clone();
        next.elapsed_days = elapsed_days;
        next.last_review = Some(now);
        next.scheduled_days = 0;
        next.scheduled_minutes = 0;
        if rating != Rating::Again {
            next.reps = card.reps.saturating_add(1);
        }

        match card.state {
            State::New => {
                next.stability = initial_stability(w, rating);
                next.difficulty = initial_difficulty(w, rating);
                self.advance_learning(&mut next, 0, rating);
            }
            State::Learning => {
                next.stability = short_term_stability(w, card.stability, rating);
                next.difficulty = new_difficulty(w, card.difficulty, rating);
                self.advance_learning(&mut next, card.step, rating);
            }
            State::Review => {
                let r = retrievability(f64::from(elapsed_days), card.stability);
                next.difficulty = new_difficulty(w, card.difficulty, rating);
                match rating {
                    Rating::Again => {
                        next.stability = lapse_stability(
                            w,
                            card.difficulty,
                            card.stability,
                            r,
                            self.params.max_lapse_factor,
                        );
                        next.lapses = card.lapses.saturating_add(1);
                        self.relearn(&mut next);
                    }
                    Rating::Hard | Rating::Good | Rating::Easy => {
                        next.stability =
                            recall_stability(w, card.difficulty, card.stability, r, rating);
                        self.graduate(&mut next);
                    }
                }
            }
            State::Relearning => {
                next.stability = short_term_stability(w, card.stability, rating);
                next.difficulty = new_difficulty(w, card.difficulty, rating);
                match rating {
                    Rating::Again => self.relearn(&mut next),
                    Rating::Hard | Rating::Good | Rating::Easy => self.graduate(&mut next),
                }
            }
        }

        let diff_percent = ((next.difficulty - D_MIN) / (D_MAX - D_MIN)) * 100.0;
        log::debug!(
            "{} {} {}->{} S={:.2}d D={:.2}% days={} minutes={}",
            &card.id.to_hex()[..8],
            rating,
            card.state,
            next.state,
            next.stability,
            diff_percent,
            next.scheduled_days,
            next.scheduled_minutes
        );

        let log = ReviewLog {
            card_id: card.id,
            rating,
            state: card.state,
            elapsed_days,
            scheduled_days: next.scheduled_days,
            scheduled_minutes: next.scheduled_minutes,
            reviewed_at: now,
        };
        Ok(ReviewOutcome { card: next, log })
    }

    /// The outcome of every rating, without committing to any of them.
    pub fn preview(&self, card: &Card, now: Timestamp) -> Fallible<Preview> {
        Ok(Preview {
            again: self.next_state(card, Rating::Again, now)?,
            hard: self.next_state(card, Rating::Hard, now)?,
            good: self.next_state(card, Rating::Good, now)?,
            easy: self.next_state(card, Rating::Easy, now)?,
        })
    }

    /// The predicted probability of recalling the card at `now`. `None` for a
    /// card that has never been reviewed.
    pub fn retrievability(&self, card: &Card, now: Timestamp) -> Fallible<Option<Recall>> {
        let elapsed_days = self.validate(card, now)?;
        match card.state {
            State::New => Ok(None),
            State::Learning | State::Review | State::Relearning => Ok(Some(retrievability(
                f64::from(elapsed_days),
                card.stability,
            ))),
        }
    }

    /// Reject malformed snapshots. Returns the whole days since the last
    /// review.
    fn validate(&self, card: &Card, now: Timestamp) -> Fallible<u32> {
        if let Some(last_review) = card.last_review {
            if now < last_review {
                return fail(format!(
                    "review time {now} precedes the last review at {last_review}"
                ));
            }
        }
        match card.state {
            State::New => {}
            State::Learning | State::Review | State::Relearning => {
                if card.last_review.is_none() {
                    return fail(format!("{} card has no last review", card.state));
                }
                // A lapse from the floor lands below S_MIN, so only zero is
                // excluded here.
                if !(card.stability > 0.0 && card.stability <= S_MAX) {
                    return fail(format!(
                        "stability must be within (0, {S_MAX}], found {}",
                        card.stability
                    ));
                }
                if !(D_MIN..=D_MAX).contains(&card.difficulty) {
                    return fail(format!(
                        "difficulty must be within [{D_MIN}, {D_MAX}], found {}",
                        card.difficulty
                    ));
                }
            }
        }
        if card.state == State::Learning && card.step as usize >= self.params.learning_steps.len()
        {
            return fail(format!(
                "learning step {} is out of range ({} steps configured)",
                card.step,
                self.params.learning_steps.len()
            ));
        }
        let elapsed = match card.last_review {
            Some(last_review) => now.days_since(last_review),
            None => 0,
        };
        Ok(u32::try_from(elapsed).unwrap_or(u32::MAX))
    }

    /// Move a New or Learning card through the learning steps. `step` is the
    /// step the card was on.
    fn advance_learning(&self, next: &mut Card, step: u32, rating: Rating) {
        let steps = &self.params.learning_steps;
        match rating {
            Rating::Again => {
                next.state = State::Learning;
                next.step = 0;
                next.scheduled_minutes = steps[0];
            }
            Rating::Hard | Rating::Good => {
                let passed = step as usize + 1;
                if passed >= steps.len() {
                    self.graduate(next);
                } else {
                    next.state = State::Learning;
                    next.step = passed as u32;
                    next.scheduled_minutes = match rating {
                        Rating::Hard => midpoint(steps[passed - 1], steps[passed]),
                        _ => steps[passed],
                    };
                }
            }
            Rating::Easy => self.graduate(next),
        }
    }

    fn relearn(&self, next: &mut Card) {
        next.state = State::Relearning;
        next.step = 0;
        next.scheduled_days = 0;
        next.scheduled_minutes = self.params.relearning_step;
    }

    fn graduate(&self, next: &mut Card) {
        next.state = State::Review;
        next.step = 0;
        next.scheduled_minutes = 0;
        next.scheduled_days = self.review_interval(next);
    }

    /// The review interval in days for the card's (already updated)
    /// stability.
    fn review_interval(&self, next: &Card) -> u32 {
        let p = &self.params;
        let min = p.min_interval;
        let max = p.max_interval;
        let days = (next.stability * p.interval_factor()).round();
        let days = days.clamp(f64::from(min), f64::from(max)) as u32;
        if p.fuzz {
            let review_index = next.reps.saturating_add(next.lapses);
            fuzz_interval(days, next.id, review_index, p.fuzz_factor).clamp(min, max)
        } else {
            days
        }
    }
}

fn midpoint(a: u32, b: u32) -> u32 {
    ((u64::from(a) + u64::from(b)) / 2) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::card_id::CardId;

    fn no_fuzz() -> Scheduler {
        Scheduler {
            params: Parameters {
                fuzz: false,
                ..Parameters::default()
            },
        }
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn review_card(last_review: &str) -> Card {
        Card {
            state: State::Review,
            stability: 10.0,
            difficulty: 5.0,
            elapsed_days: 10,
            scheduled_days: 10,
            reps: 3,
            last_review: Some(ts(last_review)),
            ..Card::new(CardId::from_content("review card"))
        }
    }

    #[test]
    fn test_new_card_again_learns() -> Fallible<()> {
        let now = ts("2025-01-01T00:00:00Z");
        let card = Card::new(CardId::from_content("new"));
        let next = no_fuzz().next_state(&card, Rating::Again, now)?;
        assert_eq!(next.state, State::Learning);
        assert_eq!(next.scheduled_minutes, 1);
        assert_eq!(next.scheduled_days, 0);
        assert_eq!(next.reps, 0);
        assert_eq!(next.last_review, Some(now));
        Ok(())
    }

    #[test]
    fn test_new_card_short_steps() -> Fallible<()> {
        let now = ts("2025-01-01T00:00:00Z");
        let card = Card::new(CardId::from_content("new"));
        let s = no_fuzz();
        let hard = s.next_state(&card, Rating::Hard, now)?;
        let good = s.next_state(&card, Rating::Good, now)?;
        assert_eq!(hard.state, State::Learning);
        assert_eq!(good.state, State::Learning);
        assert_eq!(hard.scheduled_minutes, 5);
        assert_eq!(good.scheduled_minutes, 10);
        assert_eq!(hard.step, 1);
        assert_eq!(good.step, 1);
        assert!(hard.difficulty > good.difficulty);
        Ok(())
    }

    #[test]
    fn test_new_card_easy_graduates() -> Fallible<()> {
        let now = ts("2025-01-01T00:00:00Z");
        let card = Card::new(CardId::from_content("new"));
        let next = no_fuzz().next_state(&card, Rating::Easy, now)?;
        assert_eq!(next.state, State::Review);
        assert_eq!(next.scheduled_days, 16);
        assert_eq!(next.scheduled_minutes, 0);
        assert_eq!(next.reps, 1);
        Ok(())
    }

    #[test]
    fn test_learning_graduates_after_final_step() -> Fallible<()> {
        let s = no_fuzz();
        let card = Card::new(CardId::from_content("steps"));
        let t0 = ts("2025-01-01T00:00:00Z");
        let card = s.next_state(&card, Rating::Good, t0)?;
        assert_eq!(card.state, State::Learning);
        let t1 = card.due().unwrap();
        let card = s.next_state(&card, Rating::Good, t1)?;
        assert_eq!(card.state, State::Review);
        assert!(card.scheduled_days >= 1);
        assert_eq!(card.elapsed_days, 0);
        assert_eq!(card.reps, 2);
        Ok(())
    }

    #[test]
    fn test_learning_again_restarts() -> Fallible<()> {
        let s = no_fuzz();
        let t0 = ts("2025-01-01T00:00:00Z");
        let card = s.next_state(&Card::new(CardId::from_content("x")), Rating::Good, t0)?;
        assert_eq!(card.step, 1);
        let again = s.next_state(&card, Rating::Again, card.due().unwrap())?;
        assert_eq!(again.state, State::Learning);
        assert_eq!(again.step, 0);
        assert_eq!(again.scheduled_minutes, 1);
        assert!(again.stability < card.stability);
        Ok(())
    }

    #[test]
    fn test_review_good() -> Fallible<()> {
        let card = review_card("2025-01-01T00:00:00Z");
        let next = no_fuzz().next_state(&card, Rating::Good, ts("2025-01-11T00:00:00Z"))?;
        assert_eq!(next.state, State::Review);
        assert!(next.stability > 10.0);
        assert_eq!(next.scheduled_days, 33);
        assert_eq!(next.elapsed_days, 10);
        assert_eq!(next.reps, 4);
        Ok(())
    }

    #[test]
    fn test_review_hard_and_easy_differ_from_good() -> Fallible<()> {
        let card = review_card("2025-01-01T00:00:00Z");
        let preview = no_fuzz().preview(&card, ts("2025-01-11T00:00:00Z"))?;
        assert!(preview.hard.scheduled_days < preview.good.scheduled_days);
        assert!(preview.good.scheduled_days < preview.easy.scheduled_days);
        assert!(preview.hard.stability >= card.stability);
        assert_eq!(preview.get(Rating::Again).state, State::Relearning);
        Ok(())
    }

    #[test]
    fn test_review_again_lapses() -> Fallible<()> {
        let card = review_card("2025-01-01T00:00:00Z");
        let next = no_fuzz().next_state(&card, Rating::Again, ts("2025-01-11T00:00:00Z"))?;
        assert_eq!(next.state, State::Relearning);
        assert!(next.stability < 10.0);
        assert_eq!(next.scheduled_days, 0);
        assert_eq!(next.scheduled_minutes, 10);
        assert_eq!(next.reps, 3);
        assert_eq!(next.lapses, 1);
        Ok(())
    }

    #[test]
    fn test_relearning() -> Fallible<()> {
        let s = no_fuzz();
        let card = review_card("2025-01-01T00:00:00Z");
        let lapsed = s.next_state(&card, Rating::Again, ts("2025-01-11T00:00:00Z"))?;
        let due = lapsed.due().unwrap();
        let again = s.next_state(&lapsed, Rating::Again, due)?;
        assert_eq!(again.state, State::Relearning);
        assert_eq!(again.lapses, 1);
        let back = s.next_state(&lapsed, Rating::Hard, due)?;
        assert_eq!(back.state, State::Review);
        assert!(back.scheduled_days >= 1);
        assert!(back.stability < card.stability);
        Ok(())
    }

    #[test]
    fn test_lapse_at_stability_floor_stays_reviewable() -> Fallible<()> {
        let s = no_fuzz();
        let card = Card {
            stability: crate::fsrs::S_MIN,
            ..review_card("2025-01-01T00:00:00Z")
        };
        let lapsed = s.next_state(&card, Rating::Again, ts("2025-01-02T00:00:00Z"))?;
        assert_eq!(lapsed.state, State::Relearning);
        assert!(lapsed.stability > 0.0 && lapsed.stability < card.stability);
        let due = lapsed.due().unwrap();
        for rating in Rating::ALL {
            let next = s.next_state(&lapsed, rating, due)?;
            assert!(next.stability >= crate::fsrs::S_MIN);
        }
        Ok(())
    }

    #[test]
    fn test_stability_ceiling_stays_reviewable() -> Fallible<()> {
        let s = no_fuzz();
        let card = Card {
            stability: S_MAX,
            ..review_card("2025-01-01T00:00:00Z")
        };
        let next = s.next_state(&card, Rating::Easy, ts("2026-01-01T00:00:00Z"))?;
        assert_eq!(next.stability, S_MAX);
        let due = next.due().unwrap();
        for rating in Rating::ALL {
            let after = s.next_state(&next, rating, due)?;
            assert!(after.stability <= S_MAX);
        }
        Ok(())
    }

    #[test]
    fn test_interval_clamped() -> Fallible<()> {
        let s = Scheduler::new(Parameters {
            max_interval: 30,
            fuzz: false,
            ..Parameters::default()
        })?;
        let card = Card {
            stability: 500.0,
            ..review_card("2025-01-01T00:00:00Z")
        };
        let next = s.next_state(&card, Rating::Easy, ts("2026-01-01T00:00:00Z"))?;
        assert_eq!(next.scheduled_days, 30);
        Ok(())
    }

    #[test]
    fn test_fuzz_is_deterministic() -> Fallible<()> {
        let s = Scheduler::default();
        let card = review_card("2025-01-01T00:00:00Z");
        let now = ts("2025-01-11T00:00:00Z");
        let a = s.review(&card, Rating::Good, now)?;
        let b = s.review(&card, Rating::Good, now)?;
        assert_eq!(a, b);
        assert!((31..=35).contains(&a.card.scheduled_days));
        Ok(())
    }

    #[test]
    fn test_review_log() -> Fallible<()> {
        let card = review_card("2025-01-01T00:00:00Z");
        let now = ts("2025-01-11T06:00:00Z");
        let outcome = no_fuzz().review(&card, Rating::Good, now)?;
        assert_eq!(outcome.log.card_id, card.id);
        assert_eq!(outcome.log.state, State::Review);
        assert_eq!(outcome.log.rating, Rating::Good);
        assert_eq!(outcome.log.elapsed_days, 10);
        assert_eq!(outcome.log.scheduled_days, outcome.card.scheduled_days);
        assert_eq!(outcome.log.reviewed_at, now);
        Ok(())
    }

    #[test]
    fn test_retrievability() -> Fallible<()> {
        let s = Scheduler::default();
        let card = review_card("2025-01-01T00:00:00Z");
        let r = s.retrievability(&card, ts("2025-01-11T00:00:00Z"))?.unwrap();
        assert!((r - 0.9).abs() < 1e-9);
        let new = Card::new(CardId::from_content("new"));
        assert_eq!(s.retrievability(&new, ts("2025-01-11T00:00:00Z"))?, None);
        Ok(())
    }

    #[test]
    fn test_rejects_time_travel() {
        let card = review_card("2025-01-11T00:00:00Z");
        let result = next_state(&card, Rating::Good, ts("2025-01-01T00:00:00Z"));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_stability() {
        let now = ts("2025-01-11T00:00:00Z");
        for stability in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e9] {
            let card = Card {
                stability,
                ..review_card("2025-01-01T00:00:00Z")
            };
            assert!(next_state(&card, Rating::Good, now).is_err(), "{stability}");
        }
    }

    #[test]
    fn test_rejects_bad_difficulty() {
        let now = ts("2025-01-11T00:00:00Z");
        for difficulty in [0.5, 10.5, f64::NAN] {
            let card = Card {
                difficulty,
                ..review_card("2025-01-01T00:00:00Z")
            };
            assert!(next_state(&card, Rating::Good, now).is_err(), "{difficulty}");
        }
    }

    #[test]
    fn test_rejects_reviewed_card_without_timestamp() {
        let card = Card {
            last_review: None,
            ..review_card("2025-01-01T00:00:00Z")
        };
        assert!(next_state(&card, Rating::Good, ts("2025-01-11T00:00:00Z")).is_err());
    }

    #[test]
    fn test_rejects_learning_step_out_of_range() {
        let card = Card {
            state: State::Learning,
            step: 2,
            ..review_card("2025-01-01T00:00:00Z")
        };
        assert!(next_state(&card, Rating::Good, ts("2025-01-01T00:10:00Z")).is_err());
    }

    #[test]
    fn test_new_card_ignores_seed_values() -> Fallible<()> {
        let card = Card {
            stability: 0.0,
            difficulty: 0.0,
            ..Card::new(CardId::from_content("seedless"))
        };
        let next = next_state(&card, Rating::Good, ts("2025-01-01T00:00:00Z"))?;
        assert!(next.stability > 0.0);
        assert!((D_MIN..=D_MAX).contains(&next.difficulty));
        Ok(())
    }

    #[test]
    fn test_invalid_parameters() {
        let params = Parameters {
            learning_steps: vec![],
            ..Parameters::default()
        };
        assert!(Scheduler::new(params).is_err());
    }
}
