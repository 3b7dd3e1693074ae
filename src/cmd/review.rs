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

use crate::error::Fallible;
use crate::params::Parameters;
use crate::scheduler::Scheduler;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub fn review_card(
    card_path: &Path,
    rating: Rating,
    now: Option<&str>,
    config: Option<&Path>,
) -> Fallible<String> {
    let scheduler = load_scheduler(config)?;
    let card = load_card(card_path)?;
    let now = parse_now(now)?;
    let outcome = scheduler
        .review(&card, rating, now)
        .inspect_err(|e| log::warn!("Rejected review of {}: {e}", card.id))?;
    Ok(serde_json::to_string_pretty(&outcome)?)
}

pub fn preview_card(
    card_path: &Path,
    now: Option<&str>,
    config: Option<&Path>,
) -> Fallible<String> {
    let scheduler = load_scheduler(config)?;
    let card = load_card(card_path)?;
    let now = parse_now(now)?;
    let preview = scheduler
        .preview(&card, now)
        .inspect_err(|e| log::warn!("Rejected preview of {}: {e}", card.id))?;
    Ok(serde_json::to_string_pretty(&preview)?)
}

fn load_scheduler(config: Option<&Path>) -> Fallible<Scheduler> {
    let params = match config {
        Some(path) => Parameters::load(path)?,
        None => Parameters::default(),
    };
    Scheduler::new(params)
}

fn load_card(path: &Path) -> Fallible<Card> {
    let text = read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn parse_now(now: Option<&str>) -> Fallible<Timestamp> {
    match now {
        Some(s) => Timestamp::parse(s),
        None => Ok(Timestamp::now()),
    }
}
