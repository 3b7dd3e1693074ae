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

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card_id::CardId;

pub fn new_card(text: &str) -> Fallible<String> {
    let card = Card::new(CardId::from_content(text));
    log::debug!("Created card {}", card.id);
    Ok(serde_json::to_string_pretty(&card)?)
}
