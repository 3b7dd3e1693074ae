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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::check::check_config;
use crate::cmd::new::new_card;
use crate::cmd::review::preview_card;
use crate::cmd::review::review_card;
use crate::error::Fallible;
use crate::types::rating::Rating;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Print a card that has never been reviewed.
    New {
        /// The card's content. The card id is its hash.
        text: String,
    },
    /// Review a card and print its next snapshot.
    Review {
        /// Path to the card's JSON snapshot.
        #[arg(long)]
        card: PathBuf,
        /// How well the card was recalled.
        #[arg(long, value_enum)]
        rating: Rating,
        /// Review time as an RFC 3339 timestamp. Defaults to now.
        #[arg(long)]
        now: Option<String>,
        /// Optional path to a TOML parameters file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the outcome of every rating without reviewing.
    Preview {
        /// Path to the card's JSON snapshot.
        #[arg(long)]
        card: PathBuf,
        /// Review time as an RFC 3339 timestamp. Defaults to now.
        #[arg(long)]
        now: Option<String>,
        /// Optional path to a TOML parameters file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a TOML parameters file.
    CheckConfig {
        /// Path to the parameters file.
        path: PathBuf,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    let output = match cli {
        Command::New { text } => new_card(&text)?,
        Command::Review {
            card,
            rating,
            now,
            config,
        } => review_card(&card, rating, now.as_deref(), config.as_deref())?,
        Command::Preview { card, now, config } => {
            preview_card(&card, now.as_deref(), config.as_deref())?
        }
        Command::CheckConfig { path } => check_config(&path)?,
    };
    println!("{output}");
    Ok(())
}
