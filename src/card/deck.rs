use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    enums::{MAX_CARD_COPIES, MAX_EXTRA_DECK_SIZE},
    exception::{GameError, GameplayError},
};

use super::{
    cards::Cards,
    types::{CardId, CardKind},
    Card,
};

/// 덱 리스트 파일(JSON)의 한 항목.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckEntry {
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: CardKind,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub extra_deck: bool,
}

fn one() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckList {
    #[serde(default)]
    pub name: String,
    pub cards: Vec<DeckEntry>,
}

/// 카드 인스턴스로 풀어낸 덱. 모든 카드는 고유한 id 를 가집니다.
#[derive(Clone, Debug, Default)]
pub struct BuiltDeck {
    pub main: Cards,
    pub extra: Cards,
}

impl DeckList {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|e| GameplayError::DeckParse(e.to_string()).into())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// 매수 제한을 확인하고 카드 인스턴스를 생성합니다.
    ///
    /// 같은 카드(코드가 없으면 이름 기준)는 최대 3장, 엑스트라 덱은 최대 15장입니다.
    pub fn build(&self) -> Result<BuiltDeck, GameplayError> {
        let mut copies: HashMap<&str, u32> = HashMap::new();
        for entry in &self.cards {
            let key = if entry.code.is_empty() {
                entry.name.as_str()
            } else {
                entry.code.as_str()
            };
            let total = copies.entry(key).or_insert(0);
            *total += entry.count;
            if *total > MAX_CARD_COPIES {
                warn!("Deck '{}' has {} copies of '{}'", self.name, total, entry.name);
                return Err(GameplayError::DeckParse(format!(
                    "'{}' exceeds {} copies",
                    entry.name, MAX_CARD_COPIES
                )));
            }
        }

        let mut deck = BuiltDeck::default();
        for entry in &self.cards {
            for _ in 0..entry.count {
                let card = Card::new(CardId::new(), entry.code.clone(), entry.name.clone(), entry.kind);
                if entry.extra_deck {
                    deck.extra.push(card);
                } else {
                    deck.main.push(card);
                }
            }
        }

        if deck.extra.len() > MAX_EXTRA_DECK_SIZE {
            return Err(GameplayError::DeckParse(format!(
                "extra deck holds {} cards, limit is {}",
                deck.extra.len(),
                MAX_EXTRA_DECK_SIZE
            )));
        }

        debug!(
            "Built deck '{}': {} main, {} extra",
            self.name,
            deck.main.len(),
            deck.extra.len()
        );
        Ok(deck)
    }
}
