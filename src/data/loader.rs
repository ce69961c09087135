//! Result Loader Module
//! Reads result payloads from disk or from portal JSON and turns them into cards.

use crate::data::model::{LaunchedResult, PortalEnvelope, ResultCard, ResultData};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read result file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse result JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Portal reported an error: {0}")]
    Portal(String),
    #[error("No result data found")]
    NoData,
}

/// Holds the result cards of the most recent load.
pub struct ResultLoader {
    cards: Vec<ResultCard>,
    file_path: Option<PathBuf>,
}

impl Default for ResultLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultLoader {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            file_path: None,
        }
    }

    /// Load a JSON file holding a single result, a list of launched results,
    /// or a portal envelope.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&[ResultCard], LoaderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let cards = Self::parse_cards(&text)?;
        info!(path = %path.display(), cards = cards.len(), "loaded result file");

        self.file_path = Some(path.to_path_buf());
        self.cards = cards;
        Ok(&self.cards)
    }

    /// Parse result cards from JSON text.
    pub fn parse_cards(text: &str) -> Result<Vec<ResultCard>, LoaderError> {
        let value: Value = serde_json::from_str(text)?;
        Self::cards_from_value(value)
    }

    /// Interpret an already parsed JSON document as result cards.
    pub fn cards_from_value(value: Value) -> Result<Vec<ResultCard>, LoaderError> {
        match value {
            Value::Array(items) => {
                // Same leniency as the envelope's `results` list
                let launched: Vec<LaunchedResult> = items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or_default())
                    .collect();
                debug!(count = launched.len(), "parsed launched result list");
                Ok(launched.into_iter().map(ResultCard::from).collect())
            }
            Value::Object(map) if map.contains_key("results") => {
                let envelope: PortalEnvelope = serde_json::from_value(Value::Object(map))?;
                if !envelope.success {
                    return Err(LoaderError::Portal(
                        envelope
                            .error
                            .unwrap_or_else(|| "request was not successful".to_string()),
                    ));
                }
                Ok(envelope.results.into_iter().map(ResultCard::from).collect())
            }
            Value::Object(map) if map.contains_key("result_data") => {
                let launched: LaunchedResult = serde_json::from_value(Value::Object(map))?;
                Ok(vec![ResultCard::from(launched)])
            }
            Value::Object(map) => {
                let result: ResultData = serde_json::from_value(Value::Object(map))?;
                Ok(vec![ResultCard::standalone(result)])
            }
            _ => Err(LoaderError::NoData),
        }
    }

    pub fn get_cards(&self) -> &[ResultCard] {
        &self.cards
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Replace the cards directly (used by background loading).
    pub fn set_cards(&mut self, cards: Vec<ResultCard>) {
        self.cards = cards;
    }
}
