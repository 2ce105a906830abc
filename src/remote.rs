//! Optional Gemini-backed advisor. Feature-detected through the
//! `GEMINI_API_KEY` environment variable; every transport or parse failure
//! degrades to a descriptive string so the local advisor is never blocked or
//! replaced by this path.

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;

use crate::board::{Board, Direction};

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const DEFAULT_MODEL: &str = "gemini-flash-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote recommendation. `direction` is `None` when the service could not
/// be reached or did not produce a usable answer; `reasoning` then explains
/// why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAdvice {
    pub direction: Option<Direction>,
    pub reasoning: String,
    /// 0-100.
    pub confidence: u8,
}

#[derive(Debug, Error)]
enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response had no text candidate")]
    MalformedResponse,
}

pub struct RemoteAdvisor {
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl RemoteAdvisor {
    /// `None` when the API key is absent, in which case the feature is
    /// simply unavailable.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(ENV_API_KEY).ok().filter(|key| !key.is_empty())?;

        let client = match reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                log::warn!("cannot build http client: {err}");
                return None;
            }
        };

        Some(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client,
        })
    }

    /// Asks for a single recommended move.
    pub fn recommend(&self, board: &Board<4>) -> RemoteAdvice {
        let prompt = format!(
            "You are an expert 2048 player. Analyze the board and recommend \
             the best move.\n\nCurrent board:\n{}\n\nAnswer in exactly this \
             format:\nDIRECTION: [one of up/down/left/right]\nCONFIDENCE: [a \
             number from 0 to 100]\nREASONING: [one sentence]",
            board_prompt(board),
        );

        match self.generate(&prompt) {
            Ok(text) => parse_reply(&text),
            Err(err) => {
                log::warn!("remote advisor failed: {err}");
                RemoteAdvice {
                    direction: None,
                    reasoning: format!("remote advisor unavailable: {err}"),
                    confidence: 0,
                }
            }
        }
    }

    /// Asks for a free-form strategic write-up. Failures come back as the
    /// string itself.
    pub fn detailed_analysis(&self, board: &Board<4>) -> String {
        let prompt = format!(
            "As an expert 2048 player, analyze this board and give strategic \
             advice:\n\n{}\n\nCover: strengths and weaknesses of the current \
             board, risks to watch for, the overall strategy from here, and \
             concrete recommendations for the next three moves.",
            board_prompt(board),
        );

        self.generate(&prompt)
            .unwrap_or_else(|err| format!("remote analysis unavailable: {err}"))
    }

    fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model,
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response: serde_json::Value = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or(RemoteError::MalformedResponse)
    }
}

/// Renders the board the way the prompt describes it, one row per line.
fn board_prompt(board: &Board<4>) -> String {
    let mut out = String::new();

    for (row, cells) in board.to_array().iter().enumerate() {
        let _ = write!(out, "Row {}: [", row + 1);
        for (col, &value) in cells.iter().enumerate() {
            if col > 0 {
                out.push_str(" | ");
            }
            if value == 0 {
                out.push_str("   .");
            } else {
                let _ = write!(out, "{value:>4}");
            }
        }
        out.push_str("]\n");
    }

    out
}

/// Lenient parse of the `DIRECTION`/`CONFIDENCE`/`REASONING` reply format.
/// Labels are case-insensitive, missing confidence defaults to 50, and an
/// unrecognized direction comes back as `None` rather than an error.
fn parse_reply(text: &str) -> RemoteAdvice {
    let mut direction = None;
    let mut confidence = None;
    let mut reasoning = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some(rest) = strip_prefix_ci(line, "DIRECTION:") {
            direction = rest.trim().parse::<Direction>().ok();
        } else if let Some(rest) = strip_prefix_ci(line, "CONFIDENCE:") {
            confidence = rest.trim().parse::<u8>().ok().map(|c| c.min(100));
        } else if let Some(rest) = strip_prefix_ci(line, "REASONING:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                reasoning = Some(rest.to_string());
            }
        }
    }

    RemoteAdvice {
        direction,
        confidence: confidence.unwrap_or(50),
        reasoning: reasoning.unwrap_or_else(|| "no reasoning given".to_string()),
    }
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}
