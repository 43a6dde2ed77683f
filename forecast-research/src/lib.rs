//! Sentiment oracles for headline scoring
//!
//! This crate provides `SentimentOracle` implementations: an OpenAI-backed
//! structured scorer and an offline lexicon scorer.

pub mod lexicon;
pub mod openai;
pub mod types;

pub use lexicon::LexiconSentimentOracle;
pub use openai::{parse_sentiment_reply, OpenAISentimentOracle};
pub use types::SentimentReply;
