//! Keyword sentiment of stored comments and per-run engagement stats.
//!
//! A comment is positive when it contains more positive keywords than negative ones,
//! negative in the opposite case, and neutral otherwise. Keywords match as lowercase
//! substrings, so "thanks" counts for both "thank" and "thanks".

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::graph::Comment;

/// Commenters listed in the run report.
pub const TOP_COMMENTERS: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "awesome",
    "nice",
    "love",
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "perfect",
    "beautiful",
    "thank",
    "thanks",
    "appreciate",
    "happy",
    "pleased",
    "satisfied",
    "brilliant",
    "outstanding",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "hate",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "disgusting",
    "angry",
    "sad",
    "disappointed",
    "stupid",
    "ugly",
    "annoying",
    "frustrated",
    "pathetic",
    "useless",
    "ridiculous",
    "waste",
    "failed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Classify a comment message. Missing or empty messages are neutral.
#[must_use]
pub fn analyze(message: Option<&str>) -> Sentiment {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return Sentiment::Neutral;
    };

    let lower = message.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Running sentiment and engagement counts over a set of comments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SentimentStats {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total_likes: u64,
    commenters: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommenterCount {
    pub name: String,
    pub comments: usize,
}

impl SentimentStats {
    pub fn record(&mut self, comment: &Comment) {
        match analyze(comment.message.as_deref()) {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
        self.total_likes += comment.like_count;

        if let Some(name) = comment.from.as_ref().and_then(|a| a.name.as_deref()) {
            *self.commenters.entry(name.to_string()).or_default() += 1;
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Share of `count` in all comments, in percent with one decimal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self, count: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (count as f64 * 1000.0 / total as f64).round() / 10.0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_likes(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.total_likes as f64 * 10.0 / total as f64).round() / 10.0
    }

    /// The `n` most frequent named commenters, most active first, ties by name.
    #[must_use]
    pub fn top_commenters(&self, n: usize) -> Vec<CommenterCount> {
        let mut ranked: Vec<CommenterCount> = self
            .commenters
            .iter()
            .map(|(name, &comments)| CommenterCount {
                name: name.clone(),
                comments,
            })
            .collect();
        ranked.sort_by(|a, b| b.comments.cmp(&a.comments));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Serialize)]
struct StatsReport {
    total: usize,
    positive: usize,
    negative: usize,
    neutral: usize,
    positive_percent: f64,
    negative_percent: f64,
    neutral_percent: f64,
    average_likes: f64,
    top_commenters: Vec<CommenterCount>,
}

impl Serialize for SentimentStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StatsReport {
            total: self.total(),
            positive: self.positive,
            negative: self.negative,
            neutral: self.neutral,
            positive_percent: self.percent(self.positive),
            negative_percent: self.percent(self.negative),
            neutral_percent: self.percent(self.neutral),
            average_likes: self.average_likes(),
            top_commenters: self.top_commenters(TOP_COMMENTERS),
        }
        .serialize(serializer)
    }
}
