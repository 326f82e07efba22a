//! News sentiment scoring
//!
//! Scores article headlines and descriptions with the VADER lexicon and
//! aggregates them into a single market-mood report. Scoring is pure; the
//! async entry point handles the news fetch.

use crate::error::{AgentError, Result};
use crate::providers::{Article, NewsClient};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Scores within this distance of zero count as neutral.
const NEUTRAL_BAND: f64 = 0.05;

lazy_static! {
    static ref ANALYZER: SentimentIntensityAnalyzer<'static> = SentimentIntensityAnalyzer::new();
}

/// Aggregate sentiment over a set of articles.
///
/// `overall_sentiment` is the mean per-article compound score in [-1, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentReport {
    pub overall_sentiment: f64,
    pub positive_articles: usize,
    pub neutral_articles: usize,
    pub negative_articles: usize,
    pub article_count: usize,
}

impl SentimentReport {
    pub fn mood(&self) -> &'static str {
        if self.overall_sentiment > NEUTRAL_BAND {
            "positive"
        } else if self.overall_sentiment < -NEUTRAL_BAND {
            "negative"
        } else {
            "neutral"
        }
    }
}

/// Compound polarity of one article, scored on its title plus description.
fn article_score(article: &Article) -> f64 {
    let mut text = article.title.clone();
    if let Some(description) = &article.description {
        text.push(' ');
        text.push_str(description);
    }

    ANALYZER
        .polarity_scores(&text)
        .get("compound")
        .copied()
        .unwrap_or(0.0)
}

/// Score a batch of articles; fails with `NotFound` when there is nothing
/// to score.
pub fn score_articles(articles: &[Article]) -> Result<SentimentReport> {
    if articles.is_empty() {
        return Err(AgentError::NotFound(
            "no articles to score for sentiment".to_string(),
        ));
    }

    let mut total = 0.0;
    let mut positive = 0;
    let mut neutral = 0;
    let mut negative = 0;

    for article in articles {
        let score = article_score(article);
        total += score;
        if score > NEUTRAL_BAND {
            positive += 1;
        } else if score < -NEUTRAL_BAND {
            negative += 1;
        } else {
            neutral += 1;
        }
    }

    Ok(SentimentReport {
        overall_sentiment: total / articles.len() as f64,
        positive_articles: positive,
        neutral_articles: neutral,
        negative_articles: negative,
        article_count: articles.len(),
    })
}

/// Fetch recent news for a query and score its overall sentiment.
pub async fn sentiment(news: &NewsClient, query: &str) -> Result<SentimentReport> {
    let articles = news.recent_articles(query).await?;
    debug!(query, articles = articles.len(), "scoring news sentiment");
    score_articles(&articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: Some(description.to_string()),
            source: None,
            url: None,
            published_at: None,
        }
    }

    #[test]
    fn positive_articles_yield_positive_report() {
        let articles = vec![
            article("Apple is great", "Apple stock is rising."),
            article("Apple had an excellent quarter", "Analysts are happy."),
        ];

        let report = score_articles(&articles).unwrap();
        assert_eq!(report.article_count, 2);
        assert_eq!(report.positive_articles, 2);
        assert!(report.overall_sentiment > NEUTRAL_BAND);
        assert_eq!(report.mood(), "positive");
    }

    #[test]
    fn negative_articles_yield_negative_report() {
        let articles = vec![
            article("Apple is bad", "Apple stock is falling."),
            article("Apple had a terrible quarter", "Analysts are worried."),
        ];

        let report = score_articles(&articles).unwrap();
        assert_eq!(report.negative_articles, 2);
        assert!(report.overall_sentiment < -NEUTRAL_BAND);
        assert_eq!(report.mood(), "negative");
    }

    #[test]
    fn mixed_batch_averages_the_per_article_scores() {
        let positive = article("Apple is great", "Apple stock is rising.");
        let negative = article("Apple is bad", "Apple stock is falling.");

        let positive_score = score_articles(&[positive.clone()]).unwrap().overall_sentiment;
        let negative_score = score_articles(&[negative.clone()]).unwrap().overall_sentiment;

        let report = score_articles(&[positive, negative]).unwrap();
        assert_eq!(report.article_count, 2);
        assert_eq!(report.positive_articles, 1);
        assert_eq!(report.negative_articles, 1);
        assert_eq!(report.neutral_articles, 0);
        assert!(
            (report.overall_sentiment - (positive_score + negative_score) / 2.0).abs() < 1e-12
        );
    }

    #[test]
    fn bucket_counts_cover_every_article() {
        let articles = vec![
            article("Apple is great", "Wonderful results."),
            article("Apple is bad", "Awful results."),
            article("Apple reported quarterly figures", "The report covers Q3."),
        ];

        let report = score_articles(&articles).unwrap();
        assert_eq!(
            report.positive_articles + report.neutral_articles + report.negative_articles,
            report.article_count
        );
    }

    #[test]
    fn empty_batch_is_not_found() {
        assert!(matches!(
            score_articles(&[]).unwrap_err(),
            AgentError::NotFound(_)
        ));
    }
}
