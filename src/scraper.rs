//! Fetching and batch orchestration. Pages are fetched in fixed-size batches,
//! one task per URL, and every per-URL failure (network or parse) collapses to
//! a `Failed` outcome carrying the bare URL so one broken log never sinks its
//! batch.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::parser::model::Workout;
use crate::parser::parse_workout;

/// The UA bodyspace served these pages to; anything newer gets the redesign.
pub const USER_AGENT: &str = "Mozilla/5.0 Chrome/47.0.2526.106 Safari/537.36";

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Per-URL result of a scrape pass.
pub enum ScrapeOutcome {
    Parsed(Box<Workout>),
    /// Fetch or parse failed; the URL is kept so the page can be retried and
    /// the reason so the failure is diagnosable from storage.
    Failed { url: String, reason: String },
}

pub fn client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Fetches and parses `urls` in batches of `batch_size`, one task per URL.
/// Outcomes come back in input order. The fetch capability is injected so the
/// batching contract is exercisable without a network.
pub async fn map_concurrent<F, Fut>(
    urls: &[String],
    batch_size: usize,
    fetch: F,
) -> Result<Vec<ScrapeOutcome>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut outcomes = Vec::with_capacity(urls.len());
    for chunk in urls.chunks(batch_size.max(1)) {
        let handles: Vec<_> = chunk
            .iter()
            .map(|url| {
                let fut = fetch(url.clone());
                let url = url.clone();
                tokio::spawn(async move {
                    match fut.await {
                        Ok(html) => match parse_workout(&html, &url) {
                            Ok(workout) => ScrapeOutcome::Parsed(Box::new(workout)),
                            Err(e) => {
                                warn!("parse failed for {}: {}", url, e);
                                ScrapeOutcome::Failed {
                                    url,
                                    reason: format!("parse failed: {e}"),
                                }
                            }
                        },
                        Err(e) => {
                            warn!("fetch failed for {}: {}", url, e);
                            ScrapeOutcome::Failed {
                                url,
                                reason: format!("fetch failed: {e}"),
                            }
                        }
                    }
                })
            })
            .collect();

        for (handle, url) in handles.into_iter().zip(chunk) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!("task failed for {}: {}", url, e);
                    outcomes.push(ScrapeOutcome::Failed {
                        url: url.clone(),
                        reason: format!("task failed: {e}"),
                    });
                }
            }
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    Ok(outcomes)
}

/// Network-backed scrape of workout log pages.
pub async fn scrape_workouts(urls: &[String], batch_size: usize) -> Result<Vec<ScrapeOutcome>> {
    let client = client()?;
    map_concurrent(urls, batch_size, move |url| {
        let client = client.clone();
        async move { fetch_html(&client, &url).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Summary-only page: parses to a workout with no components.
    const GOOD_PAGE: &str = r#"
        <div class="rowSectionHeader">Leg Day</div>
        <div class="musclesWorked"><span class="value">Quadriceps</span></div>
        <span wicketpath="logResultsPanel_workoutSummary_totalWorkoutTime">00:45</span>
        <span wicketpath="logResultsPanel_workoutSummary_totalCardioTime">00:00</span>
        <div class="workout-footer"><div class="high"></div><span class="bigRating">9</span></div>
    "#;

    // Same page plus an exercise whose label tag is outside the grammar.
    const BAD_PAGE: &str = r#"
        <div class="rowSectionHeader">Leg Day</div>
        <div class="musclesWorked"><span class="value">Quadriceps</span></div>
        <span wicketpath="logResultsPanel_workoutSummary_totalWorkoutTime">00:45</span>
        <span wicketpath="logResultsPanel_workoutSummary_totalCardioTime">00:00</span>
        <div class="workout-footer"><div class="high"></div><span class="bigRating">9</span></div>
        <div class="exercise-overview">
          <div class="exercise-info"><h3>Squat</h3></div>
        </div>
        <div class="exercise-details">
          <div class="set">
            <div class="set-title">Squat</div>
            <div class="set-body"><div class="set-row">
              <label class="left-label">BOGUS:</label>
              <div class="inputWrapper">225 lbs. x 5 reps.</div>
            </div></div>
          </div>
        </div>
    "#;

    fn log_url(n: usize) -> String {
        format!("https://bodyspace.bodybuilding.com/workouts/viewworkoutlog/user{n}/abc{n}")
    }

    #[tokio::test]
    async fn failed_page_does_not_sink_its_batch() {
        let urls = vec![log_url(1), log_url(2), log_url(3)];
        let bad_url = urls[1].clone();

        let outcomes = map_concurrent(&urls, 2, move |url| {
            let page = if url == bad_url { BAD_PAGE } else { GOOD_PAGE };
            async move { Ok(page.to_string()) }
        })
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], ScrapeOutcome::Parsed(w) if w.username == "user1"));
        match &outcomes[1] {
            ScrapeOutcome::Failed { url, reason } => {
                assert_eq!(url, &log_url(2));
                assert!(reason.contains("unrecognized set type"), "{reason}");
            }
            ScrapeOutcome::Parsed(_) => panic!("bad page parsed"),
        }
        assert!(matches!(&outcomes[2], ScrapeOutcome::Parsed(w) if w.username == "user3"));
    }

    #[tokio::test]
    async fn fetch_errors_become_failed_outcomes() {
        let urls = vec![log_url(1)];
        let outcomes = map_concurrent(&urls, 10, |_url| async {
            Err(anyhow::anyhow!("connection reset"))
        })
        .await
        .unwrap();
        match &outcomes[0] {
            ScrapeOutcome::Failed { url, reason } => {
                assert_eq!(url, &log_url(1));
                assert!(reason.contains("connection reset"), "{reason}");
            }
            ScrapeOutcome::Parsed(_) => panic!("fetch error produced a workout"),
        }
    }
}
