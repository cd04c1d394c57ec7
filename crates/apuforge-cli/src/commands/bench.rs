//! `apuforge bench`
//!
//! OpenAI-style chat completions against the gateway. Throughput is
//! `completion_tokens / wall-clock seconds` per request.

use crate::cli::BenchCommands;
use crate::output::Table;
use apuforge_kernel::{ActiveConfiguration, ServiceKind};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// One completed request.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub elapsed_secs: f64,
}

impl Sample {
    pub fn tokens_per_sec(&self) -> f64 {
        self.completion_tokens as f64 / self.elapsed_secs.max(f64::EPSILON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl Stats {
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let rates: Vec<f64> = samples.iter().map(Sample::tokens_per_sec).collect();
        let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
        let max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        Some(Self { min, mean, max })
    }
}

pub struct BenchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BenchClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub async fn complete(&self, model: &str, prompt: &str, max_tokens: u32) -> anyhow::Result<Sample> {
        let body = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: 0.0,
            stream: false,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("{model}: gateway returned {status}: {text}");
        }
        let parsed: ChatResponse = response.json().await?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        let usage = parsed
            .usage
            .ok_or_else(|| anyhow::anyhow!("{model}: response carried no usage block"))?;
        debug!(model, completion_tokens = usage.completion_tokens, elapsed_secs, "request finished");
        Ok(Sample {
            model: model.to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            elapsed_secs,
        })
    }

    pub async fn repeat(&self, model: &str, prompt: &str, max_tokens: u32, runs: usize) -> anyhow::Result<Vec<Sample>> {
        let mut samples = Vec::with_capacity(runs);
        for _ in 0..runs {
            samples.push(self.complete(model, prompt, max_tokens).await?);
        }
        Ok(samples)
    }

    pub async fn concurrent(&self, model: &str, prompt: &str, max_tokens: u32, concurrency: usize) -> Vec<anyhow::Result<Sample>> {
        let requests = (0..concurrency).map(|_| self.complete(model, prompt, max_tokens));
        futures::future::join_all(requests).await
    }
}

/// Prompt of roughly `tokens` tokens followed by a short instruction.
pub fn ladder_prompt(tokens: u32) -> String {
    const FILLER: [&str; 8] = ["memory", "wave", "kernel", "tensor", "cache", "shader", "queue", "fabric"];
    let mut prompt = String::with_capacity(tokens as usize * 7 + 64);
    for i in 0..tokens as usize {
        prompt.push_str(FILLER[i % FILLER.len()]);
        prompt.push(' ');
    }
    prompt.push_str("\n\nSummarize the words above in one sentence.");
    prompt
}

fn default_model(active: &ActiveConfiguration) -> String {
    active.binding(ServiceKind::Chat).model_key().to_string()
}

pub async fn run(
    active: &ActiveConfiguration,
    url: Option<String>,
    max_tokens: u32,
    mode: BenchCommands,
) -> anyhow::Result<()> {
    let gw = active.gateway();
    let base_url = url.unwrap_or_else(|| format!("http://127.0.0.1:{}", gw.listen_port));
    let client = BenchClient::new(&base_url, &gw.api_key, Duration::from_secs(gw.timeouts.chat))?;
    println!("{} Benchmarking {}", "→".green(), base_url.cyan());

    let samples = match mode {
        BenchCommands::Single { model, runs, prompt } => {
            let model = model.unwrap_or_else(|| default_model(active));
            client.repeat(&model, &prompt, max_tokens, runs).await?
        }
        BenchCommands::Compare { models, runs } => {
            let models = if models.is_empty() {
                active
                    .binding(ServiceKind::Chat)
                    .aliases()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            } else {
                models
            };
            let mut samples = Vec::new();
            for model in &models {
                match client.repeat(model, "Explain unified memory in two sentences.", max_tokens, runs).await {
                    Ok(batch) => samples.extend(batch),
                    Err(e) => warn!(model = %model, error = %e, "model skipped"),
                }
            }
            samples
        }
        BenchCommands::Stress { model, concurrency } => {
            let model = model.unwrap_or_else(|| default_model(active));
            let started = Instant::now();
            let results = client
                .concurrent(&model, "Count from one to twenty in words.", max_tokens, concurrency)
                .await;
            let wall = started.elapsed().as_secs_f64();
            let mut samples = Vec::new();
            for result in results {
                match result {
                    Ok(sample) => samples.push(sample),
                    Err(e) => warn!(error = %e, "request failed"),
                }
            }
            let total: u64 = samples.iter().map(|s| s.completion_tokens).sum();
            println!(
                "  {} of {} requests succeeded, aggregate {:.1} tok/s",
                samples.len(),
                concurrency,
                total as f64 / wall.max(f64::EPSILON)
            );
            samples
        }
        BenchCommands::Context { model, sizes } => {
            let model = model.unwrap_or_else(|| default_model(active));
            let mut samples = Vec::new();
            for size in sizes {
                match client.complete(&model, &ladder_prompt(size), max_tokens).await {
                    Ok(sample) => samples.push(sample),
                    Err(e) => {
                        warn!(size, error = %e, "context ladder stopped");
                        break;
                    }
                }
            }
            samples
        }
    };

    print_samples(&samples);
    if samples.is_empty() {
        anyhow::bail!("no benchmark request succeeded");
    }
    Ok(())
}

fn print_samples(samples: &[Sample]) {
    let mut table = Table::builder().headers(&["Model", "Prompt tok", "Completion tok", "Seconds", "tok/s"]);
    for s in samples {
        table = table.row(&[
            s.model.clone(),
            s.prompt_tokens.to_string(),
            s.completion_tokens.to_string(),
            format!("{:.2}", s.elapsed_secs),
            format!("{:.1}", s.tokens_per_sec()),
        ]);
    }
    println!("{}", table.build());

    if let Some(stats) = Stats::from_samples(samples) {
        println!(
            "{} tok/s min {:.1} / mean {:.1} / max {:.1}",
            "✓".green(),
            stats.min,
            stats.mean,
            stats.max
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn mock_gateway() -> String {
        async fn completions(Json(body): Json<Value>) -> Json<Value> {
            let model = body["model"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "model": model,
                "choices": [{"message": {"role": "assistant", "content": "ok"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 64}
            }))
        }

        let app = Router::new().route("/v1/chat/completions", post(completions));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(url: &str) -> BenchClient {
        BenchClient::new(url, "sk-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn complete_reads_usage() {
        let url = mock_gateway().await;
        let sample = client(&url).complete("gpt-4o", "hi", 64).await.unwrap();
        assert_eq!(sample.model, "gpt-4o");
        assert_eq!(sample.prompt_tokens, 12);
        assert_eq!(sample.completion_tokens, 64);
        assert!(sample.tokens_per_sec() > 0.0);
    }

    #[tokio::test]
    async fn concurrent_requests_all_complete() {
        let url = mock_gateway().await;
        let results = client(&url).concurrent("gpt-4o", "hi", 16, 4).await;
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn http_errors_are_reported() {
        let url = mock_gateway().await;
        let bad = BenchClient::new(format!("{url}/nope"), "k", Duration::from_secs(5)).unwrap();
        let err = bad.complete("gpt-4o", "hi", 8).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn stats_cover_min_mean_max() {
        let sample = |tokens, secs| Sample {
            model: "m".to_string(),
            prompt_tokens: 0,
            completion_tokens: tokens,
            elapsed_secs: secs,
        };
        let stats = Stats::from_samples(&[sample(10, 1.0), sample(40, 2.0), sample(30, 1.0)]).unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert!((stats.mean - 20.0).abs() < 1e-9);
        assert!(Stats::from_samples(&[]).is_none());
    }

    #[test]
    fn ladder_prompt_scales_with_size() {
        let small = ladder_prompt(10);
        let large = ladder_prompt(1000);
        assert_eq!(small.split_whitespace().count(), 10 + 7);
        assert!(large.len() > small.len() * 50);
    }
}
