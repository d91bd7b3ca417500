use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    pub off_base_url: String,
    pub goupc_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Repeat scans of the same (email, upc) inside this window replay the
    /// stored result instead of re-evaluating.
    pub dedup_window_secs: i64,
    /// Minimum number of scanned products required before ranking.
    pub min_ranking_candidates: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub judge: JudgeConfig,
    pub resolver: ResolverConfig,
    pub evaluation: EvaluationConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let judge = JudgeConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            model: std::env::var("JUDGE_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            base_url: std::env::var("JUDGE_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            timeout_secs: std::env::var("JUDGE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        let resolver = ResolverConfig {
            off_base_url: std::env::var("OFF_BASE_URL")
                .unwrap_or_else(|_| "https://world.openfoodfacts.org".into()),
            goupc_base_url: std::env::var("GOUPC_BASE_URL")
                .unwrap_or_else(|_| "https://go-upc.com".into()),
            timeout_secs: std::env::var("RESOLVER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        let evaluation = EvaluationConfig {
            dedup_window_secs: std::env::var("DEDUP_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            min_ranking_candidates: std::env::var("MIN_RANKING_CANDIDATES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(2),
        };
        Ok(Self {
            database_url,
            judge,
            resolver,
            evaluation,
        })
    }
}
