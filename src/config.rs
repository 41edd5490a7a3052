use std::{env, path::PathBuf, str::FromStr};

use secrecy::SecretString;

#[derive(Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub log_level: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
    pub default_questions: usize,
    pub min_transcript_chars: usize,
    pub http_timeout_seconds: u64,
    pub download_timeout_seconds: u64,
    pub generation_concurrency: usize,
    pub llm_api_key: Option<SecretString>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub stt_api_key: Option<SecretString>,
    pub stt_base_url: String,
    pub stt_model: String,
    pub stt_max_upload_bytes: u64,
    pub yt_dlp_path: String,
    pub yt_cookies_path: Option<PathBuf>,
    pub audio_temp_dir: PathBuf,
    pub embedding_api_key: Option<SecretString>,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub pinecone_api_key: Option<SecretString>,
    pub pinecone_index_host: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            web_server_host: env_or("WEB_SERVER_HOST", "127.0.0.1"),
            web_server_port: env_parse("WEB_SERVER_PORT", 8080),
            log_level: env_or("LOG_LEVEL", "info"),
            allowed_origins: parse_origins(&env_or("ALLOWED_ORIGINS", "*")),
            rate_limit_requests: env_parse("RATE_LIMIT_REQUESTS", 60),
            rate_limit_window_seconds: env_parse("RATE_LIMIT_WINDOW_SECONDS", 60),
            default_questions: env_parse("DEFAULT_QUESTIONS", 5),
            min_transcript_chars: env_parse("MIN_TRANSCRIPT_CHARS", 100),
            http_timeout_seconds: env_parse("HTTP_TIMEOUT_SECONDS", 30),
            download_timeout_seconds: env_parse("DOWNLOAD_TIMEOUT_SECONDS", 300),
            generation_concurrency: env_parse("GENERATION_CONCURRENCY", 4),
            llm_api_key: env_secret("LLM_API_KEY"),
            llm_base_url: env_or("LLM_BASE_URL", "https://api.deepseek.com"),
            llm_model: env_or("LLM_MODEL", "deepseek-chat"),
            stt_api_key: env_secret("STT_API_KEY"),
            stt_base_url: env_or("STT_BASE_URL", "https://api.openai.com"),
            stt_model: env_or("STT_MODEL", "whisper-1"),
            stt_max_upload_bytes: env_parse("STT_MAX_UPLOAD_BYTES", 25 * 1024 * 1024),
            yt_dlp_path: env_or("YT_DLP_PATH", "yt-dlp"),
            yt_cookies_path: env_optional("YT_COOKIES_PATH")
                .or_else(|| Some("cookies.txt".to_string()))
                .map(PathBuf::from),
            audio_temp_dir: env_optional("AUDIO_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            embedding_api_key: env_secret("EMBEDDING_API_KEY"),
            embedding_base_url: env_or("EMBEDDING_BASE_URL", "https://api.openai.com"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            pinecone_api_key: env_secret("PINECONE_API_KEY"),
            pinecone_index_host: env_optional("PINECONE_INDEX_HOST"),
        }
    }

    pub fn vector_storage_enabled(&self) -> bool {
        self.embedding_api_key.is_some()
            && self.pinecone_api_key.is_some()
            && self.pinecone_index_host.is_some()
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            log_level: "debug".to_string(),
            allowed_origins: vec!["*".to_string()],
            rate_limit_requests: 60,
            rate_limit_window_seconds: 60,
            default_questions: 5,
            min_transcript_chars: 100,
            http_timeout_seconds: 5,
            download_timeout_seconds: 5,
            generation_concurrency: 2,
            llm_api_key: None,
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "test-model".to_string(),
            stt_api_key: None,
            stt_base_url: "http://127.0.0.1:9".to_string(),
            stt_model: "whisper-1".to_string(),
            stt_max_upload_bytes: 25 * 1024 * 1024,
            yt_dlp_path: "yt-dlp".to_string(),
            yt_cookies_path: None,
            audio_temp_dir: env::temp_dir(),
            embedding_api_key: None,
            embedding_base_url: "http://127.0.0.1:9".to_string(),
            embedding_model: "test-embedding".to_string(),
            pinecone_api_key: None,
            pinecone_index_host: None,
        }
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env_optional(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_secret(key: &str) -> Option<SecretString> {
    env_optional(key).map(SecretString::from)
}

/// Comma separated origin list; blank input means any origin.
pub fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}
