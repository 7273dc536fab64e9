use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_path: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url = env::var("CONFER_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let storage_path = env::var("CONFER_STORAGE_PATH").unwrap_or("./".to_string());
        let request_timeout_secs = env::var("CONFER_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            api_base_url,
            storage_path,
            request_timeout_secs,
        }
    }
}
