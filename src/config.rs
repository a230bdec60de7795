use std::{env, path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_concurrent_requests: usize,
    pub payments: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            max_concurrent_requests: parse_or("MAX_CONCURRENT_REQUESTS", 100),
            payments: PaymentConfig::from_env(),
        })
    }
}

/// Policy knobs of the payment engine.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub currency: String,
    /// Tax applied once at checkout, in basis points (1000 = 10%).
    pub tax_rate_bps: i64,
    /// Largest accepted gap between a receipt amount and the order total.
    pub amount_tolerance: i64,
    pub mtn_ussd_prefix: String,
    pub orange_ussd_prefix: String,
    pub chat_link_base: String,
    pub ocr: OcrConfig,
    pub psp: PspConfig,
    pub proof_dir: PathBuf,
    pub max_proof_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub binary: String,
    pub languages: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PspConfig {
    pub api_base: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub timeout: Duration,
    pub webhook_tolerance: Duration,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            currency: env::var("CURRENCY").unwrap_or_else(|_| "XAF".to_string()),
            tax_rate_bps: parse_or("TAX_RATE_BPS", 1000),
            amount_tolerance: parse_or("AMOUNT_TOLERANCE", 1),
            mtn_ussd_prefix: env::var("MTN_USSD_PREFIX").unwrap_or_else(|_| "*126*9*".to_string()),
            orange_ussd_prefix: env::var("ORANGE_USSD_PREFIX")
                .unwrap_or_else(|_| "#150*47*".to_string()),
            chat_link_base: env::var("CHAT_LINK_BASE")
                .unwrap_or_else(|_| "https://wa.me".to_string()),
            ocr: OcrConfig {
                binary: env::var("OCR_BINARY").unwrap_or_else(|_| "tesseract".to_string()),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng+fra".to_string()),
                timeout: Duration::from_secs(parse_or("OCR_TIMEOUT_SECS", 20)),
            },
            psp: PspConfig {
                api_base: env::var("PSP_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
                secret_key: env::var("PSP_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("PSP_WEBHOOK_SECRET").unwrap_or_default(),
                timeout: Duration::from_secs(parse_or("PSP_TIMEOUT_SECS", 15)),
                webhook_tolerance: Duration::from_secs(parse_or("WEBHOOK_TOLERANCE_SECS", 300)),
            },
            proof_dir: env::var("PROOF_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./proofs")),
            max_proof_bytes: parse_or("MAX_PROOF_BYTES", 5 * 1024 * 1024),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            currency: "XAF".to_string(),
            tax_rate_bps: 1000,
            amount_tolerance: 1,
            mtn_ussd_prefix: "*126*9*".to_string(),
            orange_ussd_prefix: "#150*47*".to_string(),
            chat_link_base: "https://wa.me".to_string(),
            ocr: OcrConfig {
                binary: "tesseract".to_string(),
                languages: "eng+fra".to_string(),
                timeout: Duration::from_secs(20),
            },
            psp: PspConfig {
                api_base: "https://api.stripe.com".to_string(),
                secret_key: String::new(),
                webhook_secret: String::new(),
                timeout: Duration::from_secs(15),
                webhook_tolerance: Duration::from_secs(300),
            },
            proof_dir: PathBuf::from("./proofs"),
            max_proof_bytes: 5 * 1024 * 1024,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
