//! Environment-variable configuration (§6, SPEC_FULL.md §6 "Configuration
//! loading") — loaded once at startup via `dotenvy` so a `.env` file
//! works in development, the same way the teacher reads its own `SEM_OS_*`
//! vars directly from the process environment.

use rewire_notify::NotifyConfig;

pub struct Config {
    pub db_path: String,
    pub listen_addr: String,
    pub listen_port: u16,
    pub base_url: String,
    pub admin_token: String,
    pub check_every_s: u64,
    pub renotify_after_s: i64,
    pub notify: NotifyConfig,
}

impl Config {
    /// Missing `admin_token` is a fatal init failure (exit code 1, §6).
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let admin_token = std::env::var("REWIRE_ADMIN_TOKEN")
            .map_err(|_| anyhow::anyhow!("REWIRE_ADMIN_TOKEN must be set"))?;

        let listen_port: u16 = env_or("REWIRE_LISTEN_PORT", "8080").parse()?;
        let smtp_port: u16 = env_opt("REWIRE_SMTP_PORT")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(587);

        Ok(Self {
            db_path: env_or("REWIRE_DB_PATH", "rewire.db"),
            listen_addr: env_or("REWIRE_LISTEN_ADDR", "0.0.0.0"),
            listen_port,
            base_url: env_or("REWIRE_BASE_URL", "http://localhost:8080"),
            admin_token,
            check_every_s: env_or("REWIRE_CHECK_EVERY_S", "60").parse()?,
            renotify_after_s: env_or("REWIRE_RENOTIFY_AFTER_S", "0").parse()?,
            notify: NotifyConfig {
                smtp_host: env_opt("REWIRE_SMTP_HOST"),
                smtp_port,
                smtp_user: env_opt("REWIRE_SMTP_USER"),
                smtp_pass: env_opt("REWIRE_SMTP_PASS"),
                smtp_from: env_opt("REWIRE_SMTP_FROM"),
                webhook_url: env_opt("REWIRE_WEBHOOK_URL"),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}
