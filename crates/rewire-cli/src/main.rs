//! rewire-cli — thin client over the admin/ack HTTP surface (§6,
//! SPEC_FULL.md "CLI surface"), so operators can script expectation
//! management without hand-building requests.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rewire", about = "Operate a rewire server from the command line")]
struct Cli {
    /// Base URL of the rewire server.
    #[arg(long, env = "REWIRE_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Admin bearer token, required for `new`/`enable`/`disable`.
    #[arg(long, env = "REWIRE_ADMIN_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new expectation.
    New {
        #[arg(long)]
        name: String,
        #[arg(long)]
        owner_contact: String,
        #[arg(long)]
        expected_interval_s: i64,
        #[arg(long)]
        tolerance_s: i64,
        /// Internally tagged params, e.g. `{"kind":"schedule","max_runtime_s":0,"min_spacing_s":0,"allow_overlap":false}`.
        #[arg(long)]
        params_json: String,
    },
    /// Enable an expectation.
    Enable {
        #[arg(long)]
        id: String,
    },
    /// Disable an expectation.
    Disable {
        #[arg(long)]
        id: String,
    },
    /// Ack a pending alert trial.
    Ack {
        #[arg(long)]
        trial_id: String,
    },
    /// Check server liveness.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Command::New {
            name,
            owner_contact,
            expected_interval_s,
            tolerance_s,
            params_json,
        } => {
            let form = [
                ("name", name),
                ("owner_contact", owner_contact),
                ("expected_interval_s", expected_interval_s.to_string()),
                ("tolerance_s", tolerance_s.to_string()),
                ("params_json", params_json),
            ];
            let resp = admin_request(&client, &cli.server, &cli.token, "/admin/new", &form).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Enable { id } => {
            let form = [("id", id)];
            let resp = admin_request(&client, &cli.server, &cli.token, "/admin/enable", &form).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Disable { id } => {
            let form = [("id", id)];
            let resp = admin_request(&client, &cli.server, &cli.token, "/admin/disable", &form).await?;
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Ack { trial_id } => {
            let url = format!("{}/ack/{}", cli.server.trim_end_matches('/'), trial_id);
            let resp = client.get(url).send().await?;
            if resp.status().is_success() {
                println!("acked");
            } else {
                anyhow::bail!("ack failed: {}", resp.status());
            }
        }
        Command::Status => {
            let url = format!("{}/status", cli.server.trim_end_matches('/'));
            let resp = client.get(url).send().await?.text().await?;
            print!("{resp}");
        }
    }

    Ok(())
}

async fn admin_request(
    client: &reqwest::Client,
    server: &str,
    token: &Option<String>,
    path: &str,
    form: &[(&str, String)],
) -> anyhow::Result<serde_json::Value> {
    let token = token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--token (or REWIRE_ADMIN_TOKEN) is required for admin commands"))?;
    let url = format!("{}{}", server.trim_end_matches('/'), path);
    let resp = client
        .post(url)
        .bearer_auth(token)
        .form(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("request failed: {status}: {body}");
    }
    Ok(resp.json::<serde_json::Value>().await?)
}
