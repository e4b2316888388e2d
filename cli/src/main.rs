use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("i/o failed on {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

#[derive(Parser, Debug)]
#[command(name = "studio-cli", about = "Studio assistant chat and project CLI")]
struct Cli {
    #[arg(long, env = "STUDIO_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    /// Interactive chat. `/ui`, `/dashboard [tab]` and `/quit` are commands.
    Chat {
        #[arg(long)]
        session: Option<String>,
    },
    /// Send one message and print the outcome.
    Say {
        text: String,
        #[arg(long)]
        session: Option<String>,
    },
    Dashboard(DashboardArgs),
    Project(ProjectCommand),
}

#[derive(Args, Debug)]
struct DashboardArgs {
    session: String,
    #[arg(long)]
    tab: Option<String>,
    #[arg(long)]
    project_id: Option<i32>,
    #[arg(long)]
    file_id: Option<i32>,
}

#[derive(Args, Debug)]
struct ProjectCommand {
    #[command(subcommand)]
    command: ProjectSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectSubcommand {
    List,
    Read {
        project_id: i32,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, help = "RFC 3339, e.g. 2025-04-02T00:00:00Z")]
        start_date: String,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        project_id: i32,
    },
    Export {
        project_id: i32,
        #[arg(long, help = "Output file; stdout when omitted")]
        output: Option<PathBuf>,
    },
    Import {
        project_id: i32,
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, client: reqwest::Client::new() };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Chat { session } => run_chat(&ctx, session).await,
        Command::Say { text, session } => run_say(&ctx, &text, session).await,
        Command::Dashboard(args) => run_dashboard(&ctx, args).await,
        Command::Project(project) => run_project(&ctx, project).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let response = cli.client.get(url(cli, "/healthz")).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

// =============================================================================
// CHAT
// =============================================================================

async fn open_or_reuse(cli: &CliContext, session: Option<String>) -> Result<(String, Option<Value>), CliError> {
    if let Some(id) = session {
        return Ok((id, None));
    }
    let created = api_request(cli, reqwest::Method::POST, "/api/chat/sessions", None).await?;
    let id = created
        .get("id")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(CliError::MissingField("id"))?;
    eprintln!("session: {id}");
    Ok((id, Some(created)))
}

async fn submit(cli: &CliContext, session: &str, text: &str) -> Result<Value, CliError> {
    let path = format!("/api/chat/sessions/{session}/messages");
    api_request(cli, reqwest::Method::POST, &path, Some(serde_json::json!({ "text": text }))).await
}

/// Human-readable lines for one submit outcome.
fn render_outcome(outcome: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(reply) = outcome.get("reply").and_then(Value::as_str) {
        lines.push(format!("assistant> {reply}"));
    }
    let unlocked: Vec<&str> = outcome
        .get("unlocked")
        .and_then(Value::as_array)
        .map(|panels| panels.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !unlocked.is_empty() {
        lines.push(format!("[unlocked: {}]", unlocked.join(", ")));
    }
    lines
}

async fn run_chat(cli: &CliContext, session: Option<String>) -> Result<(), CliError> {
    let (session, created) = open_or_reuse(cli, session).await?;
    if let Some(greeting) = created
        .as_ref()
        .and_then(|c| c.pointer("/messages/0/text"))
        .and_then(Value::as_str)
    {
        println!("assistant> {greeting}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout
            .write_all(b"you> ")
            .await
            .map_err(|source| CliError::Io { path: "stdout".to_owned(), source })?;
        stdout.flush().await.map_err(|source| CliError::Io { path: "stdout".to_owned(), source })?;

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|source| CliError::Io { path: "stdin".to_owned(), source })?
        else {
            break;
        };
        let line = line.trim();
        match line {
            "" => {}
            "/quit" | "/exit" => break,
            "/ui" => {
                let path = format!("/api/chat/sessions/{session}/ui");
                print_json(&api_request(cli, reqwest::Method::GET, &path, None).await?)?;
            }
            _ if line.starts_with("/dashboard") => {
                let tab = line.trim_start_matches("/dashboard").trim();
                let path = dashboard_path(&session, (!tab.is_empty()).then_some(tab), None, None);
                print_json(&api_request(cli, reqwest::Method::GET, &path, None).await?)?;
            }
            text => {
                let outcome = submit(cli, &session, text).await?;
                for rendered in render_outcome(&outcome) {
                    println!("{rendered}");
                }
            }
        }
    }
    Ok(())
}

async fn run_say(cli: &CliContext, text: &str, session: Option<String>) -> Result<(), CliError> {
    let (session, _) = open_or_reuse(cli, session).await?;
    let outcome = submit(cli, &session, text).await?;
    print_json(&outcome)
}

fn dashboard_path(session: &str, tab: Option<&str>, project_id: Option<i32>, file_id: Option<i32>) -> String {
    let mut params = Vec::new();
    if let Some(tab) = tab {
        params.push(format!("tab={tab}"));
    }
    if let Some(project_id) = project_id {
        params.push(format!("projectId={project_id}"));
    }
    if let Some(file_id) = file_id {
        params.push(format!("fileId={file_id}"));
    }
    let base = format!("/api/chat/sessions/{session}/dashboard");
    if params.is_empty() { base } else { format!("{base}?{}", params.join("&")) }
}

async fn run_dashboard(cli: &CliContext, args: DashboardArgs) -> Result<(), CliError> {
    let path = dashboard_path(&args.session, args.tab.as_deref(), args.project_id, args.file_id);
    print_json(&api_request(cli, reqwest::Method::GET, &path, None).await?)
}

// =============================================================================
// PROJECTS
// =============================================================================

async fn run_project(cli: &CliContext, project: ProjectCommand) -> Result<(), CliError> {
    match project.command {
        ProjectSubcommand::List => {
            let json = api_request(cli, reqwest::Method::GET, "/api/projects", None).await?;
            print_json(&json)
        }
        ProjectSubcommand::Read { project_id } => {
            let path = format!("/api/projects/{project_id}");
            let json = api_request(cli, reqwest::Method::GET, &path, None).await?;
            print_json(&json)
        }
        ProjectSubcommand::Create { name, start_date, end_date, description } => {
            let mut body = Map::new();
            body.insert("name".to_owned(), Value::String(name));
            body.insert("startDate".to_owned(), Value::String(start_date));
            if let Some(end_date) = end_date {
                body.insert("endDate".to_owned(), Value::String(end_date));
            }
            if let Some(description) = description {
                body.insert("description".to_owned(), Value::String(description));
            }
            let json = api_request(cli, reqwest::Method::POST, "/api/projects", Some(Value::Object(body))).await?;
            print_json(&json)
        }
        ProjectSubcommand::Delete { project_id } => {
            let path = format!("/api/projects/{project_id}");
            api_request(cli, reqwest::Method::DELETE, &path, None).await?;
            eprintln!("deleted project {project_id}");
            Ok(())
        }
        ProjectSubcommand::Export { project_id, output } => {
            let response = cli
                .client
                .get(url(cli, &format!("/api/projects/{project_id}/export.jsonl")))
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                return Err(CliError::ServerError { status: status.as_u16(), message: body });
            }
            match output {
                Some(path) => {
                    tokio::fs::write(&path, body.as_bytes())
                        .await
                        .map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
                    eprintln!("exported {} lines to {}", body.lines().count(), path.display());
                }
                None => print!("{body}"),
            }
            Ok(())
        }
        ProjectSubcommand::Import { project_id, input } => {
            let jsonl = tokio::fs::read_to_string(&input)
                .await
                .map_err(|source| CliError::Io { path: input.display().to_string(), source })?;
            let path = format!("/api/projects/{project_id}/import.jsonl");
            let json =
                api_request(cli, reqwest::Method::POST, &path, Some(serde_json::json!({ "jsonl": jsonl }))).await?;
            print_json(&json)
        }
    }
}

// =============================================================================
// HTTP
// =============================================================================

fn url(cli: &CliContext, path: &str) -> String {
    format!("{}{}", cli.base_url.trim_end_matches('/'), path)
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let request = cli.client.request(method, url(cli, path));
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), ToOwned::to_owned);
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
