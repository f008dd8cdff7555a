//! QueueDesk CLI - Command-line client for the QueueDesk server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "queuedesk")]
#[command(about = "QueueDesk department queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "QUEUEDESK_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Session token from `login`
    #[arg(long, env = "QUEUEDESK_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List staff members and their queues
    Directory,

    /// Join a staff member's queue
    Join {
        /// Queue ID (from `directory`)
        queue_id: String,

        /// Your name
        #[arg(short, long)]
        name: String,

        /// Reason for the visit
        #[arg(short, long)]
        reason: String,
    },

    /// Show an entry's status and place in line
    Status {
        /// Entry ID (from `join`)
        entry_id: String,
    },

    /// Sign in and print a session token
    Login {
        #[command(subcommand)]
        who: LoginAs,
    },

    /// Revoke the current session token
    Logout,

    /// Show who the current token belongs to
    Whoami,

    /// Show a queue's entries (staff: defaults to your own queue)
    Entries {
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Open a queue for submissions
    Open {
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Close a queue to new submissions
    Close {
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Call the next waiting student
    CallNext {
        #[arg(short, long)]
        queue: Option<String>,
    },

    /// Mark an entry as skipped
    Skip { entry_id: String },

    /// Mark an entry as completed
    Complete { entry_id: String },

    /// Remove called students who never showed up
    Sweep,

    /// Manage staff members (admin)
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },

    /// Show system statistics (admin)
    Stats,

    /// Run housekeeping now (admin)
    Maintenance {
        /// Force VACUUM even if not needed
        #[arg(long)]
        force_vacuum: bool,
    },
}

#[derive(Subcommand)]
enum LoginAs {
    /// Admin email/password login
    Admin {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "QUEUEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Staff access-code login
    Staff { access_code: String },
    /// Create the admin account, then sign in
    Signup {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, env = "QUEUEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    List,
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        department: String,
    },
    Update {
        staff_id: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        department: String,
    },
    Delete {
        staff_id: String,
    },
    /// Issue a new access code
    Regen {
        staff_id: String,
    },
}

#[derive(Clone, Copy)]
enum QueueState {
    Open,
    Closed,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Tabled)]
struct DirectoryRow {
    queue_id: String,
    staff: String,
    department: String,
    status: String,
    waiting: i64,
    called: i64,
}

#[derive(Tabled)]
struct EntryRow {
    number: i64,
    entry_id: String,
    student: String,
    reason: String,
    status: String,
    position: String,
    deadline: String,
}

#[derive(Tabled)]
struct StaffRow {
    staff_id: String,
    name: String,
    email: String,
    department: String,
    access_code: String,
}

async fn call_rpc(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to server")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Attach the session token to a params object
fn with_token(token: &Option<String>, mut params: Value) -> Value {
    if let (Some(token), Some(obj)) = (token, params.as_object_mut()) {
        obj.insert("token".to_string(), json!(token));
    }
    params
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn position_label(value: &Value) -> String {
    match value.get("position").and_then(Value::as_i64) {
        Some(position) => format!(
            "#{} (~{} min)",
            position,
            value["estimated_wait_minutes"].as_i64().unwrap_or(0)
        ),
        None => "-".to_string(),
    }
}

fn entry_row(view: &Value) -> EntryRow {
    let entry = &view["entry"];
    EntryRow {
        number: entry["queue_number"].as_i64().unwrap_or(0),
        entry_id: text(&entry["id"]),
        student: text(&entry["student_name"]),
        reason: text(&entry["reason"]),
        status: text(&entry["status"]),
        position: position_label(&view["position"]),
        deadline: view["response_deadline"]
            .as_i64()
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn staff_row(staff: &Value) -> StaffRow {
    StaffRow {
        staff_id: text(&staff["id"]),
        name: text(&staff["name"]),
        email: text(&staff["email"]),
        department: text(&staff["department"]),
        access_code: text(&staff["access_code"]),
    }
}

fn print_login(result: &Value) {
    println!("{}", "✓ Signed in".green().bold());
    println!();
    println!("  {} {}", "Session:".bold(), result["session"]["kind"]);
    if let Some(queue_id) = result["queue_id"].as_str() {
        println!("  {} {}", "Queue:".bold(), queue_id);
    }
    println!();
    println!("  export QUEUEDESK_TOKEN={}", text(&result["token"]));
}

async fn set_queue_status(
    cli: &Cli,
    queue: &Option<String>,
    status: QueueState,
) -> Result<()> {
    let status = match status {
        QueueState::Open => "open",
        QueueState::Closed => "closed",
    };
    let params = with_token(&cli.token, json!({ "queue_id": queue, "status": status }));
    let queue = call_rpc(&cli.rpc_url, "queue.set_status.v1", params).await?;
    println!(
        "{}",
        format!("✓ Queue {} is now {}", text(&queue["id"]), status)
            .green()
            .bold()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(&cli).await
}

/// Run one command; any failed RPC is returned so the process exits non-zero
async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Directory => {
            let result = call_rpc(&cli.rpc_url, "directory.list.v1", json!({})).await?;
            let rows: Vec<DirectoryRow> = result
                .as_array()
                .map(|queues| {
                    queues
                        .iter()
                        .map(|q| DirectoryRow {
                            queue_id: text(&q["queue_id"]),
                            staff: text(&q["staff_name"]),
                            department: text(&q["department"]),
                            status: text(&q["status"]),
                            waiting: q["waiting_count"].as_i64().unwrap_or(0),
                            called: q["called_count"].as_i64().unwrap_or(0),
                        })
                        .collect()
                })
                .unwrap_or_default();

            if rows.is_empty() {
                println!("{}", "No queues yet".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Join {
            queue_id,
            name,
            reason,
        } => {
            let params = json!({
                "queue_id": queue_id,
                "student_name": name,
                "reason": reason,
            });
            let receipt = call_rpc(&cli.rpc_url, "queue.join.v1", params).await?;

            println!("{}", "✓ You're in line".green().bold());
            println!();
            println!("  {} {}", "Entry ID:".bold(), text(&receipt["entry"]["id"]));
            println!("  {} {}", "Number:".bold(), receipt["entry"]["queue_number"]);
            println!("  {} {}", "Position:".bold(), position_label(&receipt["position"]));
        }

        Commands::Status { entry_id } => {
            let view = call_rpc(
                &cli.rpc_url,
                "entry.status.v1",
                json!({ "entry_id": entry_id }),
            )
            .await?;
            println!("{}", Table::new(vec![entry_row(&view)]));
            if view["entry"]["status"] == "called" {
                println!();
                println!("{}", "You've been called. Please head over now.".cyan().bold());
            }
        }

        Commands::Login { who } => {
            let result = match who {
                LoginAs::Admin { email, password } => {
                    let params = json!({ "email": email, "password": password });
                    call_rpc(&cli.rpc_url, "auth.admin_login.v1", params).await?
                }
                LoginAs::Staff { access_code } => {
                    let params = json!({ "access_code": access_code });
                    call_rpc(&cli.rpc_url, "auth.staff_login.v1", params).await?
                }
                LoginAs::Signup {
                    email,
                    name,
                    password,
                } => {
                    let params = json!({ "email": email, "name": name, "password": password });
                    call_rpc(&cli.rpc_url, "auth.admin_signup.v1", params).await?;
                    let params = json!({ "email": email, "password": password });
                    call_rpc(&cli.rpc_url, "auth.admin_login.v1", params).await?
                }
            };
            print_login(&result);
        }

        Commands::Logout => {
            let result = call_rpc(
                &cli.rpc_url,
                "auth.logout.v1",
                with_token(&cli.token, json!({})),
            )
            .await?;
            if result["revoked"].as_bool().unwrap_or(false) {
                println!("{}", "✓ Signed out".green().bold());
            } else {
                println!("{}", "No active session".yellow());
            }
        }

        Commands::Whoami => {
            let result = call_rpc(
                &cli.rpc_url,
                "auth.whoami.v1",
                with_token(&cli.token, json!({})),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Entries { queue } => {
            let params = with_token(&cli.token, json!({ "queue_id": queue }));
            let result = call_rpc(&cli.rpc_url, "queue.entries.v1", params).await?;
            let rows: Vec<EntryRow> = result
                .as_array()
                .map(|entries| entries.iter().map(entry_row).collect())
                .unwrap_or_default();

            if rows.is_empty() {
                println!("{}", "Queue is empty".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Open { queue } => set_queue_status(cli, queue, QueueState::Open).await?,
        Commands::Close { queue } => set_queue_status(cli, queue, QueueState::Closed).await?,

        Commands::CallNext { queue } => {
            let params = with_token(&cli.token, json!({ "queue_id": queue }));
            let view = call_rpc(&cli.rpc_url, "queue.call_next.v1", params).await?;
            println!(
                "{}",
                format!(
                    "✓ Called #{} {}",
                    view["entry"]["queue_number"],
                    text(&view["entry"]["student_name"])
                )
                .green()
                .bold()
            );
            println!("{}", Table::new(vec![entry_row(&view)]));
        }

        Commands::Skip { entry_id } => {
            let params = with_token(&cli.token, json!({ "entry_id": entry_id }));
            call_rpc(&cli.rpc_url, "entry.skip.v1", params).await?;
            println!("{}", format!("✓ Entry {} skipped", entry_id).green().bold());
        }

        Commands::Complete { entry_id } => {
            let params = with_token(&cli.token, json!({ "entry_id": entry_id }));
            call_rpc(&cli.rpc_url, "entry.complete.v1", params).await?;
            println!("{}", format!("✓ Entry {} completed", entry_id).green().bold());
        }

        Commands::Sweep => {
            let params = with_token(&cli.token, json!({}));
            let result = call_rpc(&cli.rpc_url, "queue.sweep.v1", params).await?;
            let removed = result["removed"].as_array().map(Vec::len).unwrap_or(0);
            println!("  {} {} unresponsive entries removed", "✓".green(), removed);
        }

        Commands::Staff { action } => match action {
            StaffAction::List => {
                let params = with_token(&cli.token, json!({}));
                let result = call_rpc(&cli.rpc_url, "admin.staff.list.v1", params).await?;
                let rows: Vec<StaffRow> = result["staff"]
                    .as_array()
                    .map(|staff| staff.iter().map(staff_row).collect())
                    .unwrap_or_default();
                if rows.is_empty() {
                    println!("{}", "No staff members".yellow());
                } else {
                    println!("{}", Table::new(rows));
                }
            }
            StaffAction::Create {
                name,
                email,
                department,
            } => {
                let params = with_token(
                    &cli.token,
                    json!({ "name": name, "email": email, "department": department }),
                );
                let staff = call_rpc(&cli.rpc_url, "admin.staff.create.v1", params).await?;
                println!("{}", "✓ Staff member created".green().bold());
                println!();
                println!("{}", Table::new(vec![staff_row(&staff)]));
            }
            StaffAction::Update {
                staff_id,
                name,
                email,
                department,
            } => {
                let params = with_token(
                    &cli.token,
                    json!({
                        "staff_id": staff_id,
                        "name": name,
                        "email": email,
                        "department": department,
                    }),
                );
                let staff = call_rpc(&cli.rpc_url, "admin.staff.update.v1", params).await?;
                println!("{}", "✓ Staff member updated".green().bold());
                println!();
                println!("{}", Table::new(vec![staff_row(&staff)]));
            }
            StaffAction::Delete { staff_id } => {
                let params = with_token(&cli.token, json!({ "staff_id": staff_id }));
                call_rpc(&cli.rpc_url, "admin.staff.delete.v1", params).await?;
                println!(
                    "{}",
                    format!("✓ Staff member {} and their queue deleted", staff_id)
                        .green()
                        .bold()
                );
            }
            StaffAction::Regen { staff_id } => {
                let params = with_token(&cli.token, json!({ "staff_id": staff_id }));
                let staff =
                    call_rpc(&cli.rpc_url, "admin.staff.regenerate_code.v1", params).await?;
                println!(
                    "{} {}",
                    "✓ New access code:".green().bold(),
                    text(&staff["access_code"]).bold()
                );
            }
        },

        Commands::Stats => {
            println!("{}", "System Status".cyan().bold());
            println!();

            let params = with_token(&cli.token, json!({}));
            match call_rpc(&cli.rpc_url, "admin.stats.v1", params).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Staff:".bold(), stats["staff_count"]);
                    println!(
                        "  {} {} open / {} closed",
                        "Queues:".bold(),
                        stats["open_queues"],
                        stats["closed_queues"]
                    );
                    println!("  {} {}", "Waiting:".bold(), stats["waiting_entries"]);
                    println!("  {} {}", "Called:".bold(), stats["called_entries"]);
                    println!("  {} {}", "Skipped:".bold(), stats["skipped_entries"]);
                    println!("  {} {}", "Completed:".bold(), stats["completed_entries"]);
                    println!();
                    println!(
                        "  {} {:.2} MB",
                        "DB Size:".bold(),
                        stats["db_size_mb"].as_f64().unwrap_or(0.0)
                    );
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_secs"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    return Err(e.context("Failed to fetch stats"));
                }
            }
        }

        Commands::Maintenance { force_vacuum } => {
            println!("{}", "Running maintenance...".cyan().bold());
            println!();

            if *force_vacuum {
                println!("  {} Force VACUUM enabled", "•".bold());
            }

            let params = with_token(&cli.token, json!({ "force_vacuum": force_vacuum }));

            match call_rpc(&cli.rpc_url, "admin.maintenance.v1", params).await {
                Ok(result) => {
                    println!("  ✓ Maintenance completed");
                    println!();
                    if result["vacuum_run"].as_bool().unwrap_or(false) {
                        println!("  {} VACUUM executed", "✓".green());
                    } else {
                        println!("  ○ VACUUM skipped (not needed)");
                    }
                    println!(
                        "  {} {} finished entries deleted",
                        "✓".green(),
                        result["entries_deleted"]
                    );
                    println!();
                    let size_before_mb =
                        result["db_size_before"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    let size_after_mb =
                        result["db_size_after"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    println!(
                        "  {} {:.2} MB → {:.2} MB",
                        "DB Size:".bold(),
                        size_before_mb,
                        size_after_mb
                    );
                }
                Err(e) => {
                    println!("  {} Maintenance failed", "✗".red());
                    return Err(e.context("Maintenance failed"));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_token_inserts_field() {
        let params = with_token(&Some("abc".to_string()), json!({ "entry_id": "e-1" }));
        assert_eq!(params["token"], "abc");
        assert_eq!(params["entry_id"], "e-1");

        let anonymous = with_token(&None, json!({}));
        assert!(anonymous.get("token").is_none());
    }

    #[test]
    fn test_position_label() {
        let pos = json!({ "position": 3, "estimated_wait_minutes": 15 });
        assert_eq!(position_label(&pos), "#3 (~15 min)");
        assert_eq!(position_label(&Value::Null), "-");
    }

    /// Nothing listens on port 1
    const UNREACHABLE: &str = "http://127.0.0.1:1";

    #[tokio::test]
    async fn test_failed_stats_is_an_error() {
        let cli = Cli::try_parse_from(["queuedesk", "--rpc-url", UNREACHABLE, "stats"]).unwrap();
        let err = run(&cli).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch stats"), "got {:#}", err);
    }

    #[tokio::test]
    async fn test_failed_maintenance_is_an_error() {
        let cli =
            Cli::try_parse_from(["queuedesk", "--rpc-url", UNREACHABLE, "maintenance"]).unwrap();
        assert!(run(&cli).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_call_propagates() {
        let cli = Cli::try_parse_from(["queuedesk", "--rpc-url", UNREACHABLE, "directory"]).unwrap();
        let err = run(&cli).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to connect"), "got {:#}", err);
    }

    #[test]
    fn test_cli_parses_staff_create() {
        let cli = Cli::try_parse_from([
            "queuedesk",
            "staff",
            "create",
            "--name",
            "Grace",
            "--email",
            "grace@uni.edu",
            "--department",
            "CS",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Staff {
                action: StaffAction::Create { .. }
            }
        ));
    }
}
