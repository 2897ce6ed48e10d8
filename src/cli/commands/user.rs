use clap::Subcommand;
use serde_json::json;

use crate::auth::Role;
use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Change a user's role (admin, editor, user)")]
    SetRole {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "New role")]
        role: Role,
    },

    #[command(about = "List users with their roles")]
    List,
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = UserService::new(connect().await?);

    match cmd {
        UserCommands::SetRole { username, role } => {
            let user = service.set_role_by_username(&username, role).await?;
            output_success(
                output_format,
                &format!("User '{}' is now {}", user.username, user.role),
                Some(json!({ "id": user.id, "username": user.username, "role": user.role })),
            )
        }
        UserCommands::List => {
            let users = service.list().await?;
            match output_format {
                OutputFormat::Json => {
                    let rows: Vec<_> = users
                        .iter()
                        .map(|u| json!({ "id": u.id, "username": u.username, "role": u.role }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": rows }))?);
                }
                OutputFormat::Text => {
                    if users.is_empty() {
                        println!("No users");
                    }
                    for user in users {
                        println!("{:>6}  {:<8}  {}", user.id, user.role, user.username);
                    }
                }
            }
            Ok(())
        }
    }
}
