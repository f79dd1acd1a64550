use clap::{Parser, Subcommand};

/// Review and request access to cost objects
#[derive(Parser, Debug)]
#[command(name = "object-access", version, about)]
pub struct Cli {
    /// Base URL of the REST API
    #[arg(long, global = true, env = "OBJECT_ACCESS_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "OBJECT_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive review of access requests (administrators)
    Admin,

    /// Interactive request submission and history (default)
    Request,

    /// List cost objects
    Objects,

    /// List your own access requests
    MyRequests,

    /// List access requests for one object
    Requests {
        object_id: i64,
        /// PENDING, APPROVED, REJECTED or ALL
        #[arg(long, default_value = "ALL")]
        status: String,
    },

    /// Ask for access to an object
    RequestAccess {
        object_id: i64,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Approve a pending request
    Approve { object_id: i64, request_id: i64 },

    /// Reject a pending request
    Reject {
        object_id: i64,
        request_id: i64,
        #[arg(long)]
        reason: String,
    },
}

impl Commands {
    pub fn is_interactive(&self) -> bool {
        matches!(self, Commands::Admin | Commands::Request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reject() {
        let cli = Cli::parse_from([
            "object-access",
            "--token",
            "t",
            "reject",
            "1",
            "10",
            "--reason",
            "incomplete paperwork",
        ]);
        assert_eq!(cli.token.as_deref(), Some("t"));
        match cli.command {
            Some(Commands::Reject { object_id, request_id, reason }) => {
                assert_eq!((object_id, request_id), (1, 10));
                assert_eq!(reason, "incomplete paperwork");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_requests_default_status() {
        let cli = Cli::parse_from(["object-access", "requests", "3"]);
        match cli.command {
            Some(Commands::Requests { object_id, status }) => {
                assert_eq!(object_id, 3);
                assert_eq!(status, "ALL");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_command_is_allowed() {
        let cli = Cli::parse_from(["object-access"]);
        assert!(cli.command.is_none());
        assert!(Commands::Admin.is_interactive());
        assert!(!Commands::Objects.is_interactive());
    }

    #[test]
    fn test_global_flags_read_environment() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
                .map(|e| e.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("api_url").as_deref(), Some("OBJECT_ACCESS_API_URL"));
        assert_eq!(env_of("token").as_deref(), Some("OBJECT_ACCESS_TOKEN"));
    }
}
