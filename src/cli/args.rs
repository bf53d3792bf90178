use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "visitlog",
    version,
    about = "administrative client for the visitor-log service",
    long_about = "visitlog lists, searches, creates, edits and deletes visitor-log records and shows the dashboard metrics of the visitor-log API.\n\nExamples:\n  visitlog login -U admin\n  visitlog list --search ana --status incomplete --sort name\n  visitlog create --name \"Ana Pérez\" --identity 12345678-5 --reason Reunión --entry 2024-05-01T09:30\n  visitlog dashboard\n\nTip: Use --config to persist the API base and page size."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.visitlog/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'u',
        long = "api",
        visible_alias = "api-base",
        value_name = "URL",
        env = "VISITLOG_API_BASE",
        global = true,
        help_heading = "HTTP",
        help = "Base URL of the visitor-log API."
    )]
    pub api_base: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "sf",
        visible_alias = "session-file",
        value_name = "FILE",
        global = true,
        help_heading = "Session",
        help = "Where the access token is kept (defaults to ~/.visitlog/session)."
    )]
    pub session_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Exchange credentials for an access token.
    Login(LoginArgs),
    /// Forget the stored access token.
    Logout,
    /// Fetch every record and show one page of the filtered, sorted list.
    List(ListArgs),
    /// Create a record.
    Create(RecordArgs),
    /// Update a record by its URL.
    Update(UpdateArgs),
    /// Delete a record by its URL.
    Delete(DeleteArgs),
    /// Show metrics and charts, followed by one page of the filtered, sorted list.
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    #[arg(
        short = 'U',
        long = "username",
        value_name = "USER",
        env = "VISITLOG_USERNAME",
        help_heading = "Session",
        help = "Account name (prompted when absent)."
    )]
    pub username: Option<String>,

    #[arg(
        short = 'P',
        long = "password",
        value_name = "PASSWORD",
        env = "VISITLOG_PASSWORD",
        hide_env_values = true,
        help_heading = "Session",
        help = "Account password (prompted without echo when absent)."
    )]
    pub password: Option<String>,
}

// Filter, sort and page flags shared by `list` and `dashboard`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    #[arg(
        short = 'q',
        long = "search",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Match name, identity code or reason (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        long = "name",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Name contains TEXT."
    )]
    pub name: Option<String>,

    #[arg(
        long = "identity",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Identity code contains TEXT."
    )]
    pub identity: Option<String>,

    #[arg(
        long = "reason",
        value_name = "TEXT",
        help_heading = "Filters",
        help = "Reason contains TEXT."
    )]
    pub reason: Option<String>,

    #[arg(
        short = 's',
        long = "status",
        value_name = "STATUS",
        help_heading = "Filters",
        help = "Visit status: any, completed or incomplete."
    )]
    pub status: Option<String>,

    #[arg(
        short = 'o',
        long = "sort",
        value_name = "FIELD",
        help_heading = "Sorting",
        help = "Sort field: name, identity, reason, entry, exit or status (default: entry, newest first)."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "desc",
        conflicts_with = "asc",
        help_heading = "Sorting",
        help = "Sort descending."
    )]
    pub desc: bool,

    #[arg(long = "asc", help_heading = "Sorting", help = "Sort ascending.")]
    pub asc: bool,

    #[arg(
        long = "page",
        value_name = "N",
        help_heading = "Pagination",
        help = "Page to show, clamped to the last page (default: 1)."
    )]
    pub page: Option<usize>,

    #[arg(
        short = 'z',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Pagination",
        help = "Rows per page: 5, 10, 25 or 50."
    )]
    pub page_size: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (table or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        long = "json",
        help_heading = "Output",
        help = "Shorthand for --output-format json."
    )]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    #[arg(long = "name", value_name = "TEXT", help = "Visitor name.")]
    pub name: Option<String>,

    #[arg(
        long = "identity",
        value_name = "CODE",
        help = "Identity code, 7-8 digits, dash, check character (e.g. 12345678-K)."
    )]
    pub identity: Option<String>,

    #[arg(long = "reason", value_name = "TEXT", help = "Reason for the visit.")]
    pub reason: Option<String>,

    #[arg(
        long = "entry",
        value_name = "YYYY-MM-DDTHH:MM",
        help = "Entry time in local time; empty clears it."
    )]
    pub entry: Option<String>,

    #[arg(
        long = "exit",
        value_name = "YYYY-MM-DDTHH:MM",
        help = "Exit time in local time; empty clears it."
    )]
    pub exit: Option<String>,

    #[arg(
        long = "completed",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Mark the visit as completed."
    )]
    pub completed: Option<bool>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(value_name = "URL", help = "Record URL as shown by `visitlog list`.")]
    pub url: String,

    #[command(flatten)]
    pub fields: RecordArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(value_name = "URL", help = "Record URL as shown by `visitlog list`.")]
    pub url: String,

    #[arg(short = 'y', long = "yes", help = "Do not ask for confirmation.")]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    #[arg(
        long = "width",
        value_name = "COLUMNS",
        help_heading = "Output",
        help = "Width of the longest chart bar (default: 40)."
    )]
    pub width: Option<usize>,
}
