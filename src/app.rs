use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::auth::{AuthGuard, FileSession, MemorySession, SessionStore};
use crate::cli::args::{CliArgs, Commands, DashboardArgs, ListArgs, LoginArgs, RecordArgs, ViewArgs};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::console::{Command, Console, Outcome};
use crate::dashboard::{render_charts, DashboardClient};
use crate::endpoints::{Endpoints, DEFAULT_API_BASE};
use crate::error::ClientError;
use crate::fetcher::PageFetcher;
use crate::gateway::MutationGateway;
use crate::output::{self, OutputFormat, TerminalCharts};
use crate::paginator::PageSize;
use crate::query::{Filters, SortDirection, SortField, SortState, StatusFilter};
use crate::record::RecordForm;
use crate::transport::{HttpTransport, Transport, TransportOptions};

fn arg_flags(arg: &clap::Arg) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(short) = arg.get_short() {
        parts.push(format!("-{short}"));
    }
    if let Some(long) = arg.get_long() {
        parts.push(format!("--{long}"));
    }
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        let alias = format!("--{alias}");
        if !parts.contains(&alias) {
            parts.push(alias);
        }
    }
    let mut flags = parts.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        flags.push_str(&format!(" <{value}>"));
    }
    flags
}

// Global options grouped by help heading, commands listed in `::` lines.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default()
    );
    if let Some(about) = cmd.get_long_about().or(cmd.get_about()) {
        out.push_str(&format!("{about}\n"));
    }

    out.push_str(&format!("\nUsage: {} [OPTIONS] <COMMAND>\n\nCommands:\n", cmd.get_name()));
    for sub in cmd.get_subcommands() {
        let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
        out.push_str(&output::format_kv_line(sub.get_name(), &about));
        out.push('\n');
    }

    let mut sections: Vec<(&str, Vec<String>)> = Vec::new();
    for arg in cmd.get_arguments() {
        if arg.is_hide_set() || arg.is_positional() {
            continue;
        }
        let heading = arg.get_help_heading().unwrap_or("Options");
        let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
        let line = format!("   {:<34} {}", arg_flags(arg), help.trim());
        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, lines)) => lines.push(line),
            None => sections.push((heading, vec![line])),
        }
    }
    for (heading, lines) in sections {
        out.push_str(&format!("\n{heading}:\n"));
        for line in lines {
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out.push_str("\nRun `visitlog <COMMAND> --help` for the options of a command.\n");
    out
}

#[derive(Debug)]
struct RunConfig {
    verbose: u8,
    no_color: bool,
    api_base: String,
    timeout: u64,
    proxy: Option<String>,
    page_size: PageSize,
    session_path: PathBuf,
    command: Commands,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let api_base = args
        .api_base
        .or(cfg.api_base)
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(30);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let page_size = match cfg.page_size {
        Some(value) => PageSize::new(value).map_err(|e| format!("invalid config: {e}"))?,
        None => PageSize::default(),
    };

    let session_path = match args.session_file.or(cfg.session_file) {
        Some(path) => config::expand_tilde(&path),
        None => config::default_session_path()
            .ok_or_else(|| "could not resolve a home directory for the session file".to_string())?,
    };

    Ok(RunConfig {
        verbose: args.verbose,
        no_color,
        api_base,
        timeout,
        proxy,
        page_size,
        session_path,
        command: args.command,
    })
}

fn filters_from_args(view: &ViewArgs) -> Filters {
    Filters {
        search: view.search.clone().unwrap_or_default(),
        name: view.name.clone().unwrap_or_default(),
        identity_code: view.identity.clone().unwrap_or_default(),
        reason: view.reason.clone().unwrap_or_default(),
        status: view
            .status
            .as_deref()
            .and_then(StatusFilter::parse)
            .unwrap_or_default(),
    }
}

/// `--sort` alone starts ascending, like picking a new column header.
fn sort_from_args(view: &ViewArgs) -> SortState {
    let field = view.sort.as_deref().and_then(SortField::parse);
    let default = SortState::default();
    let direction = if view.desc {
        SortDirection::Descending
    } else if view.asc || field.is_some() {
        SortDirection::Ascending
    } else {
        default.direction
    };
    SortState::new(field.unwrap_or(default.field), direction)
}

/// Filters, sort and page flags applied to a loaded console, in that order.
fn apply_view(console: &mut Console, view: &ViewArgs) -> Result<(), String> {
    console.set_filters(filters_from_args(view));
    console.set_sort(sort_from_args(view));
    if let Some(size) = view.page_size {
        console.set_page_size(PageSize::new(size).map_err(client_error)?);
    }
    console.go_to_page(view.page.unwrap_or(1));
    Ok(())
}

fn output_format(list: &ListArgs) -> OutputFormat {
    if list.json {
        return OutputFormat::Json;
    }
    list.output_format
        .as_deref()
        .and_then(OutputFormat::parse)
        .unwrap_or(OutputFormat::Table)
}

fn apply_record_args(form: &mut RecordForm, fields: &RecordArgs) {
    if let Some(name) = fields.name.as_ref() {
        form.name = name.clone();
    }
    if let Some(identity) = fields.identity.as_ref() {
        form.identity_code = identity.clone();
    }
    if let Some(reason) = fields.reason.as_ref() {
        form.reason = reason.clone();
    }
    if let Some(entry) = fields.entry.as_ref() {
        form.entry_time = entry.trim().to_string();
    }
    if let Some(exit) = fields.exit.as_ref() {
        form.exit_time = exit.trim().to_string();
    }
    if let Some(completed) = fields.completed {
        form.completed = completed;
    }
}

fn session_store(path: PathBuf) -> Box<dyn SessionStore> {
    match std::env::var("VISITLOG_TOKEN") {
        Ok(token) if !token.trim().is_empty() => {
            tracing::debug!("using access token from VISITLOG_TOKEN");
            Box::new(MemorySession::with_token(token.trim()))
        }
        _ => Box::new(FileSession::new(path)),
    }
}

fn fetch_spinner() -> Result<ProgressBar, String> {
    if !std::io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: Fetching {spinner} [{elapsed_precise}] :: {msg}")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?,
    );
    Ok(pb)
}

fn prompt_line(label: &str) -> Result<String, String> {
    print!("{label}");
    std::io::stdout()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("failed to read input: {e}"))?;
    Ok(line.trim().to_string())
}

fn confirm_delete(url: &str) -> Result<bool, String> {
    let answer = prompt_line(&format!("Delete {url}? This cannot be undone [y/N]: "))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí"))
}

fn report_outcome(outcome: Outcome) {
    let verb = match outcome {
        Outcome::Refreshed(_) => "refreshed",
        Outcome::Created(_) => "record created",
        Outcome::Updated(_) => "record updated",
        Outcome::Deleted(_) => "record deleted",
    };
    let report = outcome.report();
    output::notice_ok(&format!(
        "{verb} :: {} records loaded in {} page(s)",
        report.records, report.pages
    ));
}

fn client_error(e: ClientError) -> String {
    if e.is_auth() {
        tracing::debug!(error = %e, "session ended");
    }
    e.to_string()
}

struct Session {
    transport: Arc<dyn Transport>,
    guard: Arc<AuthGuard>,
    endpoints: Endpoints,
}

impl Session {
    /// A console whose fetcher reports page progress on the returned spinner.
    fn console(&self, page_size: PageSize) -> Result<(Console, ProgressBar), String> {
        let spinner = fetch_spinner()?;
        let fetcher = PageFetcher::new(
            self.transport.clone(),
            self.guard.clone(),
            self.endpoints.records(),
        )
        .with_progress(spinner.clone());
        let gateway = MutationGateway::new(
            self.transport.clone(),
            self.guard.clone(),
            self.endpoints.records(),
        );
        let mut console = Console::new(fetcher, gateway);
        console.set_page_size(page_size);
        Ok((console, spinner))
    }

    async fn refreshed(&self, page_size: PageSize) -> Result<Console, String> {
        let (mut console, spinner) = self.console(page_size)?;
        let outcome = console.dispatch(Command::Refresh).await;
        spinner.finish_and_clear();
        outcome.map_err(client_error)?;
        Ok(console)
    }
}

async fn run_login(session: &Session, login: LoginArgs) -> Result<(), String> {
    let username = match login.username {
        Some(u) if !u.trim().is_empty() => u,
        _ => prompt_line("Username: ")?,
    };
    let password = match login.password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ")
            .map_err(|e| format!("failed to read password: {e}"))?,
    };
    session
        .guard
        .login(
            session.transport.as_ref(),
            &session.endpoints.token(),
            &username,
            &password,
        )
        .await
        .map_err(client_error)?;
    output::notice_ok(&format!("logged in as {username}"));
    Ok(())
}

async fn run_list(session: &Session, list: ListArgs, page_size: PageSize) -> Result<(), String> {
    let mut console = session.refreshed(page_size).await?;
    apply_view(&mut console, &list.view)?;

    let window = console.window();
    match output_format(&list) {
        OutputFormat::Json => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&output::render_json(console.state(), &window))
                .and_then(|_| stdout.write_all(b"\n"))
                .map_err(|e| format!("failed to write output: {e}"))?;
        }
        OutputFormat::Table => print!("{}", output::render_table(&window, &Local)),
    }
    Ok(())
}

async fn run_create(session: &Session, fields: RecordArgs, page_size: PageSize) -> Result<(), String> {
    let (mut console, spinner) = session.console(page_size)?;
    console.open_create();
    if let Some(form) = console.panel_mut().form_mut() {
        apply_record_args(form, &fields);
    }
    let outcome = console.submit_panel(&Local).await;
    spinner.finish_and_clear();
    report_outcome(outcome.map_err(client_error)?);
    Ok(())
}

async fn run_update(
    session: &Session,
    url: String,
    fields: RecordArgs,
    page_size: PageSize,
) -> Result<(), String> {
    let mut console = session.refreshed(page_size).await?;
    console.open_edit(url.trim(), &Local).map_err(client_error)?;
    if let Some(form) = console.panel_mut().form_mut() {
        apply_record_args(form, &fields);
    }
    let outcome = console.submit_panel(&Local).await;
    report_outcome(outcome.map_err(client_error)?);
    Ok(())
}

async fn run_delete(session: &Session, url: String, yes: bool, page_size: PageSize) -> Result<(), String> {
    let url = url.trim().to_string();
    if !yes && !confirm_delete(&url)? {
        output::notice_warn("delete cancelled");
        return Ok(());
    }
    let (mut console, spinner) = session.console(page_size)?;
    let outcome = console.dispatch(Command::Delete(url)).await;
    spinner.finish_and_clear();
    report_outcome(outcome.map_err(client_error)?);
    Ok(())
}

async fn run_dashboard(session: &Session, dash: DashboardArgs, page_size: PageSize) -> Result<(), String> {
    let client = DashboardClient::new(
        session.transport.clone(),
        session.guard.clone(),
        session.endpoints.dashboard(),
    );
    let metrics = client.fetch().await.map_err(client_error)?;
    println!("{}", output::render_metrics(&metrics));
    println!();

    let mut charts = TerminalCharts::new(dash.width.unwrap_or(40));
    render_charts(&metrics, &mut charts);
    print!("{}", charts.finish());

    let mut console = session.refreshed(page_size).await?;
    apply_view(&mut console, &dash.view)?;
    print!("{}", output::render_table(&console.window(), &Local));
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let endpoints = Endpoints::new(&run.api_base).map_err(client_error)?;
    let options = TransportOptions {
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
    };
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&options).map_err(client_error)?);
    let guard = Arc::new(AuthGuard::new(session_store(run.session_path.clone())));

    if run.verbose > 0 {
        eprintln!("{}", output::format_kv_line("API", endpoints.base()));
        eprintln!("{}", output::format_kv_line("Timeout", &format!("{}s", run.timeout)));
    }

    let session = Session {
        transport,
        guard,
        endpoints,
    };

    match run.command {
        Commands::Login(login) => run_login(&session, login).await,
        Commands::Logout => {
            session.guard.logout().map_err(client_error)?;
            output::notice_ok("logged out");
            Ok(())
        }
        Commands::List(list) => run_list(&session, list, run.page_size).await,
        Commands::Create(fields) => run_create(&session, fields, run.page_size).await,
        Commands::Update(update) => {
            run_update(&session, update.url, update.fields, run.page_size).await
        }
        Commands::Delete(delete) => {
            run_delete(&session, delete.url, delete.yes, run.page_size).await
        }
        Commands::Dashboard(dash) => run_dashboard(&session, dash, run.page_size).await,
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp if std::env::args().len() <= 2 => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{e}");
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.clone().map(|p| config::expand_tilde(&p)) {
        Some(path) => config::load_config(&path, false)?,
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(e) = config::ensure_default_config_file(&path) {
                    output::notice_warn(&e);
                }
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    if run.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init(run.verbose, !run.no_color)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
