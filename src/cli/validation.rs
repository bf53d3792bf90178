use crate::cli::args::{CliArgs, Commands, ListArgs, ViewArgs};
use crate::output::OutputFormat;
use crate::paginator::PAGE_SIZES;
use crate::query::{SortField, StatusFilter};

fn check_page_size(value: Option<usize>) -> Result<(), String> {
    if let Some(size) = value {
        if !PAGE_SIZES.contains(&size) {
            return Err(format!(
                "invalid page-size {size}, expected one of 5, 10, 25, 50"
            ));
        }
    }
    Ok(())
}

fn check_view(view: &ViewArgs) -> Result<(), String> {
    check_page_size(view.page_size)?;
    if let Some(raw) = view.status.as_deref() {
        StatusFilter::parse(raw).ok_or_else(|| {
            format!("invalid --status '{raw}', expected any, completed or incomplete")
        })?;
    }
    if let Some(raw) = view.sort.as_deref() {
        SortField::parse(raw).ok_or_else(|| {
            format!("invalid --sort '{raw}', expected name, identity, reason, entry, exit or status")
        })?;
    }
    if view.page == Some(0) {
        return Err("invalid page, expected positive integer".to_string());
    }
    Ok(())
}

fn check_list(list: &ListArgs) -> Result<(), String> {
    check_view(&list.view)?;
    if let Some(raw) = list.output_format.as_deref() {
        OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected table or json"))?;
    }
    Ok(())
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    match &args.command {
        Commands::List(list) => check_list(list)?,
        Commands::Dashboard(dash) => check_view(&dash.view)?,
        Commands::Update(update) if update.url.trim().is_empty() => {
            return Err("invalid record url, expected a non-empty value".to_string());
        }
        Commands::Delete(delete) if delete.url.trim().is_empty() => {
            return Err("invalid record url, expected a non-empty value".to_string());
        }
        _ => {}
    }
    Ok(())
}
