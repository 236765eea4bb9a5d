use clap::{CommandFactory, Parser};
use prodline_cli::cli::{Cli, Command, build_overrides, expand_status_shortcut};
use prodline_core::config::{Config, load_config_with_fallback, merge_overrides};
use prodline_core::error::AppError;
use prodline_core::job_api::{self, ComponentUpdate, NewJob, ProductionLine};
use prodline_core::model::{Component, Job, Status, house_models};
use prodline_core::stats::{self, Dashboard};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Done")]
    progress: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Responsible")]
    resp_user: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "#")]
    sequence: u32,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Started")]
    started_at: String,
    #[tabled(rename = "Finished")]
    finished_at: String,
    #[tabled(rename = "Pauses")]
    pauses: usize,
    #[tabled(rename = "Minutes")]
    minutes: i64,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Job")]
    job_id: String,
    #[tabled(rename = "Name")]
    job_name: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Component ID")]
    component_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Minutes")]
    minutes: i64,
}

fn stamp(value: Option<OffsetDateTime>) -> String {
    value
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn day(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.date().to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))
}

fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

fn job_row(job: &Job) -> JobRow {
    let done = job
        .components
        .iter()
        .filter(|component| component.status == Status::Done)
        .count();
    JobRow {
        id: job.id.clone(),
        name: job.name.clone(),
        model: job.model.clone(),
        status: job.status.to_string(),
        progress: format!("{}/{}", done, job.components.len()),
        deadline: day(job.deadline),
        resp_user: job.resp_user.clone(),
    }
}

fn component_row(component: &Component) -> ComponentRow {
    ComponentRow {
        sequence: component.sequence,
        id: component.id.clone(),
        name: component.name.clone(),
        status: component.status.to_string(),
        started_at: stamp(component.started_at),
        finished_at: stamp(component.finished_at),
        pauses: component.pause_history.len(),
        minutes: component.total_time_spent,
    }
}

fn print_job_plain(job: &Job) {
    println!(
        "{} | {} | {} | {} | {} | start {} | deadline {}",
        job.id,
        job.name,
        job.model,
        job.status,
        job.resp_user,
        day(job.start_date),
        day(job.deadline)
    );
    println!(
        "{}",
        render_table(job.components.iter().map(component_row).collect())
    );
}

fn print_jobs_plain(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No jobs.");
        return;
    }
    println!("{}", render_table(jobs.iter().map(job_row).collect()));
}

fn print_component_update_plain(update: &ComponentUpdate) {
    let component = &update.component;
    println!(
        "Component {} ({}) of {}: {}",
        component.name, component.id, update.job.name, component.status
    );
    if let Some(paused_at) = component.paused_at {
        println!("Paused at {}", stamp(Some(paused_at)));
    }
    if component.status == Status::Done {
        println!("Time spent: {} min", component.total_time_spent);
    }
}

fn print_line_plain(line: &ProductionLine) {
    let counts = &line.status_counts;
    println!("Production line: {}", line.component_name);
    println!(
        "{}: {} | {}: {} | {}: {}",
        Status::Draft,
        counts.draft,
        Status::InProgress,
        counts.in_progress,
        Status::Done,
        counts.done
    );

    let rows: Vec<LineRow> = line
        .jobs
        .iter()
        .filter_map(|job| {
            job.component_named(&line.component_name)
                .map(|component| LineRow {
                    job_id: job.id.clone(),
                    job_name: job.name.clone(),
                    deadline: day(job.deadline),
                    component_id: component.id.clone(),
                    status: component.status.to_string(),
                    minutes: component.total_time_spent,
                })
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", render_table(rows));
    }
}

fn print_dashboard_plain(board: &Dashboard) {
    let overall = &board.overall;
    println!(
        "Overall: {} draft, {} in progress, {} done ({} components)",
        overall.draft,
        overall.in_progress,
        overall.done,
        overall.total()
    );

    for entry in &board.components {
        println!(
            "{}: {} draft, {} in progress, {} done",
            entry.name, entry.counts.draft, entry.counts.in_progress, entry.counts.done
        );
    }

    if !board.average_times.is_empty() {
        println!("Average time:");
        for entry in &board.average_times {
            println!(
                "  {}: {} min over {} jobs",
                entry.name, entry.average_time, entry.total_jobs
            );
        }
    }

    println!("Last 7 days:");
    for entry in &board.daily {
        println!(
            "  {}: {} pending, {} completed",
            entry.date, entry.pending, entry.completed
        );
    }
}

fn print_models(json: bool) -> Result<(), AppError> {
    if json {
        let payload: Vec<serde_json::Value> = house_models()
            .iter()
            .map(|model| {
                let steps: Vec<serde_json::Value> = model
                    .components
                    .iter()
                    .map(|step| {
                        serde_json::json!({
                            "sequence": step.sequence,
                            "name": step.name,
                            "description": step.description,
                        })
                    })
                    .collect();
                serde_json::json!({ "key": model.key, "components": steps })
            })
            .collect();
        println!("{}", serde_json::Value::Array(payload));
        return Ok(());
    }

    for model in house_models() {
        let steps: Vec<&str> = model.components.iter().map(|step| step.name).collect();
        println!("{}: {}", model.key, steps.join(" > "));
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        log::warn!("using default configuration: {err}");
    }
    let overrides = build_overrides(&cli.config_override)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Create {
            name,
            model,
            start_date,
            deadline,
            resp_user,
            status,
        } => {
            let model = model
                .or(config.default_model)
                .ok_or_else(|| AppError::invalid_input("model is required"))?;
            let resp_user = resp_user
                .or(config.resp_user)
                .ok_or_else(|| AppError::invalid_input("responsible user is required"))?;
            let request = NewJob {
                name,
                model,
                start_date,
                deadline,
                resp_user,
                status: status.parse()?,
            };

            let job = job_api::create_job(&request)?;
            if cli.json {
                println!("{}", to_json(&job)?);
            } else {
                println!(
                    "Created job: {} ({}) with {} components",
                    job.name,
                    job.id,
                    job.components.len()
                );
            }
        }
        Command::List => {
            let jobs = job_api::list_jobs()?;
            if cli.json {
                println!("{}", to_json(&jobs)?);
            } else {
                print_jobs_plain(&jobs);
            }
        }
        Command::Show { id } => {
            let job = job_api::get_job(&id)?;
            if cli.json {
                println!("{}", to_json(&job)?);
            } else {
                print_job_plain(&job);
            }
        }
        Command::Status { id, status } => {
            let job = job_api::set_job_status(&id, status.parse()?)?;
            if cli.json {
                println!("{}", to_json(&job)?);
            } else {
                println!("Updated job: {} ({}) -> {}", job.name, job.id, job.status);
            }
        }
        Command::Component { id, status } => {
            let update = job_api::update_component_status(&id, status.parse()?, config.tracker)?;
            if cli.json {
                println!("{}", to_json(&update.component)?);
            } else {
                print_component_update_plain(&update);
            }
        }
        Command::Line {
            name,
            show_completed,
        } => {
            let line = job_api::production_line(&name, show_completed)?;
            if cli.json {
                let payload = serde_json::json!({
                    "componentName": line.component_name,
                    "statusCounts": line.status_counts,
                    "jobs": line.jobs,
                });
                println!("{}", payload);
            } else {
                print_line_plain(&line);
            }
        }
        Command::Stats => {
            let jobs = job_api::list_jobs()?;
            let board = stats::dashboard(&jobs, OffsetDateTime::now_utc().date());
            if cli.json {
                println!("{}", to_json(&board)?);
            } else {
                print_dashboard_plain(&board);
            }
        }
        Command::Models => print_models(cli.json)?,
    }

    Ok(())
}

/// Reads one command per line until `exit` or end of input. Besides the
/// regular subcommands it accepts `start|resume|pause|done <component-id>`.
fn run_interactive() -> Result<(), AppError> {
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| AppError::io(err.to_string()))?;
        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "help" | "?" => print_help(),
            command => {
                if let Err(err) = run_interactive_line(command) {
                    eprintln!("ERROR: {}", err);
                }
            }
        }
    }

    Ok(())
}

fn run_interactive_line(line: &str) -> Result<(), AppError> {
    let args = expand_status_shortcut(split_command_line(line)?);
    if args.is_empty() {
        return Ok(());
    }

    let argv = std::iter::once("prodline".to_string()).chain(args);
    let cli = Cli::try_parse_from(argv).map_err(normalize_parse_error)?;
    run_command(cli)
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
