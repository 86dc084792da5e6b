use std::path::{Path, PathBuf};

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::WriteLock;
use crate::io::xp_config_io;
use crate::model::config::AppConfig;
use crate::model::sort_metric::SortMetric;
use crate::model::task::{DEFAULT_MODULE, NewTask, PRESET_MODULES, Priority, parse_date};
use crate::ops::session::Session;
use crate::ops::task_api::Backend;
use crate::ops::xp_controller::XpController;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = match cli.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => config_io::default_data_dir(),
    };
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&data_dir, args, json),
        Commands::Modules => cmd_modules(&data_dir, json),
        Commands::Xp(XpCmd { action: None }) => cmd_xp_show(&data_dir, json),

        // Write commands
        Commands::Module(args) => cmd_module(&data_dir, args),
        Commands::Add(args) => cmd_add(&data_dir, args, json),
        Commands::Modify(args) => cmd_modify(&data_dir, args),
        Commands::Done(args) => cmd_toggle(&data_dir, args, true, json),
        Commands::Undo(args) => cmd_toggle(&data_dir, args, false, json),
        Commands::Delete(args) => cmd_delete(&data_dir, args),
        Commands::Xp(XpCmd {
            action: Some(XpAction::Set(args)),
        }) => cmd_xp_set(&data_dir, args),
        Commands::Sort(args) => cmd_sort(&data_dir, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the session for this data directory: task API, XP controller with
/// the configured bars, and the modules known from config.
fn open_session(data_dir: &Path, config: &AppConfig) -> Result<Session, Box<dyn std::error::Error>> {
    let api = Backend::Store(config_io::store_path(data_dir, config)).open(config.sort)?;
    let multipliers = xp_config_io::load_config(&config_io::xp_config_path(data_dir, config));
    let xp = XpController::with_bars(multipliers, &config.bars);
    let mut session = Session::new(api, xp);
    for module in &config.modules {
        session.add_module(module);
    }
    Ok(session)
}

/// Split `KEY=VALUE` arguments. The value may be empty.
fn parse_assignments(items: &[String]) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let re = Regex::new(r"^([A-Za-z_][A-Za-z0-9_.\-]*)=(.*)$")?;
    items
        .iter()
        .map(|item| -> Result<(String, String), Box<dyn std::error::Error>> {
            let caps = re
                .captures(item)
                .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", item))?;
            Ok((caps[1].to_string(), caps[2].to_string()))
        })
        .collect()
}

/// Listing positions start at 1.
fn listing_index(index: usize) -> Result<usize, Box<dyn std::error::Error>> {
    index
        .checked_sub(1)
        .ok_or_else(|| "task index starts at 1".into())
}

fn require_module(session: &Session, module: &str) -> CmdResult {
    if session.api().index().has_module(module) {
        Ok(())
    } else {
        Err(format!("unknown module: {}", module).into())
    }
}

fn print_bars(session: &Session) {
    for bar in session.xp().bars() {
        println!("{}", format_bar(bar));
    }
    println!("{}", format_bar(session.xp().main_bar()));
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &Path, args: ListArgs, json: bool) -> CmdResult {
    let config = config_io::read_config(data_dir)?;
    let mut session = open_session(data_dir, &config)?;
    if let Some(ref sort) = args.sort {
        let metric: SortMetric = sort.parse()?;
        session.set_sort_metric(metric);
    }

    let modules = match args.module {
        Some(module) => {
            require_module(&session, &module)?;
            vec![module]
        }
        None => session.api().modules(),
    };

    if json {
        let mut results = Vec::new();
        for module in &modules {
            let tasks = session.api().index().tasks(module)?;
            results.push(ModuleListJson {
                module: module.clone(),
                tasks: tasks
                    .iter()
                    .enumerate()
                    .map(|(i, t)| task_to_json(t, i))
                    .collect(),
            });
        }
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let mut first = true;
        for module in &modules {
            if !first {
                println!();
            }
            first = false;
            let tasks = session.api().index().tasks(module)?;
            for line in format_module_listing(module, tasks) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn cmd_modules(data_dir: &Path, json: bool) -> CmdResult {
    let config = config_io::read_config(data_dir)?;
    let session = open_session(data_dir, &config)?;
    let index = session.api().index();

    let mut infos = Vec::new();
    for name in index.modules() {
        let tasks = index.tasks(name)?;
        infos.push(ModuleInfoJson {
            name: name.to_string(),
            tasks: tasks.len(),
            completed: tasks.iter().filter(|t| t.is_completed()).count(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        for info in &infos {
            println!("{} ({}/{} done)", info.name, info.completed, info.tasks);
        }
    }
    Ok(())
}

fn cmd_xp_show(data_dir: &Path, json: bool) -> CmdResult {
    let config = config_io::read_config(data_dir)?;
    let session = open_session(data_dir, &config)?;

    if json {
        let output = XpJson {
            main: bar_to_json(session.xp().main_bar()),
            bars: session.xp().bars().iter().map(bar_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_bars(&session);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_module(data_dir: &Path, args: ModuleCmd) -> CmdResult {
    let names: Vec<String> = match args.action {
        ModuleAction::Add(a) => vec![a.name],
        ModuleAction::Preset => PRESET_MODULES.iter().map(|s| s.to_string()).collect(),
    };

    let _lock = WriteLock::wait(data_dir)?;
    let mut config = config_io::read_config(data_dir)?;
    let mut added = Vec::new();
    for name in names {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("module name cannot be empty".into());
        }
        if name == DEFAULT_MODULE || config.modules.contains(&name) {
            continue;
        }
        config.modules.push(name.clone());
        added.push(name);
    }
    config_io::write_config(data_dir, &config)?;

    if added.is_empty() {
        println!("no new modules");
    }
    for name in &added {
        tracing::info!(module = %name, "module added");
        println!("added module {}", name);
    }
    Ok(())
}

fn cmd_add(data_dir: &Path, args: AddArgs, json: bool) -> CmdResult {
    let description = args.description.join(" ");
    if description.trim().is_empty() {
        return Err("task description cannot be empty".into());
    }
    let mut new = NewTask::new(description.trim());
    if let Some(module) = args.module {
        new = new.in_module(module);
    }
    if let Some(ref p) = args.priority {
        new = new.with_priority(p.parse::<Priority>()?);
    }
    if let Some(project) = args.project {
        new = new.with_project(project);
    }
    for tag in args.tags {
        new = new.with_tag(tag);
    }
    if let Some(ref due) = args.due {
        new = new.with_due(parse_date(due)?);
    }
    new.recur = args.recur;
    for (key, value) in parse_assignments(&args.columns)? {
        new = new.with_column(key, value);
    }

    let _lock = WriteLock::wait(data_dir)?;
    let config = config_io::read_config(data_dir)?;
    let mut session = open_session(data_dir, &config)?;
    let task = session.add_task(new)?;
    let index = session
        .api()
        .index()
        .index_of(task.uuid, &task.module)
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task, index))?);
    } else {
        println!("added to {}: {}", task.module, format_task_line(&task, index));
    }
    Ok(())
}

fn cmd_modify(data_dir: &Path, args: ModifyArgs) -> CmdResult {
    let index = listing_index(args.index)?;
    let fields = parse_assignments(&args.fields)?;

    let _lock = WriteLock::wait(data_dir)?;
    let config = config_io::read_config(data_dir)?;
    let mut session = open_session(data_dir, &config)?;
    require_module(&session, &args.module)?;
    let task = session.edit_task(index, &args.module, &fields)?;
    println!("modified: {}", task.description);
    Ok(())
}

fn cmd_toggle(data_dir: &Path, args: TaskRefArgs, completed: bool, json: bool) -> CmdResult {
    let index = listing_index(args.index)?;

    let _lock = WriteLock::wait(data_dir)?;
    let config = config_io::read_config(data_dir)?;
    let mut session = open_session(data_dir, &config)?;
    require_module(&session, &args.module)?;
    let uuid = session
        .api()
        .task_at(index, &args.module)
        .map(|t| t.uuid)
        .ok_or_else(|| format!("no task at index {} in module {}", args.index, args.module))?;
    let xp = session.set_completed(index, &args.module, completed)?;

    // The store re-sorts after the update, so look the task up again.
    let index = session
        .api()
        .index()
        .index_of(uuid, &args.module)
        .unwrap_or(index);
    let task = session
        .api()
        .task_at(index, &args.module)
        .cloned()
        .ok_or_else(|| format!("task vanished from module {}", args.module))?;
    let relevant = session.xp().get_relevant_xp_bars(&task);

    if json {
        let output = ToggleJson {
            task: task_to_json(&task, index),
            xp,
            bars: relevant.iter().copied().map(bar_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let verb = if completed { "completed" } else { "reopened" };
        let sign = if completed { "+" } else { "-" };
        println!("{}: {} ({}{} xp)", verb, task.description, sign, format_xp(xp));
        for bar in relevant {
            println!("  {}", format_bar(bar));
        }
    }
    Ok(())
}

fn cmd_delete(data_dir: &Path, args: TaskRefArgs) -> CmdResult {
    let index = listing_index(args.index)?;

    let _lock = WriteLock::wait(data_dir)?;
    let config = config_io::read_config(data_dir)?;
    let mut session = open_session(data_dir, &config)?;
    require_module(&session, &args.module)?;
    let removed = session
        .delete_at(index, &args.module)?
        .ok_or_else(|| format!("no task at index {} in module {}", args.index, args.module))?;
    println!("deleted: {}", removed.description);
    Ok(())
}

fn cmd_xp_set(data_dir: &Path, args: XpSetArgs) -> CmdResult {
    let _lock = WriteLock::wait(data_dir)?;
    let config = config_io::read_config(data_dir)?;
    let path = config_io::xp_config_path(data_dir, &config);
    let mut multipliers = xp_config_io::load_config(&path);

    let (table, key) = match args.kind {
        MultiplierKind::Priority => {
            let key = if args.key.eq_ignore_ascii_case("none") {
                crate::model::config::UNSET_PRIORITY_KEY.to_string()
            } else {
                args.key.parse::<Priority>()?.code().to_string()
            };
            (&mut multipliers.priorities, key)
        }
        MultiplierKind::Tag => (&mut multipliers.tags, args.key.clone()),
        MultiplierKind::Project => (&mut multipliers.projects, args.key.clone()),
    };
    table.insert(key.clone(), args.value);

    xp_config_io::save_config(&multipliers, &path)?;
    println!("set {} = {}", key, format_xp(args.value));
    Ok(())
}

fn cmd_sort(data_dir: &Path, args: SortArgs) -> CmdResult {
    let metric: SortMetric = args.metric.parse()?;

    let _lock = WriteLock::wait(data_dir)?;
    let mut config = config_io::read_config(data_dir)?;
    config.sort = metric;
    config_io::write_config(data_dir, &config)?;
    println!("default sort: {}", metric);
    Ok(())
}
