use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{action_io, config_io};
use crate::model::action::{Action, ActionStatus};
use crate::model::config::{AnchorPolicy, EngineConfig};
use crate::model::patch::Patch;
use crate::model::view::{CollapsedSet, QuickFilter, SortMode};
use crate::ops::check;
use crate::ops::filter::{FilterSpec, filter_actions};
use crate::ops::lifecycle::{CompleteOptions, complete_action};
use crate::ops::mutate::Mutator;
use crate::ops::recurrence::occurrences;
use crate::ops::tree::build_outline;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let config = cli.config.as_deref();

    match cli.command {
        // Read commands
        Commands::Outline(args) => cmd_outline(args, config, json),
        Commands::Next(args) => cmd_next(args, config, json),
        Commands::Check(args) => cmd_check(args, json),

        // Mutating commands (print a patch, never write)
        Commands::Reorder(args) => cmd_reorder(args, config, json),
        Commands::Indent(args) => cmd_indent(args, config, json),
        Commands::Outdent(args) => cmd_outdent(args, config, json),
        Commands::Complete(args) => cmd_complete(args, config, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load(file: &Path, config: Option<&Path>) -> Result<(Vec<Action>, EngineConfig), Box<dyn std::error::Error>> {
    let actions = action_io::load_actions(file)?;
    let config = config_io::read_config(&config_io::config_path_for(file, config))?;
    Ok((actions, config))
}

/// `--now` if given, else the local clock
fn resolve_now(now: Option<&str>) -> Result<DateTime<FixedOffset>, String> {
    match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("invalid --now '{}': {}", s, e)),
        None => {
            let local = Local::now();
            Ok(local.with_timezone(local.offset()))
        }
    }
}

fn parse_all<T: FromStr<Err = String> + Ord>(values: &[String]) -> Result<BTreeSet<T>, String> {
    values.iter().map(|v| v.parse()).collect()
}

fn find_action<'a>(actions: &'a [Action], id: &str) -> Result<&'a Action, String> {
    actions
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| format!("action not found: {}", id))
}

fn print_patch(patch: &Patch, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(patch)?);
    } else {
        for line in format_patch(patch) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_outline(args: OutlineArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let now = resolve_now(args.now.as_deref())?;

    let sort = match args.sort.as_deref() {
        Some(s) => s.parse::<SortMode>()?,
        None => config.view.sort,
    };
    let spec = FilterSpec {
        include_statuses: if args.status.is_empty() {
            None
        } else {
            Some(parse_all::<ActionStatus>(&args.status)?)
        },
        exclude_statuses: parse_all(&args.exclude_status)?,
        show_deferred: args.show_deferred || config.view.show_deferred,
        quick: args.quick.as_deref().map(QuickFilter::from_str).transpose()?,
        max_estimated_minutes: args.max_minutes,
        tag: args.tag,
        title_pattern: args.search,
        upcoming_days: config.filter.upcoming_days,
    };
    let collapsed: CollapsedSet = args.collapse.into_iter().collect();

    let kept = filter_actions(&actions, &spec, now);
    let rows = build_outline(kept.iter().copied(), sort, &collapsed)?;

    if json {
        let out: Vec<OutlineRowJson> = rows.iter().map(row_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if rows.is_empty() {
        println!("(no actions)");
    } else {
        for line in format_outline(&rows) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_next(args: NextArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let action = find_action(&actions, &args.id)?;
    let rule = action
        .recurrence
        .as_ref()
        .ok_or_else(|| format!("{} does not recur", action.id))?;
    // same anchor `complete` would use
    let now = resolve_now(args.now.as_deref())?.with_timezone(&Utc);
    let anchor = match config.recurrence.anchor {
        AnchorPolicy::DueDate => action.due_date.unwrap_or(now),
        AnchorPolicy::Completion => now,
    };
    let dates: Vec<_> = occurrences(rule, anchor.date_naive()).take(args.count).collect();

    if json {
        let out = OccurrencesJson {
            id: action.id.clone(),
            occurrences: dates,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for date in dates {
            println!("{}", date.format("%Y-%m-%d %a"));
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let actions = action_io::load_actions(&args.file)?;
    let result = check::check_actions(&actions);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.errors.is_empty() {
            println!("Errors:");
            for err in &result.errors {
                println!("  {}", format_check_error(err));
            }
        }
        if !result.warnings.is_empty() {
            if !result.errors.is_empty() {
                println!();
            }
            println!("Warnings:");
            for warn in &result.warnings {
                println!("  {}", format_check_warning(warn));
            }
        }
        if result.valid {
            println!("✓ actions are valid");
        } else {
            println!("✗ actions have errors");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Mutating command handlers
// ---------------------------------------------------------------------------

fn cmd_reorder(args: ReorderArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let collapsed: CollapsedSet = args.collapse.into_iter().collect();
    let flat = build_outline(&actions, SortMode::Manual, &collapsed)?;
    let mutator = Mutator::new(&flat, &actions)?.with_stride(config.ordering.position_stride);
    print_patch(&mutator.reorder(&args.dragged, &args.target), json)
}

fn cmd_indent(args: MoveArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let collapsed: CollapsedSet = args.collapse.into_iter().collect();
    let flat = build_outline(&actions, SortMode::Manual, &collapsed)?;
    let mutator = Mutator::new(&flat, &actions)?.with_stride(config.ordering.position_stride);
    print_patch(&mutator.indent(&args.id), json)
}

fn cmd_outdent(args: MoveArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let collapsed: CollapsedSet = args.collapse.into_iter().collect();
    let flat = build_outline(&actions, SortMode::Manual, &collapsed)?;
    let mutator = Mutator::new(&flat, &actions)?.with_stride(config.ordering.position_stride);
    print_patch(&mutator.outdent(&args.id), json)
}

fn cmd_complete(args: CompleteArgs, config: Option<&Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (actions, config) = load(&args.file, config)?;
    let action = find_action(&actions, &args.id)?;
    if action.recurrence.is_some() && !action.is_completed() && args.next_id.is_none() {
        return Err(format!("{} recurs; pass --next-id for the next instance", action.id).into());
    }

    let opts = CompleteOptions {
        now: resolve_now(args.now.as_deref())?.with_timezone(&Utc),
        next_id: args.next_id.unwrap_or_default(),
        anchor: config.recurrence.anchor,
        stride: config.ordering.position_stride,
    };
    let Some(done) = complete_action(&actions, &args.id, &opts)? else {
        return print_patch(&Patch::new(), json);
    };

    if json {
        let out = CompletionJson {
            patch: &done.patch,
            next: done.next.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_patch(&done.patch, false)?;
        if let Some(next) = &done.next {
            println!("new: {}", format_action_line(next));
        }
    }
    Ok(())
}
