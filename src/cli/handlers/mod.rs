mod init;
pub use init::cmd_init;

use std::collections::HashSet;
use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::project_io;
use crate::io::store_io::FileAuthority;
use crate::model::config::EngineConfig;
use crate::model::content::{Category, Content, ContentDraft, ContentKind};
use crate::model::state::{Completion, Intent};
use crate::model::tree::Bucket;
use crate::ops::content_ops::ContentEdit;
use crate::ops::move_ops::DropGesture;
use crate::session::{Action, Outcome, Session};

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let json = cli.json;
    let start = match &cli.project_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start),
        Commands::Tree(args) => cmd_tree(args, &start, json),
        Commands::Add(args) => cmd_add(args, &start, json),
        Commands::Group(cmd) => match cmd.action {
            GroupAction::New(args) => cmd_group_new(args, &start, json),
            GroupAction::Copy(args) => cmd_group_copy(args, &start, json),
        },
        Commands::Mv(args) => cmd_mv(args, &start, json),
        Commands::Rm(args) => cmd_rm(args, &start, json),
        Commands::Check(args) => cmd_check(args, &start, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(start: &Path) -> Result<Session<FileAuthority>, Box<dyn std::error::Error>> {
    let root = project_io::discover_project(start)?;
    let project = project_io::load_project(&root)?;
    let remote = FileAuthority::open(project.store_path())?;
    let contents = remote.contents().to_vec();
    Ok(Session::with_contents(
        remote,
        EngineConfig::from(&project.config),
        contents,
    ))
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse_category(s).ok_or_else(|| {
        format!(
            "unknown category \"{}\" (expected one of: overlay, measurement, ess, map, metadata)",
            s
        )
    })
}

/// Dispatch one action; intents left by a failure are reported on stderr.
fn run(
    session: &mut Session<FileAuthority>,
    action: Action,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    match session.dispatch(action) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            for intent in session.take_intents() {
                eprintln!("note: {}", format_intent(&intent));
            }
            Err(e.into())
        }
    }
}

/// Ids present now that were not in `before`
fn new_contents(session: &Session<FileAuthority>, before: &HashSet<String>) -> Vec<Content> {
    session
        .state()
        .store
        .iter()
        .filter(|c| !before.contains(&c.id))
        .cloned()
        .collect()
}

fn known_ids(session: &Session<FileAuthority>) -> HashSet<String> {
    session.state().store.iter().map(|c| c.id.clone()).collect()
}

fn report(outcome: &Outcome, created: &[Content], json: bool) -> CliResult {
    if json {
        let mut value = serde_json::to_value(outcome)?;
        if !created.is_empty() {
            value["created"] = serde_json::to_value(created)?;
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    match outcome.completion {
        Completion::Applied => {
            for content in created {
                println!("created {}", format_content_line(content));
            }
        }
        Completion::Unchanged => println!("nothing to do"),
        Completion::Cancelled => println!("cancelled"),
    }
    for intent in &outcome.intents {
        println!("  {}", format_intent(intent));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_tree(args: TreeArgs, start: &Path, json: bool) -> CliResult {
    let session = open_session(start)?;
    let filter = TreeFilter {
        category: args.category.as_deref().map(parse_category).transpose()?,
        screen: args.screen,
    };

    if json {
        let tree = tree_to_json(session.state(), &filter);
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        for line in format_tree(session.state(), &filter) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    if !session.state().store.contains(&args.id) {
        return Err(format!("content not found: {}", args.id).into());
    }
    let outcome = run(
        &mut session,
        Action::CheckGroup {
            content_id: args.id.clone(),
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.completion == Completion::Applied {
        println!("group of {} was deleted; removed it locally", args.id);
    } else {
        println!("ok");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    let category = parse_category(&args.category)?;
    let kind = match ContentKind::parse_kind(&args.kind) {
        Some(ContentKind::Group) => return Err("use `ct group new` to create groups".into()),
        Some(kind) => kind,
        None => return Err(format!("unknown kind \"{}\"", args.kind).into()),
    };

    // Children share their group's screen
    let mut screen_id = args.screen;
    if let Some(group_id) = &args.group {
        let group = session
            .state()
            .store
            .get(group_id)
            .filter(|c| c.is_group())
            .ok_or_else(|| format!("group not found: {}", group_id))?;
        if screen_id.is_some() && screen_id != group.screen_id {
            return Err(format!("--screen does not match the screen of group {}", group_id).into());
        }
        screen_id = group.screen_id.clone();
    }

    let draft = ContentDraft {
        group_id: args.group,
        screen_id,
        category,
        kind,
        title: args.title,
        payload: serde_json::Value::Null,
    };
    let before = known_ids(&session);
    let outcome = run(&mut session, Action::SaveContent(ContentEdit::Create(draft)))?;
    report(&outcome, &new_contents(&session, &before), json)
}

fn cmd_group_new(args: GroupNewArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    let category = parse_category(&args.category)?;
    let bucket = Bucket {
        category,
        screen_id: args.screen,
    };

    let before = known_ids(&session);
    let outcome = run(
        &mut session,
        Action::CreateGroup {
            bucket,
            title: args.title,
            start_rename: false,
        },
    )?;
    report(&outcome, &new_contents(&session, &before), json)
}

fn cmd_group_copy(args: GroupCopyArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    let source = session
        .state()
        .store
        .get(&args.id)
        .filter(|c| c.is_group())
        .cloned()
        .ok_or_else(|| format!("group not found: {}", args.id))?;
    let bucket = match (args.pinned, args.screen) {
        (true, _) => Bucket::pinned(source.category),
        (false, Some(screen)) => Bucket::unpinned(source.category, screen),
        (false, None) => Bucket::of(&source),
    };

    let before = known_ids(&session);
    let outcome = run(
        &mut session,
        Action::CopyGroup {
            group_id: source.id,
            bucket,
        },
    )?;
    report(&outcome, &new_contents(&session, &before), json)
}

fn cmd_mv(args: MvArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    if !session.state().store.contains(&args.id) {
        return Err(format!("content not found: {}", args.id).into());
    }

    let (nearest_id, insert_after) = match (args.before, args.after, args.empty_list) {
        (Some(before), None, false) => (Some(before), false),
        (None, Some(after), false) => (Some(after), true),
        (None, None, true) => (None, false),
        _ => return Err("give exactly one of --before, --after or --empty-list".into()),
    };
    if let Some(target) = &nearest_id
        && !session.state().store.contains(target)
    {
        return Err(format!("content not found: {}", target).into());
    }

    let gesture = DropGesture {
        moved_id: args.id,
        nearest_id,
        insert_after,
        is_invalid_target: false,
        next_sibling_id: None,
        screen_id: args.screen,
    };
    let before = known_ids(&session);
    let mut outcome = run(&mut session, Action::Move(gesture))?;

    // A root list that lost its last group gets an empty one
    let placeholders: Vec<Bucket> = outcome
        .intents
        .iter()
        .filter_map(|intent| match intent {
            Intent::CreatePlaceholderGroup {
                category,
                screen_id,
            } => Some(Bucket {
                category: *category,
                screen_id: screen_id.clone(),
            }),
            _ => None,
        })
        .collect();
    for bucket in placeholders {
        let created = run(
            &mut session,
            Action::CreateGroup {
                bucket,
                title: None,
                start_rename: false,
            },
        )?;
        outcome.intents.extend(created.intents);
    }

    report(&outcome, &new_contents(&session, &before), json)
}

fn cmd_rm(args: RmArgs, start: &Path, json: bool) -> CliResult {
    let mut session = open_session(start)?;
    let outcome = run(
        &mut session,
        Action::DeleteContent {
            content_id: args.id.clone(),
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("deleted {}", args.id);
    }
    Ok(())
}
