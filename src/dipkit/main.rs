use clap::Parser;
use colored::*;
use dipkit::api::{CmdMessage, ConfigAction, DeleteOptions, DipApi, MessageLevel, Placement};
use dipkit::config::DipConfig;
use dipkit::error::{DipError, Result};
use dipkit::links::NoopRewriter;
use dipkit::loader;
use dipkit::model::{ElementKind, NodeId};
use dipkit::session::Session;
use dipkit::snapshot::SnapshotService;
use dipkit::store::fs::FsStore;
use dipkit::tree::DipTree;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands, PlaceArgs};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: DipApi<FsStore, NoopRewriter>,
    project: String,
}

impl AppContext {
    /// Full ID for an element given relative to the project.
    fn full(&self, element: &str) -> String {
        let relative = element.trim_matches('/');
        if relative.is_empty() || relative == "." {
            self.project.clone()
        } else {
            format!("{}/{}", self.project, relative)
        }
    }

    fn placement(&self, place: &PlaceArgs) -> Placement {
        if place.start {
            Placement::Start
        } else if let Some(before) = &place.before {
            Placement::Before(self.full(before))
        } else if let Some(after) = &place.after {
            Placement::After(self.full(after))
        } else {
            Placement::End
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Init { name } = &cli.command {
        return handle_init(cli.project.as_deref(), name);
    }
    let mut ctx = init_context(&cli)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Tree => handle_tree(&ctx),
        Commands::Id { element } => handle_id(&ctx, &element),
        Commands::Mkdir {
            parent,
            name,
            place,
        } => {
            let placement = ctx.placement(&place);
            let parent = ctx.full(&parent);
            let result = ctx.api.create_folder(&parent, name.as_deref(), placement)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::New {
            parent,
            name,
            content,
            attachment,
            place,
        } => handle_new(&mut ctx, parent, name, content, attachment, place),
        Commands::Rename { element, new_name } => {
            let element = ctx.full(&element);
            let result = ctx.api.rename(&element, &new_name)?;
            print_messages(&result.messages);
            print_link_failures(&result);
            Ok(())
        }
        Commands::Mv {
            element,
            target,
            place,
        } => {
            let placement = ctx.placement(&place);
            let (element, target) = (ctx.full(&element), ctx.full(&target));
            let result = ctx.api.move_to(&element, &target, placement)?;
            print_messages(&result.messages);
            print_link_failures(&result);
            Ok(())
        }
        Commands::Cp {
            element,
            target,
            name,
            place,
        } => {
            let placement = ctx.placement(&place);
            let (element, target) = (ctx.full(&element), ctx.full(&target));
            let result = ctx.api.copy(&element, &target, placement, name.as_deref())?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Rm {
            elements,
            reserve,
            tmp,
        } => handle_rm(&mut ctx, elements, DeleteOptions { reserve, tmp }),
        Commands::Unreserve { element } => {
            let element = ctx.full(&element);
            let result = ctx.api.unreserve(&element)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Extract { folder } => {
            let folder = ctx.full(&folder);
            let result = ctx.api.extract(&folder)?;
            print_messages(&result.messages);
            print_snapshots(&result.snapshots);
            print_link_failures(&result);
            Ok(())
        }
        Commands::Up { elements } => {
            let ids: Vec<String> = elements.iter().map(|e| ctx.full(e)).collect();
            let result = ctx.api.up(&ids)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Down { elements } => {
            let ids: Vec<String> = elements.iter().map(|e| ctx.full(e)).collect();
            let result = ctx.api.down(&ids)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Disable { element } => handle_disabled(&mut ctx, &element, true),
        Commands::Enable { element } => handle_disabled(&mut ctx, &element, false),
        Commands::Paste {
            source,
            into,
            attachment,
            place,
        } => {
            let placement = ctx.placement(&place);
            let source = std::fs::canonicalize(&source).unwrap_or(source);
            let into = ctx.full(&into);
            let result = ctx.api.paste(&into, &source, placement, attachment)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Number {
            folder,
            files,
            folders,
        } => {
            let folder = ctx.full(&folder);
            let result = ctx.api.set_numbering(&folder, files, folders)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Config { key, value } => handle_config(&mut ctx, key, value),
    }
}

/// `DIPKIT_LOG` takes precedence; otherwise warnings, or debug with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "dipkit=debug" } else { "dipkit=warn" };
    let filter = EnvFilter::try_from_env("DIPKIT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Nearest directory at or above `start` that holds a project marker.
fn find_project(store: &FsStore, start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| loader::is_project(store, dir))
        .map(Path::to_path_buf)
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let store = FsStore::new();
    let root = match &cli.project {
        Some(dir) => dir.clone(),
        None => find_project(&store, &current_dir()).ok_or_else(|| {
            DipError::Project("not inside a project (run `dipkit init <name>`)".to_string())
        })?,
    };
    let root = std::fs::canonicalize(&root).unwrap_or(root);

    let config = DipConfig::load(&store, &root).unwrap_or_default();
    let snapshots = SnapshotService::from_config(&config)?;
    let mut api = DipApi::new(Session::new(store, NoopRewriter, config, snapshots));
    let project = api.open(&root)?;

    Ok(AppContext { api, project })
}

fn handle_init(parent: Option<&Path>, name: &str) -> Result<()> {
    let parent = parent.map(Path::to_path_buf).unwrap_or_else(current_dir);
    let config = DipConfig::default();
    let snapshots = SnapshotService::from_config(&config)?;
    let mut api = DipApi::new(Session::new(FsStore::new(), NoopRewriter, config, snapshots));
    let project = api.init(&parent, name)?;
    print_messages(&[CmdMessage::success(format!(
        "Initialized project {} in {}",
        project,
        parent.join(name).display()
    ))]);
    Ok(())
}

fn handle_new(
    ctx: &mut AppContext,
    parent: String,
    name: Option<String>,
    content: String,
    attachment: bool,
    place: PlaceArgs,
) -> Result<()> {
    let placement = ctx.placement(&place);
    let parent = ctx.full(&parent);
    let result = if attachment {
        let name = name.ok_or_else(|| DipError::Api("an attachment needs a name".into()))?;
        ctx.api
            .create_attachment(&parent, &name, &content, placement)?
    } else {
        ctx.api
            .create_unit(&parent, name.as_deref(), &content, placement)?
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_rm(ctx: &mut AppContext, elements: Vec<String>, options: DeleteOptions) -> Result<()> {
    let ids: Vec<String> = elements.iter().map(|e| ctx.full(e)).collect();
    let result = ctx.api.delete(&ids, options)?;
    print_messages(&result.messages);
    print_snapshots(&result.snapshots);
    Ok(())
}

fn handle_disabled(ctx: &mut AppContext, element: &str, disabled: bool) -> Result<()> {
    let element = ctx.full(element);
    let result = ctx.api.set_disabled(&element, disabled)?;
    print_messages(&result.messages);
    print_link_failures(&result);
    Ok(())
}

fn handle_id(ctx: &AppContext, element: &str) -> Result<()> {
    let (project, id) = ctx.api.resolve(&ctx.full(element))?;
    let tree = ctx.api.tree(&project)?;
    let el = tree.element(id)?;
    println!("{}", tree.full_id(id).bold());
    println!("{} {}", "relative:".dimmed(), tree.relative_project_id(id));
    println!("{} {}", "kind:".dimmed(), el.kind.label());
    println!("{} {}", "path:".dimmed(), el.resource.display());
    if let Some(source) = tree.source_id(id) {
        println!("{} {}", "source:".dimmed(), source);
    }
    Ok(())
}

fn handle_tree(ctx: &AppContext) -> Result<()> {
    let tree = ctx.api.tree(&ctx.project)?;
    println!("{}", tree.project_name().bold());
    print_children(tree, tree.root(), 1);
    Ok(())
}

fn print_children(tree: &DipTree, container: NodeId, depth: usize) {
    for child in tree.children(container) {
        let Some(el) = tree.get(*child) else {
            continue;
        };
        let indent = "  ".repeat(depth);
        let line = match el.kind {
            ElementKind::Folder | ElementKind::Project => format!("{}/", el.name).blue().bold(),
            ElementKind::IncludeFolder => {
                let target = el
                    .link
                    .as_ref()
                    .map(|l| format!("{}/{}", l.project, l.folder))
                    .unwrap_or_default();
                let broken = el.link.as_ref().map(|l| l.broken).unwrap_or(false);
                let text = format!("{}/ -> {}", el.name, target);
                if broken {
                    text.red()
                } else {
                    text.cyan()
                }
            }
            ElementKind::ReservedFolder | ElementKind::ReservedUnit => {
                format!("{} ({})", el.name, el.kind.label()).dimmed().strikethrough()
            }
            ElementKind::Report | ElementKind::Table => el.name.yellow(),
            ElementKind::Unit => el.name.normal(),
        };
        let line = if el.disabled { line.dimmed() } else { line };
        println!("{}{}", indent, line);
        print_children(tree, *child, depth + 1);
    }
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let project = ctx.project.clone();
    let result = ctx.api.config(&project, action)?;
    if let (true, Some(config)) = (show_all, &result.config) {
        for key in DipConfig::KEYS {
            println!("{} = {}", key, config.get(key).unwrap_or_default());
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

fn print_snapshots(snapshots: &[dipkit::snapshot::TmpElement]) {
    for tmp in snapshots {
        println!(
            "{} {} -> {}",
            "snapshot".dimmed(),
            tmp.origin,
            tmp.path.display()
        );
    }
}

fn print_link_failures(result: &dipkit::api::CmdResult) {
    for rewrite in result.link_rewrites.iter().filter(|r| !r.is_ok()) {
        if let Err(e) = &rewrite.outcome {
            println!("{}", format!("Links not updated: {}", e).yellow());
        }
    }
}
