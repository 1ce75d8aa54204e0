use crate::commands::helpers::persist_or_warn;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::model::NodeId;
use crate::ordering::{self, Direction};
use crate::session::Session;
use crate::store::ExternalStore;
use tracing::info;

pub fn up<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    ids: &[NodeId],
) -> Result<CmdResult> {
    run(session, project, ids, Direction::Up)
}

pub fn down<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    ids: &[NodeId],
) -> Result<CmdResult> {
    run(session, project, ids, Direction::Down)
}

/// Moves a block of siblings one step and saves the new order. Only the
/// presentation order changes: no store entry is touched and no ID changes.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    ids: &[NodeId],
    direction: Direction,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    let tree = registry.get_mut(project)?;

    let first = *ids
        .first()
        .ok_or_else(|| DipError::Api("nothing selected".to_string()))?;
    let parent = tree
        .parent(first)
        .ok_or_else(|| DipError::Unsupported {
            op: "reorder",
            name: tree.project_name().to_string(),
        })?;
    let parent_el = tree.element(parent)?;
    if parent_el.read_only || parent_el.included {
        return Err(DipError::ReadOnly(tree.full_id(parent)));
    }

    ordering::shift(tree, ids, direction)?;

    let mut result = CmdResult::default().with_affected(ids.to_vec());
    persist_or_warn(store, tree, parent, &mut result);

    let label = match direction {
        Direction::Up => "up",
        Direction::Down => "down",
    };
    info!(container = %tree.full_id(parent), count = ids.len(), direction = label, "elements reordered");
    result.add_message(CmdMessage::success(format!(
        "Moved {} element(s) {} in {}",
        ids.len(),
        label,
        tree.full_id(parent)
    )));
    Ok(result)
}
