use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::model::config::EngineConfig;
use crate::model::content::{Content, ContentDraft, ContentId};
use crate::model::state::{Completion, Intent, TreeState};
use crate::model::tree::{Bucket, MoveOption};
use crate::ops::content_ops::discard_remote;
use crate::ops::recovery;
use crate::ops::tree_ops::add_to_tree;
use crate::remote::{RemoteAuthority, RemoteError};
use crate::util::cancel::CancelHandle;

/// Error type for group operations
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group not found: {0}")]
    UnknownGroup(ContentId),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// `" - 20"` after the default prefix
static DEFAULT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ - (\d+)$").expect("default suffix pattern"));

/// `" (3)"` after a copied title
static COPY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ \((\d+)\)$").expect("copy suffix pattern"));

/// Trailing `" (n)"` to strip from a copy source
static TRAILING_COPY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(\d+\)$").expect("trailing copy suffix pattern"));

// ---------------------------------------------------------------------------
// Title numbering
// ---------------------------------------------------------------------------

/// Shared numbering primitive. Among `titles` accepted by `matches`, take the
/// highest `parse`d suffix (no suffix counts as 0) and hand it to `format`;
/// `format(None)` when no title matched.
pub fn next_title<'a, I, M, P, F>(titles: I, matches: M, parse: P, format: F) -> String
where
    I: IntoIterator<Item = &'a str>,
    M: Fn(&str) -> bool,
    P: Fn(&str) -> Option<u32>,
    F: FnOnce(Option<u32>) -> String,
{
    let max = titles
        .into_iter()
        .filter(|t| matches(t))
        .map(|t| parse(t).unwrap_or(0))
        .max();
    format(max)
}

fn suffix_number(re: &Regex, rest: &str) -> Option<u32> {
    re.captures(rest).and_then(|caps| caps[1].parse().ok())
}

/// `prefix` when no existing title starts with it, else
/// `"{prefix} - {max + gap}"`.
pub fn default_group_title<'a>(
    titles: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    gap: u32,
) -> String {
    next_title(
        titles,
        |t| t.starts_with(prefix),
        |t| suffix_number(&DEFAULT_SUFFIX, &t[prefix.len()..]),
        |max| match max {
            None => prefix.to_string(),
            Some(n) => format!("{} - {}", prefix, n.saturating_add(gap)),
        },
    )
}

/// Title for a copy of `source_title`: `"{base} ({max + 1})"`, where `base`
/// is the source title without any copy suffix.
pub fn copy_title<'a>(titles: impl IntoIterator<Item = &'a str>, source_title: &str) -> String {
    let base = TRAILING_COPY_SUFFIX.replace(source_title, "").into_owned();
    next_title(
        titles,
        |t| t.starts_with(base.as_str()),
        |t| suffix_number(&COPY_SUFFIX, &t[base.len()..]),
        |max| format!("{} ({})", base, max.unwrap_or(0).saturating_add(1)),
    )
}

/// Titles of the root groups in one bucket
fn group_titles(state: &TreeState, bucket: &Bucket) -> Vec<String> {
    state
        .store
        .iter()
        .filter(|c| c.is_group() && c.is_root() && bucket.contains(c))
        .map(|c| c.title.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Create / copy
// ---------------------------------------------------------------------------

/// Create an empty group in `bucket`. Without a usable `title` it is numbered
/// after the bucket's existing default-titled groups.
pub fn create_group<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    config: &EngineConfig,
    cancel: &CancelHandle,
    bucket: &Bucket,
    title: Option<String>,
    start_rename: bool,
) -> Result<Completion, GroupError> {
    let title = match title.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => t,
        _ => {
            let titles = group_titles(state, bucket);
            default_group_title(
                titles.iter().map(String::as_str),
                &config.locale.group_name(),
                config.groups.title_gap,
            )
        }
    };

    let key = bucket.to_string();
    cancel.begin(&key);
    let response = remote.create_content(ContentDraft::group(
        bucket.category,
        bucket.screen_id.clone(),
        title,
    ));
    if cancel.take(&key) {
        debug!(%bucket, "group creation cancelled");
        if let Ok(group) = &response {
            discard_remote(remote, &group.id);
        }
        return Ok(Completion::Cancelled);
    }
    let group = response?;

    insert_content(state, &group, &config.groups.new_group_position.into());
    state.ui.expanded.insert(group.id.clone());
    if start_rename {
        state.ui.editing = Some(group.id.clone());
        state.emit(Intent::StartRename {
            content_id: group.id.clone(),
        });
    }
    Ok(Completion::Applied)
}

/// Duplicate a group and every current child, in order, into `bucket`.
///
/// The copy lands right after the source when both share the bucket. A
/// failure part-way removes the partial copy locally and asks the authority
/// to delete it.
pub fn copy_group<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    config: &EngineConfig,
    cancel: &CancelHandle,
    group_id: &str,
    bucket: &Bucket,
) -> Result<Completion, GroupError> {
    let source = state
        .store
        .get(group_id)
        .filter(|c| c.is_group())
        .cloned()
        .ok_or_else(|| GroupError::UnknownGroup(group_id.to_string()))?;

    cancel.begin(group_id);
    if recovery::remove_group_if_deleted(state, remote, group_id)? {
        return Err(RemoteError::NotFound(group_id.to_string()).into());
    }

    let titles = group_titles(state, bucket);
    let title = copy_title(titles.iter().map(String::as_str), &source.title);
    let response = remote.create_content(ContentDraft::group(
        bucket.category,
        bucket.screen_id.clone(),
        title,
    ));
    if cancel.take(group_id) {
        if let Ok(copy) = &response {
            discard_remote(remote, &copy.id);
        }
        return Ok(Completion::Cancelled);
    }
    let copy = response?;

    let option = if source.is_root() && bucket.contains(&source) {
        MoveOption::Next(source.id.clone())
    } else {
        config.groups.new_group_position.into()
    };
    insert_content(state, &copy, &option);
    state.ui.expanded.insert(copy.id.clone());

    let children: Vec<Content> = state
        .tree
        .children(&source.id)
        .iter()
        .filter_map(|id| state.store.get(id).cloned())
        .collect();
    for child in &children {
        let response = remote.create_content(ContentDraft::duplicate_of(child, &copy));
        if cancel.take(group_id) {
            debug!(group_id, "copy cancelled part-way");
            roll_back_copy(state, remote, &copy);
            return Ok(Completion::Cancelled);
        }
        match response {
            Ok(duplicate) => insert_content(state, &duplicate, &MoveOption::Last),
            Err(e) => {
                warn!(group_id, copy_id = %copy.id, error = %e, "copy failed, rolling back");
                roll_back_copy(state, remote, &copy);
                return Err(e.into());
            }
        }
    }
    Ok(Completion::Applied)
}

fn insert_content(state: &mut TreeState, content: &Content, option: &MoveOption) {
    state.store.upsert(content.clone());
    add_to_tree(&mut state.tree, content, option);
}

fn roll_back_copy<R: RemoteAuthority + ?Sized>(
    state: &mut TreeState,
    remote: &mut R,
    copy: &Content,
) {
    recovery::remove_group(state, &copy.id);
    discard_remote(remote, &copy.id);
}
