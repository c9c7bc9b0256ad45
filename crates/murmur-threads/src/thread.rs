use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use murmur_types::api::{PostCommentRequest, PostReplyRequest, ToggleVoteRequest};
use murmur_types::models::{Comment, VoteTally};

use crate::votes::{VoteLedger, VoteOutcome};

#[derive(Debug, Error, PartialEq)]
pub enum ThreadError {
    #[error("comment text is empty")]
    EmptyText,

    /// Recoverable: the reply target is absent anywhere in the tree. The
    /// tree is left unchanged and the caller decides what to do.
    #[error("parent comment {0} not found")]
    ParentNotFound(Uuid),

    #[error("comment {0} not found")]
    CommentNotFound(Uuid),
}

/// Append-only comment tree for a single content item, with a vote ledger
/// beside it.
///
/// The tree is exclusively owned: mutation happens in place through
/// `&mut self`, and every accessor that hands a `Comment` out hands out an
/// owned copy. `total_count` recomputes recursively on demand, so it is
/// always consistent with the mutation that just returned.
pub struct CommentThread {
    item_id: Uuid,
    roots: Vec<Comment>,
    votes: VoteLedger,
}

impl CommentThread {
    pub fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            roots: Vec::new(),
            votes: VoteLedger::new(),
        }
    }

    /// Rehydrate a thread from comment roots a caller previously persisted.
    pub fn from_saved(item_id: Uuid, roots: Vec<Comment>) -> Self {
        Self {
            item_id,
            roots,
            votes: VoteLedger::new(),
        }
    }

    pub fn item_id(&self) -> Uuid {
        self.item_id
    }

    /// Top-level comments in insertion order, for rendering.
    pub fn comments(&self) -> &[Comment] {
        &self.roots
    }

    /// Append a top-level comment. Rejects text that is empty after
    /// trimming; nothing is inserted on rejection.
    pub fn add_comment(&mut self, req: &PostCommentRequest) -> Result<Comment, ThreadError> {
        let comment = build_comment(&req.text, &req.author)?;
        self.roots.push(comment.clone());
        debug!(item = %self.item_id, comment = %comment.id, "comment added");
        Ok(comment)
    }

    /// Append a reply under `parent_id`, located by depth-first search over
    /// the whole tree. Returns `ParentNotFound` (tree untouched) when the
    /// parent is absent anywhere, including the empty tree.
    pub fn add_reply(&mut self, req: &PostReplyRequest) -> Result<Comment, ThreadError> {
        let comment = build_comment(&req.text, &req.author)?;
        let parent = find_mut(&mut self.roots, req.parent_id)
            .ok_or(ThreadError::ParentNotFound(req.parent_id))?;
        parent.replies.push(comment.clone());
        debug!(
            item = %self.item_id,
            parent = %req.parent_id,
            comment = %comment.id,
            "reply added"
        );
        Ok(comment)
    }

    /// Recursive 1-per-node count over the whole tree. Equals the number of
    /// `add_comment`/`add_reply` calls that have returned successfully.
    pub fn total_count(&self) -> usize {
        self.roots.iter().map(count_subtree).sum()
    }

    /// Look a comment up by id, depth-first, left-to-right.
    pub fn find(&self, id: Uuid) -> Option<&Comment> {
        find_in(&self.roots, id)
    }

    /// Toggle a voter's vote on a comment: same direction clears it, the
    /// opposite direction switches it. Votes never affect `total_count`.
    pub fn toggle_vote(&mut self, req: &ToggleVoteRequest) -> Result<VoteOutcome, ThreadError> {
        if find_in(&self.roots, req.comment_id).is_none() {
            return Err(ThreadError::CommentNotFound(req.comment_id));
        }
        let vote = self.votes.toggle(req.comment_id, req.voter_id, req.kind);
        Ok(VoteOutcome {
            vote,
            tally: self.votes.tally(req.comment_id),
        })
    }

    /// Current tally for a comment; zero for unknown or unvoted ids.
    pub fn tally(&self, comment_id: Uuid) -> VoteTally {
        self.votes.tally(comment_id)
    }
}

fn build_comment(text: &str, author: &str) -> Result<Comment, ThreadError> {
    if text.trim().is_empty() {
        return Err(ThreadError::EmptyText);
    }
    Ok(Comment {
        id: Uuid::new_v4(),
        text: text.to_string(),
        author: author.to_string(),
        created_at: Utc::now(),
        replies: Vec::new(),
    })
}

// The search must keep descending into later siblings after an unsuccessful
// subtree; an early return after the first branch would lose parents that
// live further right.
fn find_in(comments: &[Comment], id: Uuid) -> Option<&Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_in(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut(comments: &mut [Comment], id: Uuid) -> Option<&mut Comment> {
    for comment in comments.iter_mut() {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn count_subtree(comment: &Comment) -> usize {
    1 + comment.replies.iter().map(count_subtree).sum::<usize>()
}
