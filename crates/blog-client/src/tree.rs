//! Two-level thread view built from the server's comment list.

use std::collections::HashMap;

use blog_shared::{Comment, CommentId};

/// A root comment and the replies attached to it.
///
/// Replies never carry replies of their own; the depth cap is the shape of
/// this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub root: Comment,
    pub replies: Vec<Comment>,
}

/// Derived view of one post's comments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Threads {
    /// Root comments in server order.
    pub roots: Vec<Thread>,
    /// Replies whose parent is not a root in the list. Not displayed.
    pub orphaned: Vec<CommentId>,
}

impl Threads {
    /// Number of displayed comments, roots and replies.
    pub fn total(&self) -> usize {
        self.roots.iter().map(|t| 1 + t.replies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a displayed comment, root or reply.
    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        self.roots.iter().find_map(|thread| {
            if thread.root.id == id {
                Some(&thread.root)
            } else {
                thread.replies.iter().find(|reply| reply.id == id)
            }
        })
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.find(id).is_some()
    }
}

/// Move replies delivered nested under their parent into the flat list.
///
/// Each comment is followed by its nested replies, depth first, so the
/// relative order the server used is kept.
pub fn flatten(comments: Vec<Comment>) -> Vec<Comment> {
    let mut flat = Vec::with_capacity(comments.len());
    let mut stack: Vec<std::vec::IntoIter<Comment>> = vec![comments.into_iter()];

    while let Some(level) = stack.last_mut() {
        let Some(mut comment) = level.next() else {
            stack.pop();
            continue;
        };
        let nested = std::mem::take(&mut comment.replies);
        flat.push(comment);
        if !nested.is_empty() {
            stack.push(nested.into_iter());
        }
    }

    flat
}

/// Partition a flat list into roots, attached replies and orphans.
///
/// No reordering: roots keep input order and so do the replies of each
/// root. A reply whose parent is missing, or is itself a reply, is
/// orphaned.
pub fn build_tree(comments: &[Comment]) -> Threads {
    let mut threads = Threads::default();
    let mut root_index: HashMap<CommentId, usize> = HashMap::new();

    for comment in comments.iter().filter(|c| c.parent_id.is_none()) {
        root_index.entry(comment.id).or_insert(threads.roots.len());
        threads.roots.push(Thread {
            root: detached(comment),
            replies: Vec::new(),
        });
    }

    for comment in comments {
        let Some(parent_id) = comment.parent_id else {
            continue;
        };
        match root_index.get(&parent_id) {
            Some(&idx) => threads.roots[idx].replies.push(detached(comment)),
            None => threads.orphaned.push(comment.id),
        }
    }

    threads
}

fn detached(comment: &Comment) -> Comment {
    Comment {
        replies: Vec::new(),
        ..comment.clone()
    }
}

/// Whether `viewer` may delete `comment`: its author or the post's author.
pub fn can_delete(comment: &Comment, viewer: Option<&str>, post_author: &str) -> bool {
    match viewer {
        Some(viewer) => comment.author_username == viewer || post_author == viewer,
        None => false,
    }
}

/// Whether the comment was written by the author of the post.
pub fn is_post_author(comment: &Comment, post_author: &str) -> bool {
    comment.author_username == post_author
}
