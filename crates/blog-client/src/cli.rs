use std::sync::Arc;

use anyhow::{Context, Result};
use blog_client::{
    can_delete, is_post_author, ApiClient, CommentTree, LikeToggle, PostOutcome, Session, Threads,
    ToggleOutcome,
};
use blog_shared::{Comment, CommentId, Post, PostId};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "blog")]
#[command(about = "Command-line client for the blog service")]
#[command(version)]
pub struct Cli {
    /// Service root, e.g. http://localhost:8000/api
    #[arg(long, env = "BLOG_SERVER_URL")]
    pub server: Option<String>,

    /// Username the token belongs to
    #[arg(long, env = "BLOG_USERNAME")]
    pub username: Option<String>,

    /// Auth token sent with every request
    #[arg(long, env = "BLOG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse posts
    #[command(subcommand)]
    Posts(PostsCommand),
    /// Read and write comments on a post
    #[command(subcommand)]
    Comments(CommentsCommand),
    /// Like or unlike a post
    Like { post: i64 },
}

#[derive(Debug, Subcommand)]
pub enum PostsCommand {
    /// List all posts, newest first
    List {
        /// Only posts by this user
        #[arg(long)]
        author: Option<String>,
    },
    /// Show a post with its like count and comments
    Show { post: i64 },
}

#[derive(Debug, Subcommand)]
pub enum CommentsCommand {
    /// Print the comment threads of a post
    List { post: i64 },
    /// Add a comment, or a reply with --reply-to
    Add {
        post: i64,
        text: String,
        #[arg(long)]
        reply_to: Option<i64>,
    },
    /// Delete a comment
    Delete { post: i64, comment: i64 },
}

impl Cli {
    pub fn session(&self) -> Session {
        Session::from_parts(self.username.clone(), self.token.clone())
    }
}

pub async fn run(cli: Cli, api: ApiClient) -> Result<()> {
    let session = cli.session();
    let api = Arc::new(api);

    match cli.command {
        Command::Posts(PostsCommand::List { author }) => {
            let posts = match author {
                Some(author) => api.user_posts(&session, &author).await,
                None => api.list_posts(&session).await,
            }
            .context("Failed to list posts")?;

            if posts.is_empty() {
                println!("No posts yet.");
            }
            for post in &posts {
                println!("#{} {} by {} ({} likes)", post.id, post.title, post.author, post.like_count);
            }
        }
        Command::Posts(PostsCommand::Show { post }) => {
            let post = api
                .get_post(&session, PostId(post))
                .await
                .context("Failed to load post")?;
            print_post(&post);

            let tree = CommentTree::new(api.clone(), post.id);
            let threads = tree.load(&session).await?;
            println!();
            print_threads(&threads, tree.len(), &post.author, session.username());
        }
        Command::Comments(CommentsCommand::List { post }) => {
            let post = api
                .get_post(&session, PostId(post))
                .await
                .context("Failed to load post")?;
            let tree = CommentTree::new(api.clone(), post.id);
            let threads = tree.load(&session).await?;
            print_threads(&threads, tree.len(), &post.author, session.username());
        }
        Command::Comments(CommentsCommand::Add {
            post,
            text,
            reply_to,
        }) => {
            let tree = CommentTree::new(api.clone(), PostId(post));
            match tree.post(&session, &text, reply_to.map(CommentId)).await? {
                PostOutcome::Skipped => println!("Nothing to post: comment is empty."),
                PostOutcome::Posted { id } => {
                    match id {
                        Some(id) => println!("Posted comment #{}.", id),
                        None => println!("Posted comment."),
                    }
                    println!("{} comments on post #{}.", tree.len(), post);
                }
            }
        }
        Command::Comments(CommentsCommand::Delete { post, comment }) => {
            let tree = CommentTree::new(api.clone(), PostId(post));
            tree.delete(&session, CommentId(comment)).await?;
            println!("Deleted comment #{}. {} comments left.", comment, tree.len());
        }
        Command::Like { post } => {
            let post = api
                .get_post(&session, PostId(post))
                .await
                .context("Failed to load post")?;
            let toggle = LikeToggle::from_post(api.clone(), &post);

            match toggle.toggle(&session).await? {
                ToggleOutcome::Reconciled(state) => {
                    let verb = if state.liked { "Liked" } else { "Unliked" };
                    println!("{} post #{} ({} likes).", verb, post.id, state.count);
                }
                ToggleOutcome::Ignored => println!("A toggle is already in progress."),
            }
        }
    }

    Ok(())
}

fn print_post(post: &Post) {
    println!("{}", post.title);
    match post.created_at {
        Some(at) => println!("by {} on {}", post.author, at.format("%Y-%m-%d")),
        None => println!("by {}", post.author),
    }
    let heart = if post.liked_by_user { "♥" } else { "♡" };
    println!("{} {}", heart, post.like_count);
    println!();
    println!("{}", post.description);
}

fn print_threads(threads: &Threads, total: usize, post_author: &str, viewer: Option<&str>) {
    println!("Comments ({})", total);
    if threads.is_empty() {
        println!("No comments yet. Be the first to share your thoughts!");
        return;
    }

    for thread in &threads.roots {
        println!("{}", comment_line(&thread.root, post_author, viewer));
        for reply in &thread.replies {
            println!("    ↳ {}", comment_line(reply, post_author, viewer));
        }
    }
}

fn comment_line(comment: &Comment, post_author: &str, viewer: Option<&str>) -> String {
    let badge = if is_post_author(comment, post_author) {
        " (Author)"
    } else {
        ""
    };
    let deletable = if can_delete(comment, viewer, post_author) {
        " [can delete]"
    } else {
        ""
    };
    format!(
        "#{} {}{} {}: {}{}",
        comment.id,
        comment.author_username,
        badge,
        comment.created_at.format("%Y-%m-%d"),
        comment.content,
        deletable
    )
}
