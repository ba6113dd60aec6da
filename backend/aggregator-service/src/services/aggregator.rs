/// Fan-out aggregation over the upstream users/posts/comments API
///
/// Each operation fetches everything it needs for one inbound request, joins
/// the fan-out all-or-nothing, then ranks. Output order depends only on the
/// ranking step, never on which outbound call finished first.
use resilience::ConcurrencyLimiter;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::{HttpUpstreamClient, UpstreamApi};
use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{Post, PostType, PostWithCommentCount, PostsResponse, User, UserPostCount};

pub const TOP_USERS_LIMIT: usize = 5;
pub const LATEST_POSTS_LIMIT: usize = 5;

pub struct Aggregator {
    upstream: Arc<dyn UpstreamApi>,
    limiter: ConcurrencyLimiter,
}

impl Aggregator {
    pub fn new(upstream: Arc<dyn UpstreamApi>, limiter: ConcurrencyLimiter) -> Self {
        Self { upstream, limiter }
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        let upstream = HttpUpstreamClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(upstream),
            ConcurrencyLimiter::new(config.max_concurrent_requests),
        ))
    }

    /// Users with the most posts, at most [`TOP_USERS_LIMIT`] of them.
    pub async fn top_users(&self) -> Result<Vec<UserPostCount>, UpstreamError> {
        info!("Retrieving user list");
        let users = self.upstream.fetch_users().await?;

        let counts = self
            .limiter
            .try_join_all(users.into_iter().map(|user| self.count_posts(user)))
            .await?;

        info!(user_count = counts.len(), "Post counts collected");
        Ok(rank_top_users(counts, TOP_USERS_LIMIT))
    }

    /// Dispatch on the requested view.
    pub async fn posts(&self, post_type: PostType) -> Result<PostsResponse, UpstreamError> {
        match post_type {
            PostType::Latest => Ok(PostsResponse::LatestPosts(self.latest_posts().await?)),
            PostType::Popular => Ok(PostsResponse::PopularPosts(self.popular_posts().await?)),
        }
    }

    /// Newest posts across all users, at most [`LATEST_POSTS_LIMIT`].
    pub async fn latest_posts(&self) -> Result<Vec<Post>, UpstreamError> {
        let posts = self.all_posts().await?;
        Ok(newest_posts(posts, LATEST_POSTS_LIMIT))
    }

    /// Every post sharing the highest comment count.
    pub async fn popular_posts(&self) -> Result<Vec<PostWithCommentCount>, UpstreamError> {
        let posts = self.all_posts().await?;

        let with_counts = self
            .limiter
            .try_join_all(posts.into_iter().map(|post| self.count_comments(post)))
            .await?;

        Ok(most_commented(with_counts))
    }

    async fn count_posts(&self, user: User) -> Result<UserPostCount, UpstreamError> {
        debug!(user_id = %user.id, name = %user.name, "Fetching posts for user");
        let posts = self.upstream.fetch_user_posts(&user.id).await?;
        Ok(UserPostCount {
            user_id: user.id,
            name: user.name,
            post_count: posts.len(),
        })
    }

    async fn count_comments(&self, post: Post) -> Result<PostWithCommentCount, UpstreamError> {
        debug!(post_id = post.id, "Fetching comments for post");
        let comment_count = self.upstream.fetch_comment_count(post.id).await?;
        Ok(PostWithCommentCount::new(post, comment_count))
    }

    /// All posts of all users, flattened in user enumeration order.
    async fn all_posts(&self) -> Result<Vec<Post>, UpstreamError> {
        info!("Fetching users");
        let users = self.upstream.fetch_users().await?;

        let per_user = self
            .limiter
            .try_join_all(users.iter().map(|user| {
                debug!(user_id = %user.id, "Retrieving posts for user");
                self.upstream.fetch_user_posts(&user.id)
            }))
            .await?;

        let posts: Vec<Post> = per_user.into_iter().flatten().collect();
        info!(post_count = posts.len(), "Posts collected");
        Ok(posts)
    }
}

/// Stable sort by post count, most first; equal counts keep upstream order.
pub fn rank_top_users(mut counts: Vec<UserPostCount>, limit: usize) -> Vec<UserPostCount> {
    counts.sort_by(|a, b| b.post_count.cmp(&a.post_count));
    counts.truncate(limit);
    counts
}

/// Stable sort by post id, highest first.
pub fn newest_posts(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    posts.truncate(limit);
    posts
}

/// Every post whose comment count equals the maximum, in input order.
/// No posts means no maximum, which yields an empty result.
pub fn most_commented(posts: Vec<PostWithCommentCount>) -> Vec<PostWithCommentCount> {
    let Some(max) = posts.iter().map(|p| p.comment_count).max() else {
        return Vec::new();
    };

    posts
        .into_iter()
        .filter(|p| p.comment_count == max)
        .collect()
}
