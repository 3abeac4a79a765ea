use async_trait::async_trait;
use murmur_common::{Profile, Result, Toot};
use murmur_social::MastodonApi;

/// Remote side of the pipeline: where posts and profiles come from.
#[async_trait]
pub trait SocialSource: Send + Sync {
    async fn list_public_posts(&self, limit: u32) -> Result<Vec<Toot>>;

    async fn public_usernames(&self, limit: u32) -> Result<Vec<String>>;

    async fn search_accounts(&self, query: &str) -> Result<Vec<Profile>>;

    async fn verify_credentials(&self) -> Result<i64>;
}

#[async_trait]
impl SocialSource for MastodonApi {
    async fn list_public_posts(&self, limit: u32) -> Result<Vec<Toot>> {
        let posts = MastodonApi::list_public_posts(self, limit).await?;
        Ok(posts.iter().map(|p| p.to_toot()).collect())
    }

    async fn public_usernames(&self, limit: u32) -> Result<Vec<String>> {
        MastodonApi::public_usernames(self, limit).await
    }

    async fn search_accounts(&self, query: &str) -> Result<Vec<Profile>> {
        MastodonApi::search_accounts(self, query).await
    }

    async fn verify_credentials(&self) -> Result<i64> {
        MastodonApi::verify_credentials(self).await
    }
}
