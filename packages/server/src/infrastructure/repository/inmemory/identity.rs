//! InMemory Identity Resolver 実装
//!
//! 認証そのものは外部サービスの責務。ここでは発行済みトークン → ユーザー ID の
//! 対応表を引くだけ。開発用に、数値のクレデンシャルをそのままユーザー ID として
//! 信頼するモードを持つ。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{IdentityError, IdentityResolver, UserId};

#[derive(Default)]
pub struct InMemoryIdentityResolver {
    tokens: RwLock<HashMap<String, UserId>>,
    trust_numeric_credentials: bool,
}

impl InMemoryIdentityResolver {
    pub fn new(trust_numeric_credentials: bool) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            trust_numeric_credentials,
        }
    }

    /// Resolver pre-populated with issued tokens
    pub fn with_tokens(
        trust_numeric_credentials: bool,
        tokens: impl IntoIterator<Item = (String, UserId)>,
    ) -> Self {
        Self {
            tokens: RwLock::new(tokens.into_iter().collect()),
            trust_numeric_credentials,
        }
    }

    pub async fn register_token(&self, token: impl Into<String>, user_id: UserId) {
        self.tokens.write().await.insert(token.into(), user_id);
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn resolve_identity(&self, credential: &str) -> Result<UserId, IdentityError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(IdentityError::MissingCredential);
        }

        if let Some(user_id) = self.tokens.read().await.get(credential) {
            return Ok(*user_id);
        }

        if self.trust_numeric_credentials
            && let Ok(id) = credential.parse::<i64>()
            && id > 0
        {
            return Ok(UserId::new(id));
        }

        Err(IdentityError::UnknownCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_token_resolves() {
        // テスト項目: 登録済みトークンからユーザー ID が解決される
        // given (前提条件):
        let resolver = InMemoryIdentityResolver::new(false);
        resolver.register_token("secret-alice", UserId::new(10)).await;

        // when (操作):
        let result = resolver.resolve_identity("secret-alice").await;

        // then (期待する結果):
        assert_eq!(result, Ok(UserId::new(10)));
    }

    #[tokio::test]
    async fn test_with_tokens_takes_precedence_over_numeric() {
        // テスト項目: 登録済みトークンは数値解釈より優先される
        // given (前提条件):
        let resolver =
            InMemoryIdentityResolver::with_tokens(true, [("7".to_string(), UserId::new(70))]);

        // when (操作):
        let result = resolver.resolve_identity("7").await;

        // then (期待する結果):
        assert_eq!(result, Ok(UserId::new(70)));
    }

    #[tokio::test]
    async fn test_numeric_credential_requires_trust() {
        // テスト項目: 数値クレデンシャルは信頼モードの時のみ受け付ける
        // given (前提条件):
        let strict = InMemoryIdentityResolver::new(false);
        let trusting = InMemoryIdentityResolver::new(true);

        // when (操作):
        let strict_result = strict.resolve_identity("7").await;
        let trusting_result = trusting.resolve_identity("7").await;
        let negative_result = trusting.resolve_identity("-7").await;

        // then (期待する結果):
        assert_eq!(strict_result, Err(IdentityError::UnknownCredential));
        assert_eq!(trusting_result, Ok(UserId::new(7)));
        assert_eq!(negative_result, Err(IdentityError::UnknownCredential));
    }

    #[tokio::test]
    async fn test_empty_credential_is_missing() {
        // テスト項目: 空のクレデンシャルは MissingCredential
        // given (前提条件):
        let resolver = InMemoryIdentityResolver::new(true);

        // when (操作):
        let result = resolver.resolve_identity("  ").await;

        // then (期待する結果):
        assert_eq!(result, Err(IdentityError::MissingCredential));
    }
}
