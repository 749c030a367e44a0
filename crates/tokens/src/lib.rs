use alloy::primitives::Address;
use chzswap_common::{Token, NATIVE_ADDRESS};
use serde::Deserialize;
use tokio::sync::RwLock;

const NATIVE_LOGO_URI: &str =
    "https://hebbkx1anhila5yf.public.blob.vercel-storage.com/image-rHJrCRLDtphuSlEN06yGYcJTuo2kpg.png";

#[derive(Debug, Deserialize)]
struct TokenList {
    #[serde(default)]
    tokens: Vec<Token>,
}

/// Resolves token addresses to metadata.
///
/// The built-in native-asset entry is always present. The supplemental set
/// comes from a remote token list, fetched once on first access; a failed
/// fetch degrades to the built-in set and is retried on the next access.
pub struct TokenRegistry {
    http: reqwest::Client,
    list_url: String,
    native: Token,
    supplemental: RwLock<Option<Vec<Token>>>,
}

impl TokenRegistry {
    pub fn new(list_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            list_url,
            native: native_token(),
            supplemental: RwLock::new(None),
        }
    }

    /// Registry seeded with a fixed supplemental set; no network access.
    pub fn with_tokens(tokens: Vec<Token>) -> Self {
        Self {
            http: reqwest::Client::new(),
            list_url: String::new(),
            native: native_token(),
            supplemental: RwLock::new(Some(tokens)),
        }
    }

    pub fn native(&self) -> &Token {
        &self.native
    }

    /// Warm the supplemental list ahead of first use.
    pub async fn ensure_loaded(&self) {
        let _ = self.supplemental().await;
    }

    /// All known tokens, native entry first.
    pub async fn all(&self) -> Vec<Token> {
        let mut tokens = vec![self.native.clone()];
        for token in self.supplemental().await {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    pub async fn resolve(&self, address: Address) -> Option<Token> {
        self.all().await.into_iter().find(|t| t.address == address)
    }

    /// Look a token up by symbol (case-insensitive) or address.
    pub async fn find(&self, query: &str) -> Option<Token> {
        if let Ok(address) = query.parse::<Address>() {
            return self.resolve(address).await;
        }
        self.all()
            .await
            .into_iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(query))
    }

    /// Tokens offered for selection, excluding an already-chosen counterpart.
    pub async fn selectable(&self, exclude: Option<&Token>) -> Vec<Token> {
        self.all()
            .await
            .into_iter()
            .filter(|t| exclude.map_or(true, |other| t.address != other.address))
            .collect()
    }

    async fn supplemental(&self) -> Vec<Token> {
        if let Some(tokens) = self.supplemental.read().await.as_ref() {
            return tokens.clone();
        }

        match self.fetch_list().await {
            Ok(tokens) => {
                tracing::info!(count = tokens.len(), "token list loaded");
                *self.supplemental.write().await = Some(tokens.clone());
                tokens
            }
            Err(err) => {
                tracing::warn!("token list fetch failed: {err:#}");
                Vec::new()
            }
        }
    }

    async fn fetch_list(&self) -> Result<Vec<Token>, reqwest::Error> {
        let list: TokenList = self
            .http
            .get(&self.list_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(list.tokens)
    }
}

fn native_token() -> Token {
    Token {
        address: NATIVE_ADDRESS,
        decimals: 18,
        symbol: "CHZ".to_string(),
        name: "Chiliz".to_string(),
        logo_uri: Some(NATIVE_LOGO_URI.to_string()),
    }
}

/// Parse a token-list document; malformed input yields an empty set.
pub fn parse_token_list(body: &str) -> Vec<Token> {
    serde_json::from_str::<TokenList>(body)
        .map(|list| list.tokens)
        .unwrap_or_default()
}
