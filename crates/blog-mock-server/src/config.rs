use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Accounts to seed, as (username, token)
    pub users: Vec<(String, String)>,
    /// Serve comments as roots with nested replies instead of a flat list
    pub nested_comments: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            users: parse_users(&env::var("MOCK_USERS").unwrap_or_default())?,
            nested_comments: env::var("MOCK_NESTED_COMMENTS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// Parse `alice:token1,bob:token2`.
fn parse_users(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, token) = pair
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("MOCK_USERS entry without token: {}", pair))?;
            Ok((name.to_string(), token.to_string()))
        })
        .collect()
}
