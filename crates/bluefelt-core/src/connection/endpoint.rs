//! Lobby WebSocket endpoint URLs

use crate::error::ConfigError;

/// Build the lobby endpoint for a player
///
/// `{base}/lobbies/{lobby_id}/ws?player_id={player_id}`. `http(s)` bases map
/// to `ws(s)`, so the REST base URL can be reused.
pub fn endpoint_url(base: &str, lobby_id: &str, player_id: &str) -> Result<String, ConfigError> {
    if lobby_id.is_empty() {
        return Err(ConfigError::MissingField("lobby id"));
    }
    if player_id.is_empty() {
        return Err(ConfigError::MissingField("player id"));
    }

    let base = websocket_base(base)?;
    Ok(format!(
        "{}/lobbies/{}/ws?player_id={}",
        base.trim_end_matches('/'),
        encode_component(lobby_id),
        encode_component(player_id)
    ))
}

fn websocket_base(base: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: base.to_string(),
        reason: reason.to_string(),
    };

    let (scheme, rest) = base
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme"))?;
    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        _ => return Err(invalid("scheme must be ws, wss, http or https")),
    };
    if rest.trim_matches('/').is_empty() {
        return Err(invalid("missing host"));
    }
    if rest.contains(['?', '#']) {
        return Err(invalid("base URL must not carry a query or fragment"));
    }
    Ok(format!("{}://{}", scheme, rest))
}

/// Percent-encode everything outside the RFC 3986 unreserved set
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("ws://localhost:8000", "abc", "p1").unwrap(),
            "ws://localhost:8000/lobbies/abc/ws?player_id=p1"
        );
    }

    #[test]
    fn test_endpoint_url_maps_http_schemes() {
        assert_eq!(
            endpoint_url("https://games.example.com/", "abc", "p1").unwrap(),
            "wss://games.example.com/lobbies/abc/ws?player_id=p1"
        );
        assert_eq!(
            endpoint_url("http://127.0.0.1:8000/api", "abc", "p1").unwrap(),
            "ws://127.0.0.1:8000/api/lobbies/abc/ws?player_id=p1"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_ids() {
        assert_eq!(
            endpoint_url("ws://h", "a/b", "Jane Doe&co").unwrap(),
            "ws://h/lobbies/a%2Fb/ws?player_id=Jane%20Doe%26co"
        );
    }

    #[test]
    fn test_endpoint_url_rejects_bad_input() {
        assert!(matches!(
            endpoint_url("localhost:8000", "abc", "p1"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            endpoint_url("ftp://h", "abc", "p1"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            endpoint_url("ws://", "abc", "p1"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert_eq!(
            endpoint_url("ws://h", "", "p1"),
            Err(ConfigError::MissingField("lobby id"))
        );
        assert_eq!(
            endpoint_url("ws://h", "abc", ""),
            Err(ConfigError::MissingField("player id"))
        );
    }
}
