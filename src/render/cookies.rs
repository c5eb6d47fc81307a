//! Cookies requested by a function through its `cookies` payload field.
//!
//! Entries look like `{"name": "c1", "value": "v1", "options": {...}}` with
//! options named the way express' `res.cookie` names them.

use cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Deserialize)]
pub struct CookieSpec {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub options: Option<CookieOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieOptions {
    /// Lifetime in milliseconds.
    pub max_age: Option<f64>,
    /// RFC 3339 timestamp or epoch milliseconds.
    pub expires: Option<Value>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    /// `true`, `"strict"`, `"lax"` or `"none"`.
    pub same_site: Option<Value>,
    pub signed: Option<bool>,
}

impl CookieSpec {
    /// Build the cookie to send. Non-string values are stored as `j:<json>`.
    pub fn into_cookie(self) -> Cookie<'static> {
        let value = match self.value {
            Value::String(s) => s,
            other => format!("j:{other}"),
        };
        let options = self.options.unwrap_or_default();

        let mut cookie = Cookie::new(self.name, value);
        cookie.set_path(options.path.unwrap_or_else(|| "/".to_string()));

        if let Some(domain) = options.domain {
            cookie.set_domain(domain);
        }

        if let Some(max_age_ms) = options.max_age {
            // `as` saturates, so absurd lifetimes clamp to the i64 range
            let lifetime = time::Duration::milliseconds(max_age_ms as i64);
            cookie.set_max_age(lifetime);
            match OffsetDateTime::now_utc().checked_add(lifetime) {
                Some(at) => cookie.set_expires(at),
                None => tracing::warn!(cookie = %cookie.name(), max_age_ms, "Cookie lifetime out of range, sending Max-Age only"),
            }
        } else if let Some(expires) = options.expires {
            match parse_expires(&expires) {
                Some(at) => cookie.set_expires(at),
                None => tracing::warn!(cookie = %cookie.name(), expires = %expires, "Ignoring unparseable cookie expiry"),
            }
        }

        if options.secure == Some(true) {
            cookie.set_secure(true);
        }
        if options.http_only == Some(true) {
            cookie.set_http_only(true);
        }
        if let Some(same_site) = options.same_site.as_ref().and_then(parse_same_site) {
            cookie.set_same_site(same_site);
        }
        if options.signed == Some(true) {
            tracing::warn!(cookie = %cookie.name(), "Signed cookies are not supported, sending unsigned");
        }

        cookie
    }
}

fn parse_expires(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(s) => OffsetDateTime::parse(s, &Rfc3339).ok(),
        Value::Number(n) => {
            let millis = n.as_f64()? as i128;
            OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
        }
        _ => None,
    }
}

fn parse_same_site(value: &Value) -> Option<SameSite> {
    match value {
        Value::Bool(true) => Some(SameSite::Strict),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        },
        _ => None,
    }
}

/// Decode a `cookies` payload array. Malformed entries are skipped.
pub fn cookies_from_payload(entries: &[Value]) -> Vec<Cookie<'static>> {
    entries
        .iter()
        .filter_map(|entry| match CookieSpec::deserialize(entry) {
            Ok(spec) => Some(spec.into_cookie()),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed cookie entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(entry: Value) -> Cookie<'static> {
        let mut cookies = cookies_from_payload(&[entry]);
        assert_eq!(cookies.len(), 1);
        cookies.remove(0)
    }

    #[test]
    fn plain_cookie_defaults_to_root_path() {
        let cookie = one(json!({"name": "c1", "value": "v1", "options": {}}));
        assert_eq!(cookie.name(), "c1");
        assert_eq!(cookie.value(), "v1");
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn applies_express_options() {
        let cookie = one(json!({
            "name": "session",
            "value": "abc",
            "options": {
                "maxAge": 60000,
                "domain": "example.com",
                "path": "/app",
                "secure": true,
                "httpOnly": true,
                "sameSite": "lax"
            }
        }));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(60)));
        assert!(cookie.expires_datetime().is_some());
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn expires_accepts_timestamps() {
        let cookie = one(json!({
            "name": "a",
            "value": "b",
            "options": {"expires": "2030-01-01T00:00:00.000Z", "sameSite": true}
        }));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.year()),
            Some(2030)
        );
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));

        let cookie = one(json!({"name": "a", "value": "b", "options": {"expires": 0}}));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn out_of_range_expires_is_ignored() {
        for expires in [json!(1e300), json!(-1e300), json!(9_000_000_000_000_000_i64)] {
            let cookie = one(json!({"name": "a", "value": "b", "options": {"expires": expires}}));
            assert!(cookie.expires_datetime().is_none());
        }
    }

    #[test]
    fn huge_max_age_keeps_max_age_only() {
        for max_age in [json!(1e15), json!(-1e15), json!(1e300)] {
            let cookie = one(json!({"name": "a", "value": "b", "options": {"maxAge": max_age}}));
            assert!(cookie.max_age().is_some());
            assert!(cookie.expires_datetime().is_none());
            assert!(cookie.encoded().to_string().contains("Max-Age="));
        }
    }

    #[test]
    fn non_string_values_are_json_prefixed() {
        let cookie = one(json!({"name": "prefs", "value": {"dark": true}, "options": null}));
        assert_eq!(cookie.value(), r#"j:{"dark":true}"#);
    }

    #[test]
    fn malformed_entries_are_skipped_in_order() {
        let cookies = cookies_from_payload(&[
            json!({"name": "first", "value": "1"}),
            json!({"value": "nameless"}),
            json!("not an object"),
            json!({"name": "second", "value": "2"}),
        ]);
        let names: Vec<_> = cookies.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
