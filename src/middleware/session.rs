use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Identity of "the current shopper". Constructing the no-identity case is
/// impossible; callers with neither a user nor a session have a bug, and
/// `from_parts` fails fast instead of matching every cart or none.
#[derive(Debug, Clone)]
pub enum CartIdentity {
    User(Uuid),
    Session(String),
    Both { user_id: Uuid, session_id: String },
}

impl CartIdentity {
    pub fn from_parts(
        user_id: Option<Uuid>,
        session_id: Option<String>,
    ) -> Result<Self, AppError> {
        match (user_id, session_id) {
            (Some(user_id), Some(session_id)) => Ok(CartIdentity::Both {
                user_id,
                session_id,
            }),
            (Some(user_id), None) => Ok(CartIdentity::User(user_id)),
            (None, Some(session_id)) => Ok(CartIdentity::Session(session_id)),
            (None, None) => Err(AppError::BadRequest(
                "cart lookup requires a user or a session".into(),
            )),
        }
    }
}

/// Read the anonymous session id from the cookie jar, minting one if absent.
/// Returns the (possibly updated) jar so handlers can propagate the
/// `Set-Cookie` header.
pub fn session_from_jar(jar: CookieJar, secure: bool) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        if !id.is_empty() {
            return (jar, id);
        }
    }
    let id = Uuid::new_v4().to_string();
    let cookie = build_session_cookie(id.clone(), secure);
    (jar.add(cookie), id)
}

fn build_session_cookie(id: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::days(SESSION_MAX_AGE_DAYS));
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_rejects_missing_identity() {
        assert!(CartIdentity::from_parts(None, None).is_err());
    }

    #[test]
    fn from_parts_prefers_both_when_present() {
        let user = Uuid::new_v4();
        let identity = CartIdentity::from_parts(Some(user), Some("abc".into())).unwrap();
        assert!(matches!(identity, CartIdentity::Both { .. }));
    }

    #[test]
    fn fresh_jar_mints_a_session() {
        let (jar, id) = session_from_jar(CookieJar::new(), false);
        assert!(!id.is_empty());
        let cookie = jar.get(SESSION_COOKIE).expect("cookie set");
        assert_eq!(cookie.value(), id);
    }
}
