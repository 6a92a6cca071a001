//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] issued by the identity
/// provider.
#[derive(Clone, Debug, From)]
pub struct AuthorizeSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Clk> Command<AuthorizeSession> for Service<Db, Clk> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> ExecutionError))?
        .claims)
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::{AuthorizeSession, Command as _},
        domain::user::{self, session, Session},
        fixture,
    };

    #[expect(unsafe_code, reason = "freshly encoded")]
    fn token(session: &Session) -> session::Token {
        let token = jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(fixture::JWT_SECRET),
        )
        .unwrap();
        unsafe { session::Token::new_unchecked(token) }
    }

    #[tokio::test]
    async fn accepts_valid_session() {
        let (svc, _) = fixture::service().await;
        let session = Session {
            user_id: user::Id::new(),
            expires_at: DateTime::from_unix_timestamp(
                DateTime::now().unix_timestamp() + 3600,
            )
            .unwrap()
            .coerce(),
        };

        let authorized = svc
            .execute(AuthorizeSession::from(token(&session)))
            .await
            .unwrap();

        assert_eq!(authorized.user_id, session.user_id);
        assert_eq!(
            authorized.expires_at.unix_timestamp(),
            session.expires_at.unix_timestamp(),
        );
    }

    #[tokio::test]
    async fn rejects_expired_session() {
        let (svc, _) = fixture::service().await;
        let session = Session {
            user_id: user::Id::new(),
            expires_at: DateTime::from_unix_timestamp(1_000).unwrap().coerce(),
        };

        assert!(svc
            .execute(AuthorizeSession::from(token(&session)))
            .await
            .is_err());
    }
}
