//! Bring a vehicle online before talking to it
//!
//! The wake command is idempotent, so it is simply re-sent until the vehicle
//! reports `online` or the attempt budget is spent.

use crate::api::{HttpMethod, OnlineState, WakeResponse};
use crate::auth;
use crate::error::{AuthError, Error, Result};
use crate::session::Session;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// How long to keep waking a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakePolicy {
    /// Delay between wake attempts
    pub interval: Duration,
    /// Total wake requests before giving up
    pub max_attempts: u32,
}

impl Default for WakePolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl WakePolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Result of a successful wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeOutcome {
    /// Wake requests sent; `attempts - 1` sleeps happened in between
    pub attempts: u32,
}

/// Wake `internal_id` until it reports online.
///
/// A wake response without a vehicle state means the token was not
/// accepted; that is fatal immediately because retrying cannot fix it.
pub async fn ensure_online(session: &mut Session, internal_id: &str, policy: &WakePolicy) -> Result<WakeOutcome> {
    let path = format!("{}/wake_up", urlencoding::encode(internal_id));
    let mut attempt = 1;

    loop {
        info!("Attempting to wake up Vehicle (ID:{})", internal_id);
        let token = auth::get_token(session).await?;
        let body = session.client.send(HttpMethod::Post, &path, &token, &[]).await?;

        let raw = body.to_string();
        let state = serde_json::from_value::<WakeResponse>(body)
            .ok()
            .and_then(|wake| wake.response)
            .and_then(|response| response.state)
            .filter(|state| !state.is_empty())
            .ok_or(AuthError::InvalidWakeResponse(raw))?;

        match OnlineState::from_state(Some(&state)) {
            OnlineState::Online => {
                info!("Vehicle (ID:{}) is Online", internal_id);
                return Ok(WakeOutcome { attempts: attempt });
            }
            _ => {
                if attempt >= policy.max_attempts {
                    return Err(Error::DeviceUnreachable {
                        id: internal_id.to_string(),
                        attempts: attempt,
                    });
                }
                info!(
                    "Vehicle (ID:{}) is {}; Waiting {:?} before retry ({}/{})...",
                    internal_id, state, policy.interval, attempt, policy.max_attempts
                );
                sleep(policy.interval).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::method;
    use wiremock::{Mock, ResponseTemplate};

    fn quick(max_attempts: u32) -> WakePolicy {
        WakePolicy::new(Duration::ZERO, max_attempts)
    }

    #[tokio::test]
    async fn test_already_online_needs_one_attempt() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        wake_mock("online").expect(1).mount(&server).await;

        let outcome = ensure_online(&mut session, INTERNAL_ID, &quick(5)).await.unwrap();
        assert_eq!(outcome.attempts, 1);
    }

    #[tokio::test]
    async fn test_converges_after_n_attempts() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        // Two asleep answers, then online: three wake calls, two sleeps.
        wake_mock("asleep").up_to_n_times(2).expect(2).mount(&server).await;
        wake_mock("online").expect(1).mount(&server).await;

        let policy = WakePolicy::new(Duration::from_millis(200), 10);
        let started = Instant::now();
        let outcome = ensure_online(&mut session, INTERNAL_ID, &policy).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert!(elapsed >= policy.interval * 2, "slept {:?}", elapsed);
        assert!(elapsed < policy.interval * 3, "slept {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_unrecognised_state_is_retried() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        wake_mock("offline").up_to_n_times(1).expect(1).mount(&server).await;
        wake_mock("online").expect(1).mount(&server).await;

        let outcome = ensure_online(&mut session, INTERNAL_ID, &quick(5)).await.unwrap();
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        wake_mock("asleep").expect(4).mount(&server).await;

        let result = ensure_online(&mut session, INTERNAL_ID, &quick(4)).await;
        assert!(matches!(
            result,
            Err(Error::DeviceUnreachable { attempts: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_null_response_is_fatal_without_retry() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": null })))
            .expect(1)
            .mount(&server)
            .await;

        let result = ensure_online(&mut session, INTERNAL_ID, &quick(10)).await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidWakeResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_state_is_fatal_without_retry() {
        for body in [json!({ "response": {} }), json!({ "response": { "state": null } })] {
            let (mut session, server, _dir) = session_with(resolved_credential()).await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;

            let result = ensure_online(&mut session, INTERNAL_ID, &quick(5)).await;
            assert!(matches!(
                result,
                Err(Error::Auth(AuthError::InvalidWakeResponse(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_fatal_without_retry() {
        let (mut session, server, _dir) = session_with(resolved_credential()).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(408))
            .expect(1)
            .mount(&server)
            .await;

        let result = ensure_online(&mut session, INTERNAL_ID, &quick(10)).await;
        assert!(matches!(result, Err(Error::EmptyResponse { .. })));
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        assert_eq!(WakePolicy::new(Duration::from_secs(1), 0).max_attempts, 1);
        assert_eq!(WakePolicy::default().interval, Duration::from_secs(5));
    }
}
