//! Protocol engine
//!
//! [`ProtocolEngine`] turns one [`Command`] at a time into a UDP exchange:
//! it builds the wire request, sends it through the session's transport,
//! decodes and reassembles the reply, classifies it, and feeds the result
//! into the ban/backoff state. Scheduling, throttling and retries belong to
//! the caller; `&mut self` on [`ProtocolEngine::process`] keeps exactly one
//! command in flight.

use crate::protocol::backoff::{BackoffSnapshot, BackoffState};
use crate::protocol::clock::Clock;
use crate::protocol::codec::{
    Codec, MultipartAssembler, MultipartKind, MultipartState, TextEncoding, WireFrame,
    response_code,
};
use crate::protocol::config::EngineConfig;
use crate::protocol::error::{ProtocolError, ResponseCode, Result};
use crate::protocol::keepalive::{KeepAliveAction, KeepAlivePolicy};
use crate::protocol::messages::{
    AniDBCommand, Command, DomainOutcome, LoginCommand, LogoutCommand, Payload, PingCommand,
    Request, UpdatedAnime, UpdatedCommand, build_wire_request, classify, mask_request,
};
use crate::protocol::session::{SessionContext, SessionToken, stale_utf16_session};
use crate::protocol::transport::TransportConnector;
use chrono::{DateTime, Utc};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;

/// Single-session AniDB UDP engine
pub struct ProtocolEngine {
    config: EngineConfig,
    connector: Arc<dyn TransportConnector>,
    clock: Arc<dyn Clock>,
    codec: Codec,
    session: Option<SessionContext>,
    backoff: BackoffState,
    keepalive: KeepAlivePolicy,
}

impl ProtocolEngine {
    /// Open the first session
    pub async fn connect(
        config: EngineConfig,
        connector: Arc<dyn TransportConnector>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        debug!("Connecting to AniDB at {}", config.server);
        let transport = connector.connect(&config.server).await?;

        let backoff = BackoffState::new(config.tuning.pause_extension());
        let keepalive =
            KeepAlivePolicy::new(config.tuning.ping_frequency(), config.tuning.logout_after());

        Ok(Self {
            config,
            connector,
            clock,
            codec: Codec::new(),
            session: Some(SessionContext::new(transport)),
            backoff,
            keepalive,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current session, absent after a failed reconnect
    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    /// Check if the current session holds a session key
    pub fn is_logged_in(&self) -> bool {
        self.session.as_ref().is_some_and(SessionContext::is_logged_in)
    }

    /// Image server announced at login
    pub fn image_server(&self) -> Option<&str> {
        self.session.as_ref().and_then(SessionContext::image_server)
    }

    /// Ban and pause state for the dispatcher
    pub fn backoff(&self) -> BackoffSnapshot {
        self.backoff.snapshot()
    }

    /// Process one command and report its outcome
    ///
    /// Transport and decoding failures are reported as
    /// [`DomainOutcome::TransportError`]; they are never retried here.
    pub async fn process(&mut self, command: &mut Command) -> DomainOutcome {
        command.reset();

        if self.session.is_none() {
            self.open_session().await;
        }
        let Some(session) = self.session.as_ref() else {
            error!("{}: no AniDB session available", command.key());
            return command.record_error(&ProtocolError::NotConnected);
        };

        let wire = build_wire_request(command.request(), session.token(), self.config.encoding);
        debug!("UDP_REQUEST {}", mask_request(&wire));

        let reply = match command.request().multipart() {
            Some(kind) => self.exchange_multipart(kind, &wire).await,
            None => self.exchange(command.request(), &wire).await,
        };

        let framed = match reply {
            Ok(framed) => framed,
            Err(e) => {
                if e.is_transient() {
                    warn!("{} failed: {e}", command.key());
                } else {
                    error!("{} failed: {e}", command.key());
                }
                // No reply is recorded as code 0
                self.backoff.record_response(0, self.clock.now());
                return command.record_error(&e);
            }
        };

        let code = response_code(&framed);
        let classification = classify(command.request(), &framed, code);
        self.backoff.record_response(code, self.clock.now());
        self.apply_session_effects(command.request(), &classification.outcome, &classification.payload);

        let outcome = command.record_response(framed, code, classification);
        debug!("{} -> {outcome} ({})", command.key(), ResponseCode(code));

        if outcome.triggers_reconnect() {
            self.force_reconnect().await;
        }
        outcome
    }

    /// Log in with the configured credentials
    ///
    /// Does nothing when already logged in. Returns whether the session is
    /// logged in afterwards.
    pub async fn login(&mut self) -> Result<bool> {
        if self.is_logged_in() {
            return Ok(true);
        }

        let credentials = self.config.credentials.as_ref().ok_or_else(|| {
            ProtocolError::invalid_parameter("credentials", "no AniDB account configured")
        })?;
        let login = LoginCommand::new(
            credentials.username.as_str(),
            credentials.password.clone(),
            self.config.client.name.as_str(),
            self.config.client.version,
        )?;

        let mut command = Command::new(login);
        match self.process(&mut command).await {
            DomainOutcome::LoggedIn => {
                self.clock.sleep(self.config.tuning.login_settle()).await;
                Ok(self.is_logged_in())
            }
            DomainOutcome::LoginFailed => {
                error!("AniDB login failed: {}", command.raw_response().trim_end());
                Ok(false)
            }
            outcome => {
                warn!("AniDB login not accepted: {outcome}");
                Ok(false)
            }
        }
    }

    /// Send LOGOUT when logged in and forget the session key
    pub async fn force_logout(&mut self) -> Option<DomainOutcome> {
        if !self.is_logged_in() {
            return None;
        }

        let mut command = Command::new(LogoutCommand::new());
        let outcome = self.process(&mut command).await;
        if let Some(session) = self.session.as_mut() {
            session.clear_token();
        }
        Some(outcome)
    }

    /// Periodic maintenance: lift elapsed pauses, ping idle sessions, log
    /// out abandoned ones
    pub async fn keepalive_tick(&mut self) -> KeepAliveAction {
        let now = self.clock.now();
        self.backoff.clear_elapsed_pause(now);

        let Some(session) = self.session.as_ref() else {
            return KeepAliveAction::Idle;
        };
        let action = self.keepalive.decide(
            session.is_logged_in(),
            session.activity(),
            &self.backoff.snapshot(),
            now,
        );

        match action {
            KeepAliveAction::Ping => {
                trace!("Keepalive ping");
                let mut command = Command::new(PingCommand::new());
                self.process(&mut command).await;
            }
            KeepAliveAction::Logout => {
                info!("Logging out idle AniDB session");
                self.force_logout().await;
            }
            KeepAliveAction::Idle => {}
        }
        action
    }

    /// Collect every anime updated since `since`, following UPDATED pages
    ///
    /// Returns the outcome of the last page processed with everything
    /// gathered up to that point.
    pub async fn fetch_updated(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<(DomainOutcome, UpdatedAnime)> {
        let mut collected = UpdatedAnime::default();
        let mut since = since;
        let mut first_page = true;

        loop {
            let mut command = Command::new(UpdatedCommand::new(since)?);
            let outcome = self.process(&mut command).await;
            let Some(Payload::Updated(page)) = command.into_payload() else {
                return Ok((outcome, collected));
            };

            let overlap = !first_page
                && page
                    .aids
                    .first()
                    .is_some_and(|aid| collected.aids.contains(aid));
            if first_page {
                collected.entity = page.entity;
                collected.count = page.count;
            }
            collected
                .aids
                .extend(page.aids.iter().skip(usize::from(overlap)).copied());
            collected.last_update = page.last_update.or(collected.last_update);
            first_page = false;

            let more = page.count as usize > crate::protocol::UPDATED_PAGE_SIZE;
            match page.last_update {
                Some(next) if more && next > since => {
                    debug!("UPDATED has {} more records, next page from {next}", page.count);
                    since = next;
                }
                _ => return Ok((outcome, collected)),
            }
        }
    }

    /// Record a ban reported by the HTTP API
    pub fn record_http_ban(&mut self) {
        self.backoff.record_http_ban(self.clock.now());
    }

    /// Lift a ban older than the configured reset period
    pub fn expire_ban(&mut self) -> bool {
        let now = self.clock.now();
        self.backoff.expire_ban(now, self.config.tuning.ban_reset())
    }

    /// Log out and drop the session
    pub async fn shutdown(mut self) {
        self.force_logout().await;
        if let Some(session) = self.session.take() {
            session.dispose();
        }
    }

    /// Tear the session down and build a fresh one
    async fn force_reconnect(&mut self) {
        warn!("Forcing AniDB reconnect");
        if let Some(session) = self.session.take() {
            session.dispose();
        }
        self.clock.sleep(self.config.tuning.reconnect_delay()).await;
        self.open_session().await;
    }

    async fn open_session(&mut self) {
        match self.connector.connect(&self.config.server).await {
            Ok(transport) => self.session = Some(SessionContext::new(transport)),
            Err(e) => error!("Could not reconnect to {}: {e}", self.config.server),
        }
    }

    fn apply_session_effects(
        &mut self,
        request: &Request,
        outcome: &DomainOutcome,
        payload: &Option<Payload>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match (request, outcome, payload) {
            (Request::Login(_), DomainOutcome::LoggedIn, Some(Payload::Session(info))) => {
                session.authenticate(SessionToken {
                    token: info.session_key.clone(),
                    image_server: info.image_server.clone(),
                });
            }
            (Request::Logout(_), DomainOutcome::LoggedOut | DomainOutcome::NotLoggedIn, _)
            | (_, DomainOutcome::LoginRequired, _) => session.clear_token(),
            _ => {}
        }
    }

    /// One request/reply, with the stale UTF-16 login check
    async fn exchange(&mut self, request: &Request, wire: &str) -> Result<String> {
        let requested = self.config.encoding;
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(ProtocolError::NotConnected)?;

        if !request.is_login() {
            let encoding = session.encoding();
            let frame =
                round_trip(&mut self.codec, session, wire, encoding, encoding, request.is_ping(), now)
                    .await?;
            return Ok(frame.framed);
        }

        let mut frame = round_trip(
            &mut self.codec,
            session,
            wire,
            TextEncoding::Ascii,
            requested,
            false,
            now,
        )
        .await?;

        if stale_utf16_session(frame.payload(), session.encoding(), requested) {
            info!("Server holds a {requested} session, resending login");
            session.negotiate(requested)?;
            frame = round_trip(&mut self.codec, session, wire, requested, requested, false, now)
                .await?;
        }

        session.negotiate(requested)?;
        Ok(frame.framed)
    }

    /// Fetch every part of a multi-part reply
    async fn exchange_multipart(&mut self, kind: MultipartKind, wire: &str) -> Result<String> {
        let mut assembler = MultipartAssembler::new(kind);
        let mut request = wire.to_string();

        loop {
            let now = self.clock.now();
            let session = self.session.as_mut().ok_or(ProtocolError::NotConnected)?;
            let encoding = session.encoding();

            let frame =
                match round_trip(&mut self.codec, session, &request, encoding, encoding, false, now)
                    .await
                {
                    Ok(frame) => frame,
                    Err(e) => {
                        assembler.abort(&e);
                        return Err(e);
                    }
                };

            match assembler.accept(&frame.framed).clone() {
                MultipartState::Done(_) => break,
                MultipartState::Aborted(message) => return Err(ProtocolError::multipart(message)),
                MultipartState::AwaitingFragment { .. } => {
                    request = assembler.next_request(&request).ok_or_else(|| {
                        ProtocolError::multipart("request carries no part parameter")
                    })?;
                    self.clock.sleep(self.config.tuning.multipart_delay()).await;
                    debug!("UDP_REQUEST {}", mask_request(&request));
                }
            }
        }

        assembler
            .into_response()
            .ok_or_else(|| ProtocolError::multipart("reassembly did not complete"))
    }
}

/// Send one datagram and decode the reply
///
/// `send_as` encodes the request; `decode_as` is used when the reply carries
/// a byte-order mark.
async fn round_trip(
    codec: &mut Codec,
    session: &mut SessionContext,
    request: &str,
    send_as: TextEncoding,
    decode_as: TextEncoding,
    is_ping: bool,
    now: DateTime<Utc>,
) -> Result<WireFrame> {
    let datagram = codec.encode(request, send_as)?;
    session.touch(is_ping, now);
    session.transport().send(&datagram).await?;

    let mut buffer = vec![0u8; crate::protocol::MAX_DATAGRAM_SIZE];
    let len = session.transport().recv(&mut buffer).await?;
    let frame = codec.decode(&buffer[..len], decode_as)?;
    trace!("Received {} bytes: {}", len, frame.framed.trim_end());
    Ok(frame)
}
