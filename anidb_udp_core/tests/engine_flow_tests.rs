//! End-to-end engine behaviour against a scripted server
//!
//! Covers login and session key handling, encoding negotiation, the shared
//! ban/pause/reconnect codes and transport failures.

mod common;

use anidb_test_utils::{ManualClock, ScriptedServer, utf16};
use anidb_udp_core::protocol::backoff::BanOrigin;
use anidb_udp_core::protocol::codec::TextEncoding;
use anidb_udp_core::protocol::messages::{GroupCommand, PingCommand, VoteCommand, VoteType};
use anidb_udp_core::protocol::{Clock, Command, DomainOutcome, Payload};
use chrono::TimeDelta;
use common::{engine, logged_in, utf16_text};
use std::time::Duration;

fn vote() -> Command {
    Command::new(VoteCommand::new(VoteType::Anime, 5, 850).unwrap())
}

fn group() -> Command {
    Command::new(GroupCommand::new(7).unwrap())
}

#[tokio::test]
async fn test_vote_after_login() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = logged_in(&server, &clock).await;
    server.reply_text("260 VOTED\nCowboy Bebop|850|1|5\n");

    let mut command = vote();
    assert_eq!(engine.process(&mut command).await, DomainOutcome::Voted);
    assert_eq!(command.response_code(), 260);
    assert!(!command.error_occurred());
    assert!(matches!(command.payload(), Some(Payload::Vote(info)) if info.value == Some(850)));

    let sent = server.sent_requests();
    assert!(sent[0].starts_with("AUTH user=bob&pass=secret&protover=3"));
    assert!(sent[0].ends_with("&enc=ascii"));
    assert_eq!(sent[1], "VOTE type=1&id=5&value=850&s=abcde");
    assert_eq!(engine.image_server(), Some("http://img7.anidb.net/"));
}

#[tokio::test]
async fn test_login_settles_before_next_command() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let _engine = logged_in(&server, &clock).await;
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(2200)]);
}

#[tokio::test]
async fn test_utf16_session_after_login() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    server.reply(utf16("200 abcde LOGIN ACCEPTED\n\n"));
    server.reply(utf16("260 VOTED\nCowboy Bebop|850|1|5\n"));

    let mut engine = engine(&server, &clock, TextEncoding::Utf16).await;
    assert!(engine.login().await.unwrap());
    assert_eq!(
        engine.session().map(|s| s.encoding()),
        Some(TextEncoding::Utf16)
    );

    let mut command = vote();
    assert_eq!(engine.process(&mut command).await, DomainOutcome::Voted);

    let sent = server.sent_datagrams();
    assert!(sent[0].starts_with(b"AUTH "), "login goes out as ASCII");
    assert!(sent[0].ends_with(b"&enc=utf-16"));
    assert_eq!(utf16_text(&sent[1]), "VOTE type=1&id=5&value=850&s=abcde");
}

#[tokio::test]
async fn test_stale_utf16_login_is_resent() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    server.reply(utf16("501 LOGIN FIRST\n\n"));
    server.reply(utf16("200 fghij LOGIN ACCEPTED\n\n"));

    let mut engine = engine(&server, &clock, TextEncoding::Utf16).await;
    assert!(engine.login().await.unwrap());

    let sent = server.sent_datagrams();
    assert_eq!(sent.len(), 2);
    let ascii = String::from_utf8(sent[0].clone()).unwrap();
    assert_eq!(utf16_text(&sent[1]), ascii);
    assert_eq!(engine.session().and_then(|s| s.token()), Some("fghij"));
}

#[tokio::test]
async fn test_banned_reply() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = logged_in(&server, &clock).await;
    server.reply_text("555 BANNED\nflooding\n");

    let mut command = vote();
    assert_eq!(engine.process(&mut command).await, DomainOutcome::Banned);

    let backoff = engine.backoff();
    assert!(backoff.is_banned());
    assert_eq!(backoff.ban_origin, BanOrigin::Udp);
    assert_eq!(backoff.banned_at, Some(clock.now()));
    assert!(!backoff.may_dispatch(clock.now()));
}

#[tokio::test]
async fn test_ban_lifted_by_next_reply() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("555 BANNED\n\n").reply_text("300 PONG\n4556\n");

    engine.process(&mut group()).await;
    assert!(engine.backoff().is_banned());

    let mut ping = Command::new(PingCommand::new());
    assert_eq!(engine.process(&mut ping).await, DomainOutcome::Pong);
    assert!(!engine.backoff().is_banned());
}

#[tokio::test]
async fn test_http_ban_survives_udp_replies() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("300 PONG\n4556\n");

    engine.record_http_ban();
    let mut ping = Command::new(PingCommand::new());
    assert_eq!(engine.process(&mut ping).await, DomainOutcome::Pong);

    let backoff = engine.backoff();
    assert!(backoff.is_banned());
    assert_eq!(backoff.ban_origin, BanOrigin::Http);
}

#[tokio::test]
async fn test_timeout_lifts_udp_ban() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("555 BANNED\n\n").reply_timeout();

    engine.process(&mut group()).await;
    assert!(engine.backoff().is_banned());

    let mut ping = Command::new(PingCommand::new());
    assert_eq!(
        engine.process(&mut ping).await,
        DomainOutcome::TransportError
    );
    assert!(!engine.backoff().is_banned());
}

#[tokio::test]
async fn test_server_busy_pauses() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("602 SERVER BUSY\n\n");

    let started = clock.now();
    let mut command = group();
    assert_eq!(
        engine.process(&mut command).await,
        DomainOutcome::TemporaryServerError
    );

    let backoff = engine.backoff();
    assert_eq!(backoff.paused_until(), Some(started + TimeDelta::seconds(300)));
    assert!(backoff.is_paused(started));
    assert!(!backoff.is_paused(started + TimeDelta::seconds(301)));
    assert!(!backoff.is_banned());
}

#[tokio::test]
async fn test_pause_cleared_by_keepalive_tick() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("604 TIMEOUT - DELAY AND RESUBMIT\n\n");

    engine.process(&mut group()).await;
    assert!(engine.backoff().paused_until().is_some());

    clock.advance(Duration::from_secs(300));
    engine.keepalive_tick().await;
    assert_eq!(engine.backoff().paused_until(), None);
    assert_eq!(engine.backoff().pause_reason, None);
}

#[tokio::test]
async fn test_unknown_command_reconnects() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = logged_in(&server, &clock).await;
    server.reply_text("598 UNKNOWN COMMAND\n\n");

    let mut command = group();
    assert_eq!(
        engine.process(&mut command).await,
        DomainOutcome::UnknownCommand
    );
    assert_eq!(server.connect_count(), 2);
    assert!(!engine.is_logged_in());
    assert!(clock.sleeps().contains(&Duration::from_secs(1)));
}

#[tokio::test]
async fn test_invalid_session_then_login_again() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = logged_in(&server, &clock).await;
    server
        .reply_text("506 INVALID SESSION\n\n")
        .reply_text("200 zyxwv LOGIN ACCEPTED\n\n")
        .reply_text("260 VOTED\n5|850\n");

    assert_eq!(
        engine.process(&mut vote()).await,
        DomainOutcome::InvalidSession
    );
    assert!(engine.login().await.unwrap());
    assert_eq!(engine.process(&mut vote()).await, DomainOutcome::Voted);
    assert_eq!(
        server.sent_requests().last().map(String::as_str),
        Some("VOTE type=1&id=5&value=850&s=zyxwv")
    );
}

#[tokio::test]
async fn test_failed_reconnect_recovers_lazily() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_text("598 UNKNOWN COMMAND\n\n");
    server.fail_next_connects(1);

    engine.process(&mut group()).await;
    assert!(engine.session().is_none());

    server.reply_text("250 GROUP\n7|8|3|Frostii|Frostii\n");
    assert_eq!(engine.process(&mut group()).await, DomainOutcome::GotGroup);
    assert_eq!(server.connect_count(), 2);
}

#[tokio::test]
async fn test_login_required_clears_token() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = logged_in(&server, &clock).await;
    server.reply_text("501 LOGIN FIRST\n\n");

    assert_eq!(
        engine.process(&mut vote()).await,
        DomainOutcome::LoginRequired
    );
    assert!(!engine.is_logged_in());
}

#[tokio::test]
async fn test_login_failed() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    server.reply_text("500 LOGIN FAILED\n\n");

    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    assert!(!engine.login().await.unwrap());
    assert!(!engine.is_logged_in());
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply_timeout();

    let mut command = group();
    assert_eq!(
        engine.process(&mut command).await,
        DomainOutcome::TransportError
    );
    assert!(command.error_occurred());
    assert!(command.error_message().is_some_and(|m| m.contains("Timed out")));
    assert_eq!(server.connect_count(), 1);
    assert!(!engine.backoff().is_banned());
}

#[tokio::test]
async fn test_compressed_reply() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;
    server.reply(anidb_test_utils::compressed(b"300 PONG\n4556\n"));

    let mut ping = Command::new(PingCommand::new());
    assert_eq!(engine.process(&mut ping).await, DomainOutcome::Pong);
    assert_eq!(ping.raw_response(), "300 PONG\n4556\n");
    assert_eq!(server.sent_requests(), vec!["PING nat=1"]);
}

#[tokio::test]
async fn test_http_ban_expires() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let mut engine = engine(&server, &clock, TextEncoding::Ascii).await;

    engine.record_http_ban();
    assert_eq!(engine.backoff().ban_origin, BanOrigin::Http);
    assert!(!engine.expire_ban());

    clock.advance(Duration::from_secs(12 * 60 * 60));
    assert!(engine.expire_ban());
    assert!(!engine.backoff().is_banned());
}

#[tokio::test]
async fn test_shutdown_logs_out() {
    let server = ScriptedServer::new();
    let clock = ManualClock::default();
    let engine = logged_in(&server, &clock).await;
    server.reply_text("203 LOGGED OUT\n\n");

    engine.shutdown().await;
    assert_eq!(
        server.sent_requests().last().map(String::as_str),
        Some("LOGOUT s=abcde")
    );
    assert_eq!(server.remaining_replies(), 0);
}
