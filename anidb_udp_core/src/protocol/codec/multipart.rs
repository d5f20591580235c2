//! Multi-part response reassembly
//!
//! ANIMEDESC and REVIEW replies larger than one datagram arrive as a series
//! of `{part}|{max parts}|{fragment}` data lines, each requested separately
//! by bumping the `part=` parameter of the request.

use crate::protocol::error::ProtocolError;
use log::{debug, warn};

/// Reply kinds that may be split across datagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    /// `233 ANIMEDESC`
    AnimeDescription,
    /// `234 REVIEW`
    Review,
}

impl MultipartKind {
    /// Status line prefixes marking a fragment of this kind
    fn markers(&self) -> [&'static str; 2] {
        match self {
            MultipartKind::AnimeDescription => ["233 ANIMEDESC", "233  ANIMEDESC"],
            MultipartKind::Review => ["234 REVIEW", "234  REVIEW"],
        }
    }

    fn matches(&self, status_line: &str) -> bool {
        self.markers()
            .iter()
            .any(|marker| status_line.starts_with(marker))
    }
}

/// Reassembly state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartState {
    /// More fragments are expected
    AwaitingFragment { received: u32, max_parts: u32 },
    /// Logical response is complete
    Done(String),
    /// A part could not be fetched; accumulated data was discarded
    Aborted(String),
}

/// State machine accumulating fragments of one multi-part reply
#[derive(Debug)]
pub struct MultipartAssembler {
    kind: MultipartKind,
    accumulated: String,
    state: MultipartState,
}

impl MultipartAssembler {
    /// Create an assembler waiting for the first fragment
    pub fn new(kind: MultipartKind) -> Self {
        Self {
            kind,
            accumulated: String::new(),
            state: MultipartState::AwaitingFragment {
                received: 0,
                max_parts: 1,
            },
        }
    }

    /// Current state
    pub fn state(&self) -> &MultipartState {
        &self.state
    }

    /// Feed one framed datagram
    pub fn accept(&mut self, framed: &str) -> &MultipartState {
        let MultipartState::AwaitingFragment {
            received,
            max_parts,
        } = self.state
        else {
            warn!("Ignoring datagram for finished multi-part response");
            return &self.state;
        };

        let mut lines = framed.split('\n').filter(|line| !line.is_empty());
        let status_line = lines.next().unwrap_or_default();

        let fragment = if self.kind.matches(status_line) {
            lines.next().and_then(parse_fragment_line)
        } else {
            None
        };

        let Some((max_from_line, fragment)) = fragment else {
            // Error replies end the exchange as they are
            debug!("Datagram is not a {:?} fragment: {status_line}", self.kind);
            self.state = MultipartState::Done(framed.to_string());
            return &self.state;
        };

        self.accumulated.push_str(fragment);

        let max_parts = if received == 0 { max_from_line } else { max_parts };
        let received = received + 1;
        debug!("Received {:?} part {received}/{max_parts}", self.kind);

        self.state = if received >= max_parts {
            // Status line of the final datagram heads the whole reply
            MultipartState::Done(format!("{status_line}\n0|1|{}\n", self.accumulated))
        } else {
            MultipartState::AwaitingFragment {
                received,
                max_parts,
            }
        };
        &self.state
    }

    /// Abort on a transport failure, dropping everything accumulated
    pub fn abort(&mut self, error: &ProtocolError) {
        warn!("Aborting {:?} multi-part response: {error}", self.kind);
        self.accumulated.clear();
        self.state = MultipartState::Aborted(error.to_string());
    }

    /// Rewrite the request for the next part
    ///
    /// The request's `part={received - 1}` token becomes `part={received}`.
    pub fn next_request(&self, request: &str) -> Option<String> {
        match self.state {
            MultipartState::AwaitingFragment { received, .. } if received > 0 => {
                Some(rewrite_part(request, received - 1, received))
            }
            _ => None,
        }
    }

    /// Finished logical response, if reassembly completed
    pub fn into_response(self) -> Option<String> {
        match self.state {
            MultipartState::Done(text) => Some(text),
            _ => None,
        }
    }
}

/// Split `{part}|{max parts}|{fragment}` into max parts and fragment
///
/// The fragment is everything after the second pipe, pipes included.
fn parse_fragment_line(line: &str) -> Option<(u32, &str)> {
    let mut fields = line.splitn(3, '|');
    let _part = fields.next()?;
    let max_parts = fields.next()?.trim().parse().ok()?;
    let fragment = fields.next().unwrap_or_default();
    Some((max_parts, fragment))
}

/// Replace the exact `part=from` token in a request's query string
fn rewrite_part(request: &str, from: u32, to: u32) -> String {
    let (verb, query) = request.split_once(' ').unwrap_or((request, ""));
    let needle = format!("part={from}");
    let query = query
        .split('&')
        .map(|token| {
            if token == needle {
                format!("part={to}")
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{verb} {query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_part_anime_description() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);

        assert_eq!(
            assembler.accept("233 ANIMEDESC\n0|3|AAA\n"),
            &MultipartState::AwaitingFragment {
                received: 1,
                max_parts: 3
            }
        );
        assembler.accept("233 ANIMEDESC\n1|3|BBB\n");
        assert_eq!(
            assembler.accept("233 ANIMEDESC\n2|3|CCC\n"),
            &MultipartState::Done("233 ANIMEDESC\n0|1|AAABBBCCC\n".to_string())
        );
        assert_eq!(
            assembler.into_response().as_deref(),
            Some("233 ANIMEDESC\n0|1|AAABBBCCC\n")
        );
    }

    #[test]
    fn test_single_part_completes_immediately() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        let state = assembler.accept("233 ANIMEDESC\n0|1|Short description\n");
        assert_eq!(
            state,
            &MultipartState::Done("233 ANIMEDESC\n0|1|Short description\n".to_string())
        );
    }

    #[test]
    fn test_double_space_marker() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        assembler.accept("233  ANIMEDESC\n0|2|A\n");
        let state = assembler.accept("233  ANIMEDESC\n1|2|B\n");
        assert_eq!(
            state,
            &MultipartState::Done("233  ANIMEDESC\n0|1|AB\n".to_string())
        );
    }

    #[test]
    fn test_final_status_line_heads_reply() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        assembler.accept("233 ANIMEDESC\n0|2|A\n");
        let state = assembler.accept("233  ANIMEDESC\n1|2|B\n");
        assert_eq!(
            state,
            &MultipartState::Done("233  ANIMEDESC\n0|1|AB\n".to_string())
        );
    }

    #[test]
    fn test_review_keeps_inner_pipes() {
        let mut assembler = MultipartAssembler::new(MultipartKind::Review);
        assembler.accept("234 REVIEW\n0|2|good|story\n");
        let state = assembler.accept("234 REVIEW\n1|2| and art\n");
        assert_eq!(
            state,
            &MultipartState::Done("234 REVIEW\n0|1|good|story and art\n".to_string())
        );
    }

    #[test]
    fn test_error_reply_ends_exchange() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        let state = assembler.accept("330 NO SUCH ANIME\n");
        assert_eq!(state, &MultipartState::Done("330 NO SUCH ANIME\n".to_string()));
    }

    #[test]
    fn test_abort_discards_accumulation() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        assembler.accept("233 ANIMEDESC\n0|3|AAA\n");
        assembler.abort(&ProtocolError::Timeout(std::time::Duration::from_secs(20)));
        assert!(matches!(assembler.state(), MultipartState::Aborted(_)));
        assert!(assembler.into_response().is_none());
    }

    #[test]
    fn test_next_request_rewrites_part_token() {
        let mut assembler = MultipartAssembler::new(MultipartKind::AnimeDescription);
        assert!(assembler.next_request("ANIMEDESC aid=1&part=0").is_none());

        assembler.accept("233 ANIMEDESC\n0|3|AAA\n");
        assert_eq!(
            assembler
                .next_request("ANIMEDESC aid=10&part=0&s=abc")
                .as_deref(),
            Some("ANIMEDESC aid=10&part=1&s=abc")
        );
    }

    #[test]
    fn test_rewrite_part_matches_whole_token() {
        assert_eq!(
            rewrite_part("REVIEW rid=part=1&part=1", 1, 2),
            "REVIEW rid=part=1&part=2"
        );
        assert_eq!(rewrite_part("REVIEW rid=5&part=10", 1, 2), "REVIEW rid=5&part=10");
    }
}
