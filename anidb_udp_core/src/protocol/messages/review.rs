//! REVIEW command

use crate::protocol::codec::MultipartKind;
use crate::protocol::error::Result;
use crate::protocol::messages::{
    AniDBCommand, ActivityKind, Classification, DomainOutcome, Payload, Reply, multipart_text,
    validate_nonzero,
};
use serde::Serialize;

/// REVIEW command, fetched part by part
#[derive(Debug, Clone)]
pub struct ReviewCommand {
    rid: u64,
}

impl ReviewCommand {
    pub fn new(rid: u64) -> Result<Self> {
        Ok(Self {
            rid: validate_nonzero("rid", rid)?,
        })
    }
}

impl AniDBCommand for ReviewCommand {
    fn name(&self) -> &'static str {
        "REVIEW"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("rid", self.rid.to_string()), ("part", "0".to_string())]
    }

    fn key(&self) -> String {
        format!("GetReview_{}", self.rid)
    }

    fn activity(&self) -> ActivityKind {
        ActivityKind::GettingReview
    }

    fn classify(&self, reply: &Reply<'_>) -> Classification {
        match (reply.code, multipart_text(reply)) {
            (234, Some(text)) => Classification::with(
                DomainOutcome::GotReview,
                Payload::Review(ReviewInfo {
                    rid: self.rid,
                    text,
                }),
            ),
            _ => Classification::bare(DomainOutcome::NoSuchReview),
        }
    }

    fn multipart(&self) -> Option<MultipartKind> {
        Some(MultipartKind::Review)
    }
}

/// Review body, reassembled from all parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewInfo {
    pub rid: u64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let cmd = ReviewCommand::new(311).unwrap();
        assert_eq!(cmd.encode(), "REVIEW rid=311&part=0");
        assert_eq!(cmd.key(), "GetReview_311");
        assert_eq!(cmd.multipart(), Some(MultipartKind::Review));
    }

    #[test]
    fn test_review_keeps_inner_pipes() {
        let cmd = ReviewCommand::new(311).unwrap();
        let text = "234 REVIEW\n0|1|Story 8|10, animation 9|10\n";
        let result = cmd.classify(&Reply::parse(text, 234));
        assert_eq!(result.outcome, DomainOutcome::GotReview);
        let Some(Payload::Review(review)) = result.payload else {
            panic!("expected review payload");
        };
        assert_eq!(review.text, "Story 8|10, animation 9|10");
    }

    #[test]
    fn test_no_such_review() {
        let cmd = ReviewCommand::new(311).unwrap();
        let result = cmd.classify(&Reply::parse("334 NO SUCH REVIEW\n", 334));
        assert_eq!(result.outcome, DomainOutcome::NoSuchReview);
    }
}
