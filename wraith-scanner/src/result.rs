use serde::{Deserialize, Serialize};

/// An HTTP response with its redirect history resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    pub status_code: u16,
    /// URL of the response that ended the redirect chain.
    pub final_url: String,
    /// Raw `Location` targets recorded along the chain, in order.
    pub redirect_targets: Vec<String>,
    pub body: String,
}

/// Which rule marked a candidate dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadReason {
    /// The candidate answered with a literal 404.
    Status404,
    /// An error phrase in a heading or title that the probe does not share.
    BadPhrase,
    /// The candidate redirected to a root-equivalent of its own host.
    RootRedirect,
    /// The candidate landed on the same page as the reference probe.
    ProbeRedirect,
    /// Candidate and probe share a 4xx/5xx status.
    SharedErrorStatus,
    /// Candidate body is byte-identical to the probe body.
    ProbeBodyMatch,
}

/// Tri-state outcome for one classified URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Live { final_url: String },
    Dead { reason: DeadReason },
    NeedsJs { final_url: String },
}

/// Split verdicts from a classification pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classified {
    /// Final URLs judged live without rendering.
    pub live: Vec<String>,
    /// Final URLs that need a JS-rendering re-check.
    pub needs_js: Vec<String>,
}
