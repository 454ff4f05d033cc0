pub mod cloudflare;

/// How a run decides between the write operations. Exactly one mode per
/// run; the CLI rejects combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write only when the record is missing or its content is stale.
    Sync,
    /// Rewrite the record even when the content already matches.
    ForceUpdate,
    /// Delete the record (when present), then create it from scratch.
    ForceDeleteCreate,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub message: String,
    pub record_id: Option<String>,
}
