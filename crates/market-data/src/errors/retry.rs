/// Classification for retry policy.
///
/// Used by the crawl loop to decide what to do with a failed fetch.
///
/// # Behavior Summary
///
/// | Class | Retry the same request? | Charge the budget? |
/// |-------|------------------------|--------------------|
/// | `Never` | No | Yes (the call completed) |
/// | `WithBackoff` | Yes, after a delay | No |
/// | `ReduceScope` | Yes, with a narrower request | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry. The provider answered conclusively; repeating the
    /// request will produce the same result. "No data for instrument"
    /// lands here: it is a completed call, not a failure.
    Never,

    /// Retry the same request after backing off.
    ///
    /// Used for transient conditions: rate limiting (429), upstream
    /// timeouts, and transport-level failures. The request itself is fine;
    /// the provider or the network was momentarily unable to serve it.
    WithBackoff,

    /// Retry with a narrower request.
    ///
    /// Used for gateway/proxy timeouts (502/503/504): the upstream took
    /// longer than the intermediary allows, which usually means the
    /// requested scope is too large, not that the provider is down.
    /// Repeating the identical request is unlikely to help.
    ReduceScope,
}
