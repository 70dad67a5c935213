/// Installs DOM-mutation and network-activity observers on `window.__lucentWaiter`.
/// Evaluated once per wait as a function body; its return value is ignored.
pub const WAITER_JS: &str = include_str!("waiter.js");

/// Settle check. A function expression taking `(timeoutMs, quietMs, done)` which calls
/// `done(null)` once the page is settled, or `done(message)` when it gives up.
pub const WAIT_FOR_JS: &str = include_str!("wait_for.js");
